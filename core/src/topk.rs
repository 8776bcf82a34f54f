//! Bounded top-K collector.
//!
//! Ties are insertion-order stable: a document whose score equals the current
//! K-th best does not displace it, and results with equal scores come out in
//! the order they were inserted. Since evaluation inserts candidates in
//! increasing docID order, equal scores rank the smaller docID first.

use crate::index::DocId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Clone, Copy)]
struct HeapEntry {
    doc: ScoredDoc,
    seq: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    // The heap top is the entry to evict next: lowest score, latest insertion on ties.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .doc
            .score
            .partial_cmp(&self.doc.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

/// Min-heap holding the best `k` documents seen so far.
pub struct TopK {
    heap: BinaryHeap<HeapEntry>,
    k: usize,
    seq: u64,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self { heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1 << 20)), k, seq: 0 }
    }

    /// Score a document must beat to enter: the K-th best score once K
    /// documents are held, 0 before that.
    #[inline]
    pub fn threshold(&self) -> f64 {
        if self.k > 0 && self.heap.len() >= self.k {
            self.heap.peek().map(|e| e.doc.score).unwrap_or(0.0)
        } else {
            0.0
        }
    }

    /// Offer a document. Returns the document pushed out of the top K, or the
    /// offered document itself when it does not make the cut.
    pub fn insert(&mut self, doc_id: DocId, score: f64) -> Option<ScoredDoc> {
        let doc = ScoredDoc { doc_id, score };
        if self.k == 0 {
            return Some(doc);
        }
        if self.heap.len() < self.k {
            self.push(doc);
            return None;
        }
        match self.heap.peek() {
            Some(worst) if score > worst.doc.score => {
                let evicted = self.heap.pop().map(|e| e.doc);
                self.push(doc);
                evicted
            }
            _ => Some(doc),
        }
    }

    pub fn len(&self) -> usize { self.heap.len() }
    pub fn is_empty(&self) -> bool { self.heap.is_empty() }

    /// Best first; equal scores in insertion order.
    pub fn into_sorted_vec(self) -> Vec<ScoredDoc> {
        let mut entries = self.heap.into_vec();
        // ascending in eviction order means best first
        entries.sort();
        entries.into_iter().map(|e| e.doc).collect()
    }

    fn push(&mut self, doc: ScoredDoc) {
        self.heap.push(HeapEntry { doc, seq: self.seq });
        self.seq += 1;
    }
}
