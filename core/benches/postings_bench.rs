use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use searchcore::postings::{PostingFileWriter, PostingList};
use searchcore::{Compression, IndexPaths, Posting};

fn postings(n: u32) -> Vec<Posting> {
    (1..=n).map(|i| Posting::new(i * 3 + i % 7, 1 + i % 5)).collect()
}

fn bench_decode(c: &mut Criterion) {
    let list = postings(100_000);
    let mut group = c.benchmark_group("postings");
    for codec in [Compression::None, Compression::VByte] {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let mut writer = PostingFileWriter::create(&paths, codec, 1024).unwrap();
        let entry = writer.write_list(&list).unwrap();
        writer.finish().unwrap();

        group.bench_with_input(BenchmarkId::new("scan", format!("{codec:?}")), &entry, |b, entry| {
            b.iter(|| {
                let mut cursor = PostingList::open(&paths, codec, "t", entry).unwrap();
                let mut sum = 0u64;
                while let Some(p) = cursor.current() {
                    sum += p.frequency as u64;
                    cursor.next().unwrap();
                }
                black_box(sum)
            })
        });
        group.bench_with_input(BenchmarkId::new("next_geq", format!("{codec:?}")), &entry, |b, entry| {
            b.iter(|| {
                let mut cursor = PostingList::open(&paths, codec, "t", entry).unwrap();
                let mut target = 0;
                while let Some(p) = cursor.next_geq(target).unwrap() {
                    target = p.doc_id + 5_000;
                }
                black_box(target)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
