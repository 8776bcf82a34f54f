use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::CollectionStatistics;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub created_at: String,
    pub version: u32,
    pub config: IndexConfig,
}

impl MetaFile {
    pub fn now(config: IndexConfig) -> Self {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self { created_at, version: FORMAT_VERSION, config }
    }
}

/// File layout of one index directory.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn lexicon(&self) -> PathBuf { self.root.join("lexicon.bin") }
    pub fn doc_ids(&self) -> PathBuf { self.root.join("doc_ids.bin") }
    pub fn freqs(&self) -> PathBuf { self.root.join("freqs.bin") }
    pub fn skips(&self) -> PathBuf { self.root.join("skips.bin") }
    pub fn doc_index(&self) -> PathBuf { self.root.join("doc_index.bin") }
    pub fn statistics(&self) -> PathBuf { self.root.join("statistics.json") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn blocks_dir(&self) -> PathBuf { self.root.join("blocks") }
    pub fn block_lexicon(&self, block: u32) -> PathBuf { self.blocks_dir().join(format!("lexicon_{block}.bin")) }
    pub fn block_doc_ids(&self, block: u32) -> PathBuf { self.blocks_dir().join(format!("doc_ids_{block}.bin")) }
    pub fn block_freqs(&self, block: u32) -> PathBuf { self.blocks_dir().join(format!("freqs_{block}.bin")) }

    /// Remove every file a previous build may have left behind.
    pub fn clear(&self) -> Result<()> {
        for file in [self.lexicon(), self.doc_ids(), self.freqs(), self.skips(), self.doc_index(), self.statistics(), self.meta()] {
            if file.exists() {
                fs::remove_file(file)?;
            }
        }
        self.remove_blocks()
    }

    pub fn remove_blocks(&self) -> Result<()> {
        let dir = self.blocks_dir();
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

fn save_json<T: Serialize>(root: &Path, path: PathBuf, value: &T) -> Result<()> {
    create_dir_all(root)?;
    let mut f = File::create(path)?;
    let json = serde_json::to_string_pretty(value)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

fn load_json<T: for<'de> Deserialize<'de>>(path: PathBuf) -> Result<T> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    save_json(&paths.root, paths.meta(), meta)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    load_json(paths.meta())
}

pub fn save_statistics(paths: &IndexPaths, stats: &CollectionStatistics) -> Result<()> {
    save_json(&paths.root, paths.statistics(), stats)
}

pub fn load_statistics(paths: &IndexPaths) -> Result<CollectionStatistics> {
    load_json(paths.statistics())
}
