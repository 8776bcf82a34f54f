use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use searchcore::{rebuild_from_blocks, BuildSummary, Compression, IndexConfig, IndexPaths, IndexWriter, Scoring};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(default)]
    title: Option<String>,
    body: String,
}

impl InputDoc {
    fn text(&self) -> String {
        match &self.title {
            Some(title) => format!("{title}\n{}", self.body),
            None => self.body.clone(),
        }
    }
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a block-merged inverted index for BM25/TF-IDF retrieval", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from TSV, JSON or JSONL files, or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Remove stopwords and stem terms
        #[arg(long, default_value_t = false)]
        stem: bool,
        /// VByte-compress posting lists
        #[arg(long, default_value_t = false)]
        compress: bool,
        /// Memory the in-memory partial index may use before it is flushed to a block
        #[arg(long, default_value_t = 64)]
        memory_budget_mb: usize,
        /// Posting lists longer than this get skip blocks
        #[arg(long, default_value_t = searchcore::config::DEFAULT_SKIP_THRESHOLD)]
        skip_threshold: usize,
        /// Scoring function term upper bounds are computed for (bm25 or tfidf)
        #[arg(long, default_value = "bm25")]
        scoring: Scoring,
    },
    /// Merge the blocks a failed build left behind
    Merge {
        /// Index directory holding blocks/, statistics.json and meta.json
        #[arg(long)]
        index: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let summary = match cli.command {
        Commands::Build { input, output, stem, compress, memory_budget_mb, skip_threshold, scoring } => {
            let config = IndexConfig {
                compression: if compress { Compression::VByte } else { Compression::None },
                stem_and_stop: stem,
                memory_budget: memory_budget_mb.max(1) * 1024 * 1024,
                skip_threshold,
                scoring,
            };
            build_index(Path::new(&input), &output, config)?
        }
        Commands::Merge { index } => {
            rebuild_from_blocks(&IndexPaths::new(&index)).with_context(|| format!("merging blocks in {index}"))?
        }
    };
    tracing::info!(
        documents = summary.documents,
        skipped = summary.skipped,
        blocks = summary.blocks,
        terms = summary.terms,
        postings = summary.postings,
        "done"
    );
    Ok(())
}

fn build_index(input: &Path, output: &str, config: IndexConfig) -> Result<BuildSummary> {
    let files = input_files(input)?;
    if files.is_empty() {
        bail!("no .tsv, .txt, .json or .jsonl input under {}", input.display());
    }
    let mut writer = IndexWriter::create(IndexPaths::new(output), config).with_context(|| format!("creating index in {output}"))?;
    for file in &files {
        let ingested = match extension(file) {
            Some("jsonl") => index_jsonl(file, &mut writer),
            Some("json") => index_json(file, &mut writer),
            _ => index_tsv(file, &mut writer),
        }
        .with_context(|| format!("indexing {}", file.display()))?;
        tracing::info!(file = %file.display(), documents = ingested, "file ingested");
    }
    Ok(writer.finish()?)
}

fn extension(path: &Path) -> Option<&str> { path.extension().and_then(|s| s.to_str()) }

fn input_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl" | "tsv" | "txt")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input {} does not exist", input.display());
    }
    Ok(files)
}

/// One document per line: `docno<TAB>text`. Lines without a tab are skipped.
fn index_tsv(file: &Path, writer: &mut IndexWriter) -> Result<usize> {
    let reader = BufReader::new(File::open(file)?);
    let mut count = 0;
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let Some((doc_no, text)) = line.split_once('\t') else {
            tracing::warn!(file = %file.display(), line = n + 1, "line has no tab separator, skipped");
            continue;
        };
        if writer.add_document(doc_no.trim(), text)?.is_some() {
            count += 1;
        }
    }
    Ok(count)
}

fn index_jsonl(file: &Path, writer: &mut IndexWriter) -> Result<usize> {
    let reader = BufReader::new(File::open(file)?);
    let mut count = 0;
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line).with_context(|| format!("line {}", n + 1))?;
        if writer.add_document(&doc.id, &doc.text())?.is_some() {
            count += 1;
        }
    }
    Ok(count)
}

fn index_json(file: &Path, writer: &mut IndexWriter) -> Result<usize> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let docs: Vec<InputDoc> = match json {
        serde_json::Value::Array(arr) => arr.into_iter().map(serde_json::from_value).collect::<Result<_, _>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => bail!("expected a JSON object or array"),
    };
    let mut count = 0;
    for doc in docs {
        if writer.add_document(&doc.id, &doc.text())?.is_some() {
            count += 1;
        }
    }
    Ok(count)
}
