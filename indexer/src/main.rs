use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use sift_core::persist::{export_json, load_docs, load_index, save_docs, save_index, IndexPaths};
use sift_core::synonyms::{DatamuseClient, NoSynonyms, SynonymSource};
use sift_core::{
    DocId, DocMeta, Document, Engine, IdfMode, IndexBuilder, Normalizer, NormalizerConfig, Notice, Popularity,
    SearchConfig, SearchOutcome, SearchReport,
};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocId,
    #[serde(default)]
    title: Option<String>,
    body: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    popularity: Option<f64>,
    #[serde(default)]
    group: Option<u32>,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a boolean TF-IDF inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SynonymBackend {
    None,
    Datamuse,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Use smoothed IDF = ln(1 + N/(1+df)) instead of ln(N/(1+df))
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
        /// Keep stopwords in the index
        #[arg(long, default_value_t = false)]
        no_stopwords: bool,
        /// Index surface forms instead of stems
        #[arg(long, default_value_t = false)]
        no_stemming: bool,
    },
    /// Run a boolean query against a built index
    Query {
        #[arg(long, default_value = "./index")]
        index: String,
        #[arg(long)]
        q: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, value_enum, default_value_t = SynonymBackend::None)]
        synonyms: SynonymBackend,
        #[arg(long, default_value_t = 0.8)]
        similarity_floor: f64,
        #[arg(long, default_value_t = 2000)]
        synonym_timeout_ms: u64,
    },
    /// Write the index as interchange JSON
    Export {
        #[arg(long, default_value = "./index")]
        index: String,
        #[arg(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, smoothed_idf, no_stopwords, no_stemming } => {
            let config = NormalizerConfig { stopwords: !no_stopwords, stemming: !no_stemming, ..Default::default() };
            let idf_mode = if smoothed_idf { IdfMode::Smoothed } else { IdfMode::Standard };
            build_index(Path::new(&input), &output, config, idf_mode)
        }
        Commands::Query { index, q, k, offset, synonyms, similarity_floor, synonym_timeout_ms } => {
            let config = SearchConfig { similarity_floor, synonym_timeout_ms, ..Default::default() };
            run_query(&index, &q, k, offset, synonyms, &config)
        }
        Commands::Export { index, output } => {
            let loaded = load_index(&IndexPaths::new(&index))?;
            export_json(&loaded, Path::new(&output))?;
            tracing::info!(output = %output, "index exported");
            Ok(())
        }
    }
}

fn build_index(input: &Path, output: &str, config: NormalizerConfig, idf_mode: IdfMode) -> Result<()> {
    let out_paths = IndexPaths::new(output);
    let inputs = load_documents(input)?;
    tracing::info!(num_docs = inputs.len(), "ingested documents");

    let mut builder = IndexBuilder::new(Normalizer::new(config)).idf_mode(idf_mode);
    let mut docs: HashMap<DocId, DocMeta> = HashMap::new();
    for doc in inputs {
        let title = doc.title.unwrap_or_else(|| format!("Document {}", doc.id));
        docs.insert(doc.id, DocMeta { title, url: doc.url, popularity: doc.popularity });
        builder
            .add(Document { id: doc.id, text: doc.body, group: doc.group })
            .with_context(|| format!("adding document {}", doc.id))?;
    }

    let (index, report) = builder.build();
    for notice in &report.notices {
        tracing::warn!(%notice, "build notice");
    }
    save_index(&out_paths, &index)?;
    save_docs(&out_paths, &docs)?;

    tracing::info!(output, num_terms = report.num_terms, num_postings = report.num_postings, "index build complete");
    Ok(())
}

fn load_documents(input: &Path) -> Result<Vec<InputDoc>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        anyhow::bail!("input path {} does not exist", input.display());
    }

    let mut docs = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping non-document JSON"),
    }
    Ok(())
}

#[derive(Serialize)]
struct QueryHit {
    doc_id: DocId,
    score: f64,
    title: Option<String>,
    url: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse<'a> {
    query: &'a str,
    boolean_query: &'a str,
    status: &'static str,
    total_hits: usize,
    offset: usize,
    has_more: bool,
    results: Vec<QueryHit>,
    notices: Vec<String>,
    report: &'a SearchReport,
}

fn run_query(index_dir: &str, q: &str, k: usize, offset: usize, backend: SynonymBackend, config: &SearchConfig) -> Result<()> {
    let paths = IndexPaths::new(index_dir);
    let index = load_index(&paths)?;
    let docs = load_docs(&paths)?;
    let popularity: Popularity = docs.iter().filter_map(|(id, m)| m.popularity.map(|p| (*id, p))).collect();

    let synonyms: Arc<dyn SynonymSource> = match backend {
        SynonymBackend::None => Arc::new(NoSynonyms),
        SynonymBackend::Datamuse => Arc::new(DatamuseClient::new(config.synonym_timeout(), config.max_synonyms)?),
    };
    let engine = Engine::with_config(index, config, synonyms)?.with_popularity(popularity);
    let report = engine.search(q);

    let k = k.clamp(1, 100);
    let (status, total_hits, has_more, results) = match &report.outcome {
        SearchOutcome::Hits(result) => {
            let page = result.page(offset, k);
            let results = page
                .hits
                .iter()
                .map(|h| {
                    let meta = docs.get(&h.doc_id);
                    QueryHit {
                        doc_id: h.doc_id,
                        score: h.score,
                        title: meta.map(|m| m.title.clone()),
                        url: meta.and_then(|m| m.url.clone()),
                    }
                })
                .collect();
            ("hits", page.total, page.has_more, results)
        }
        SearchOutcome::Empty(reason) => (empty_status(*reason), 0, false, Vec::new()),
    };

    let response = QueryResponse {
        query: q,
        boolean_query: &report.boolean_query,
        status,
        total_hits,
        offset,
        has_more,
        results,
        notices: report.notices.iter().map(Notice::to_string).collect(),
        report: &report,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn empty_status(reason: sift_core::EmptyReason) -> &'static str {
    match reason {
        sift_core::EmptyReason::MalformedQuery => "malformed_query",
        sift_core::EmptyReason::NoMatches => "no_matches",
    }
}
