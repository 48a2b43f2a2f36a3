use crate::error::{Error, Result};
use crate::index::{DocId, DocMeta, IdfMode, InvertedIndex, Posting, TermEntry};
use crate::tokenizer::{NormalizerConfig, NORMALIZER_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub num_docs: u32,
    pub num_terms: usize,
    pub created_at: String,
    pub normalizer: NormalizerConfig,
    pub idf_mode: IdfMode,
}

impl MetaFile {
    fn describe(index: &InvertedIndex) -> Self {
        Self {
            version: FORMAT_VERSION,
            num_docs: index.num_docs,
            num_terms: index.num_terms(),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "".into()),
            normalizer: index.normalizer,
            idf_mode: index.idf_mode,
        }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn terms(&self) -> PathBuf { self.root.join("terms.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
}

/// Write `meta.json` and `terms.bin`. Returns the metadata written.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.terms())?;
    let bytes = bincode::serialize(&index.terms)?;
    f.write_all(&bytes)?;

    let meta = MetaFile::describe(index);
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_terms = meta.num_terms, "index saved");
    Ok(meta)
}

pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let meta = load_meta(paths)?;
    check_compatible(&meta)?;

    let mut f = File::open(paths.terms())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let terms: BTreeMap<String, TermEntry> = bincode::deserialize(&buf)?;
    if terms.len() != meta.num_terms {
        return Err(Error::IncompatibleIndex(format!(
            "meta.json lists {} terms, terms.bin has {}",
            meta.num_terms,
            terms.len()
        )));
    }
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, num_terms = meta.num_terms, "index loaded");
    Ok(InvertedIndex::from_parts(terms, meta.num_docs, meta.normalizer, meta.idf_mode))
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

pub fn save_docs(paths: &IndexPaths, docs: &HashMap<DocId, DocMeta>) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.docs())?;
    let bytes = bincode::serialize(docs)?;
    f.write_all(&bytes)?;
    Ok(())
}

/// Document metadata, or an empty map when the index was saved without any.
pub fn load_docs(paths: &IndexPaths) -> Result<HashMap<DocId, DocMeta>> {
    let path = paths.docs();
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let docs = bincode::deserialize(&buf)?;
    Ok(docs)
}

fn check_compatible(meta: &MetaFile) -> Result<()> {
    if meta.version > FORMAT_VERSION {
        return Err(Error::IncompatibleIndex(format!(
            "format version {} is newer than supported version {FORMAT_VERSION}",
            meta.version
        )));
    }
    if meta.normalizer.version > NORMALIZER_VERSION {
        return Err(Error::IncompatibleIndex(format!(
            "normalizer version {} is newer than supported version {NORMALIZER_VERSION}",
            meta.normalizer.version
        )));
    }
    Ok(())
}

// Interchange format: the top-level object maps each term to
// `{ "idf": f64, "postings": { "<doc_id>": weight } }`. Unknown per-term fields are ignored.
// Corpus size and pipeline settings go to a `<name>.meta.json` sidecar; group tags are not carried.

#[derive(Serialize, Deserialize)]
struct JsonTerm {
    idf: f64,
    postings: BTreeMap<DocId, f64>,
}

/// Sidecar path for an interchange file: `inverted_index.json` -> `inverted_index.meta.json`.
pub fn json_meta_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

pub fn export_json(index: &InvertedIndex, path: &Path) -> Result<()> {
    let terms: BTreeMap<&str, JsonTerm> = index
        .terms()
        .map(|(term, entry)| {
            let postings = entry.postings.iter().map(|p| (p.doc_id, p.weight)).collect();
            (term, JsonTerm { idf: entry.idf, postings })
        })
        .collect();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &terms)?;

    let meta = serde_json::to_string_pretty(&MetaFile::describe(index))?;
    File::create(json_meta_path(path))?.write_all(meta.as_bytes())?;
    Ok(())
}

/// Read an interchange file. Without a sidecar, the corpus size is the number of
/// distinct doc ids in the postings and the default pipeline settings apply.
pub fn import_json(path: &Path) -> Result<InvertedIndex> {
    let reader = BufReader::new(File::open(path)?);
    let doc: BTreeMap<String, JsonTerm> = serde_json::from_reader(reader)?;
    let terms: BTreeMap<String, TermEntry> = doc
        .into_iter()
        .map(|(term, t)| {
            // BTreeMap iteration keeps postings sorted by doc id.
            let postings = t.postings.into_iter().map(|(doc_id, weight)| Posting { doc_id, weight, group: None }).collect();
            (term, TermEntry { idf: t.idf, postings })
        })
        .collect();

    let meta_path = json_meta_path(path);
    let (num_docs, normalizer, idf_mode) = if meta_path.exists() {
        let meta: MetaFile = serde_json::from_reader(BufReader::new(File::open(meta_path)?))?;
        check_compatible(&meta)?;
        (meta.num_docs, meta.normalizer, meta.idf_mode)
    } else {
        let docs: BTreeSet<DocId> = terms.values().flat_map(|e| e.postings.iter().map(|p| p.doc_id)).collect();
        (docs.len() as u32, NormalizerConfig::default(), IdfMode::default())
    };
    tracing::info!(path = %path.display(), num_docs, num_terms = terms.len(), "interchange index imported");
    Ok(InvertedIndex::from_parts(terms, num_docs, normalizer, idf_mode))
}
