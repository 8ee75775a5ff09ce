use crate::document::StoredDoc;
use crate::error::{Error, Result};
use crate::{DocId, Posting};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Term -> posting list, as stored in partial-run and merged partition files.
/// `BTreeMap` keeps terms lexicographically sorted on disk.
pub type PartitionTable = BTreeMap<String, Vec<Posting>>;

/// Build sidecar written after a successful build, shape kept small enough
/// for humans to eyeball.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u64,
    pub num_runs: u32,
    pub created_at: String,
    pub version: u32,
}

pub const META_VERSION: u32 = 1;

/// Owner of every artifact name under one index directory. All readers and
/// writers go through this so the layout stays consistent within a
/// build/query pair.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// Append-only doc-id -> uid map, one `<id>\t<uid>` line per document.
    pub fn docmap(&self) -> PathBuf {
        self.root.join("roomdocmap.tsv")
    }

    /// JSONL metadata store; line N holds the record for document id N.
    pub fn docstore(&self) -> PathBuf {
        self.root.join("roomdocstore.jsonl")
    }

    pub fn run_file(&self, partition: &str, run_id: u32) -> PathBuf {
        self.root
            .join(format!("inverted_index_{partition}_run{run_id}.json"))
    }

    pub fn partition_file(&self, partition: &str) -> PathBuf {
        self.root.join(format!("inverted_index_{partition}.json"))
    }

    pub fn report(&self) -> PathBuf {
        self.root.join("index_report.txt")
    }

    pub fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
}

pub fn write_partition_table(path: &Path, table: &PartitionTable) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::storage(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, table)
        .map_err(|e| Error::storage(path, std::io::Error::other(e)))?;
    writer.flush().map_err(|e| Error::storage(path, e))?;
    Ok(())
}

/// Read a partition table, or `None` if the file does not exist, a valid
/// state meaning nothing was ever routed to that partition.
pub fn read_partition_table(path: &Path) -> Result<Option<PartitionTable>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::storage(path, e)),
    };
    let table = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::corrupt(path, e))?;
    Ok(Some(table))
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let path = paths.meta();
    let file = File::create(&path).map_err(|e| Error::storage(&path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), meta)
        .map_err(|e| Error::storage(&path, std::io::Error::other(e)))?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let file = File::open(&path).map_err(|e| Error::storage(&path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::corrupt(&path, e))
}

/// Load the doc-id map. Malformed lines are skipped with a warning rather
/// than failing the open; the consistency check at query time catches any
/// resulting holes.
pub fn load_docmap(paths: &IndexPaths) -> Result<BTreeMap<DocId, String>> {
    let path = paths.docmap();
    let file = File::open(&path).map_err(|e| Error::storage(&path, e))?;
    let mut map = BTreeMap::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::storage(&path, e))?;
        if line.is_empty() {
            continue;
        }
        match line.split_once('\t') {
            Some((id, uid)) => match id.parse::<DocId>() {
                Ok(id) => {
                    map.insert(id, uid.to_string());
                }
                Err(_) => tracing::warn!(%line, "docmap line has non-numeric id, skipping"),
            },
            None => tracing::warn!(%line, "docmap line missing tab separator, skipping"),
        }
    }
    Ok(map)
}

/// Load the metadata store; the vector index is the document id.
pub fn load_docstore(paths: &IndexPaths) -> Result<Vec<StoredDoc>> {
    let path = paths.docstore();
    let file = File::open(&path).map_err(|e| Error::storage(&path, e))?;
    let mut docs = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::storage(&path, e))?;
        if line.is_empty() {
            continue;
        }
        let doc = serde_json::from_str(&line).map_err(|e| Error::corrupt(&path, e))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// Incremental writers for the docmap and docstore, held open for the whole
/// build pass.
pub struct DocWriters {
    docmap: BufWriter<File>,
    docstore: BufWriter<File>,
    docmap_path: PathBuf,
    docstore_path: PathBuf,
}

impl DocWriters {
    pub fn create(paths: &IndexPaths) -> Result<Self> {
        let docmap_path = paths.docmap();
        let docstore_path = paths.docstore();
        let docmap = File::create(&docmap_path).map_err(|e| Error::storage(&docmap_path, e))?;
        let docstore =
            File::create(&docstore_path).map_err(|e| Error::storage(&docstore_path, e))?;
        Ok(Self {
            docmap: BufWriter::new(docmap),
            docstore: BufWriter::new(docstore),
            docmap_path,
            docstore_path,
        })
    }

    pub fn append(&mut self, doc_id: DocId, uid: &str, store: &StoredDoc) -> Result<()> {
        writeln!(self.docmap, "{doc_id}\t{uid}")
            .map_err(|e| Error::storage(&self.docmap_path, e))?;
        let line = serde_json::to_string(store)
            .map_err(|e| Error::storage(&self.docstore_path, std::io::Error::other(e)))?;
        writeln!(self.docstore, "{line}").map_err(|e| Error::storage(&self.docstore_path, e))?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.docmap
            .flush()
            .map_err(|e| Error::storage(&self.docmap_path, e))?;
        self.docstore
            .flush()
            .map_err(|e| Error::storage(&self.docstore_path, e))?;
        Ok(())
    }
}
