use crate::document::{extract_room_docs, RoomDoc};
use crate::error::{Error, Result};
use crate::partition::partition_key;
use crate::storage::{DocWriters, IndexPaths, PartitionTable};
use crate::{DocId, Posting};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Documents accumulated between partial-run flushes.
    pub batch_size: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self { batch_size: 10_000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub num_docs: u64,
    pub num_runs: u32,
    pub skipped_files: u64,
}

/// Single-pass index builder. Owns the in-memory partition tables, the
/// global document-id counter, and the docmap/docstore writers; all state is
/// constructed with the builder and discarded when [`IndexBuilder::build`]
/// returns.
pub struct IndexBuilder {
    config: BuilderConfig,
    paths: IndexPaths,
    partitions: HashMap<String, PartitionTable>,
    writers: DocWriters,
    next_doc_id: DocId,
    docs_in_batch: usize,
    next_run_id: u32,
    skipped_files: u64,
}

impl IndexBuilder {
    pub fn create(out_dir: &Path, config: BuilderConfig) -> Result<Self> {
        fs::create_dir_all(out_dir).map_err(|e| Error::storage(out_dir, e))?;
        let paths = IndexPaths::new(out_dir);
        let writers = DocWriters::create(&paths)?;
        Ok(Self {
            config,
            paths,
            partitions: HashMap::new(),
            writers,
            next_doc_id: 0,
            docs_in_batch: 0,
            next_run_id: 0,
            skipped_files: 0,
        })
    }

    /// Walk `input_dir` in sorted path order, index every `.json` file, and
    /// flush the final partial run. A file that fails to parse is logged and
    /// skipped; only storage failures abort the pass.
    pub fn build(mut self, input_dir: &Path) -> Result<BuildStats> {
        let walker = WalkDir::new(input_dir).sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(input_dir).to_path_buf();
                Error::storage(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_json = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if !is_json {
                continue;
            }

            match extract_room_docs(path) {
                Ok(docs) => {
                    for doc in docs {
                        self.add_document(&doc)?;
                    }
                }
                Err(err @ Error::Parse { .. }) => {
                    tracing::warn!(path = %path.display(), %err, "skipping unparseable space file");
                    self.skipped_files += 1;
                }
                Err(err) => return Err(err),
            }
        }

        if self.partitions.values().any(|t| !t.is_empty()) {
            self.flush()?;
        }
        self.writers.finish()?;

        let stats = BuildStats {
            num_docs: self.next_doc_id as u64,
            num_runs: self.next_run_id,
            skipped_files: self.skipped_files,
        };
        tracing::info!(
            num_docs = stats.num_docs,
            num_runs = stats.num_runs,
            skipped_files = stats.skipped_files,
            "build pass complete"
        );
        Ok(stats)
    }

    /// Assign the next document id, persist the docmap/docstore entries, and
    /// post every distinct stem into its partition table. Flushes a partial
    /// run when the batch fills.
    fn add_document(&mut self, doc: &RoomDoc) -> Result<()> {
        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;

        self.writers.append(doc_id, &doc.uid, &doc.store)?;

        for term in &doc.terms {
            let table = self
                .partitions
                .entry(partition_key(term))
                .or_default();
            let postings = table.entry(term.clone()).or_default();
            // Document ids only grow within a run, so checking the tail is
            // enough to keep (term, doc_id) pairs unique.
            if postings.last().map(|p| p.doc_id) != Some(doc_id) {
                postings.push(Posting::new(doc_id));
            }
        }

        self.docs_in_batch += 1;
        if self.docs_in_batch >= self.config.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Write every non-empty partition table to a run file tagged with the
    /// current run id, then swap in fresh tables. The doc-id counter is
    /// global and keeps advancing across flushes.
    fn flush(&mut self) -> Result<()> {
        let run_id = self.next_run_id;
        let tables = std::mem::take(&mut self.partitions);
        for (partition, table) in &tables {
            if table.is_empty() {
                continue;
            }
            let path = self.paths.run_file(partition, run_id);
            crate::storage::write_partition_table(&path, table)?;
        }
        tracing::debug!(run_id, partitions = tables.len(), "flushed partial run");
        self.next_run_id += 1;
        self.docs_in_batch = 0;
        Ok(())
    }
}
