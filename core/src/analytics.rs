use crate::error::{Error, Result};
use crate::storage::{read_partition_table, IndexPaths};
use std::fs;
use std::io::Write;

/// Read-only summary of a merged index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexReport {
    pub num_docs: u64,
    pub unique_terms: u64,
    pub bytes_on_disk: u64,
}

/// Summarize the merged index and write `index_report.txt`. Consumes only
/// the builder's and merger's outputs; never mutates them.
pub fn write_report(paths: &IndexPaths, num_docs: u64) -> Result<IndexReport> {
    let mut unique_terms = 0u64;
    let mut bytes_on_disk = 0u64;

    for partition in merged_partitions(paths)? {
        let path = paths.partition_file(&partition);
        if let Some(table) = read_partition_table(&path)? {
            unique_terms += table.len() as u64;
        }
        let meta = fs::metadata(&path).map_err(|e| Error::storage(&path, e))?;
        bytes_on_disk += meta.len();
    }

    for path in [paths.docmap(), paths.docstore()] {
        match fs::metadata(&path) {
            Ok(meta) => bytes_on_disk += meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::storage(&path, e)),
        }
    }

    let report = IndexReport { num_docs, unique_terms, bytes_on_disk };

    let report_path = paths.report();
    let mut file = fs::File::create(&report_path).map_err(|e| Error::storage(&report_path, e))?;
    write!(
        file,
        "Number of indexed rooms: {}\n\
         Number of unique terms: {}\n\
         Index size on disk (merged index + docmap + docstore): {:.2} KB\n",
        report.num_docs,
        report.unique_terms,
        report.bytes_on_disk as f64 / 1024.0,
    )
    .map_err(|e| Error::storage(&report_path, e))?;

    tracing::info!(
        num_docs = report.num_docs,
        unique_terms = report.unique_terms,
        bytes_on_disk = report.bytes_on_disk,
        "wrote index report"
    );
    Ok(report)
}

/// Merged partition names present in the index directory (run files are not
/// counted).
fn merged_partitions(paths: &IndexPaths) -> Result<Vec<String>> {
    let mut partitions = Vec::new();
    let dir = fs::read_dir(&paths.root).map_err(|e| Error::storage(&paths.root, e))?;
    for entry in dir {
        let entry = entry.map_err(|e| Error::storage(&paths.root, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(rest) = name
            .strip_prefix("inverted_index_")
            .and_then(|r| r.strip_suffix(".json"))
        else {
            continue;
        };
        if rest.contains("_run") {
            continue;
        }
        partitions.push(rest.to_string());
    }
    partitions.sort();
    Ok(partitions)
}
