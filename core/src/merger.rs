use crate::error::{Error, Result};
use crate::storage::{read_partition_table, write_partition_table, IndexPaths, PartitionTable};
use std::collections::BTreeSet;
use std::fs;

/// Merge every partial run into one canonical file per partition.
///
/// For each partition that appears in any run, the run tables for ids
/// `0..num_runs` are unioned term by term: posting lists concatenate across
/// runs (document ids are globally unique and a document posts to a
/// partition at most once per pass, so no cross-run deduplication is
/// needed), then sort by ascending document id. A run that never touched a
/// partition simply contributes nothing. Returns the number of merged
/// partition files written.
pub fn merge_runs(paths: &IndexPaths, num_runs: u32) -> Result<usize> {
    let mut merged_files = 0;
    for partition in discover_partitions(paths)? {
        let mut merged = PartitionTable::new();
        for run_id in 0..num_runs {
            let Some(table) = read_partition_table(&paths.run_file(&partition, run_id))? else {
                continue;
            };
            for (term, postings) in table {
                merged.entry(term).or_default().extend(postings);
            }
        }
        if merged.is_empty() {
            continue;
        }
        for postings in merged.values_mut() {
            postings.sort_by_key(|p| p.doc_id);
        }
        write_partition_table(&paths.partition_file(&partition), &merged)?;
        merged_files += 1;
    }
    tracing::info!(merged_files, "merged partial runs");
    Ok(merged_files)
}

/// Scan the index directory for run files and collect the set of partitions
/// that received postings during the build pass.
fn discover_partitions(paths: &IndexPaths) -> Result<BTreeSet<String>> {
    let mut partitions = BTreeSet::new();
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
        // rest = "<partition>_run<id>" for partial runs.
        if let Some((partition, run)) = rest.rsplit_once("_run") {
            if run.chars().all(|c| c.is_ascii_digit()) && !run.is_empty() {
                partitions.insert(partition.to_string());
            }
        }
    }
    Ok(partitions)
}

/// Delete the partial-run files once a merge has succeeded. Best-effort: a
/// file that cannot be removed is logged and left behind.
pub fn remove_runs(paths: &IndexPaths, num_runs: u32) -> Result<()> {
    for partition in discover_partitions(paths)? {
        for run_id in 0..num_runs {
            let path = paths.run_file(&partition, run_id);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), %e, "could not remove run file"),
            }
        }
    }
    Ok(())
}
