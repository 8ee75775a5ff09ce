use crate::availability::{earliest_free_slot, slot_to_12h};
use crate::cache::PartitionCache;
use crate::document::StoredDoc;
use crate::error::{Error, Result};
use crate::partition::partition_key;
use crate::storage::{load_docmap, load_docstore, IndexPaths};
use crate::tokenizer::normalize_query;
use crate::DocId;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Capacity and availability filters applied after the boolean-OR match.
#[derive(Debug, Clone, Copy)]
pub struct SearchFilters {
    pub min_capacity: Option<u32>,
    pub duration_minutes: i32,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self { min_capacity: None, duration_minutes: 30 }
    }
}

#[derive(Debug, Clone)]
pub struct RoomHit {
    pub doc_id: DocId,
    pub uid: String,
    pub space_name: String,
    pub room_name: String,
    pub capacity: Option<u32>,
    /// Query stems this room matched, the ranking signal.
    pub matched_terms: Vec<String>,
    /// Wall-clock label of the earliest block long enough for the request.
    pub earliest_start: String,
}

/// Query-time engine over a merged index. Loads the docmap and docstore up
/// front; partitions come and go through the LRU cache, the only shared
/// mutable state between concurrent queries.
pub struct SearchEngine {
    docmap: BTreeMap<DocId, String>,
    docstore: Vec<StoredDoc>,
    cache: PartitionCache,
    inconsistent_postings: AtomicU64,
}

impl SearchEngine {
    pub fn open(index_dir: &Path, cache_capacity: usize) -> Result<Self> {
        let paths = IndexPaths::new(index_dir);
        let docmap = load_docmap(&paths)?;
        let docstore = load_docstore(&paths)?;
        tracing::info!(
            num_docs = docstore.len(),
            cache_capacity,
            "opened index for search"
        );
        Ok(Self {
            docmap,
            docstore,
            cache: PartitionCache::new(paths, cache_capacity),
            inconsistent_postings: AtomicU64::new(0),
        })
    }

    /// Boolean-OR keyword search with capacity and availability
    /// post-filtering. Results are ranked by descending matched-stem count;
    /// ties break by ascending document id. An empty query or an empty index
    /// yields an empty result set, not an error.
    pub fn search(&self, query: &str, filters: SearchFilters, k: usize) -> Result<Vec<RoomHit>> {
        if filters.duration_minutes <= 0 {
            return Err(Error::Query(format!(
                "duration must be positive, got {}",
                filters.duration_minutes
            )));
        }
        let duration_minutes = filters.duration_minutes as u32;

        let stems = normalize_query(query);
        if stems.is_empty() {
            return Ok(Vec::new());
        }

        // Union postings across stems, remembering which stems matched.
        // BTreeMap keeps candidates in ascending doc-id order, which is the
        // documented tie-break.
        let mut candidates: BTreeMap<DocId, BTreeSet<&str>> = BTreeMap::new();
        for stem in &stems {
            let table = self.cache.get(&partition_key(stem))?;
            let Some(postings) = table.get(stem.as_str()) else {
                continue;
            };
            for posting in postings {
                candidates
                    .entry(posting.doc_id)
                    .or_default()
                    .insert(stem.as_str());
            }
        }

        let mut hits = Vec::new();
        for (doc_id, matched) in candidates {
            let Some(store) = self.docstore.get(doc_id as usize) else {
                self.inconsistent_postings.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(doc_id, "posting references unknown document, excluded");
                continue;
            };

            if let Some(min) = filters.min_capacity {
                // Rooms with no recorded capacity drop out when a capacity
                // floor is requested.
                match store.room.capacity {
                    Some(cap) if cap >= min => {}
                    _ => continue,
                }
            }

            let Some(hit) = self.availability_hit(doc_id, store, &matched, duration_minutes)
            else {
                continue;
            };
            hits.push(hit);
        }

        // Stable sort over ascending-doc-id input preserves the tie-break.
        hits.sort_by(|a, b| b.matched_terms.len().cmp(&a.matched_terms.len()));
        hits.truncate(k);
        Ok(hits)
    }

    fn availability_hit(
        &self,
        doc_id: DocId,
        store: &StoredDoc,
        matched: &BTreeSet<&str>,
        duration_minutes: u32,
    ) -> Option<RoomHit> {
        let slot_minutes = store.space.slot_minutes?;
        let slot = earliest_free_slot(&store.room.slots_bitset, slot_minutes, duration_minutes)?;
        let opening = store.space.hours.as_ref()?;
        let earliest_start = slot_to_12h(slot, &opening.open, slot_minutes)?;

        let uid = self
            .docmap
            .get(&doc_id)
            .cloned()
            .unwrap_or_else(|| store.uid.clone());
        Some(RoomHit {
            doc_id,
            uid,
            space_name: store.space.name.clone(),
            room_name: store.room.name.clone(),
            capacity: store.room.capacity,
            matched_terms: matched.iter().map(|s| s.to_string()).collect(),
            earliest_start,
        })
    }

    /// Count of postings that referenced a document id missing from the
    /// metadata store. Diagnostics only; such postings are excluded from
    /// results.
    pub fn inconsistent_postings(&self) -> u64 {
        self.inconsistent_postings.load(Ordering::Relaxed)
    }

    pub fn num_docs(&self) -> usize {
        self.docstore.len()
    }
}

/// Open an engine over a directory that may not contain an index yet: an
/// absent docmap/docstore is treated as an empty corpus.
pub fn open_or_empty(index_dir: &Path, cache_capacity: usize) -> Result<SearchEngine> {
    match SearchEngine::open(index_dir, cache_capacity) {
        Ok(engine) => Ok(engine),
        Err(Error::Storage { ref source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            Ok(SearchEngine {
                docmap: BTreeMap::new(),
                docstore: Vec::new(),
                cache: PartitionCache::new(IndexPaths::new(index_dir), cache_capacity),
                inconsistent_postings: AtomicU64::new(0),
            })
        }
        Err(e) => Err(e),
    }
}
