use std::fs;
use std::path::Path;
use studyspot_core::analytics::write_report;
use studyspot_core::builder::{BuilderConfig, IndexBuilder};
use studyspot_core::engine::{open_or_empty, SearchEngine, SearchFilters};
use studyspot_core::error::Error;
use studyspot_core::merger::merge_runs;
use studyspot_core::storage::{load_docmap, read_partition_table, IndexPaths};
use tempfile::tempdir;

fn write_space(dir: &Path, file: &str, space_id: &str, rooms_json: &str) {
    let body = format!(
        r#"{{
            "space": {{
                "id": "{space_id}",
                "name": "{space_id} library",
                "timezone": "America/Los_Angeles",
                "hours": {{"open": "08:00", "close": "22:00"}},
                "slot_minutes": 30,
                "slot_count": 28,
                "location": {{"lat": 33.647, "lon": -117.841}}
            }},
            "date": "2026-02-10",
            "rooms": [{rooms_json}]
        }}"#
    );
    fs::write(dir.join(file), body).unwrap();
}

/// Three synthetic rooms: A is a quiet library room, B a group library room,
/// C a lounge that never mentions "library".
fn build_corpus(input: &Path) {
    write_space(
        input,
        "langson.json",
        "langson",
        r#"{"id": "a", "name": "quiet library room", "capacity": 2,
            "features": ["quiet"], "slots_bitset": "1111111111"},
           {"id": "b", "name": "group library room", "capacity": 8,
            "features": ["group", "whiteboard"], "slots_bitset": "1100111111"}"#,
    );
    write_space(
        input,
        "science.json",
        "science",
        r#"{"id": "c", "name": "lounge corner", "capacity": 4,
            "features": ["sofa"], "slots_bitset": "0000000011"}"#,
    );
}

fn build_and_merge(input: &Path, index: &Path, batch_size: usize) -> u64 {
    let stats = IndexBuilder::create(index, BuilderConfig { batch_size })
        .unwrap()
        .build(input)
        .unwrap();
    merge_runs(&IndexPaths::new(index), stats.num_runs).unwrap();
    stats.num_docs
}

#[test]
fn end_to_end_build_then_search() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    build_corpus(input.path());
    let num_docs = build_and_merge(input.path(), index.path(), 10_000);
    assert_eq!(num_docs, 3);

    let engine = SearchEngine::open(index.path(), 3).unwrap();
    let hits = engine
        .search("library", SearchFilters::default(), 5)
        .unwrap();

    // Rooms a and b both match the single stem, tied, so ascending doc id.
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].uid, "langson:a:2026-02-10");
    assert_eq!(hits[1].uid, "langson:b:2026-02-10");
    assert_eq!(hits[0].matched_terms, vec!["librari"]);
    assert_eq!(hits[0].earliest_start, "8:00 AM");
}

#[test]
fn ranking_prefers_more_matched_stems() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    build_corpus(input.path());
    build_and_merge(input.path(), index.path(), 10_000);

    let engine = SearchEngine::open(index.path(), 3).unwrap();
    let hits = engine
        .search("library group whiteboard", SearchFilters::default(), 5)
        .unwrap();

    // Room b matches all three stems, room a only "librari".
    assert_eq!(hits[0].uid, "langson:b:2026-02-10");
    assert_eq!(hits[0].matched_terms.len(), 3);
    assert_eq!(hits[1].uid, "langson:a:2026-02-10");
}

#[test]
fn capacity_filter_drops_small_rooms() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    build_corpus(input.path());
    build_and_merge(input.path(), index.path(), 10_000);

    let engine = SearchEngine::open(index.path(), 3).unwrap();
    let filters = SearchFilters { min_capacity: Some(5), ..Default::default() };
    let hits = engine.search("library", filters, 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].capacity, Some(8));
}

#[test]
fn missing_capacity_is_dropped_when_filter_set() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    write_space(
        input.path(),
        "s.json",
        "s",
        r#"{"id": "nocap", "name": "mystery library room",
            "slots_bitset": "1111"}"#,
    );
    build_and_merge(input.path(), index.path(), 10_000);

    let engine = SearchEngine::open(index.path(), 3).unwrap();
    let open = engine
        .search("library", SearchFilters::default(), 5)
        .unwrap();
    assert_eq!(open.len(), 1);

    let filters = SearchFilters { min_capacity: Some(1), ..Default::default() };
    let filtered = engine.search("library", filters, 5).unwrap();
    assert!(filtered.is_empty());
}

#[test]
fn availability_filter_respects_duration() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    build_corpus(input.path());
    build_and_merge(input.path(), index.path(), 10_000);

    let engine = SearchEngine::open(index.path(), 3).unwrap();
    // Room b's bitset "1100111111" has no 3-slot block before slot 4.
    let filters = SearchFilters { duration_minutes: 90, ..Default::default() };
    let hits = engine.search("group library", filters, 5).unwrap();
    let b = hits.iter().find(|h| h.uid.contains(":b:")).unwrap();
    assert_eq!(b.earliest_start, "10:00 AM");

    // Room c is only free for the last two slots; 90 minutes cannot fit.
    let hits = engine.search("lounge sofa", filters, 5).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn non_positive_duration_is_a_query_error() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    build_corpus(input.path());
    build_and_merge(input.path(), index.path(), 10_000);

    let engine = SearchEngine::open(index.path(), 3).unwrap();
    let filters = SearchFilters { duration_minutes: -15, ..Default::default() };
    match engine.search("library", filters, 5) {
        Err(Error::Query(_)) => {}
        other => panic!("expected query error, got {other:?}"),
    }
}

#[test]
fn empty_query_and_empty_corpus_yield_no_hits() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    build_corpus(input.path());
    build_and_merge(input.path(), index.path(), 10_000);

    let engine = SearchEngine::open(index.path(), 3).unwrap();
    assert!(engine
        .search("", SearchFilters::default(), 5)
        .unwrap()
        .is_empty());
    assert!(engine
        .search("???", SearchFilters::default(), 5)
        .unwrap()
        .is_empty());

    // An index built from zero documents answers queries without error.
    let empty_in = tempdir().unwrap();
    let empty_index = tempdir().unwrap();
    build_and_merge(empty_in.path(), empty_index.path(), 10_000);
    let engine = SearchEngine::open(empty_index.path(), 3).unwrap();
    assert!(engine
        .search("library", SearchFilters::default(), 5)
        .unwrap()
        .is_empty());

    // A directory with no index at all is an empty corpus, not an error.
    let bare = tempdir().unwrap();
    let engine = open_or_empty(bare.path(), 3).unwrap();
    assert!(engine
        .search("library", SearchFilters::default(), 5)
        .unwrap()
        .is_empty());
}

#[test]
fn multi_run_build_merges_completely() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    build_corpus(input.path());
    // batch_size 1 forces one run per document.
    let stats = IndexBuilder::create(index.path(), BuilderConfig { batch_size: 1 })
        .unwrap()
        .build(input.path())
        .unwrap();
    assert_eq!(stats.num_runs, 3);
    merge_runs(&IndexPaths::new(index.path()), stats.num_runs).unwrap();

    let paths = IndexPaths::new(index.path());
    let lib = read_partition_table(&paths.partition_file("lib"))
        .unwrap()
        .expect("lib partition merged");
    let ids: Vec<_> = lib["librari"].iter().map(|p| p.doc_id).collect();
    // Rooms a and b from separate runs both survive the merge, in order.
    assert_eq!(ids, vec![0, 1]);

    // Same results as a single-run build.
    let engine = SearchEngine::open(index.path(), 2).unwrap();
    let hits = engine
        .search("library", SearchFilters::default(), 5)
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].doc_id, 0);
}

#[test]
fn posting_for_missing_document_is_excluded_and_counted() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    build_corpus(input.path());
    build_and_merge(input.path(), index.path(), 10_000);

    // Truncate the docstore so postings for later doc ids dangle.
    let docstore = IndexPaths::new(index.path()).docstore();
    let first_line = fs::read_to_string(&docstore)
        .unwrap()
        .lines()
        .next()
        .unwrap()
        .to_string();
    fs::write(&docstore, format!("{first_line}\n")).unwrap();

    let engine = SearchEngine::open(index.path(), 3).unwrap();
    let hits = engine
        .search("library", SearchFilters::default(), 5)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc_id, 0);
    assert_eq!(engine.inconsistent_postings(), 1);
}

#[test]
fn report_counts_docs_terms_and_bytes() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    build_corpus(input.path());
    let num_docs = build_and_merge(input.path(), index.path(), 10_000);

    let paths = IndexPaths::new(index.path());
    let report = write_report(&paths, num_docs).unwrap();
    assert_eq!(report.num_docs, 3);
    assert!(report.unique_terms > 0);
    assert!(report.bytes_on_disk > 0);

    let text = fs::read_to_string(paths.report()).unwrap();
    assert!(text.contains("Number of indexed rooms: 3"));
}

#[test]
fn docmap_is_gapless_after_build() {
    let input = tempdir().unwrap();
    let index = tempdir().unwrap();
    build_corpus(input.path());
    let num_docs = build_and_merge(input.path(), index.path(), 10_000);

    let docmap = load_docmap(&IndexPaths::new(index.path())).unwrap();
    let ids: Vec<u32> = docmap.keys().copied().collect();
    assert_eq!(ids, (0..num_docs as u32).collect::<Vec<_>>());
}
