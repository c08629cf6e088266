//! Facets over segments read back from disk

use std::fs;
use std::sync::Arc;

use facetdex::{
    BrowseSelection, CountMode, DocumentFields, FacetSegment, FacetSpec, SegmentId, SegmentStore,
    SegmentWriter, SimpleFacetHandler, ValueType,
};

fn handlers() -> Vec<SimpleFacetHandler> {
    vec![
        SimpleFacetHandler::new("color", ValueType::Text),
        SimpleFacetHandler::new("price", ValueType::Int),
    ]
}

fn write_catalog(store: &SegmentStore, id: u64) -> FacetSegment {
    let mut writer = SegmentWriter::new(SegmentId::new(id));
    for i in 0..200u32 {
        let color = ["red", "blue", "green", "black"][(i % 4) as usize];
        let mut doc = DocumentFields::new().with("color", color);
        if i % 5 != 0 {
            doc = doc.with("price", (i % 7 * 10).to_string());
        }
        writer.add_document(doc);
    }
    let result = writer.finish().unwrap();
    store.write_segment(&result).unwrap();
    FacetSegment::open(Arc::new(result.reader), &handlers())
}

#[test]
fn test_reloaded_segment_has_identical_caches() {
    let dir = tempfile::tempdir().unwrap();
    let store = SegmentStore::new(dir.path()).unwrap();
    let in_memory = write_catalog(&store, 1);

    let reader = store.read_segment(SegmentId::new(1)).unwrap();
    let reloaded = FacetSegment::open(reader, &handlers());
    assert!(reloaded.failed_facets().is_empty());

    for facet in ["color", "price"] {
        let before = in_memory.cache(facet).unwrap();
        let after = reloaded.cache(facet).unwrap();
        assert_eq!(before.ordinals(), after.ordinals());
        assert_eq!(before.freqs(), after.freqs());
        assert_eq!(before.ordinal_count(), after.ordinal_count());
    }

    // numeric dictionary keeps numeric order across the round trip
    let price = reloaded.cache("price").unwrap();
    assert_eq!(price.missing_ordinal(), Some(0));
    let values: Vec<_> = (1..price.ordinal_count() as u32)
        .map(|ord| price.value_of(ord).unwrap())
        .collect();
    assert_eq!(values, vec!["0", "10", "20", "30", "40", "50", "60"]);
}

#[test]
fn test_queries_on_reloaded_segment() {
    let dir = tempfile::tempdir().unwrap();
    let store = SegmentStore::new(dir.path()).unwrap();
    write_catalog(&store, 4);

    let handler = SimpleFacetHandler::new("color", ValueType::Text);
    let segment = FacetSegment::open(
        store.read_segment(SegmentId::new(4)).unwrap(),
        std::slice::from_ref(&handler),
    );

    let selection = BrowseSelection::new().with_value("red").with_not_value("blue");
    let docs = handler
        .build_selection_filter(&selection)
        .doc_id_set(&segment)
        .unwrap();
    assert_eq!(docs.len(), 50);

    let mut collector = handler
        .count_collector_source(Some(&selection), FacetSpec::default(), CountMode::Simple)
        .collector(&segment)
        .unwrap();
    collector.collect_matches(&docs);
    let counts = collector.finish();
    assert_eq!(counts.hit_count("red"), 50);
    assert_eq!(counts.hit_count("blue"), 0);
    assert!(counts.facet("red").unwrap().selected);
}

#[test]
fn test_corrupted_docvalues_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = SegmentStore::new(dir.path()).unwrap();
    write_catalog(&store, 2);

    let path = dir.path().join("segment_2").join("docvalues.bin");
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x5a;
    fs::write(&path, bytes).unwrap();

    let err = store.read_segment(SegmentId::new(2)).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn test_listed_segments_all_open() {
    let dir = tempfile::tempdir().unwrap();
    let store = SegmentStore::new(dir.path()).unwrap();
    write_catalog(&store, 1);
    write_catalog(&store, 2);

    let ids = store.list_segments().unwrap();
    assert_eq!(ids, vec![SegmentId::new(1), SegmentId::new(2)]);
    for id in ids {
        let segment = FacetSegment::open(store.read_segment(id).unwrap(), &handlers());
        assert_eq!(segment.doc_count(), 200);
        assert!(segment.is_available("price"));
    }
}
