//! End-to-end facet behavior over written segments

use std::collections::HashMap;
use std::sync::Arc;

use facetdex::filter::{AdaptiveFacetFilter, AdaptiveSelector, FacetOrFilter, FilterType};
use facetdex::{
    merge_facets, BrowseFacet, BrowseSelection, CountMode, DocIdSet, DocNo, DocumentFields,
    FacetError, FacetSegment, FacetSpec, FilterStrategy, SegmentId, SegmentWriter,
    SelectionOperation, SimpleFacetHandler, ValueType,
};

fn create_segment(
    id: u64,
    field: &str,
    values: &[Option<&str>],
    handlers: &[SimpleFacetHandler],
) -> FacetSegment {
    let mut writer = SegmentWriter::new(SegmentId::new(id));
    for value in values {
        let doc = match value {
            Some(v) => DocumentFields::new().with(field, *v),
            None => DocumentFields::new().with("title", "untitled"),
        };
        writer.add_document(doc);
    }
    let reader = Arc::new(writer.finish().unwrap().reader);
    FacetSegment::open(reader, handlers)
}

fn color_handler() -> SimpleFacetHandler {
    SimpleFacetHandler::new("color", ValueType::Text)
}

fn worked_example() -> FacetSegment {
    create_segment(
        1,
        "color",
        &[Some("red"), Some("blue"), Some("red"), Some("green"), Some("red")],
        &[color_handler()],
    )
}

fn matching(
    handler: &SimpleFacetHandler,
    segment: &FacetSegment,
    selection: &BrowseSelection,
) -> Vec<u32> {
    handler
        .build_selection_filter(selection)
        .doc_id_set(segment)
        .unwrap()
        .iter()
        .map(|d| d.as_u32())
        .collect()
}

#[test]
fn test_worked_example() {
    let handler = color_handler();
    let segment = worked_example();
    let cache = segment.cache("color").unwrap();

    let dictionary: Vec<_> = (0..3).map(|ord| cache.value_of(ord).unwrap()).collect();
    assert_eq!(dictionary, vec!["blue", "green", "red"]);
    assert_eq!(cache.ordinals(), &[2, 0, 2, 1, 2]);
    assert_eq!(cache.freqs(), &[1, 1, 3]);

    let red = BrowseSelection::new().with_value("red");
    assert_eq!(matching(&handler, &segment, &red), vec![0, 2, 4]);

    let mut simple = handler
        .count_collector_source(None, FacetSpec::default(), CountMode::Simple)
        .collector(&segment)
        .unwrap();
    simple.collect_all();
    assert_eq!(simple.finish().counts(), &[1, 1, 3]);

    let mut group = handler
        .count_collector_source(None, FacetSpec::default(), CountMode::GroupBy)
        .collector(&segment)
        .unwrap();
    for doc in 0..5 {
        group.collect(DocNo(doc));
    }
    assert_eq!(group.finish().total_groups(), Some(3));
}

#[test]
fn test_frequencies_sum_to_doc_count() {
    let segment = create_segment(
        1,
        "color",
        &[Some("a"), None, Some("b"), Some("a"), None, Some("c")],
        &[color_handler()],
    );
    let cache = segment.cache("color").unwrap();

    let total: u32 = cache.freqs().iter().sum();
    assert_eq!(total, segment.doc_count());
    assert!(cache.ordinals().iter().all(|&ord| (ord as usize) < cache.ordinal_count()));
}

#[test]
fn test_ordinals_are_stable() {
    let segment = worked_example();
    let cache = segment.cache("color").unwrap();

    let first: Vec<_> = (0..5).map(|d| cache.ordinal_of(DocNo(d))).collect();
    let second: Vec<_> = (0..5).map(|d| cache.ordinal_of(DocNo(d))).collect();
    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&cache, &segment.cache("color").unwrap()));
}

#[test]
fn test_or_filter_is_union_and_negation_is_complement() {
    let handler = color_handler();
    let segment = create_segment(
        1,
        "color",
        &[Some("red"), Some("blue"), None, Some("green"), Some("red"), Some("blue")],
        &[handler.clone()],
    );

    let red = matching(&handler, &segment, &BrowseSelection::new().with_value("red"));
    let blue = matching(&handler, &segment, &BrowseSelection::new().with_value("blue"));
    let both = matching(
        &handler,
        &segment,
        &BrowseSelection::new().with_value("red").with_value("blue"),
    );
    let mut union: Vec<u32> = red.iter().chain(&blue).copied().collect();
    union.sort_unstable();
    assert_eq!(both, union);

    let values = vec!["red".to_string(), "blue".to_string()];
    let not = handler.build_or_filter(&values, true);
    let complement: Vec<u32> = not
        .doc_id_set(&segment)
        .unwrap()
        .iter()
        .map(|d| d.as_u32())
        .collect();
    let expected: Vec<u32> = (0..segment.doc_count()).filter(|d| !both.contains(d)).collect();
    assert_eq!(complement, expected);
    assert_eq!(complement, vec![2, 3]);
}

#[test]
fn test_unsatisfiable_conjunction() {
    let handler = color_handler();
    let segment = worked_example();

    let selection = BrowseSelection::new()
        .with_value("red")
        .with_value("blue")
        .with_operation(SelectionOperation::And);
    let filter = handler.build_selection_filter(&selection);
    assert_eq!(filter.filter_type(), FilterType::Empty);
    assert!(filter.doc_id_set(&segment).unwrap().is_empty());
}

#[test]
fn test_absent_value_yields_zero_everywhere() {
    let handler = color_handler();
    let segment = worked_example();
    let selection = BrowseSelection::new().with_value("purple");

    assert!(matching(&handler, &segment, &selection).is_empty());

    let mut collector = handler
        .count_collector_source(Some(&selection), FacetSpec::default(), CountMode::GroupBy)
        .collector(&segment)
        .unwrap();
    let docs = handler.build_selection_filter(&selection).doc_id_set(&segment).unwrap();
    collector.collect_matches(&docs);
    let counts = collector.finish();
    assert_eq!(counts.hit_count("purple"), 0);
    assert_eq!(counts.total_groups(), Some(0));

    let boosts = HashMap::from([("purple".to_string(), 10.0)]);
    let scorer = handler
        .doc_scorer(&segment, &handler.scoring_factory(), &boosts)
        .unwrap();
    assert!(scorer.boosts().iter().all(|&b| b == 1.0));
}

#[test]
fn test_load_error_is_per_facet() {
    let color = color_handler();
    let price = SimpleFacetHandler::new("price", ValueType::Int);
    let brand = SimpleFacetHandler::new("brand", ValueType::Text);

    let mut writer = SegmentWriter::new(SegmentId::new(1));
    writer.add_document(DocumentFields::new().with("color", "red").with("price", "12"));
    writer.add_document(DocumentFields::new().with("color", "blue").with("price", "n/a"));
    let reader = Arc::new(writer.finish().unwrap().reader);
    let segment = FacetSegment::open(reader, &[color.clone(), price.clone(), brand.clone()]);

    assert_eq!(segment.failed_facets(), vec!["brand".to_string(), "price".to_string()]);
    assert!(matches!(
        price.build_filter("12").doc_id_set(&segment),
        Err(FacetError::FacetUnavailable { .. })
    ));
    assert!(matches!(
        brand.field_values(&segment, DocNo(0)),
        Err(FacetError::FacetUnavailable { .. })
    ));

    // other facets keep working
    assert_eq!(color.field_values(&segment, DocNo(1)).unwrap(), vec!["blue"]);
}

#[test]
fn test_sparse_union_on_selective_query() {
    let handler = color_handler();
    let mut values: Vec<Option<&str>> = vec![Some("common"); 1000];
    values[10] = Some("rare");
    values[700] = Some("rare");
    let segment = create_segment(1, "color", &values, &[handler.clone()]);

    let filter = handler.build_or_filter(&["rare".to_string(), "absent".to_string()], false);
    assert_eq!(filter.filter_type(), FilterType::Adaptive);
    let docs = filter.doc_id_set(&segment).unwrap();
    assert!(matches!(docs, DocIdSet::Bitmap(_)));
    assert_eq!(docs.docs(), vec![DocNo(10), DocNo(700)]);

    // a single selected value goes through the same selector
    let single = handler.build_selection_filter(&BrowseSelection::new().with_value("rare"));
    assert_eq!(single.filter_type(), FilterType::Adaptive);
    let docs = single.doc_id_set(&segment).unwrap();
    assert!(matches!(docs, DocIdSet::Bitmap(_)));
    assert_eq!(docs.docs(), vec![DocNo(10), DocNo(700)]);

    let common = handler.build_filter("common").doc_id_set(&segment).unwrap();
    assert!(matches!(common, DocIdSet::Ordinals(_)));
    assert_eq!(common.len(), 998);

    let adaptive = AdaptiveFacetFilter::new(
        FacetOrFilter::new(handler.data_ref(), vec!["common".to_string()], false),
        AdaptiveSelector::default(),
    );
    assert_eq!(adaptive.strategy(&segment).unwrap(), FilterStrategy::DenseScan);
}

#[test]
fn test_merge_across_segments() {
    let handler = color_handler();
    let first = create_segment(1, "color", &[Some("red"), Some("blue")], &[handler.clone()]);
    let second = create_segment(
        2,
        "color",
        &[Some("red"), None, Some("green")],
        &[handler.clone()],
    );

    let source = handler.count_collector_source(None, FacetSpec::default(), CountMode::Simple);
    let results: Vec<_> = [&first, &second]
        .iter()
        .map(|segment| {
            let mut collector = source.collector(segment).unwrap();
            collector.collect_all();
            collector.finish()
        })
        .collect();

    assert_eq!(
        merge_facets(&results, source.spec()),
        vec![
            BrowseFacet::new("red", 2),
            BrowseFacet::new("blue", 1),
            BrowseFacet::new("green", 1),
        ]
    );
}

#[test]
fn test_concurrent_queries_share_one_cache() {
    let handler = color_handler();
    let values: Vec<Option<&str>> = (0..2000)
        .map(|i| match i % 4 {
            0 => Some("red"),
            1 => Some("blue"),
            2 => Some("green"),
            _ => None,
        })
        .collect();
    let segment = Arc::new(create_segment(1, "color", &values, &[handler.clone()]));
    let freqs = segment.cache("color").unwrap().freqs().to_vec();

    std::thread::scope(|scope| {
        for t in 0..8 {
            let segment = Arc::clone(&segment);
            let handler = &handler;
            let freqs = &freqs;
            scope.spawn(move || {
                let value = ["red", "blue", "green"][t % 3];
                let selection = BrowseSelection::new().with_value(value);
                let docs = handler
                    .build_selection_filter(&selection)
                    .doc_id_set(&segment)
                    .unwrap();
                assert_eq!(docs.len(), 500);

                let mut collector = handler
                    .count_collector_source(None, FacetSpec::default(), CountMode::GroupBy)
                    .collector(&segment)
                    .unwrap();
                for doc in 0..segment.doc_count() {
                    collector.collect(DocNo(doc));
                }
                let counts = collector.finish();
                assert_eq!(counts.counts(), freqs.as_slice());
                assert_eq!(counts.total_groups(), Some(4));
            });
        }
    });
}
