use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use facetdex::filter::{AdaptiveFacetFilter, AdaptiveSelector, FacetOrFilter};
use facetdex::{
    CountMode, DocNo, DocumentFields, FacetSegment, FacetSpec, RandomAccessFilter, SegmentId,
    SegmentWriter, SimpleFacetHandler, ValueType,
};

const DISTINCT_VALUES: u32 = 200;

fn build_segment(doc_count: u32, handler: &SimpleFacetHandler) -> FacetSegment {
    let mut writer = SegmentWriter::new(SegmentId::new(1));
    for i in 0..doc_count {
        // skewed: value 0 is common, the tail is rare
        let value = if i % 2 == 0 { 0 } else { i % DISTINCT_VALUES };
        writer.add_document(DocumentFields::new().with("brand", format!("brand-{:03}", value)));
    }
    let reader = Arc::new(writer.finish().unwrap().reader);
    FacetSegment::open(reader, std::slice::from_ref(handler))
}

fn bench_filter_strategies(c: &mut Criterion) {
    let handler = SimpleFacetHandler::new("brand", ValueType::Text);
    let mut group = c.benchmark_group("or_filter");

    for &doc_count in &[10_000u32, 100_000] {
        let segment = build_segment(doc_count, &handler);
        let rare = vec!["brand-007".to_string(), "brand-113".to_string()];

        for (name, threshold) in [("sparse", 1.0), ("dense", 0.0)] {
            let filter = AdaptiveFacetFilter::new(
                FacetOrFilter::new(handler.data_ref(), rare.clone(), false),
                AdaptiveSelector::new(threshold),
            );
            group.bench_with_input(BenchmarkId::new(name, doc_count), &segment, |b, segment| {
                b.iter(|| {
                    let docs = filter.doc_id_set(segment).unwrap();
                    black_box(docs.iter().count())
                })
            });
        }
    }
    group.finish();
}

fn bench_counting(c: &mut Criterion) {
    let handler = SimpleFacetHandler::new("brand", ValueType::Text);
    let segment = build_segment(100_000, &handler);
    let source = handler.count_collector_source(None, FacetSpec::default(), CountMode::GroupBy);
    let mut group = c.benchmark_group("count");

    group.bench_function("collect_each", |b| {
        b.iter(|| {
            let mut collector = source.collector(&segment).unwrap();
            for doc in 0..segment.doc_count() {
                collector.collect(DocNo(doc));
            }
            black_box(collector.finish().total_groups())
        })
    });
    group.bench_function("collect_all", |b| {
        b.iter(|| {
            let mut collector = source.collector(&segment).unwrap();
            collector.collect_all();
            black_box(collector.finish().total_groups())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_filter_strategies, bench_counting);
criterion_main!(benches);
