use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use facetdex::{
    BrowseSelection, CountMode, DocNo, DocumentFields, FacetFieldConfig, FacetSegment,
    FacetSettings, FacetSortOrder, FacetSpec, SegmentId, SegmentStore, SegmentWriter,
    SelectionOperation, SimpleFacetHandler, ValueType,
};
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "facetdex")]
#[command(about = "Facet counts over a JSON-lines document set", long_about = None)]
struct Args {
    /// JSON-lines input, one flat object per document ("-" for stdin)
    #[arg(long, env = "FACETDEX_INPUT", default_value = "-")]
    input: String,

    /// Field to facet on
    #[arg(long)]
    field: String,

    /// Value type of the field (text, int, float)
    #[arg(long, default_value = "text")]
    value_type: String,

    /// Values to select (comma-separated)
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,

    /// Values to exclude (comma-separated)
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Combine selected values with AND instead of OR
    #[arg(long)]
    and: bool,

    /// Report the number of distinct values hit
    #[arg(long)]
    group: bool,

    /// Facet ordering (hits, value)
    #[arg(long, default_value = "hits")]
    order: String,

    /// Maximum number of facets to print
    #[arg(long)]
    max_count: Option<usize>,

    /// Minimum hit count of a printed facet
    #[arg(long, default_value = "1")]
    min_count: u32,

    /// Sparse-union threshold as a fraction of the segment size
    #[arg(long, env = "FACETDEX_SPARSE_THRESHOLD")]
    threshold: Option<f64>,

    /// Value boosts as value=weight (comma-separated)
    #[arg(long, value_delimiter = ',')]
    boost: Vec<String>,

    /// Print the score explanation of these docnos (comma-separated)
    #[arg(long, value_delimiter = ',')]
    explain: Vec<u32>,

    /// Persist the segment here and read it back before querying
    #[arg(long, env = "FACETDEX_SEGMENT_DIR")]
    segment_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let value_type = match args.value_type.to_lowercase().as_str() {
        "text" | "string" => ValueType::Text,
        "int" | "integer" => ValueType::Int,
        "float" | "double" => ValueType::Float,
        other => bail!("unknown value type '{}'", other),
    };
    let order_by = match args.order.to_lowercase().as_str() {
        "hits" => FacetSortOrder::HitsDesc,
        "value" => FacetSortOrder::ValueAsc,
        _ => {
            warn!("Unknown order '{}', using 'hits'", args.order);
            FacetSortOrder::HitsDesc
        }
    };

    let mut settings = FacetSettings::default();
    if let Some(threshold) = args.threshold {
        settings = settings.with_sparse_threshold(threshold);
    }
    let config = FacetFieldConfig::new(&args.field)
        .with_value_type(value_type)
        .with_settings(settings);
    let handler = SimpleFacetHandler::from_config(&config)?;

    let mut writer = SegmentWriter::new(SegmentId::new(1));
    for doc in read_documents(&args.input)? {
        writer.add_document(doc);
    }
    let result = writer.finish()?;
    info!(
        "Indexed {} documents into {}",
        result.reader.doc_count(),
        result.reader.id()
    );

    let reader = match &args.segment_dir {
        Some(dir) => {
            let store = SegmentStore::new(dir)?;
            store.write_segment(&result)?;
            info!("Segment persisted to {:?}", dir);
            store.read_segment(result.reader.id())?
        }
        None => Arc::new(result.reader),
    };

    let segment = FacetSegment::open(reader, std::slice::from_ref(&handler));
    if !segment.is_available(handler.name()) {
        // surfaces the load error
        segment.cache(handler.name())?;
    }

    let selection = BrowseSelection {
        values: args.select.clone(),
        not_values: args.exclude.clone(),
        operation: if args.and {
            SelectionOperation::And
        } else {
            SelectionOperation::Or
        },
    };
    let mut spec = FacetSpec::default()
        .with_order(order_by)
        .with_min_hit_count(args.min_count);
    if let Some(max) = args.max_count {
        spec = spec.with_max_count(max);
    }
    let mode = if args.group {
        CountMode::GroupBy
    } else {
        CountMode::Simple
    };

    let filter = handler.build_selection_filter(&selection);
    let docs = filter.doc_id_set(&segment)?;
    let mut collector = handler
        .count_collector_source(Some(&selection), spec, mode)
        .collector(&segment)?;
    collector.collect_matches(&docs);
    let counts = collector.finish();

    let mut output = json!({
        "facet": handler.name(),
        "hits": docs.len(),
        "facets": counts.facets(),
    });
    if let Some(groups) = counts.total_groups() {
        output["total_groups"] = json!(groups);
    }

    if !args.explain.is_empty() {
        let boosts = parse_boosts(&args.boost)?;
        let scorer = handler.doc_scorer(&segment, &handler.scoring_factory(), &boosts)?;
        let explanations: Vec<Value> = args
            .explain
            .iter()
            .map(|&doc| {
                json!({
                    "doc": doc,
                    "score": scorer.score(DocNo::new(doc)),
                    "explanation": scorer.explain(DocNo::new(doc)),
                })
            })
            .collect();
        output["explanations"] = Value::Array(explanations);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_documents(input: &str) -> Result<Vec<DocumentFields>> {
    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(input).with_context(|| format!("opening {}", input))?;
        Box::new(BufReader::new(file))
    };

    let mut documents = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let object: serde_json::Map<String, Value> = serde_json::from_str(&line)
            .with_context(|| format!("line {}: expected a JSON object", line_no + 1))?;

        let mut doc = DocumentFields::new();
        for (field, value) in object {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => continue,
                other => {
                    warn!("line {}: skipping non-scalar field '{}': {}", line_no + 1, field, other);
                    continue;
                }
            };
            doc = doc.with(field, text);
        }
        documents.push(doc);
    }
    Ok(documents)
}

fn parse_boosts(entries: &[String]) -> Result<HashMap<String, f32>> {
    entries
        .iter()
        .map(|entry| {
            let Some((value, weight)) = entry.rsplit_once('=') else {
                bail!("boost '{}' is not value=weight", entry);
            };
            let weight: f32 = weight
                .parse()
                .with_context(|| format!("boost weight in '{}'", entry))?;
            Ok((value.to_string(), weight))
        })
        .collect()
}
