//! Per-segment facet data cache
//!
//! Built once when a segment is opened and read-only afterwards:
//!
//! - dictionary: sorted distinct values of the field
//! - ordinals: `ordinals[doc]` is the ordinal of the document's value
//! - freqs: `freqs[ord]` is the number of documents carrying `ord`
//! - min/max doc bounds per ordinal
//!
//! Ordinal 0 is the "no value" ordinal when some document lacks the field;
//! otherwise ordinals map one-to-one onto dictionary positions.

use std::collections::HashMap;
use std::time::Instant;

use ordered_float::OrderedFloat;
use tracing::debug;

use super::dictionary::{ValueDictionary, ValueList};
use super::value::{FacetValue, RawValue};
use crate::config::{ValueOrder, ValueType};
use crate::error::{FacetError, Result};
use crate::segment::{DocNo, PostingIterator};

/// Storage the facet layer reads from
pub trait FieldSource {
    fn doc_count(&self) -> u32;

    /// Distinct stored values of a field, sorted by byte order
    fn enumerate_field_values(&self, field: &str) -> Result<Vec<String>>;

    /// Stored value of one document
    fn document_value(&self, docno: DocNo, field: &str) -> Result<Option<&str>>;

    /// Fresh iterator over the documents carrying `value`, if postings exist
    fn posting_iterator(&self, _field: &str, _value: &str) -> Result<Option<PostingIterator>> {
        Ok(None)
    }

    fn has_postings(&self, _field: &str) -> bool {
        false
    }
}

const UNASSIGNED: u32 = u32::MAX;

/// Immutable ordinal cache for one field of one segment
#[derive(Debug)]
pub struct FacetDataCache {
    field: String,
    dictionary: Box<dyn ValueList>,
    /// Whether ordinal 0 is the "no value" ordinal
    has_missing: bool,
    ordinals: Vec<u32>,
    freqs: Vec<u32>,
    min_docs: Vec<u32>,
    max_docs: Vec<u32>,
    /// Stored text equals the canonical form of every value
    canonical_terms: bool,
}

impl FacetDataCache {
    /// Build the cache for `field` with a fixed element type
    pub fn load<T: FacetValue>(
        source: &dyn FieldSource,
        field: &str,
        order: ValueOrder,
    ) -> Result<Self> {
        let started = Instant::now();
        let raw_values = source.enumerate_field_values(field)?;

        let mut parsed = Vec::with_capacity(raw_values.len());
        let mut canonical_terms = true;
        for raw in &raw_values {
            let value = T::parse(raw).ok_or_else(|| {
                FacetError::corrupt(
                    field,
                    format!("value '{}' is not of type {:?}", raw, T::VALUE_TYPE),
                )
            })?;
            if value.format() != *raw {
                canonical_terms = false;
            }
            parsed.push(value);
        }

        let dictionary = ValueDictionary::new(parsed.clone(), order);
        if dictionary.len() != raw_values.len() {
            canonical_terms = false;
        }

        let mut index_by_raw: HashMap<&str, u32> = HashMap::with_capacity(raw_values.len());
        for (raw, value) in raw_values.iter().zip(&parsed) {
            if let Some(index) = dictionary.index_of_value(value) {
                index_by_raw.insert(raw.as_str(), index as u32);
            }
        }

        let doc_count = source.doc_count();
        let mut ordinals = Vec::with_capacity(doc_count as usize);
        let mut missing = 0u32;
        for doc in 0..doc_count {
            match source.document_value(DocNo::new(doc), field)? {
                Some(raw) => {
                    let index = index_by_raw.get(raw).copied().ok_or_else(|| {
                        FacetError::corrupt(
                            field,
                            format!("doc {} holds '{}' which was not enumerated", doc, raw),
                        )
                    })?;
                    ordinals.push(index);
                }
                None => {
                    missing += 1;
                    ordinals.push(UNASSIGNED);
                }
            }
        }

        let has_missing = missing > 0;
        let offset = u32::from(has_missing);
        let ordinal_count = dictionary.len() + offset as usize;

        let mut freqs = vec![0u32; ordinal_count];
        let mut min_docs = vec![u32::MAX; ordinal_count];
        let mut max_docs = vec![0u32; ordinal_count];
        for (doc, slot) in ordinals.iter_mut().enumerate() {
            let ord = if *slot == UNASSIGNED { 0 } else { *slot + offset };
            *slot = ord;
            let ord = ord as usize;
            let doc = doc as u32;
            freqs[ord] += 1;
            min_docs[ord] = min_docs[ord].min(doc);
            max_docs[ord] = max_docs[ord].max(doc);
        }

        debug!(
            field,
            doc_count,
            distinct_values = dictionary.len(),
            missing,
            elapsed_us = started.elapsed().as_micros() as u64,
            "facet cache built"
        );

        Ok(Self {
            field: field.to_string(),
            dictionary: Box::new(dictionary),
            has_missing,
            ordinals,
            freqs,
            min_docs,
            max_docs,
            canonical_terms,
        })
    }

    /// Build the cache choosing the element type at runtime
    pub fn load_typed(
        source: &dyn FieldSource,
        field: &str,
        value_type: ValueType,
        order: ValueOrder,
    ) -> Result<Self> {
        match value_type {
            ValueType::Text => Self::load::<String>(source, field, order),
            ValueType::Int => Self::load::<i64>(source, field, order),
            ValueType::Float => Self::load::<OrderedFloat<f64>>(source, field, order),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Ordinal of a document's value; `None` outside the segment
    #[inline]
    pub fn ordinal_of(&self, docno: DocNo) -> Option<u32> {
        self.ordinals.get(docno.as_usize()).copied()
    }

    /// Text of the value behind `ordinal`; `None` for the "no value" ordinal
    pub fn value_of(&self, ordinal: u32) -> Option<String> {
        self.dictionary_index(ordinal)
            .and_then(|index| self.dictionary.format(index))
    }

    pub fn raw_value_of(&self, ordinal: u32) -> Option<RawValue> {
        self.dictionary_index(ordinal)
            .and_then(|index| self.dictionary.raw(index))
    }

    #[inline]
    pub fn frequency_of(&self, ordinal: u32) -> u32 {
        self.freqs.get(ordinal as usize).copied().unwrap_or(0)
    }

    /// Ordinal of a value given as text; `None` when absent or unparseable
    pub fn ordinal_of_value(&self, value: &str) -> Option<u32> {
        self.dictionary
            .index_of(value)
            .map(|index| index as u32 + u32::from(self.has_missing))
    }

    /// The "no value" ordinal, when this segment has documents without a value
    pub fn missing_ordinal(&self) -> Option<u32> {
        self.has_missing.then_some(0)
    }

    /// Lowest and highest docno carrying `ordinal`
    pub fn doc_bounds(&self, ordinal: u32) -> Option<(u32, u32)> {
        let ord = ordinal as usize;
        match (self.min_docs.get(ord), self.max_docs.get(ord)) {
            (Some(&min), Some(&max)) if min <= max => Some((min, max)),
            _ => None,
        }
    }

    /// Number of ordinals, including the "no value" ordinal
    pub fn ordinal_count(&self) -> usize {
        self.freqs.len()
    }

    pub fn doc_count(&self) -> u32 {
        self.ordinals.len() as u32
    }

    pub fn ordinals(&self) -> &[u32] {
        &self.ordinals
    }

    pub fn freqs(&self) -> &[u32] {
        &self.freqs
    }

    pub fn dictionary(&self) -> &dyn ValueList {
        self.dictionary.as_ref()
    }

    /// Typed dictionary, when `T` is the element type the cache was built with
    pub fn typed_dictionary<T: FacetValue>(&self) -> Option<&ValueDictionary<T>> {
        self.dictionary.as_any().downcast_ref::<ValueDictionary<T>>()
    }

    pub fn value_type(&self) -> ValueType {
        self.dictionary.value_type()
    }

    pub fn value_order(&self) -> ValueOrder {
        self.dictionary.order()
    }

    /// Whether each value's canonical text is exactly its stored text,
    /// so per-value postings can be looked up by `value_of`
    pub fn has_canonical_terms(&self) -> bool {
        self.canonical_terms
    }

    fn dictionary_index(&self, ordinal: u32) -> Option<usize> {
        if self.has_missing {
            ordinal.checked_sub(1).map(|i| i as usize)
        } else {
            Some(ordinal as usize)
        }
    }
}
