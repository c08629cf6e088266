use std::cmp::Ordering;
use std::sync::Arc;

use super::cache::FacetDataCache;
use super::value::RawValue;
use crate::segment::DocNo;

/// Orders documents of one segment by their facet value.
///
/// Ordinals follow dictionary order, so comparing them is comparing values.
/// Documents without a value sort first.
#[derive(Clone, Debug)]
pub struct FacetDocComparator {
    cache: Arc<FacetDataCache>,
}

impl FacetDocComparator {
    pub fn new(cache: Arc<FacetDataCache>) -> Self {
        Self { cache }
    }

    pub fn compare(&self, a: DocNo, b: DocNo) -> Ordering {
        self.cache.ordinal_of(a).cmp(&self.cache.ordinal_of(b))
    }

    /// Sort value of a document
    pub fn value(&self, docno: DocNo) -> Option<RawValue> {
        self.cache
            .ordinal_of(docno)
            .and_then(|ord| self.cache.raw_value_of(ord))
    }

    /// Sort docnos in place by value, ties by docno
    pub fn sort(&self, docs: &mut [DocNo]) {
        docs.sort_by(|&a, &b| self.compare(a, b).then(a.cmp(&b)));
    }
}
