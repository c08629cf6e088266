use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use super::cache::{FacetDataCache, FieldSource};
use super::handler::SimpleFacetHandler;
use crate::error::{FacetError, Result};
use crate::segment::{SegmentId, SegmentReader};

/// An opened segment together with the facet caches built for it.
///
/// Caches are built once at open and shared read-only by every query. A
/// facet whose build failed stays unavailable on this segment until
/// [`FacetSegment::reload`] succeeds; other facets are unaffected.
#[derive(Debug)]
pub struct FacetSegment {
    reader: Arc<SegmentReader>,
    caches: DashMap<String, Arc<FacetDataCache>>,
    failures: DashMap<String, String>,
}

impl FacetSegment {
    pub fn open(reader: Arc<SegmentReader>, handlers: &[SimpleFacetHandler]) -> Self {
        let segment = Self {
            reader,
            caches: DashMap::with_capacity(handlers.len()),
            failures: DashMap::new(),
        };
        for handler in handlers {
            // failures are recorded and reported per facet
            let _ = segment.reload(handler);
        }
        segment
    }

    /// Build (or rebuild) the cache of one facet
    pub fn reload(&self, handler: &SimpleFacetHandler) -> Result<Arc<FacetDataCache>> {
        match handler.load(self.reader.as_ref()) {
            Ok(cache) => {
                let cache = Arc::new(cache);
                // publish before clearing the failure; lookups always see one of them
                self.caches
                    .insert(handler.name().to_string(), Arc::clone(&cache));
                self.failures.remove(handler.name());
                debug!(segment = %self.id(), facet = handler.name(), "facet loaded");
                Ok(cache)
            }
            Err(e) => {
                warn!(
                    segment = %self.id(),
                    facet = handler.name(),
                    field = handler.index_field(),
                    error = %e,
                    "facet load failed"
                );
                self.failures
                    .insert(handler.name().to_string(), e.to_string());
                self.caches.remove(handler.name());
                Err(e)
            }
        }
    }

    /// Cache of a facet on this segment
    pub fn cache(&self, facet: &str) -> Result<Arc<FacetDataCache>> {
        if let Some(cache) = self.caches.get(facet) {
            return Ok(Arc::clone(cache.value()));
        }
        match self.failures.get(facet) {
            Some(reason) => Err(FacetError::FacetUnavailable {
                name: facet.to_string(),
                reason: reason.value().clone(),
            }),
            None => Err(FacetError::UnknownFacet(facet.to_string())),
        }
    }

    pub fn is_available(&self, facet: &str) -> bool {
        self.caches.contains_key(facet)
    }

    /// Facets whose load failed, sorted by name
    pub fn failed_facets(&self) -> Vec<String> {
        let mut names: Vec<String> = self.failures.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn reader(&self) -> &SegmentReader {
        &self.reader
    }

    pub fn id(&self) -> SegmentId {
        self.reader.id()
    }

    pub fn doc_count(&self) -> u32 {
        FieldSource::doc_count(self.reader.as_ref())
    }
}
