//! Catalog source abstraction.
//!
//! The engine consumes an already-loaded [`Catalog`]; where that tree
//! comes from (API, fixture, file) is behind [`CatalogLoader`].

use offerlink_core::types::Catalog;
use offerlink_core::OfferLinkResult;
use tracing::info;

/// Supplies the full partner / program / promoted-program tree once per
/// view session.
pub trait CatalogLoader: Send + Sync {
    fn load(&self) -> OfferLinkResult<Catalog>;

    /// Source name for logging.
    fn source_name(&self) -> &str;
}

/// Loader over a catalog that is already in memory.
pub struct StaticLoader {
    catalog: Catalog,
    name: String,
}

impl StaticLoader {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            name: "static".to_string(),
        }
    }

    pub fn named(catalog: Catalog, name: impl Into<String>) -> Self {
        Self {
            catalog,
            name: name.into(),
        }
    }
}

impl CatalogLoader for StaticLoader {
    fn load(&self) -> OfferLinkResult<Catalog> {
        info!(
            source = %self.name,
            partners = self.catalog.partner_count(),
            "Catalog loaded"
        );
        Ok(self.catalog.clone())
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_catalog;

    #[test]
    fn test_static_loader_round_trip() {
        let loader = StaticLoader::new(sample_catalog());
        let catalog = loader.load().unwrap();
        assert_eq!(catalog.partner_count(), loader.load().unwrap().partner_count());
        assert_eq!(loader.source_name(), "static");
    }
}
