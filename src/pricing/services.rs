//! Add-on pricing services.
//!
//! The engine resolves add-on prices through [`AddonPricer`], which may need to
//! await the catalog before it can cross-reference the selected identifiers.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::CatalogLoader;
use crate::error::CalculationError;

use super::calculators::addons_total;

/// Cross-references selected add-on identifiers against a price source
#[async_trait]
pub trait AddonPricer: Send + Sync {
    /// Total price of the selected add-ons.
    ///
    /// # Arguments
    /// * `addon_ids` - Identifiers currently selected, in selection order
    async fn price_addons(&self, addon_ids: &[String]) -> Result<u64, CalculationError>;
}

/// Prices add-ons from the loaded trip catalog
pub struct CatalogAddonPricer {
    loader: Arc<CatalogLoader>,
}

impl CatalogAddonPricer {
    pub fn new(loader: Arc<CatalogLoader>) -> Self {
        Self { loader }
    }
}

#[async_trait]
impl AddonPricer for CatalogAddonPricer {
    async fn price_addons(&self, addon_ids: &[String]) -> Result<u64, CalculationError> {
        if addon_ids.is_empty() {
            return Ok(0);
        }

        let catalog = self.loader.load().await?;
        let total = addons_total(&catalog.available_addons, addon_ids)?;
        debug!("Priced {} add-ons: {}", addon_ids.len(), total);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::loader::testing::StaticSource;
    use crate::catalog::models::fixtures::SAMPLE_YAML;
    use crate::error::CatalogError;

    #[tokio::test]
    async fn test_catalog_pricer_sums_catalog_prices() {
        let loader = Arc::new(CatalogLoader::new(Arc::new(StaticSource::ok(SAMPLE_YAML))));
        let pricer = CatalogAddonPricer::new(loader);

        let ids = vec!["A1".to_string(), "A2".to_string(), "ghost".to_string()];
        assert_eq!(pricer.price_addons(&ids).await.unwrap(), 80);
    }

    #[tokio::test]
    async fn test_catalog_pricer_empty_selection_skips_catalog() {
        let source = Arc::new(StaticSource::ok(SAMPLE_YAML));
        let pricer = CatalogAddonPricer::new(Arc::new(CatalogLoader::new(source.clone())));

        assert_eq!(pricer.price_addons(&[]).await.unwrap(), 0);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_catalog_pricer_propagates_load_failure() {
        let source = Arc::new(StaticSource::with_result(Err(CatalogError::Network(
            "connection reset".to_string(),
        ))));
        let pricer = CatalogAddonPricer::new(Arc::new(CatalogLoader::new(source)));

        let err = pricer.price_addons(&["A1".to_string()]).await.unwrap_err();
        assert!(matches!(err, CalculationError::Catalog(CatalogError::Network(_))));
    }
}
