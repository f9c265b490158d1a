//! Product image generation.
//!
//! Generation runs for every catalog item at once; a failure for one item
//! leaves its placeholder in place and never stops the others.

use crate::catalog::Catalog;
use crate::types::{CatalogItem, ProductId};
use futures::future::{BoxFuture, join_all};
use std::collections::HashMap;
use thiserror::Error;

/// Image generation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// The generator rejected or failed the request
    #[error("image generation failed: {0}")]
    Generation(String),
}

/// Produces an image reference (typically a `data:` URI) for an item.
pub trait ImageGenerator: Send + Sync {
    /// `Ok(None)` means the generator returned no image data.
    fn generate<'a>(
        &'a self,
        item: &'a CatalogItem,
    ) -> BoxFuture<'a, Result<Option<String>, ImageError>>;
}

/// Outcome of one generation pass over the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageReport {
    /// Generated image references by product
    pub images: HashMap<ProductId, String>,
    /// One message per failed item, in catalog order
    pub failures: Vec<String>,
}

/// Generate images for every item in `catalog` concurrently.
pub async fn generate_catalog_images(
    catalog: &Catalog,
    generator: &dyn ImageGenerator,
) -> ImageReport {
    tracing::debug!(items = catalog.len(), "Generating product images");

    let results = join_all(
        catalog
            .items()
            .iter()
            .map(|item| async move { (item, generator.generate(item).await) }),
    )
    .await;

    let mut report = ImageReport::default();

    for (item, result) in results {
        match result {
            Ok(Some(image_ref)) => {
                tracing::debug!(product = %item.name, "Generated image");
                report.images.insert(item.id.clone(), image_ref);
            },
            Ok(None) => {
                tracing::debug!(product = %item.name, "No image data returned, keeping placeholder");
            },
            Err(error) => {
                tracing::warn!(product = %item.name, error = %error, "Image generation failed, keeping placeholder");
                report
                    .failures
                    .push(format!("Failed to generate image for {}.", item.name));
            },
        }
    }

    report
}

/// Generator used when image generation is not configured; never produces images.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledImageGenerator;

impl ImageGenerator for DisabledImageGenerator {
    fn generate<'a>(
        &'a self,
        _item: &'a CatalogItem,
    ) -> BoxFuture<'a, Result<Option<String>, ImageError>> {
        Box::pin(async { Ok(None) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails for bread, returns nothing for eggs, succeeds otherwise
    struct FlakyGenerator;

    impl ImageGenerator for FlakyGenerator {
        fn generate<'a>(
            &'a self,
            item: &'a CatalogItem,
        ) -> BoxFuture<'a, Result<Option<String>, ImageError>> {
            Box::pin(async move {
                match item.id.as_str() {
                    "2" => Err(ImageError::Generation("quota exceeded".to_string())),
                    "3" => Ok(None),
                    id => Ok(Some(format!("data:image/jpeg;base64,{id}"))),
                }
            })
        }
    }

    #[tokio::test]
    async fn test_partial_success() {
        let catalog = Catalog::baseline();
        let report = generate_catalog_images(&catalog, &FlakyGenerator).await;

        assert_eq!(report.images.len(), 6);
        assert!(!report.images.contains_key(&ProductId::new("2")));
        assert!(!report.images.contains_key(&ProductId::new("3")));
        assert_eq!(
            report.failures,
            vec!["Failed to generate image for Whole Wheat Bread.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_disabled_generator_changes_nothing() {
        let catalog = Catalog::baseline();
        let report = generate_catalog_images(&catalog, &DisabledImageGenerator).await;

        assert_eq!(report, ImageReport::default());
        assert_eq!(catalog.with_images(&report.images), catalog);
    }
}
