use std::sync::Arc;
use tracing::instrument;

use crate::models::{ProductRef, ServiceError, ServiceResult};
use crate::repositories::ProductRepository;

/// Most products selected per catalog read
pub const BATCH_SIZE: u64 = 5;

/// Number of catalog reads needed for `food_count` items
pub fn cycle_count(food_count: u64) -> u64 {
    food_count.div_ceil(BATCH_SIZE)
}

/// Requested size of each cycle, e.g. 12 -> [5, 5, 2]
pub fn batch_sizes(food_count: u64) -> impl Iterator<Item = u64> {
    let mut remaining = food_count;
    std::iter::from_fn(move || {
        if remaining == 0 {
            return None;
        }
        let batch = remaining.min(BATCH_SIZE);
        remaining -= batch;
        Some(batch)
    })
}

/// Fills a subscription box from one category's catalog.
///
/// Every cycle re-reads the first `batch` products of the category, so a
/// short category repeats its leading products and under-fills each batch.
pub struct SizingEngine {
    repository: Arc<dyn ProductRepository>,
}

impl SizingEngine {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self), fields(cycles = cycle_count(food_count)))]
    pub async fn select_products(
        &self,
        category_id: u64,
        food_count: u64,
    ) -> ServiceResult<Vec<ProductRef>> {
        let mut selected = Vec::new();

        for batch in batch_sizes(food_count) {
            let products = self
                .repository
                .fetch_products(category_id, batch as usize)
                .await?;

            if products.is_empty() {
                crate::warn_with_trace!("Category has no products to select from");
                return Err(ServiceError::CategoryNotFound { category_id });
            }

            selected.extend(products.iter().take(batch as usize).map(ProductRef::from));
        }

        crate::info_with_trace!(selected = selected.len(), "Selected subscription products");
        Ok(selected)
    }
}
