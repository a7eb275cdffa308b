use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use super::pricing::total_price;
use super::sizing::SizingEngine;
use crate::config::SubscriptionConfig;
use crate::models::{
    validate_food_count, CreateSubscriptionRequest, CreateSubscriptionResponse, ProductRef,
    ServiceError, ServiceResult, Subscription, SubscriptionDetailResponse, SubscriptionFields,
    SubscriptionListResponse, SubscriptionOptionResponse, SubscriptionPriceResponse,
    SubscriptionQuoteRequest, User, ValidatedSubscriptionRequest,
};
use crate::repositories::{ProductRepository, SubscriptionRepository};

/// Subscription quoting, pricing and persistence
pub struct SubscriptionService {
    product_repository: Arc<dyn ProductRepository>,
    subscription_repository: Arc<dyn SubscriptionRepository>,
    sizing: SizingEngine,
    config: SubscriptionConfig,
}

impl SubscriptionService {
    pub fn new(
        product_repository: Arc<dyn ProductRepository>,
        subscription_repository: Arc<dyn SubscriptionRepository>,
        config: SubscriptionConfig,
    ) -> Self {
        Self {
            sizing: SizingEngine::new(product_repository.clone()),
            product_repository,
            subscription_repository,
            config,
        }
    }

    /// Food count and the concrete products that fill it
    #[instrument(skip(self), fields(category_id = request.category_id))]
    pub async fn quote(
        &self,
        request: SubscriptionQuoteRequest,
    ) -> ServiceResult<SubscriptionOptionResponse> {
        let food_count = validate_food_count(&request.quantity, self.config.max_food_count)?;
        let food_list = self
            .sizing
            .select_products(request.category_id, food_count)
            .await?;

        crate::info_with_trace!(food_count, selected = food_list.len(), "Quoted subscription");

        Ok(SubscriptionOptionResponse {
            food_count,
            food_list,
        })
    }

    /// Food count and the summed price of the quoted products
    #[instrument(skip(self), fields(category_id = request.category_id))]
    pub async fn price(
        &self,
        request: SubscriptionQuoteRequest,
    ) -> ServiceResult<SubscriptionPriceResponse> {
        let quote = self.quote(request).await?;
        let total_price = total_price(&quote.food_list)?;

        Ok(SubscriptionPriceResponse {
            food_count: quote.food_count,
            total_price,
        })
    }

    /// Persist a subscription and link one product per selected item.
    ///
    /// Links are written one at a time; a failed link aborts the request
    /// and leaves the earlier links in place.
    #[instrument(skip(self, user, request), fields(user_id = %user.id))]
    pub async fn create(
        &self,
        user: &User,
        request: CreateSubscriptionRequest,
    ) -> ServiceResult<CreateSubscriptionResponse> {
        let request = ValidatedSubscriptionRequest::try_from(request)?;
        let food_count = validate_food_count(&request.quantity, self.config.max_food_count)?;

        let products = match &request.product_ids {
            Some(product_ids) => self.resolve_products(product_ids).await?,
            None => {
                self.sizing
                    .select_products(request.category_id, food_count)
                    .await?
            }
        };
        let total_price = total_price(&products)?;

        let fields = SubscriptionFields::new(
            user.id.clone(),
            request.box_size,
            request.category_id,
            request.quantity,
            request.food_start.unwrap_or_else(|| Utc::now().date_naive()),
            self.config.term_days,
        );
        let (food_start, food_end) = (fields.food_start, fields.food_end);

        let subscription_id = self
            .subscription_repository
            .create_subscription(fields)
            .await?;

        for product in &products {
            self.subscription_repository
                .link_product(&subscription_id, product.id)
                .await?;
        }

        crate::info_with_trace!(
            subscription_id = %subscription_id,
            food_count,
            linked_count = products.len(),
            "Subscription created"
        );

        Ok(CreateSubscriptionResponse {
            subscription_id,
            food_count,
            linked_count: products.len(),
            total_price,
            food_start,
            food_end,
        })
    }

    /// Every subscription of a user with resolved products and subtotals
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn list(&self, user: &User) -> ServiceResult<SubscriptionListResponse> {
        let subscriptions = self.subscription_repository.find_by_user(&user.id).await?;

        let mut details = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            details.push(self.to_detail(subscription).await?);
        }

        let total_price = details
            .iter()
            .try_fold(0u64, |total, detail| total.checked_add(detail.subtotal))
            .ok_or_else(|| ServiceError::ValidationError {
                message: "Subscription totals overflow".to_string(),
                field: Some("total_price".to_string()),
            })?;

        Ok(SubscriptionListResponse {
            total_count: details.len(),
            subscriptions: details,
            total_price,
        })
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn get(
        &self,
        user: &User,
        subscription_id: &str,
    ) -> ServiceResult<SubscriptionDetailResponse> {
        let subscription = self.find_owned(user, subscription_id).await?;
        self.to_detail(subscription).await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &User, subscription_id: &str) -> ServiceResult<()> {
        self.find_owned(user, subscription_id).await?;
        self.subscription_repository.delete(subscription_id).await?;

        crate::info_with_trace!(subscription_id = %subscription_id, "Subscription deleted");
        Ok(())
    }

    /// Look up a subscription, hiding ones that belong to someone else
    async fn find_owned(&self, user: &User, subscription_id: &str) -> ServiceResult<Subscription> {
        match self.subscription_repository.find_by_id(subscription_id).await? {
            Some(subscription) if subscription.user_id == user.id => Ok(subscription),
            Some(_) => {
                crate::warn_with_trace!(subscription_id = %subscription_id, "Subscription owned by another user");
                Err(ServiceError::SubscriptionNotFound {
                    subscription_id: subscription_id.to_string(),
                })
            }
            None => Err(ServiceError::SubscriptionNotFound {
                subscription_id: subscription_id.to_string(),
            }),
        }
    }

    /// Resolve an explicit product list verbatim, keeping duplicates
    async fn resolve_products(&self, product_ids: &[u64]) -> ServiceResult<Vec<ProductRef>> {
        let mut resolved: HashMap<u64, ProductRef> = HashMap::new();
        let mut products = Vec::with_capacity(product_ids.len());

        for &product_id in product_ids {
            if let Some(product) = resolved.get(&product_id) {
                products.push(product.clone());
                continue;
            }

            let product = self
                .product_repository
                .find_by_id(product_id)
                .await?
                .ok_or(ServiceError::InvalidProduct { product_id })?
                .to_ref();
            resolved.insert(product_id, product.clone());
            products.push(product);
        }

        Ok(products)
    }

    async fn to_detail(
        &self,
        subscription: Subscription,
    ) -> ServiceResult<SubscriptionDetailResponse> {
        let mut resolved: HashMap<u64, Option<ProductRef>> = HashMap::new();
        let mut products = Vec::with_capacity(subscription.product_ids.len());

        for &product_id in &subscription.product_ids {
            if !resolved.contains_key(&product_id) {
                let product = self
                    .product_repository
                    .find_by_id(product_id)
                    .await?
                    .map(|product| product.to_ref());
                if product.is_none() {
                    crate::warn_with_trace!(product_id, "Linked product no longer in catalog");
                }
                resolved.insert(product_id, product);
            }

            if let Some(Some(product)) = resolved.get(&product_id) {
                products.push(product.clone());
            }
        }

        let subtotal = total_price(&products)?;

        Ok(SubscriptionDetailResponse {
            subscription,
            products,
            subtotal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoxSize, Product, RepositoryError, SubscriptionQuantity};
    use crate::services::mocks::{test_product, test_user, MockProductRepo, MockSubscriptionRepo};
    use chrono::NaiveDate;
    use mockall::predicate::eq;

    fn catalog(products: Vec<Product>) -> MockProductRepo {
        let by_id = products.clone();
        let mut mock_repo = MockProductRepo::new();
        mock_repo
            .expect_fetch_products()
            .returning(move |_, limit| Ok(products.iter().take(limit).cloned().collect()));
        mock_repo
            .expect_find_by_id()
            .returning(move |id| Ok(by_id.iter().find(|product| product.id == id).cloned()));
        mock_repo
    }

    fn priced_catalog() -> MockProductRepo {
        catalog(vec![
            test_product(1, 1, 10),
            test_product(2, 1, 20),
            test_product(3, 1, 30),
        ])
    }

    fn service(
        products: MockProductRepo,
        subscriptions: MockSubscriptionRepo,
    ) -> SubscriptionService {
        SubscriptionService::new(
            Arc::new(products),
            Arc::new(subscriptions),
            SubscriptionConfig::default(),
        )
    }

    fn quote_request(day: u64, week: u64, period: u64) -> SubscriptionQuoteRequest {
        SubscriptionQuoteRequest {
            category_id: 1,
            quantity: SubscriptionQuantity::new(day, week, period),
        }
    }

    fn create_request() -> CreateSubscriptionRequest {
        CreateSubscriptionRequest {
            category_id: Some(1),
            box_size: Some(BoxSize::Medium),
            food_day_count: Some(1),
            food_week_count: Some(7),
            food_period: Some(1),
            food_start: NaiveDate::from_ymd_opt(2024, 3, 1),
            product_ids: None,
        }
    }

    fn stored_subscription(user_id: &str, product_ids: Vec<u64>) -> Subscription {
        let mut subscription = Subscription::new(SubscriptionFields::new(
            user_id.to_string(),
            BoxSize::Small,
            1,
            SubscriptionQuantity::new(1, 1, 3),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            30,
        ));
        subscription.product_ids = product_ids;
        subscription
    }

    #[tokio::test]
    async fn test_quote_returns_food_list() {
        let service = service(priced_catalog(), MockSubscriptionRepo::new());

        let response = service.quote(quote_request(1, 7, 1)).await.unwrap();

        assert_eq!(response.food_count, 7);
        let ids: Vec<u64> = response.food_list.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 1, 2]);
    }

    #[tokio::test]
    async fn test_price_sums_selection() {
        let service = service(priced_catalog(), MockSubscriptionRepo::new());

        let response = service.price(quote_request(1, 7, 1)).await.unwrap();

        assert_eq!(response.food_count, 7);
        assert_eq!(response.total_price, 90);
    }

    #[tokio::test]
    async fn test_zero_quantity_is_free() {
        let service = service(MockProductRepo::new(), MockSubscriptionRepo::new());

        let response = service.price(quote_request(0, 7, 4)).await.unwrap();

        assert_eq!(response.food_count, 0);
        assert_eq!(response.total_price, 0);
    }

    #[tokio::test]
    async fn test_quote_rejects_oversized_box() {
        let service = service(MockProductRepo::new(), MockSubscriptionRepo::new());

        let err = service.quote(quote_request(100, 100, 100)).await.unwrap_err();

        assert_eq!(err.field(), Some("food_count"));
    }

    #[tokio::test]
    async fn test_create_links_every_selected_item() {
        let mut subscriptions = MockSubscriptionRepo::new();
        subscriptions
            .expect_create_subscription()
            .times(1)
            .withf(|fields| {
                fields.user_id == "U1"
                    && fields.food_end == NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
            })
            .returning(|_| Ok("S12345678".to_string()));
        subscriptions
            .expect_link_product()
            .times(5)
            .returning(|_, _| Ok(()));

        let service = service(priced_catalog(), subscriptions);
        let response = service.create(&test_user(), create_request()).await.unwrap();

        assert_eq!(response.subscription_id, "S12345678");
        assert_eq!(response.food_count, 7);
        assert_eq!(response.linked_count, 5);
        assert_eq!(response.total_price, 90);
        assert_eq!(response.food_end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[tokio::test]
    async fn test_create_with_explicit_products_links_verbatim() {
        let mut subscriptions = MockSubscriptionRepo::new();
        subscriptions
            .expect_create_subscription()
            .returning(|_| Ok("S1".to_string()));
        let mut sequence = mockall::Sequence::new();
        for product_id in [3u64, 3, 1] {
            subscriptions
                .expect_link_product()
                .with(eq("S1"), eq(product_id))
                .times(1)
                .in_sequence(&mut sequence)
                .returning(|_, _| Ok(()));
        }

        let request = CreateSubscriptionRequest {
            product_ids: Some(vec![3, 3, 1]),
            ..create_request()
        };

        let service = service(priced_catalog(), subscriptions);
        let response = service.create(&test_user(), request).await.unwrap();

        assert_eq!(response.linked_count, 3);
        assert_eq!(response.total_price, 70);
    }

    #[tokio::test]
    async fn test_create_with_unknown_product_fails_before_writing() {
        let mut subscriptions = MockSubscriptionRepo::new();
        subscriptions.expect_create_subscription().times(0);

        let request = CreateSubscriptionRequest {
            product_ids: Some(vec![99]),
            ..create_request()
        };

        let service = service(priced_catalog(), subscriptions);
        let err = service.create(&test_user(), request).await.unwrap_err();

        assert!(matches!(err, ServiceError::InvalidProduct { product_id: 99 }));
    }

    #[tokio::test]
    async fn test_create_missing_field_is_named() {
        let request = CreateSubscriptionRequest {
            food_week_count: None,
            ..create_request()
        };

        let service = service(MockProductRepo::new(), MockSubscriptionRepo::new());
        let err = service.create(&test_user(), request).await.unwrap_err();

        assert_eq!(err.field(), Some("food_week_count"));
    }

    #[tokio::test]
    async fn test_create_link_failure_aborts() {
        let mut subscriptions = MockSubscriptionRepo::new();
        subscriptions
            .expect_create_subscription()
            .returning(|_| Ok("S1".to_string()));
        subscriptions
            .expect_link_product()
            .times(1)
            .returning(|_, _| Err(RepositoryError::ConnectionFailed));

        let service = service(priced_catalog(), subscriptions);
        let result = service.create(&test_user(), create_request()).await;

        assert!(matches!(result, Err(ServiceError::Repository { .. })));
    }

    #[tokio::test]
    async fn test_list_resolves_products_and_totals() {
        let mut subscriptions = MockSubscriptionRepo::new();
        subscriptions
            .expect_find_by_user()
            .with(eq("U1"))
            .returning(|user_id| {
                Ok(vec![
                    stored_subscription(user_id, vec![1, 1, 2]),
                    stored_subscription(user_id, vec![3]),
                ])
            });

        let service = service(priced_catalog(), subscriptions);
        let response = service.list(&test_user()).await.unwrap();

        assert_eq!(response.total_count, 2);
        assert_eq!(response.subscriptions[0].subtotal, 40);
        assert_eq!(response.subscriptions[1].subtotal, 30);
        assert_eq!(response.total_price, 70);
    }

    #[tokio::test]
    async fn test_get_hides_foreign_subscription() {
        let mut subscriptions = MockSubscriptionRepo::new();
        subscriptions
            .expect_find_by_id()
            .returning(|_| Ok(Some(stored_subscription("U2", vec![]))));

        let service = service(MockProductRepo::new(), subscriptions);
        let err = service.get(&test_user(), "S1").await.unwrap_err();

        assert!(matches!(err, ServiceError::SubscriptionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_owned_subscription() {
        let mut subscriptions = MockSubscriptionRepo::new();
        subscriptions
            .expect_find_by_id()
            .returning(|_| Ok(Some(stored_subscription("U1", vec![1]))));
        subscriptions
            .expect_delete()
            .with(eq("S1"))
            .times(1)
            .returning(|_| Ok(()));

        let service = service(MockProductRepo::new(), subscriptions);

        assert!(service.delete(&test_user(), "S1").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_missing_subscription() {
        let mut subscriptions = MockSubscriptionRepo::new();
        subscriptions.expect_find_by_id().returning(|_| Ok(None));
        subscriptions.expect_delete().times(0);

        let service = service(MockProductRepo::new(), subscriptions);
        let err = service.delete(&test_user(), "S404").await.unwrap_err();

        assert!(matches!(err, ServiceError::SubscriptionNotFound { .. }));
    }
}
