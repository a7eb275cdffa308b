use prometheus::{
    CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Business areas with their own operation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessDomain {
    Catalog,
    Cart,
    Subscription,
    Order,
    Profile,
}

/// Prometheus metrics for the mealbox service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Business logic metrics
    pub catalog_operations_total: CounterVec,
    pub cart_operations_total: CounterVec,
    pub subscription_operations_total: CounterVec,
    pub order_operations_total: CounterVec,
    pub profile_operations_total: CounterVec,
    pub subscription_food_count: Histogram,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        let catalog_operations_total = CounterVec::new(
            Opts::new(
                "catalog_operations_total",
                "Total number of catalog operations",
            ),
            &["operation", "status"],
        )?;

        let cart_operations_total = CounterVec::new(
            Opts::new("cart_operations_total", "Total number of cart operations"),
            &["operation", "status"],
        )?;

        let subscription_operations_total = CounterVec::new(
            Opts::new(
                "subscription_operations_total",
                "Total number of subscription operations",
            ),
            &["operation", "status"],
        )?;

        let order_operations_total = CounterVec::new(
            Opts::new("order_operations_total", "Total number of order operations"),
            &["operation", "status"],
        )?;

        let profile_operations_total = CounterVec::new(
            Opts::new(
                "profile_operations_total",
                "Total number of user profile operations",
            ),
            &["operation", "status"],
        )?;

        let subscription_food_count = Histogram::with_opts(
            HistogramOpts::new(
                "subscription_food_count",
                "Food items per computed subscription box",
            )
            .buckets(vec![0.0, 5.0, 10.0, 20.0, 40.0, 80.0, 160.0, 320.0, 640.0]),
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(catalog_operations_total.clone()))?;
        registry.register(Box::new(cart_operations_total.clone()))?;
        registry.register(Box::new(subscription_operations_total.clone()))?;
        registry.register(Box::new(order_operations_total.clone()))?;
        registry.register(Box::new(profile_operations_total.clone()))?;
        registry.register(Box::new(subscription_food_count.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            catalog_operations_total,
            cart_operations_total,
            subscription_operations_total,
            order_operations_total,
            profile_operations_total,
            subscription_food_count,
        })
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    /// Record HTTP request metrics
    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_str = status_code.to_string();

        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_str])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    /// Count one business operation outcome
    pub fn record_business_operation(
        &self,
        domain: BusinessDomain,
        operation: &str,
        success: bool,
    ) {
        let status = if success { "success" } else { "error" };
        let counter = match domain {
            BusinessDomain::Catalog => &self.catalog_operations_total,
            BusinessDomain::Cart => &self.cart_operations_total,
            BusinessDomain::Subscription => &self.subscription_operations_total,
            BusinessDomain::Order => &self.order_operations_total,
            BusinessDomain::Profile => &self.profile_operations_total,
        };

        counter.with_label_values(&[operation, status]).inc();
    }

    pub fn record_food_count(&self, food_count: u64) {
        self.subscription_food_count.observe(food_count as f64);
    }

    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }
}
