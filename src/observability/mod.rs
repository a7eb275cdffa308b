pub mod metrics;
pub mod middleware;
pub mod tracing;

pub use metrics::{BusinessDomain, Metrics, MetricsError};
pub use middleware::{observability_middleware, BusinessTracingMiddleware};
pub use tracing::{
    get_current_trace_id, init_observability, shutdown_observability, ObservabilityError,
    ObservabilitySettings,
};
