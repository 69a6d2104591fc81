//! Prometheus metrics for Kubernetes VerticalPodAutoscaler objects
//!
//! This crate provides:
//! - The VerticalPodAutoscaler custom resource model
//! - Metric family generators turning one object into gauge samples
//! - A prometheus collector over a `kube::runtime` store
//! - List/watch construction scoped to a namespace
//! - Health checks, self-metrics and the HTTP API

pub mod api;
pub mod collector;
pub mod error;
pub mod families;
pub mod health;
pub mod labels;
pub mod listwatch;
pub mod metric;
pub mod observability;
pub mod quantity;
pub mod resource;

#[cfg(test)]
pub(crate) mod test_support;

pub use collector::VpaCollector;
pub use error::{Error, Result};
pub use families::{generate, generate_dynamic, FamilyGenerator, FAMILIES};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use listwatch::{list_watch_factory, NamespaceScope, VpaListWatch};
pub use metric::{FamilyOutput, MetricKind, Sample};
pub use observability::{ExporterMetrics, StructuredLogger};
pub use resource::{VerticalPodAutoscaler, VerticalPodAutoscalerSpec, VerticalPodAutoscalerStatus};
