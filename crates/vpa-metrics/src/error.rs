//! Error types for the VPA metrics library

use thiserror::Error;

/// Errors surfaced by the metrics library
#[derive(Debug, Error)]
pub enum Error {
    /// An opaque object handed to the generator was not a VerticalPodAutoscaler
    #[error("expected {expected}, got {api_version}/{kind}")]
    UnexpectedObject {
        expected: &'static str,
        api_version: String,
        kind: String,
    },

    /// The object claimed the right type but its payload did not decode
    #[error("failed to decode VerticalPodAutoscaler: {0}")]
    Decode(#[from] kube::core::dynamic::ParseDynamicObjectError),

    /// Building the Kubernetes client failed
    #[error("error creating VerticalPodAutoscaler client: {0}")]
    Client(#[from] kube::Error),

    /// A metric descriptor was rejected by the prometheus client
    #[error("invalid metric descriptor: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// A resource quantity string was not a valid Kubernetes quantity
    #[error("invalid quantity {value:?}: {reason}")]
    Quantity { value: String, reason: &'static str },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
