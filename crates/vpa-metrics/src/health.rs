//! Health and readiness tracking for the exporter
//!
//! Backs the `/healthz` and `/readyz` probes. The exporter is ready once the
//! watcher has delivered its first full list of objects; it is healthy as long
//! as no registered component reports itself unhealthy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, possibly with stale data
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        !matches!(self, ComponentStatus::Unhealthy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Unix timestamp of the last status change
    pub since: i64,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            since: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::new(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::new(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::new(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across components; no components means healthy
    pub fn overall(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|c| c.status)
            .fold(ComponentStatus::Healthy, |worst, status| match (worst, status) {
                (ComponentStatus::Unhealthy, _) | (_, ComponentStatus::Unhealthy) => {
                    ComponentStatus::Unhealthy
                }
                (ComponentStatus::Degraded, _) | (_, ComponentStatus::Degraded) => {
                    ComponentStatus::Degraded
                }
                _ => ComponentStatus::Healthy,
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Unix timestamp of the last full list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<i64>,
}

/// Component names for health tracking
pub mod components {
    /// The VerticalPodAutoscaler watch stream
    pub const WATCHER: &str = "watcher";
}

#[derive(Debug, Default)]
struct HealthState {
    components: HashMap<String, ComponentHealth>,
    last_sync: Option<i64>,
}

/// Shared, cloneable health state
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<HealthState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component as healthy
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut state = self.state.write().await;
        state.components.insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Record that a full list of objects has been received
    pub async fn mark_synced(&self) {
        let mut state = self.state.write().await;
        state.last_sync = Some(chrono::Utc::now().timestamp());
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.state.read().await.components.clone();
        HealthResponse {
            status: HealthResponse::overall(&components),
            components,
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;
        let status = HealthResponse::overall(&state.components);

        let reason = if state.last_sync.is_none() {
            Some("Initial VerticalPodAutoscaler list not yet received")
        } else if !status.is_operational() {
            Some("Component unhealthy")
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
            last_sync: state.last_sync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_registry_is_healthy() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_registered_component_starts_healthy() {
        let registry = HealthRegistry::new();
        registry.register(components::WATCHER).await;

        let health = registry.health().await;
        assert_eq!(
            health.components[components::WATCHER].status,
            ComponentStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let registry = HealthRegistry::new();
        registry.register(components::WATCHER).await;

        registry.set_degraded(components::WATCHER, "Watch backing off").await;
        assert_eq!(registry.health().await.status, ComponentStatus::Degraded);

        registry.set_unhealthy(components::WATCHER, "Watch stream ended").await;
        assert_eq!(registry.health().await.status, ComponentStatus::Unhealthy);

        registry.set_healthy(components::WATCHER).await;
        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);
    }

    #[test]
    fn test_worst_status_wins() {
        let components = HashMap::from([
            ("a".to_string(), ComponentHealth::degraded("slow")),
            ("b".to_string(), ComponentHealth::healthy()),
        ]);
        assert_eq!(HealthResponse::overall(&components), ComponentStatus::Degraded);

        let components = HashMap::from([
            ("a".to_string(), ComponentHealth::degraded("slow")),
            ("b".to_string(), ComponentHealth::unhealthy("down")),
        ]);
        assert_eq!(HealthResponse::overall(&components), ComponentStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_not_ready_before_first_sync() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;

        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());
        assert!(readiness.last_sync.is_none());
    }

    #[tokio::test]
    async fn test_ready_after_sync_even_when_degraded() {
        let registry = HealthRegistry::new();
        registry.register(components::WATCHER).await;
        registry.mark_synced().await;
        registry.set_degraded(components::WATCHER, "Watch backing off").await;

        let readiness = registry.readiness().await;
        assert!(readiness.ready);
        assert!(readiness.last_sync.is_some());
    }

    #[tokio::test]
    async fn test_not_ready_when_unhealthy() {
        let registry = HealthRegistry::new();
        registry.register(components::WATCHER).await;
        registry.mark_synced().await;
        registry.set_unhealthy(components::WATCHER, "Watch stream ended").await;

        assert!(!registry.readiness().await.ready);
    }
}
