//! Integration tests for the exporter API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use kube::runtime::reflector::store::Writer;
use kube::runtime::watcher;
use prometheus::Registry;
use std::sync::Arc;
use tower::ServiceExt;
use vpa_metrics::{
    api::{create_router, AppState},
    health::{components, HealthRegistry},
    observability::ExporterMetrics,
    VerticalPodAutoscaler, VpaCollector,
};

fn vpa_from_manifest() -> VerticalPodAutoscaler {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "autoscaling.k8s.io/v1beta2",
        "kind": "VerticalPodAutoscaler",
        "metadata": {
            "name": "web",
            "namespace": "prod",
            "labels": { "app.kubernetes.io/name": "web" }
        },
        "spec": {
            "targetRef": { "apiVersion": "apps/v1", "kind": "Deployment", "name": "web" },
            "updatePolicy": { "updateMode": "Auto" }
        },
        "status": {
            "recommendation": {
                "containerRecommendations": [
                    { "containerName": "app", "target": { "cpu": "250m", "memory": "256Mi" } }
                ]
            }
        }
    }))
    .unwrap()
}

async fn setup_test_app(objects: Vec<VerticalPodAutoscaler>) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::WATCHER).await;

    let mut writer = Writer::default();
    writer.apply_watcher_event(&watcher::Event::Restarted(objects));
    let registry = Registry::new();
    registry
        .register(Box::new(
            VpaCollector::new(writer.as_reader())
                .unwrap()
                .with_metrics(ExporterMetrics::new()),
        ))
        .unwrap();

    let state = Arc::new(AppState::new(health_registry).with_registry(registry));
    let router = create_router(state.clone());

    (router, state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app(Vec::new()).await;

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);

    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["watcher"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app(Vec::new()).await;

    state
        .health_registry
        .set_degraded(components::WATCHER, "Watch backing off")
        .await;

    // Degraded still returns 200, the last known objects are served
    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);

    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "degraded");
    assert_eq!(
        health["components"]["watcher"]["message"],
        "Watch backing off"
    );
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app(Vec::new()).await;

    state
        .health_registry
        .set_unhealthy(components::WATCHER, "Watch stream ended")
        .await;

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_returns_503_before_first_list() {
    let (app, _state) = setup_test_app(Vec::new()).await;

    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let readiness: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_after_first_list() {
    let (app, state) = setup_test_app(Vec::new()).await;

    state.health_registry.mark_synced().await;

    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);

    let readiness: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], true);
    assert!(readiness["last_sync"].is_i64());
}

#[tokio::test]
async fn test_readyz_returns_503_when_synced_but_unhealthy() {
    let (app, state) = setup_test_app(Vec::new()).await;

    state.health_registry.mark_synced().await;
    state
        .health_registry
        .set_unhealthy(components::WATCHER, "Watch stream ended")
        .await;

    let (status, _) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app(vec![vpa_from_manifest()]).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains(
        "kube_vpa_labels{namespace=\"prod\",vpa=\"web\",targetRef=\"apps/v1/Deployment/web\",label_app_kubernetes_io_name=\"web\"} 1"
    ));
    assert!(metrics_text.contains(
        "kube_vpa_update_mode{namespace=\"prod\",vpa=\"web\",targetRef=\"apps/v1/Deployment/web\",update_mode=\"Auto\"} 1"
    ));
    assert!(metrics_text.contains(
        "kube_vpa_update_mode{namespace=\"prod\",vpa=\"web\",targetRef=\"apps/v1/Deployment/web\",update_mode=\"Off\"} 0"
    ));
    assert!(metrics_text.contains(
        "kube_vpa_container_status_recommendation_target_cpu_cores{namespace=\"prod\",vpa=\"web\",targetRef=\"apps/v1/Deployment/web\",container_name=\"app\"} 0.25"
    ));
    assert!(metrics_text.contains(
        "kube_vpa_container_status_recommendation_target_memory_bytes{namespace=\"prod\",vpa=\"web\",targetRef=\"apps/v1/Deployment/web\",container_name=\"app\"} 268435456"
    ));
}

#[tokio::test]
async fn test_metrics_omits_families_without_samples() {
    let (app, _state) = setup_test_app(vec![vpa_from_manifest()]).await;

    let (_, body) = get(app, "/metrics").await;
    let metrics_text = String::from_utf8(body).unwrap();

    // No resource policy and no bounds in the recommendation
    assert!(!metrics_text.contains("kube_vpa_container_resource_policy_min_cpu_cores"));
    assert!(!metrics_text.contains("kube_vpa_container_status_recommendation_lower_bound_cpu_cores"));
}

#[tokio::test]
async fn test_metrics_empty_store() {
    let (app, _state) = setup_test_app(Vec::new()).await;

    let (status, body) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!String::from_utf8(body).unwrap().contains("kube_vpa_"));
}
