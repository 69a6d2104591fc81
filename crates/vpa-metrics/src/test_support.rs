//! Shared fixtures for unit tests

use crate::resource::{
    ContainerResourcePolicy, PodResourcePolicy, PodUpdatePolicy, RecommendedContainerResources,
    RecommendedPodResources, ResourceList, UpdateMode, VerticalPodAutoscaler,
    VerticalPodAutoscalerSpec, VerticalPodAutoscalerStatus, RESOURCE_CPU, RESOURCE_MEMORY,
};
use k8s_openapi::api::autoscaling::v1::CrossVersionObjectReference;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

pub fn resources(cpu: &str, memory: &str) -> ResourceList {
    BTreeMap::from([
        (RESOURCE_CPU.to_string(), Quantity(cpu.to_string())),
        (RESOURCE_MEMORY.to_string(), Quantity(memory.to_string())),
    ])
}

/// Object with identity and target only; no policy, no status
pub fn bare_vpa(namespace: &str, name: &str) -> VerticalPodAutoscaler {
    let mut vpa = VerticalPodAutoscaler::new(
        name,
        VerticalPodAutoscalerSpec {
            target_ref: Some(CrossVersionObjectReference {
                api_version: Some("extensions/v1beta1".to_string()),
                kind: "Deployment".to_string(),
                name: "deployment1".to_string(),
            }),
            ..Default::default()
        },
    );
    vpa.metadata.namespace = Some(namespace.to_string());
    vpa
}

/// `vpa1` in `ns1`: Recreate mode, one `*` policy and one recommendation
pub fn fixture_vpa() -> VerticalPodAutoscaler {
    let mut vpa = bare_vpa("ns1", "vpa1");
    vpa.metadata.generation = Some(2);
    vpa.metadata.labels = Some(BTreeMap::from([("app".to_string(), "foobar".to_string())]));
    vpa.spec.update_policy = Some(PodUpdatePolicy {
        update_mode: Some(UpdateMode::Recreate),
    });
    vpa.spec.resource_policy = Some(PodResourcePolicy {
        container_policies: vec![ContainerResourcePolicy {
            container_name: "*".to_string(),
            mode: None,
            min_allowed: resources("1", "4Gi"),
            max_allowed: resources("4", "8Gi"),
        }],
    });
    vpa.status = Some(VerticalPodAutoscalerStatus {
        recommendation: Some(RecommendedPodResources {
            container_recommendations: vec![RecommendedContainerResources {
                container_name: "container1".to_string(),
                lower_bound: resources("1", "4Gi"),
                upper_bound: resources("4", "8Gi"),
                target: resources("3", "7Gi"),
                uncapped_target: resources("6", "10Gi"),
            }],
        }),
        conditions: Vec::new(),
    });
    vpa
}
