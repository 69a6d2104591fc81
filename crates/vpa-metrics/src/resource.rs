//! VerticalPodAutoscaler custom resource (`autoscaling.k8s.io/v1beta2`)
//!
//! Only the fields the exporter reads are modelled strictly; anything else in
//! the object is ignored on decode.

use k8s_openapi::api::autoscaling::v1::CrossVersionObjectReference;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Resource name to quantity, as in `core/v1.ResourceList`
pub type ResourceList = BTreeMap<String, Quantity>;

/// Decode a resource list whose values are int-or-string
///
/// The CRD stores `cpu: 1` as a JSON number, which `Quantity` alone rejects.
fn int_or_string_resources<'de, D>(deserializer: D) -> Result<ResourceList, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        String(String),
        Int(i64),
        Float(f64),
    }

    let raw = BTreeMap::<String, IntOrString>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| {
            let quantity = match value {
                IntOrString::String(s) => s,
                IntOrString::Int(i) => i.to_string(),
                IntOrString::Float(f) => f.to_string(),
            };
            (name, Quantity(quantity))
        })
        .collect())
}

pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";

/// Desired behaviour of the autoscaler
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "autoscaling.k8s.io",
    version = "v1beta2",
    kind = "VerticalPodAutoscaler",
    plural = "verticalpodautoscalers",
    shortname = "vpa",
    namespaced,
    status = "VerticalPodAutoscalerStatus",
    derive = "PartialEq",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct VerticalPodAutoscalerSpec {
    /// Workload whose pods are controlled by this autoscaler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ref: Option<CrossVersionObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_policy: Option<PodUpdatePolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_policy: Option<PodResourcePolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodUpdatePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_mode: Option<UpdateMode>,
}

/// How recommendations are applied to pods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateMode {
    /// Recommendations are computed but never applied
    Off,
    /// Resources are only assigned at pod creation
    Initial,
    /// Pods are evicted to apply new recommendations
    Recreate,
    /// Currently equivalent to `Recreate`
    Auto,
    /// A mode this exporter does not know, e.g. `InPlaceOrRecreate`
    #[serde(other)]
    Unknown,
}

impl UpdateMode {
    /// Every known mode, in the order metrics are emitted
    pub const ALL: [UpdateMode; 4] = [
        UpdateMode::Off,
        UpdateMode::Initial,
        UpdateMode::Recreate,
        UpdateMode::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::Off => "Off",
            UpdateMode::Initial => "Initial",
            UpdateMode::Recreate => "Recreate",
            UpdateMode::Auto => "Auto",
            UpdateMode::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodResourcePolicy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_policies: Vec<ContainerResourcePolicy>,
}

/// Per-container bounds; `containerName` may be `*` for the default policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerResourcePolicy {
    #[serde(default)]
    pub container_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ContainerScalingMode>,

    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "int_or_string_resources"
    )]
    pub min_allowed: ResourceList,

    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "int_or_string_resources"
    )]
    pub max_allowed: ResourceList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerScalingMode {
    Auto,
    Off,
    #[serde(other)]
    Unknown,
}

/// Most recently observed state of the autoscaler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerticalPodAutoscalerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<RecommendedPodResources>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<VerticalPodAutoscalerCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedPodResources {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_recommendations: Vec<RecommendedContainerResources>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedContainerResources {
    #[serde(default)]
    pub container_name: String,

    /// Recommended amount of resources
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "int_or_string_resources"
    )]
    pub target: ResourceList,

    /// Minimum recommended amount of resources
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "int_or_string_resources"
    )]
    pub lower_bound: ResourceList,

    /// Maximum recommended amount of resources
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "int_or_string_resources"
    )]
    pub upper_bound: ResourceList,

    /// Recommendation before the resource policy bounds were applied
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "int_or_string_resources"
    )]
    pub uncapped_target: ResourceList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerticalPodAutoscalerCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerticalPodAutoscaler {
    /// `apiVersion/kind/name` of the target workload
    ///
    /// Missing pieces render as empty segments so the label is always present.
    pub fn target_ref_string(&self) -> String {
        match &self.spec.target_ref {
            Some(target) => format!(
                "{}/{}/{}",
                target.api_version.as_deref().unwrap_or_default(),
                target.kind,
                target.name
            ),
            None => "//".to_string(),
        }
    }

    pub fn update_mode(&self) -> Option<UpdateMode> {
        self.spec.update_policy.as_ref()?.update_mode
    }

    pub fn container_policies(&self) -> &[ContainerResourcePolicy] {
        self.spec
            .resource_policy
            .as_ref()
            .map(|p| p.container_policies.as_slice())
            .unwrap_or_default()
    }

    pub fn container_recommendations(&self) -> &[RecommendedContainerResources] {
        self.status
            .as_ref()
            .and_then(|s| s.recommendation.as_ref())
            .map(|r| r.container_recommendations.as_slice())
            .unwrap_or_default()
    }

    /// Namespace of the object, empty for cluster-scoped lookups
    pub fn namespace_or_default(&self) -> String {
        self.namespace().unwrap_or_default()
    }
}
