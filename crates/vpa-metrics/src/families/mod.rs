//! Metric family generators for VerticalPodAutoscaler objects
//!
//! Every family is a plain function from one object to its samples. The
//! table in [`FAMILIES`] fixes the order; [`generate`] runs all of them and
//! prefixes each sample with the object's identity labels.


use crate::error::{Error, Result};
use crate::labels::kube_labels_to_prometheus_labels;
use crate::metric::{FamilyOutput, MetricKind, Sample};
use crate::quantity;
use crate::resource::{
    ResourceList, UpdateMode, VerticalPodAutoscaler, RESOURCE_CPU, RESOURCE_MEMORY,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::core::DynamicObject;
use kube::{Resource, ResourceExt};
use tracing::warn;

/// Labels every sample starts with, in order
pub const IDENTITY_LABEL_KEYS: [&str; 3] = ["namespace", "vpa", "targetRef"];

const CONTAINER_LABEL: &str = "container_name";

pub type GenerateFn = fn(&VerticalPodAutoscaler) -> Vec<Sample>;

/// Declaration of one metric family
#[derive(Debug, Clone, Copy)]
pub struct FamilyGenerator {
    pub name: &'static str,
    pub kind: MetricKind,
    pub help: &'static str,
    /// Family-specific label keys, after the identity labels. Empty when the
    /// keys depend on the object (the labels family).
    pub label_keys: &'static [&'static str],
    generate: GenerateFn,
}

impl FamilyGenerator {
    pub const fn gauge(
        name: &'static str,
        help: &'static str,
        label_keys: &'static [&'static str],
        generate: GenerateFn,
    ) -> Self {
        Self {
            name,
            kind: MetricKind::Gauge,
            help,
            label_keys,
            generate,
        }
    }

    /// Run the family and decorate its samples with the identity labels
    pub fn generate(&self, vpa: &VerticalPodAutoscaler) -> FamilyOutput {
        let mut samples = (self.generate)(vpa);
        decorate(vpa, &mut samples);
        FamilyOutput {
            name: self.name,
            kind: self.kind,
            help: self.help,
            samples,
        }
    }
}

/// Prefix `namespace`, `vpa` and `targetRef` to every sample
pub fn decorate(vpa: &VerticalPodAutoscaler, samples: &mut [Sample]) {
    let namespace = vpa.namespace_or_default();
    let name = vpa.name_any();
    let target_ref = vpa.target_ref_string();
    let identity = [
        (IDENTITY_LABEL_KEYS[0], namespace.as_str()),
        (IDENTITY_LABEL_KEYS[1], name.as_str()),
        (IDENTITY_LABEL_KEYS[2], target_ref.as_str()),
    ];

    for sample in samples {
        sample.prepend_labels(&identity);
    }
}

/// All VerticalPodAutoscaler families, in emission order
pub static FAMILIES: &[FamilyGenerator] = &[
    FamilyGenerator::gauge(
        "kube_vpa_labels",
        "Kubernetes labels converted to Prometheus labels.",
        &[],
        object_labels,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_update_mode",
        "Update mode of the VPA.",
        &["update_mode"],
        update_mode,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_resource_policy_min_cpu_cores",
        "Minimum CPU cores the VPA can set for containers matching the name.",
        &[CONTAINER_LABEL],
        policy_min_cpu,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_resource_policy_min_memory_bytes",
        "Minimum memory bytes the VPA can set for containers matching the name.",
        &[CONTAINER_LABEL],
        policy_min_memory,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_resource_policy_max_cpu_cores",
        "Maximum CPU cores the VPA can set for containers matching the name.",
        &[CONTAINER_LABEL],
        policy_max_cpu,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_resource_policy_max_memory_bytes",
        "Maximum memory bytes the VPA can set for containers matching the name.",
        &[CONTAINER_LABEL],
        policy_max_memory,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_status_recommendation_lower_bound_cpu_cores",
        "Minimum CPU cores the container can use before the VPA updater evicts it.",
        &[CONTAINER_LABEL],
        lower_bound_cpu,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_status_recommendation_lower_bound_memory_bytes",
        "Minimum memory bytes the container can use before the VPA updater evicts it.",
        &[CONTAINER_LABEL],
        lower_bound_memory,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_status_recommendation_upper_bound_cpu_cores",
        "Maximum CPU cores the container can use before the VPA updater evicts it.",
        &[CONTAINER_LABEL],
        upper_bound_cpu,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_status_recommendation_upper_bound_memory_bytes",
        "Maximum memory bytes the container can use before the VPA updater evicts it.",
        &[CONTAINER_LABEL],
        upper_bound_memory,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_status_recommendation_target_cpu_cores",
        "Target CPU cores the VPA recommends for the container.",
        &[CONTAINER_LABEL],
        target_cpu,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_status_recommendation_target_memory_bytes",
        "Target memory bytes the VPA recommends for the container.",
        &[CONTAINER_LABEL],
        target_memory,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_status_recommendation_uncapped_target_cpu_cores",
        "Target CPU cores the VPA recommends for the container ignoring bounds.",
        &[CONTAINER_LABEL],
        uncapped_target_cpu,
    ),
    FamilyGenerator::gauge(
        "kube_vpa_container_status_recommendation_uncapped_target_memory_bytes",
        "Target memory bytes the VPA recommends for the container ignoring bounds.",
        &[CONTAINER_LABEL],
        uncapped_target_memory,
    ),
];

/// Compose a family table into a single generator
pub fn compose(
    families: &'static [FamilyGenerator],
) -> impl Fn(&VerticalPodAutoscaler) -> Vec<FamilyOutput> + Send + Sync + 'static {
    move |vpa| families.iter().map(|family| family.generate(vpa)).collect()
}

/// Run every family in [`FAMILIES`] against one object
pub fn generate(vpa: &VerticalPodAutoscaler) -> Vec<FamilyOutput> {
    FAMILIES.iter().map(|family| family.generate(vpa)).collect()
}

/// Entry point for hosts that only hand out untyped objects
///
/// Anything that is not a `autoscaling.k8s.io/v1beta2` VerticalPodAutoscaler
/// is rejected as a whole; no partial output is produced.
pub fn generate_dynamic(obj: &DynamicObject) -> Result<Vec<FamilyOutput>> {
    let expected_api_version = VerticalPodAutoscaler::api_version(&());
    let expected_kind = VerticalPodAutoscaler::kind(&());

    let (api_version, kind) = obj
        .types
        .as_ref()
        .map(|t| (t.api_version.as_str(), t.kind.as_str()))
        .unwrap_or_default();
    if api_version != expected_api_version || kind != expected_kind {
        return Err(Error::UnexpectedObject {
            expected: "autoscaling.k8s.io/v1beta2/VerticalPodAutoscaler",
            api_version: api_version.to_string(),
            kind: kind.to_string(),
        });
    }

    let vpa: VerticalPodAutoscaler = obj.clone().try_parse()?;
    Ok(generate(&vpa))
}

fn object_labels(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    vec![Sample::new(kube_labels_to_prometheus_labels(vpa.labels()), 1.0)]
}

fn update_mode(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let Some(current) = vpa.update_mode() else {
        return Vec::new();
    };

    UpdateMode::ALL
        .iter()
        .map(|mode| {
            let value = if *mode == current { 1.0 } else { 0.0 };
            Sample::with_label("update_mode", mode.as_str(), value)
        })
        .collect()
}

/// One sample per container whose resource list declares `resource`
fn resource_samples<'a>(
    vpa: &VerticalPodAutoscaler,
    containers: impl Iterator<Item = (&'a str, &'a ResourceList)>,
    resource: &str,
    convert: fn(&Quantity) -> Result<f64>,
) -> Vec<Sample> {
    containers
        .filter_map(|(container, resources)| {
            let quantity = resources.get(resource)?;
            match convert(quantity) {
                Ok(value) => Some(Sample::with_label(CONTAINER_LABEL, container, value)),
                Err(err) => {
                    warn!(
                        namespace = %vpa.namespace_or_default(),
                        vpa = %vpa.name_any(),
                        container = %container,
                        resource = %resource,
                        error = %err,
                        "Skipping unparseable resource quantity"
                    );
                    None
                }
            }
        })
        .collect()
}

fn policy_min_cpu(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let policies = vpa.container_policies().iter();
    let min = policies.map(|c| (c.container_name.as_str(), &c.min_allowed));
    resource_samples(vpa, min, RESOURCE_CPU, quantity::cpu_cores)
}

fn policy_min_memory(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let policies = vpa.container_policies().iter();
    let min = policies.map(|c| (c.container_name.as_str(), &c.min_allowed));
    resource_samples(vpa, min, RESOURCE_MEMORY, quantity::memory_bytes)
}

fn policy_max_cpu(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let policies = vpa.container_policies().iter();
    let max = policies.map(|c| (c.container_name.as_str(), &c.max_allowed));
    resource_samples(vpa, max, RESOURCE_CPU, quantity::cpu_cores)
}

fn policy_max_memory(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let policies = vpa.container_policies().iter();
    let max = policies.map(|c| (c.container_name.as_str(), &c.max_allowed));
    resource_samples(vpa, max, RESOURCE_MEMORY, quantity::memory_bytes)
}

fn lower_bound_cpu(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let recs = vpa.container_recommendations().iter();
    let lower = recs.map(|c| (c.container_name.as_str(), &c.lower_bound));
    resource_samples(vpa, lower, RESOURCE_CPU, quantity::cpu_cores)
}

fn lower_bound_memory(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let recs = vpa.container_recommendations().iter();
    let lower = recs.map(|c| (c.container_name.as_str(), &c.lower_bound));
    resource_samples(vpa, lower, RESOURCE_MEMORY, quantity::memory_bytes)
}

fn upper_bound_cpu(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let recs = vpa.container_recommendations().iter();
    let upper = recs.map(|c| (c.container_name.as_str(), &c.upper_bound));
    resource_samples(vpa, upper, RESOURCE_CPU, quantity::cpu_cores)
}

fn upper_bound_memory(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let recs = vpa.container_recommendations().iter();
    let upper = recs.map(|c| (c.container_name.as_str(), &c.upper_bound));
    resource_samples(vpa, upper, RESOURCE_MEMORY, quantity::memory_bytes)
}

fn target_cpu(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let recs = vpa.container_recommendations().iter();
    let target = recs.map(|c| (c.container_name.as_str(), &c.target));
    resource_samples(vpa, target, RESOURCE_CPU, quantity::cpu_cores)
}

fn target_memory(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let recs = vpa.container_recommendations().iter();
    let target = recs.map(|c| (c.container_name.as_str(), &c.target));
    resource_samples(vpa, target, RESOURCE_MEMORY, quantity::memory_bytes)
}

fn uncapped_target_cpu(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let recs = vpa.container_recommendations().iter();
    let uncapped = recs.map(|c| (c.container_name.as_str(), &c.uncapped_target));
    resource_samples(vpa, uncapped, RESOURCE_CPU, quantity::cpu_cores)
}

fn uncapped_target_memory(vpa: &VerticalPodAutoscaler) -> Vec<Sample> {
    let recs = vpa.container_recommendations().iter();
    let uncapped = recs.map(|c| (c.container_name.as_str(), &c.uncapped_target));
    resource_samples(vpa, uncapped, RESOURCE_MEMORY, quantity::memory_bytes)
}
