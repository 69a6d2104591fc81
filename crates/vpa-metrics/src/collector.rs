//! Prometheus collector over a reflector store of VerticalPodAutoscalers
//!
//! The store is filled by `kube::runtime`; on every scrape this collector
//! runs the family table over the current snapshot and hands the result to
//! the prometheus registry for encoding.

use crate::error::Result;
use crate::families::{FamilyGenerator, FAMILIES, IDENTITY_LABEL_KEYS};
use crate::metric::{MetricKind, Sample};
use crate::observability::ExporterMetrics;
use crate::resource::VerticalPodAutoscaler;
use kube::runtime::reflector::Store;
use prometheus::core::{Collector, Desc};
use prometheus::proto;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Exposes every family for every object in a [`Store`]
pub struct VpaCollector {
    store: Store<VerticalPodAutoscaler>,
    families: &'static [FamilyGenerator],
    descs: Vec<Desc>,
    metrics: Option<ExporterMetrics>,
}

impl VpaCollector {
    /// Collector over the default family table
    pub fn new(store: Store<VerticalPodAutoscaler>) -> Result<Self> {
        Self::with_families(store, FAMILIES)
    }

    pub fn with_families(
        store: Store<VerticalPodAutoscaler>,
        families: &'static [FamilyGenerator],
    ) -> Result<Self> {
        let descs = families
            .iter()
            .map(|family| {
                let variable_labels = IDENTITY_LABEL_KEYS
                    .iter()
                    .chain(family.label_keys)
                    .map(|k| k.to_string())
                    .collect();
                Desc::new(
                    family.name.to_string(),
                    family.help.to_string(),
                    variable_labels,
                    HashMap::new(),
                )
            })
            .collect::<prometheus::Result<Vec<_>>>()?;

        Ok(Self {
            store,
            families,
            descs,
            metrics: None,
        })
    }

    /// Record scrape timings and object counts into `metrics`
    pub fn with_metrics(mut self, metrics: ExporterMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl std::fmt::Debug for VpaCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VpaCollector")
            .field("families", &self.families.len())
            .field("objects", &self.store.state().len())
            .finish()
    }
}

fn metric_type(kind: MetricKind) -> proto::MetricType {
    match kind {
        MetricKind::Gauge => proto::MetricType::GAUGE,
    }
}

fn to_proto(sample: &Sample) -> proto::Metric {
    let mut metric = proto::Metric::default();
    for (name, value) in sample.labels() {
        let mut pair = proto::LabelPair::default();
        pair.set_name(name.to_string());
        pair.set_value(value.to_string());
        metric.mut_label().push(pair);
    }
    let mut gauge = proto::Gauge::default();
    gauge.set_value(sample.value());
    metric.set_gauge(gauge);
    metric
}

impl Collector for VpaCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        let started = Instant::now();
        let objects = self.store.state();

        let mut families: Vec<proto::MetricFamily> = self
            .families
            .iter()
            .map(|family| {
                let mut mf = proto::MetricFamily::default();
                mf.set_name(family.name.to_string());
                mf.set_help(family.help.to_string());
                mf.set_field_type(metric_type(family.kind));
                mf
            })
            .collect();

        for vpa in &objects {
            for (mf, family) in families.iter_mut().zip(self.families) {
                for sample in family.generate(vpa).samples {
                    mf.mut_metric().push(to_proto(&sample));
                }
            }
        }

        families.retain(|mf| !mf.get_metric().is_empty());

        if let Some(metrics) = &self.metrics {
            metrics.set_objects(objects.len() as i64);
            metrics.observe_scrape_duration(started.elapsed().as_secs_f64());
        }
        debug!(
            objects = objects.len(),
            families = families.len(),
            "Collected VerticalPodAutoscaler metrics"
        );

        families
    }
}
