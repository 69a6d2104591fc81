//! VPA metrics exporter
//!
//! Watches VerticalPodAutoscaler objects and serves their state as
//! Prometheus gauges alongside health and readiness probes.

use anyhow::{Context, Result};
use clap::Parser;
use futures::{Stream, StreamExt};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::runtime::{reflector, watcher, WatchStreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vpa_metrics::{
    api,
    health::{components, HealthRegistry},
    observability::{ExporterMetrics, StructuredLogger},
    NamespaceScope, VerticalPodAutoscaler, VpaCollector, VpaListWatch,
};

mod config;

use config::{ExporterConfig, Overrides};

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "vpa-exporter", version, about = "Prometheus exporter for VerticalPodAutoscaler objects")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, env = "VPA_EXPORTER_CONFIG")]
    config: Option<PathBuf>,

    /// Namespace to watch; empty watches all namespaces
    #[arg(long)]
    namespace: Option<String>,

    /// Port for /metrics, /healthz and /readyz
    #[arg(long)]
    port: Option<u16>,

    /// Kubeconfig file to use instead of in-cluster discovery
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context
    #[arg(long)]
    context: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            namespace: self.namespace.clone(),
            api_port: self.port,
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let cli = Cli::parse();
    let config = ExporterConfig::load(cli.config.as_deref(), cli.overrides())?;
    info!(namespace = %config.namespace, port = config.api_port, "Exporter configured");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::WATCHER).await;

    let metrics = ExporterMetrics::new();
    let logger = StructuredLogger::new(config.namespace.clone());

    let kube_config = kube_config(&config).await?;
    let list_watch = VpaListWatch::new(kube_config, NamespaceScope::new(&config.namespace))
        .context("Failed to create Kubernetes client")?;

    let (reader, writer) = reflector::store();
    let collector = VpaCollector::new(reader)?.with_metrics(metrics.clone());
    prometheus::register(Box::new(collector))
        .context("Failed to register VerticalPodAutoscaler collector")?;

    let stream = reflector(writer, list_watch.watcher(watcher::Config::default())).default_backoff();
    let watcher_handle = tokio::spawn(run_watcher(
        stream,
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    let app_state = Arc::new(api::AppState::new(health_registry.clone()));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));
    logger.log_startup(EXPORTER_VERSION, config.api_port);

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            logger.log_shutdown("SIGINT received");
        }
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    logger.log_shutdown("API server failed");
                }
                Err(e) => {
                    error!(error = %e, "API server task panicked");
                    logger.log_shutdown("API server task panicked");
                }
            }
        }
    }

    watcher_handle.abort();
    info!("Shutting down");

    Ok(())
}

/// Explicit kubeconfig or context when configured, otherwise in-cluster or default discovery
async fn kube_config(config: &ExporterConfig) -> Result<kube::Config> {
    if config.kubeconfig.is_none() && config.context.is_none() {
        return kube::Config::infer()
            .await
            .context("Failed to infer Kubernetes configuration");
    }

    let options = KubeConfigOptions {
        context: config.context.clone(),
        ..Default::default()
    };
    let kube_config = match &config.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
            kube::Config::from_custom_kubeconfig(kubeconfig, &options).await?
        }
        None => kube::Config::from_kubeconfig(&options).await?,
    };
    Ok(kube_config)
}

/// Drive the reflector and mirror the stream's state into health and metrics
async fn run_watcher(
    stream: impl Stream<Item = watcher::Result<watcher::Event<VerticalPodAutoscaler>>>,
    health_registry: HealthRegistry,
    metrics: ExporterMetrics,
    logger: StructuredLogger,
) {
    let mut stream = std::pin::pin!(stream);

    while let Some(event) = stream.next().await {
        match event {
            Ok(event) => {
                match &event {
                    watcher::Event::Applied(_) => metrics.inc_watch_event("applied"),
                    watcher::Event::Deleted(_) => metrics.inc_watch_event("deleted"),
                    watcher::Event::Restarted(objects) => {
                        metrics.inc_watch_event("restarted");
                        logger.log_watch_restarted(objects.len());
                        health_registry.mark_synced().await;
                    }
                }
                health_registry.set_healthy(components::WATCHER).await;
            }
            Err(e) => {
                metrics.inc_watch_errors();
                logger.log_watch_error(&e.to_string());
                health_registry
                    .set_degraded(components::WATCHER, e.to_string())
                    .await;
            }
        }
    }

    health_registry
        .set_unhealthy(components::WATCHER, "Watch stream ended")
        .await;
}
