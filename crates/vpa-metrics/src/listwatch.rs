//! List/watch access to VerticalPodAutoscaler objects
//!
//! This is the construction side only. Caching, relisting and backoff are
//! left to `kube::runtime`, which consumes [`VpaListWatch::api`] or
//! [`VpaListWatch::watcher`].

use crate::error::Result;
use crate::resource::VerticalPodAutoscaler;
use futures::Stream;
use kube::api::{Api, ListParams, ObjectList, WatchEvent, WatchParams};
use kube::runtime::watcher;
use kube::{Client, Config};
use std::fmt;

/// Which namespaces to list and watch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceScope {
    #[default]
    All,
    Namespace(String),
}

impl NamespaceScope {
    /// The empty string selects all namespaces
    pub fn new(namespace: &str) -> Self {
        if namespace.is_empty() {
            NamespaceScope::All
        } else {
            NamespaceScope::Namespace(namespace.to_string())
        }
    }

    /// Namespace name, empty for all namespaces
    pub fn as_str(&self) -> &str {
        match self {
            NamespaceScope::All => "",
            NamespaceScope::Namespace(ns) => ns,
        }
    }
}

impl From<&str> for NamespaceScope {
    fn from(namespace: &str) -> Self {
        Self::new(namespace)
    }
}

impl fmt::Display for NamespaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceScope::All => f.write_str("all namespaces"),
            NamespaceScope::Namespace(ns) => write!(f, "namespace {ns}"),
        }
    }
}

/// Typed list/watch handle for one namespace scope
#[derive(Clone)]
pub struct VpaListWatch {
    api: Api<VerticalPodAutoscaler>,
    scope: NamespaceScope,
}

impl VpaListWatch {
    /// Build a client from `config` and scope it
    ///
    /// Fails if the client cannot be constructed (bad TLS material, for
    /// example). Callers are expected to treat this as fatal.
    pub fn new(config: Config, scope: NamespaceScope) -> Result<Self> {
        let client = Client::try_from(config)?;
        Ok(Self::from_client(client, scope))
    }

    pub fn from_client(client: Client, scope: NamespaceScope) -> Self {
        let api = match &scope {
            NamespaceScope::All => Api::all(client),
            NamespaceScope::Namespace(ns) => Api::namespaced(client, ns),
        };
        Self { api, scope }
    }

    pub fn scope(&self) -> &NamespaceScope {
        &self.scope
    }

    pub fn api(&self) -> Api<VerticalPodAutoscaler> {
        self.api.clone()
    }

    /// Point-in-time list
    pub async fn list(&self, params: &ListParams) -> Result<ObjectList<VerticalPodAutoscaler>> {
        Ok(self.api.list(params).await?)
    }

    /// Raw watch starting after `resource_version`
    pub async fn watch(
        &self,
        params: &WatchParams,
        resource_version: &str,
    ) -> Result<impl Stream<Item = kube::Result<WatchEvent<VerticalPodAutoscaler>>>> {
        Ok(self.api.watch(params, resource_version).await?)
    }

    /// Relisting watch stream for reflectors
    pub fn watcher(
        &self,
        config: watcher::Config,
    ) -> impl Stream<Item = watcher::Result<watcher::Event<VerticalPodAutoscaler>>> + Send {
        watcher(self.api(), config)
    }
}

impl fmt::Debug for VpaListWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VpaListWatch")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Build the client once and hand out list/watch handles per namespace
pub fn list_watch_factory(config: Config) -> Result<impl Fn(NamespaceScope) -> VpaListWatch> {
    let client = Client::try_from(config)?;
    Ok(move |scope| VpaListWatch::from_client(client.clone(), scope))
}
