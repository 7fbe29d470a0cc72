//! Service registry.
//!
//! Maps the first path segment of a request to the protocol service mounted
//! under it. The registry is built once at startup and shared read-only.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::ServiceError;
use crate::model::Configuration;

use super::{KmlService, Params, Request, Service, TmsService};

/// URL prefix → service table.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<dyn Service>>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the KML and TMS services mounted under `kml` and `tms`.
    pub fn with_default_services() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(KmlService::new()));
        registry.register(Arc::new(TmsService::new()));
        registry
    }

    /// Mount a service under its URL prefix, replacing any previous one.
    pub fn register(&mut self, service: Arc<dyn Service>) {
        debug!(prefix = service.url_prefix(), "Registered service");
        self.services
            .insert(service.url_prefix().to_string(), service);
    }

    pub fn get(&self, prefix: &str) -> Option<&Arc<dyn Service>> {
        self.services.get(prefix)
    }

    /// Registered prefixes, sorted.
    pub fn prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = self.services.keys().map(String::as_str).collect();
        prefixes.sort_unstable();
        prefixes
    }

    /// Find the service for `prefix` and let it parse `path`.
    pub fn dispatch(
        &self,
        prefix: &str,
        path: &str,
        params: &Params,
        config: &Configuration,
    ) -> Result<(Arc<dyn Service>, Request), ServiceError> {
        let service = self
            .get(prefix)
            .ok_or_else(|| ServiceError::UnknownService {
                prefix: prefix.to_string(),
            })?;
        let request = service.parse_request(path, params, config)?;
        Ok((Arc::clone(service), request))
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("prefixes", &self.prefixes())
            .finish()
    }
}
