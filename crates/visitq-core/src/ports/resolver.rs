//! Resolver port - the external link-visit operation.
//!
//! The resolver follows a URL through proxy-routed redirects using one
//! device profile. Device rotation and proxy retries are its business; the
//! core only sees the final provenance and the attempt ledger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DeviceProfile, ProxyAttempt, ResolveError};

/// Provenance of a successful visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub initial_url: String,
    pub final_url: String,
    pub ip: Option<String>,
    pub isp: Option<String>,
    #[serde(default)]
    pub attempts: Vec<ProxyAttempt>,
}

#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, url: &str, device: &DeviceProfile) -> Result<Resolution, ResolveError>;
}

/// Synchronous resolver, e.g. one driving a headless browser.
///
/// Wrap it in `impls::OffloadedResolver` so it runs on the blocking pool
/// instead of the scheduler's runtime threads.
pub trait BlockingResolver: Send + Sync + 'static {
    fn resolve_blocking(&self, url: &str, device: &DeviceProfile) -> Result<Resolution, ResolveError>;
}
