//! OffloadedResolver - runs a blocking resolver on tokio's blocking pool.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{DeviceProfile, ResolveError};
use crate::ports::{BlockingResolver, Resolution, Resolver};

pub struct OffloadedResolver<R> {
    inner: Arc<R>,
}

impl<R: BlockingResolver> OffloadedResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

#[async_trait]
impl<R: BlockingResolver> Resolver for OffloadedResolver<R> {
    async fn resolve(&self, url: &str, device: &DeviceProfile) -> Result<Resolution, ResolveError> {
        let inner = Arc::clone(&self.inner);
        let url = url.to_string();
        let device = device.clone();

        tokio::task::spawn_blocking(move || inner.resolve_blocking(&url, &device))
            .await
            .map_err(|e| ResolveError::Other(format!("resolver task failed: {e}")))?
    }
}
