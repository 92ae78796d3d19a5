//! Device fingerprint descriptors.

use serde::{Deserialize, Serialize};

/// Catalog entry used to parameterize one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub id: u32,
    pub user_agent: String,
    /// CSS viewport `(width, height)`.
    pub viewport: (u32, u32),
    pub platform: String,
    pub pixel_ratio: u32,
    pub mobile: bool,
    pub model: Option<String>,
}
