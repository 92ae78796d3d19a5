//! Device catalog loaded from a JSON seed file.
//!
//! File shape (keys are device ids):
//! ```json
//! {"1": {"ua": "Mozilla/5.0 ...", "css_size": [390, 844], "platform": "iPhone",
//!        "dpr": 3, "mobile": true, "model": "iPhone 13"}}
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::domain::DeviceProfile;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read device catalog {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse device catalog")]
    Parse(#[from] serde_json::Error),

    #[error("device id {0:?} is not a non-negative integer")]
    BadId(String),
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    ua: String,
    css_size: (u32, u32),
    platform: String,
    dpr: u32,
    mobile: bool,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: Vec<DeviceProfile>,
}

impl DeviceCatalog {
    pub fn new(mut devices: Vec<DeviceProfile>) -> Self {
        devices.sort_by_key(|d| d.id);
        Self { devices }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let parsed: HashMap<String, RawDevice> = serde_json::from_str(raw)?;
        let mut devices = Vec::with_capacity(parsed.len());
        for (key, device) in parsed {
            let id = key
                .trim()
                .parse::<u32>()
                .map_err(|_| CatalogError::BadId(key.clone()))?;
            devices.push(DeviceProfile {
                id,
                user_agent: device.ua,
                viewport: device.css_size,
                platform: device.platform,
                pixel_ratio: device.dpr,
                mobile: device.mobile,
                model: device.model,
            });
        }
        Ok(Self::new(devices))
    }

    /// Uniform draw. `None` only for an empty catalog.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&DeviceProfile> {
        self.devices.choose(rng)
    }

    pub fn devices(&self) -> &[DeviceProfile] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
