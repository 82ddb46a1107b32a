//! Connection configuration for an R2 bucket.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Connection settings for a single R2 bucket.
///
/// The store client is always built from an explicit `R2Config` handed to
/// [`crate::Drive::connect`]; there is no process-wide client instance, so
/// tests can substitute their own store implementation freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct R2Config {
    /// Account endpoint, e.g. `https://<account-id>.r2.cloudflarestorage.com`
    pub endpoint: String,
    /// Region name; R2 uses `auto`.
    pub region: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Bucket name.
    pub bucket: String,
}

impl R2Config {
    /// Build a configuration from environment variables.
    ///
    /// Reads `R2_ENDPOINT`, `R2_REGION` (defaults to `auto`),
    /// `R2_ACCESS_KEY_ID`, `R2_SECRET_ACCESS_KEY` and `R2_BUCKET`.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            endpoint: require_env("R2_ENDPOINT")?,
            region: env::var("R2_REGION").unwrap_or_else(|_| "auto".into()),
            access_key_id: require_env("R2_ACCESS_KEY_ID")?,
            secret_access_key: require_env("R2_SECRET_ACCESS_KEY")?,
            bucket: require_env("R2_BUCKET")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check that no field is empty.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("endpoint", &self.endpoint),
            ("region", &self.region),
            ("access_key_id", &self.access_key_id),
            ("secret_access_key", &self.secret_access_key),
            ("bucket", &self.bucket),
        ] {
            if value.trim().is_empty() {
                return Err(StorageError::Validation(format!(
                    "config field `{field}` is empty"
                )));
            }
        }
        Ok(())
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name)
        .map_err(|_| StorageError::Validation(format!("environment variable `{name}` is not set")))
}
