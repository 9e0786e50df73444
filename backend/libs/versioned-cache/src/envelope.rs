//! Versioned cache envelope

use crate::{CacheError, CacheResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// `(version, payload)` pair stored under a scope's envelope key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: i64,
    pub content: String,
}

impl Envelope {
    pub fn new(version: i64, content: String) -> Self {
        Self { version, content }
    }

    /// Serialize `value` into an envelope tagged with `version`
    pub fn wrap<T: Serialize>(version: i64, value: &T) -> CacheResult<Self> {
        let content = serde_json::to_string(value)?;
        Ok(Self { version, content })
    }

    pub fn unwrap_as<T: DeserializeOwned>(&self) -> CacheResult<T> {
        Ok(serde_json::from_str(&self.content)?)
    }

    pub fn encode(&self) -> CacheResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> CacheResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Trust the envelope only if no bump has pushed the counter past it.
    pub fn check_fresh(self, current: i64) -> CacheResult<Self> {
        if current > self.version {
            return Err(CacheError::Stale {
                stored: self.version,
                current,
            });
        }
        Ok(self)
    }
}
