//! Engine configuration
//!
//! The streaming engine takes an open-ended option map. Callers supply only
//! the keys they care about; [`EngineConfig::merged_over_defaults`] lays them
//! over the fixed defaults before the map is handed to the engine verbatim.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Option enabling worker-based transmuxing in the engine
pub const ENABLE_WORKER: &str = "enableWorker";

/// Option enabling the engine's low-latency mode
pub const LOW_LATENCY_MODE: &str = "lowLatencyMode";

/// Open string-keyed engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineConfig {
    options: Map<String, Value>,
}

impl EngineConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// The defaults applied underneath every caller configuration
    pub fn defaults() -> Self {
        Self::new()
            .with(ENABLE_WORKER, true)
            .with(LOW_LATENCY_MODE, false)
    }

    /// Parse a configuration from a JSON object
    pub fn from_json_str(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(options) => Ok(Self { options }),
            other => Err(Error::InvalidConfig(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Create config tuned for low-latency live streams
    pub fn low_latency() -> Self {
        Self::new()
            .with(LOW_LATENCY_MODE, true)
            .with("liveSyncDurationCount", 2)
            .with("maxBufferLength", 6)
    }

    /// Create config tuned for VOD
    pub fn vod() -> Self {
        Self::new()
            .with("maxBufferLength", 60)
            .with("backBufferLength", 90)
    }

    /// Set an option, replacing any previous value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Look up an option
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Lay this configuration over the defaults, caller keys winning
    pub fn merged_over_defaults(&self) -> Self {
        let mut merged = Self::defaults();
        for (key, value) in &self.options {
            merged.options.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Borrow the raw option map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Convert to a JSON object value
    pub fn to_value(&self) -> Value {
        Value::Object(self.options.clone())
    }
}

impl From<Map<String, Value>> for EngineConfig {
    fn from(options: Map<String, Value>) -> Self {
        Self { options }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
