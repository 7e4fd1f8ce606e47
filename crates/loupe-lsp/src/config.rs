//! Recognized configuration options.
//!
//! Settings arrive through `workspace/didChangeConfiguration` as a JSON
//! blob; unknown keys are ignored and missing keys keep their defaults, so
//! a partial settings object never resets unrelated options.

use serde_json::Value;
use std::time::Duration;

/// Analysis-core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether the external dependency resolver runs at all.
    pub resolver_enabled: bool,
    /// Upper bound for one classpath scan.
    pub scan_timeout_ms: u64,
    /// Whether platform/system library entries are appended to resolved
    /// classpaths.
    pub include_system_entries: bool,
    /// Number of classpath snapshots retained by the cache.
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolver_enabled: true,
            scan_timeout_ms: 10_000,
            include_system_entries: false,
            cache_capacity: crate::classpath::DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// The scan timeout as a [`Duration`].
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    /// Parse from a `didChangeConfiguration` settings object.
    ///
    /// Recognized shape:
    ///
    /// ```json
    /// {
    ///   "loupe": {
    ///     "classpath": {
    ///       "resolverEnabled": true,
    ///       "scanTimeoutMs": 10000,
    ///       "includeSystem": false
    ///     },
    ///     "cache": { "capacity": 2 }
    ///   }
    /// }
    /// ```
    pub fn from_settings(settings: &Value) -> Self {
        let mut config = Self::default();
        if let Some(v) = settings
            .pointer("/loupe/classpath/resolverEnabled")
            .and_then(Value::as_bool)
        {
            config.resolver_enabled = v;
        }
        if let Some(v) = settings
            .pointer("/loupe/classpath/scanTimeoutMs")
            .and_then(Value::as_u64)
        {
            config.scan_timeout_ms = v;
        }
        if let Some(v) = settings
            .pointer("/loupe/classpath/includeSystem")
            .and_then(Value::as_bool)
        {
            config.include_system_entries = v;
        }
        if let Some(v) = settings
            .pointer("/loupe/cache/capacity")
            .and_then(Value::as_u64)
        {
            config.cache_capacity = (v as usize).max(1);
        }
        config
    }
}
