//! Simple runtime parameter system for tickpid
//!
//! Provides a key-value store for runtime configuration, persisted as YAML.

use crate::error::{TickPidError, TickPidResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default location of the parameter file, relative to the working directory
pub const DEFAULT_PARAMS_PATH: &str = ".tickpid/params.yaml";

/// Simple runtime parameter store
#[derive(Clone)]
pub struct RuntimeParams {
    /// Parameter storage - BTreeMap maintains sorted order
    params: Arc<RwLock<BTreeMap<String, Value>>>,
    /// Optional persistence path
    persist_path: Option<PathBuf>,
}

fn default_params() -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();

    // PID defaults
    params.insert("pid_kp".to_string(), Value::from(1.0));
    params.insert("pid_ki".to_string(), Value::from(0.1));
    params.insert("pid_kd".to_string(), Value::from(0.05));
    params.insert("pid_default_dt".to_string(), Value::from(0.01));

    params
}

impl RuntimeParams {
    /// Create a parameter store from `.tickpid/params.yaml`, or defaults if absent
    pub fn init() -> TickPidResult<Self> {
        let params_file = PathBuf::from(DEFAULT_PARAMS_PATH);
        let mut initial_params = BTreeMap::new();

        if params_file.exists() {
            match Self::read_yaml(&params_file) {
                Ok(loaded) => initial_params = loaded,
                Err(e) => log::warn!(
                    "Ignoring unreadable parameter file {}: {}",
                    params_file.display(),
                    e
                ),
            }
        }

        if initial_params.is_empty() {
            initial_params = default_params();
        }

        Ok(Self {
            params: Arc::new(RwLock::new(initial_params)),
            persist_path: Some(params_file),
        })
    }

    /// Create a parameter store holding only the defaults, with no persistence path
    pub fn with_defaults() -> Self {
        Self {
            params: Arc::new(RwLock::new(default_params())),
            persist_path: None,
        }
    }

    /// Load a parameter store from a specific YAML file
    ///
    /// Keys missing from the file fall back to the defaults. The file becomes the
    /// persistence target for [`save_to_disk`](Self::save_to_disk).
    pub fn from_file(path: impl AsRef<Path>) -> TickPidResult<Self> {
        let path = path.as_ref();
        let mut params = default_params();
        params.extend(Self::read_yaml(path)?);

        log::debug!("Loaded {} parameters from {}", params.len(), path.display());

        Ok(Self {
            params: Arc::new(RwLock::new(params)),
            persist_path: Some(path.to_path_buf()),
        })
    }

    fn read_yaml(path: &Path) -> TickPidResult<BTreeMap<String, Value>> {
        let yaml_str = std::fs::read_to_string(path)?;
        let loaded: Option<BTreeMap<String, Value>> = serde_yaml::from_str(&yaml_str)?;
        Ok(loaded.unwrap_or_default())
    }

    /// Get a parameter value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let params = self.params.read();
        let value = params.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Get a parameter, failing if it is missing or has the wrong type
    pub fn require<T: for<'de> Deserialize<'de>>(&self, key: &str) -> TickPidResult<T> {
        let value = self
            .params
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| TickPidError::ParameterNotFound(key.to_string()))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Get a parameter, using `default` only when the key is absent
    ///
    /// A present value of the wrong type is a configuration error rather than
    /// a silent fallback.
    pub fn get_checked<T: for<'de> Deserialize<'de>>(
        &self,
        key: &str,
        default: T,
    ) -> TickPidResult<T> {
        let Some(value) = self.params.read().get(key).cloned() else {
            return Ok(default);
        };
        serde_json::from_value(value.clone()).map_err(|e| {
            TickPidError::config(format!("parameter '{}' = {} is invalid: {}", key, value, e))
        })
    }

    /// Get parameter with default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Get parameter as f64 with default
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get_or(key, default)
    }

    /// Get parameter as i32 with default
    pub fn get_i32(&self, key: &str, default: i32) -> i32 {
        self.get_or(key, default)
    }

    /// Get parameter as bool with default
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_or(key, default)
    }

    /// Get parameter as string with default
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get_or(key, default.to_string())
    }

    /// Set a parameter value
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> TickPidResult<()> {
        let json_value = serde_json::to_value(value)?;
        self.params.write().insert(key.to_string(), json_value);
        Ok(())
    }

    /// Get all parameters
    pub fn get_all(&self) -> BTreeMap<String, Value> {
        self.params.read().clone()
    }

    /// List all parameter keys
    pub fn list_keys(&self) -> Vec<String> {
        self.params.read().keys().cloned().collect()
    }

    /// Check if a parameter exists
    pub fn has(&self, key: &str) -> bool {
        self.params.read().contains_key(key)
    }

    /// Remove a parameter
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.params.write().remove(key)
    }

    /// Clear all parameters and reset to defaults
    pub fn reset(&self) {
        *self.params.write() = default_params();
    }

    /// Path the store persists to, if any
    pub fn persist_path(&self) -> Option<&Path> {
        self.persist_path.as_deref()
    }

    /// Save parameters to the persistence path (or the default location)
    pub fn save_to_disk(&self) -> TickPidResult<()> {
        let path = self
            .persist_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PARAMS_PATH));
        self.save_to(&path)
    }

    /// Save parameters to a specific YAML file
    pub fn save_to(&self, path: &Path) -> TickPidResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let yaml = serde_yaml::to_string(&*self.params.read())?;
        std::fs::write(path, yaml)?;
        log::debug!("Saved parameters to {}", path.display());
        Ok(())
    }

    /// Replace the current parameters with the contents of a YAML file
    ///
    /// A missing file leaves the store untouched.
    pub fn load_from_disk(&self, path: &Path) -> TickPidResult<()> {
        if path.exists() {
            let loaded = Self::read_yaml(path)?;
            *self.params.write() = loaded;
        }
        Ok(())
    }
}

impl Default for RuntimeParams {
    fn default() -> Self {
        Self::init().unwrap_or_else(|e| {
            log::warn!("Failed to initialize RuntimeParams: {}. Using defaults.", e);
            Self::with_defaults()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let params = RuntimeParams::with_defaults();

        // Test defaults
        assert_eq!(params.get_f64("pid_kp", 0.0), 1.0);
        params.set("retries", 3).unwrap();
        assert_eq!(params.get_i32("retries", 0), 3);

        // Test set/get
        params.set("test_value", 42.5).unwrap();
        assert_eq!(params.get::<f64>("test_value"), Some(42.5));

        // Test overwrite
        params.set("pid_kp", 2.0).unwrap();
        assert_eq!(params.get_f64("pid_kp", 0.0), 2.0);
    }

    #[test]
    fn test_require_missing_and_mistyped() {
        let params = RuntimeParams::with_defaults();

        assert!(matches!(
            params.require::<f64>("no_such_key"),
            Err(TickPidError::ParameterNotFound(_))
        ));

        params.set("label", "motor").unwrap();
        assert!(matches!(
            params.require::<f64>("label"),
            Err(TickPidError::Serialization(_))
        ));
        assert_eq!(params.require::<String>("label").unwrap(), "motor");
    }

    #[test]
    fn test_get_checked_only_defaults_missing_keys() {
        let params = RuntimeParams::with_defaults();
        assert_eq!(params.get_checked("pid_kp", 9.0).unwrap(), 1.0);
        assert_eq!(params.get_checked("no_such_key", 9.0).unwrap(), 9.0);

        params.set("pid_kp", "2,5").unwrap();
        let err = params.get_checked("pid_kp", 1.0).unwrap_err();
        assert!(matches!(err, TickPidError::Config(_)));
        assert!(err.to_string().contains("pid_kp"));
    }

    #[test]
    fn test_remove_and_reset() {
        let params = RuntimeParams::with_defaults();

        assert!(params.remove("pid_kd").is_some());
        assert!(!params.has("pid_kd"));

        params.set("extra", true).unwrap();
        params.reset();

        assert!(params.has("pid_kd"));
        assert!(!params.has("extra"));
    }

    #[test]
    fn test_clone_shares_storage() {
        let params = RuntimeParams::with_defaults();
        let shared = params.clone();

        shared.set("pid_ki", 0.5).unwrap();
        assert_eq!(params.get_f64("pid_ki", 0.0), 0.5);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("params.yaml");

        let params = RuntimeParams::with_defaults();
        params.set("pid_kp", 3.5).unwrap();
        params.set("motor_name", "left").unwrap();
        params.save_to(&path).unwrap();

        let loaded = RuntimeParams::from_file(&path).unwrap();
        assert_eq!(loaded.get_f64("pid_kp", 0.0), 3.5);
        assert_eq!(loaded.get_string("motor_name", ""), "left");
        assert_eq!(loaded.persist_path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_to_disk_writes_persist_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.yaml");
        std::fs::write(&path, "pid_ki: 0.2\n").unwrap();

        let params = RuntimeParams::from_file(&path).unwrap();
        params.set("pid_ki", 0.75).unwrap();
        params.save_to_disk().unwrap();

        let reloaded = RuntimeParams::with_defaults();
        reloaded.load_from_disk(&path).unwrap();
        assert_eq!(reloaded.get_f64("pid_ki", 0.0), 0.75);
    }

    #[test]
    fn test_from_file_fills_missing_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.yaml");
        std::fs::write(&path, "pid_kd: 0.25\n").unwrap();

        let params = RuntimeParams::from_file(&path).unwrap();
        assert_eq!(params.get_f64("pid_kd", 0.0), 0.25);
        assert_eq!(params.get_f64("pid_kp", 0.0), 1.0);
    }

    #[test]
    fn test_from_file_rejects_bad_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.yaml");
        std::fs::write(&path, "pid_kp: [unterminated\n").unwrap();

        assert!(matches!(
            RuntimeParams::from_file(&path),
            Err(TickPidError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_from_disk_missing_file_is_noop() {
        let params = RuntimeParams::with_defaults();
        params
            .load_from_disk(Path::new("/nonexistent/tickpid/params.yaml"))
            .unwrap();
        assert!(params.has("pid_kp"));
    }
}
