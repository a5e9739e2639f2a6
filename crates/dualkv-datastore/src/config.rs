use std::path::{Path, PathBuf};

use dualkv_types::IndexId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DatastoreError, DatastoreResult};

/// Connection parameters for a [`DualDatastore`](crate::DualDatastore).
///
/// Loaded from TOML or from the JSON config map a host runtime hands to a
/// datastore plugin. Nothing is checked until [`validate`](Self::validate),
/// which `DualDatastore::open` calls before touching either store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreConfig {
    /// Local endpoint address of this process in the object-store cluster.
    pub local_addr: String,
    /// Address of the cluster's coordination service.
    pub ha_addr: String,
    /// Cluster profile fid.
    pub profile_fid: String,
    /// Fid of this process.
    pub process_fid: String,
    /// Remote index holding the payloads, as `<hi>:<lo>`.
    pub index_id: String,
    /// Directory of the local metadata index. Empty keeps the index in memory.
    #[serde(default)]
    pub index_path: PathBuf,
    /// Worker threads for the remote store client.
    #[serde(default = "default_threads")]
    pub threads: u32,
    /// Enable client-side tracing.
    #[serde(default)]
    pub trace: bool,
}

fn default_threads() -> u32 {
    1
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            local_addr: String::new(),
            ha_addr: String::new(),
            profile_fid: String::new(),
            process_fid: String::new(),
            index_id: String::new(),
            index_path: PathBuf::new(),
            threads: default_threads(),
            trace: false,
        }
    }
}

impl DatastoreConfig {
    /// Read a TOML config file.
    pub fn load(path: &Path) -> DatastoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DatastoreError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> DatastoreResult<Self> {
        toml::from_str(text).map_err(|e| DatastoreError::Config(e.to_string()))
    }

    /// Parse the config map of a host runtime.
    ///
    /// Numbers arrive as JSON floats, so `threads` must be a positive whole
    /// number rather than any integer type.
    pub fn from_json_map(map: &Map<String, Value>) -> DatastoreResult<Self> {
        let required = |name: &str, what: &str| -> DatastoreResult<String> {
            map.get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| DatastoreError::Config(format!("no {what} specified")))
        };

        let mut config = Self {
            local_addr: required("localAddr", "local address")?,
            ha_addr: required("haxAddr", "hax address")?,
            profile_fid: required("profileFid", "cluster profile fid")?,
            process_fid: required("processFid", "local process fid")?,
            index_id: required("index", "remote index")?,
            ..Self::default()
        };

        if let Some(v) = map.get("indexPath") {
            let path = v
                .as_str()
                .ok_or_else(|| DatastoreError::Config("indexPath not a string".into()))?;
            config.index_path = PathBuf::from(path);
        }

        if let Some(v) = map.get("threads") {
            let n = v
                .as_f64()
                .ok_or_else(|| DatastoreError::Config("threads not a number".into()))?;
            if n <= 0.0 {
                return Err(DatastoreError::Config(format!("threads <= 0: {n}")));
            }
            if n.fract() != 0.0 || n > f64::from(u32::MAX) {
                return Err(DatastoreError::Config(format!("threads is not an integer: {n}")));
            }
            config.threads = n as u32;
        }

        if let Some(v) = map.get("trace") {
            config.trace = v
                .as_bool()
                .ok_or_else(|| DatastoreError::Config("trace not a bool".into()))?;
        }

        Ok(config)
    }

    /// Check every field and return the parsed remote index id.
    pub fn validate(&self) -> DatastoreResult<IndexId> {
        for (name, value) in [
            ("local_addr", &self.local_addr),
            ("ha_addr", &self.ha_addr),
            ("profile_fid", &self.profile_fid),
            ("process_fid", &self.process_fid),
            ("index_id", &self.index_id),
        ] {
            if value.trim().is_empty() {
                return Err(DatastoreError::Config(format!("{name} is empty")));
            }
        }
        if self.threads == 0 {
            return Err(DatastoreError::Config("threads must be positive".into()));
        }
        self.index_id
            .parse::<IndexId>()
            .map_err(|e| DatastoreError::Config(format!("index_id: {e}")))
    }

    /// Fields that identify the datastore a repository was created with.
    pub fn disk_spec(&self) -> Map<String, Value> {
        let mut spec = Map::new();
        spec.insert("localAddr".into(), Value::from(self.local_addr.clone()));
        spec.insert("haxAddr".into(), Value::from(self.ha_addr.clone()));
        spec.insert("profileFid".into(), Value::from(self.profile_fid.clone()));
        spec.insert("processFid".into(), Value::from(self.process_fid.clone()));
        spec.insert("index".into(), Value::from(self.index_id.clone()));
        spec.insert(
            "indexPath".into(),
            Value::from(self.index_path.to_string_lossy().into_owned()),
        );
        spec
    }
}
