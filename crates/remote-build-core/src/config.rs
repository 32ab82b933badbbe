//! Configuration types for Remote Build.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

use crate::{Error, LogFilter};

/// Complete configuration, read once when a session opens.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RemoteBuildConfig {
    /// Log view settings
    pub view: ViewSettings,
    /// Remote host and commands
    pub remote: RemoteSettings,
    /// Transport invocation
    pub transport: TransportSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl RemoteBuildConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: RemoteBuildConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay a partial YAML document on top of this configuration.
    ///
    /// Keys present in `yaml` win; everything else keeps its current value.
    /// The merged configuration is validated again.
    pub fn merge_yaml(&self, yaml: &str) -> crate::Result<Self> {
        let overlay: Value =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        let mut base = serde_yaml::to_value(self).map_err(|e| Error::Config(e.to_string()))?;
        merge_values(&mut base, overlay);

        let merged: RemoteBuildConfig =
            serde_yaml::from_value(base).map_err(|e| Error::Config(e.to_string()))?;
        merged.validate()?;
        Ok(merged)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.view.max_lines == 0 {
            return Err(Error::Config("view.max_lines must be > 0".to_string()));
        }

        if self.view.flush_threshold == 0 {
            return Err(Error::Config(
                "view.flush_threshold must be > 0".to_string(),
            ));
        }

        LogFilter::new(&self.view.filter)?;

        if self.transport.command.trim().is_empty() {
            return Err(Error::Config(
                "transport.command cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        // An empty overlay document parses as null
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}

/// Log view settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewSettings {
    /// Maximum number of retained lines
    pub max_lines: usize,
    /// Initial filter pattern; lines that do not match are folded away
    pub filter: String,
    /// Scroll to the end after every render pass
    pub auto_scroll: bool,
    /// Idle time before buffered output is flushed, in milliseconds
    pub debounce_ms: u64,
    /// Flush immediately once more than this many newlines are buffered
    pub flush_threshold: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            max_lines: 20000,
            filter: ".".to_string(),
            auto_scroll: true,
            debounce_ms: 100,
            flush_threshold: 10,
        }
    }
}

/// Remote host and the commands sent after connecting.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RemoteSettings {
    /// Remote host name
    pub host: String,
    /// Directory to `cd` into
    pub directory: String,
    /// Command sent after changing directory
    pub setup_command: String,
    /// Build command, also resent when the view is cleared
    pub build_command: String,
}

/// Transport process settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransportSettings {
    /// Transport executable (e.g. plink)
    pub command: String,
    /// Remote user id
    pub user_id: String,
    /// Remote password
    pub password: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            command: "plink".to_string(),
            user_id: String::new(),
            password: String::new(),
        }
    }
}

impl RemoteBuildConfig {
    /// Arguments passed to the transport: `<user>@<host> -pw <password>`.
    pub fn transport_args(&self) -> Vec<String> {
        vec![
            format!("{}@{}", self.transport.user_id, self.remote.host),
            "-pw".to_string(),
            self.transport.password.clone(),
        ]
    }

    /// The change-directory command sent first after launch.
    pub fn cd_command(&self) -> String {
        format!("cd {}", self.remote.directory)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
