// Configuration loader

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a declsweep scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mark declarations whose effective accessibility is public or open
    /// as live.
    pub retain_public: bool,

    /// Retain declarations whose symbol-id indicates objc bridging.
    pub retain_objc_accessible: bool,

    /// Do not report properties that are only assigned.
    pub retain_assign_only_properties: bool,

    /// Do not report unused parameters on protocol methods.
    pub retain_unused_protocol_func_params: bool,

    /// Protocol names that behave as Encodable for synthesis purposes.
    pub external_encodable_protocols: Vec<String>,

    /// Ignore in-source comment commands.
    pub ignore_comment_commands: bool,

    /// Report configuration.
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retain_public: false,
            retain_objc_accessible: false,
            retain_assign_only_properties: false,
            retain_unused_protocol_func_params: false,
            external_encodable_protocols: vec![],
            ignore_comment_commands: false,
            report: ReportConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file. The parser is chosen by extension;
    /// anything that is not `.toml` is read as YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Unable to read {}", path.display()))?;

        if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err_with(|| format!("Malformed TOML in {}", path.display()))
        } else {
            serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err_with(|| format!("Malformed YAML in {}", path.display()))
        }
    }

    /// Probe the project root for a config file; without one, the
    /// defaults apply.
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        for stem in [".declsweep", "declsweep"] {
            for extension in ["yml", "yaml", "toml"] {
                let candidate = project_root.join(format!("{stem}.{extension}"));
                if candidate.is_file() {
                    return Self::from_file(&candidate);
                }
            }
        }

        Ok(Self::default())
    }
}
