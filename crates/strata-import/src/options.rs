use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use strata_graph::DuplicatePolicy;

/// What to do with a unit whose bytes are not a readable class file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Abort the whole import with [`crate::ImportError::Malformed`].
    #[default]
    Fail,
    /// Log the unit, leave it out of the graph, and carry on.
    Skip,
}

/// What the linker does when two structurally different class files claim
/// one name. Identical duplicates are always collapsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateHandling {
    #[default]
    Fail,
    FirstWins,
}

impl From<DuplicateHandling> for DuplicatePolicy {
    fn from(value: DuplicateHandling) -> Self {
        match value {
            DuplicateHandling::Fail => DuplicatePolicy::Fail,
            DuplicateHandling::FirstWins => DuplicatePolicy::FirstWins,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportOptions {
    #[serde(default)]
    pub on_malformed: MalformedPolicy,

    /// Size of the pool used for reading. When unset, rayon's global pool is
    /// used.
    #[serde(default)]
    pub threads: Option<usize>,

    /// Import `package-info` and `module-info` units as types.
    #[serde(default)]
    pub include_package_info: bool,

    #[serde(default)]
    pub duplicates: DuplicateHandling,
}

impl ImportOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn on_malformed(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn include_package_info(mut self, include: bool) -> Self {
        self.include_package_info = include;
        self
    }

    pub fn duplicates(mut self, handling: DuplicateHandling) -> Self {
        self.duplicates = handling;
        self
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read import options {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse import options: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` quotes the offending input; keep only the message.
        ConfigError::Toml(err.message().to_string())
    }
}
