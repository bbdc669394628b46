//! Backend configuration.
//!
//! The backend runtime hands over the `[package.build.config]` table of the
//! project manifest as a JSON object. [`BackendConfig::from_value`] parses it:
//!
//! ```json
//! {
//!   "distro": "jazzy",
//!   "noarch": false,
//!   "extra-input-globs": ["msg/*.msg"],
//!   "extra-package-mappings": [
//!     "robostack-overrides.yaml",
//!     { "file": "more.yaml" },
//!     { "mapping": { "my_dep": { "conda": ["my-dep"] } } },
//!     { "other_dep": { "ros": ["other_dep"] } }
//!   ]
//! }
//! ```
//!
//! `distro` may be left out when the build runs against a robostack channel;
//! [`BackendConfig::from_value_with_channels`] then takes the distribution
//! from the first `robostack-<distro>` channel.
//!
//! Mapping files are not read here; [`BackendConfig::mapping_sources_with`]
//! asks the caller to load them so that the declared order (later wins) is
//! preserved across inline and file sources.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::mapping::InlineMapping;

const BASE_INPUT_GLOBS: [&str; 16] = [
    "**/*.c",
    "**/*.cpp",
    "**/*.h",
    "**/*.hpp",
    "**/*.rs",
    "**/*.sh",
    "package.xml",
    "setup.py",
    "setup.cfg",
    "pyproject.toml",
    "Makefile",
    "CMakeLists.txt",
    "MANIFEST.in",
    "tests/**/*.py",
    "docs/**/*.rst",
    "docs/**/*.md",
];

const PYTHON_INPUT_GLOBS: [&str; 2] = ["**/*.py", "**/*.pyx"];

/// ROS backend configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BackendConfig {
    /// ROS distribution to build against, e.g. `"humble"`. Filled in from
    /// the channel list when absent.
    #[serde(default)]
    pub distro: Option<String>,
    /// Build a noarch package; unset means `true`.
    #[serde(default)]
    pub noarch: Option<bool>,
    /// Environment variables to set during the build.
    #[serde(default)]
    pub env: Option<IndexMap<String, String>>,
    /// Directory to write debug files to.
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
    /// Extra globs that invalidate the build when matching files change.
    #[serde(default)]
    pub extra_input_globs: Option<Vec<String>>,
    /// Extra mapping sources layered over the bundled table, in order.
    #[serde(default)]
    pub extra_package_mappings: Vec<MappingSourceConfig>,
}

/// One `extra-package-mappings` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MappingSourceConfig {
    /// Bare string: path to a mapping file.
    Path(PathBuf),
    /// `{ file = "..." }`
    File { file: PathBuf },
    /// `{ mapping = { ... } }`
    Wrapped { mapping: InlineMapping },
    /// A mapping given directly.
    Inline(InlineMapping),
}

impl MappingSourceConfig {
    /// The mapping file this entry refers to, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            MappingSourceConfig::Path(path) | MappingSourceConfig::File { file: path } => {
                Some(path.as_path())
            }
            MappingSourceConfig::Wrapped { .. } | MappingSourceConfig::Inline(_) => None,
        }
    }
}

impl BackendConfig {
    /// Parse the configuration object passed by the backend runtime.
    ///
    /// `distro` is required; see [`from_value_with_channels`] for detection.
    ///
    /// [`from_value_with_channels`]: Self::from_value_with_channels
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Self::from_value_with_channels::<&str>(value, &[])
    }

    /// Parse the configuration object, taking the distribution from
    /// `channels` when the configuration does not name one.
    ///
    /// Fails with [`ResolveError::MissingDistro`] when neither does.
    pub fn from_value_with_channels<S: AsRef<str>>(
        value: serde_json::Value,
        channels: &[S],
    ) -> Result<Self> {
        let mut config: Self = serde_json::from_value(value)?;
        if config.distro.is_none() {
            config.distro = distro_from_channels(channels);
            if let Some(distro) = &config.distro {
                debug!(%distro, "detected distribution from channels");
            }
        }
        let Some(distro) = &config.distro else {
            return Err(ResolveError::MissingDistro);
        };
        debug!(
            %distro,
            mappings = config.extra_package_mappings.len(),
            "parsed backend configuration"
        );
        Ok(config)
    }

    /// The configured or detected distribution name.
    pub fn distro(&self) -> &str {
        self.distro.as_deref().unwrap_or_default()
    }

    /// Whether to build a noarch package.
    pub fn is_noarch(&self) -> bool {
        self.noarch.unwrap_or(true)
    }

    /// Make relative paths absolute with respect to `manifest_root`.
    pub fn resolve_paths(&mut self, manifest_root: &Path) {
        if let Some(dir) = self.debug_dir.take() {
            self.debug_dir = Some(absolute(dir, manifest_root));
        }
        for source in &mut self.extra_package_mappings {
            match source {
                MappingSourceConfig::Path(path) | MappingSourceConfig::File { file: path } => {
                    *path = absolute(std::mem::take(path), manifest_root);
                }
                MappingSourceConfig::Wrapped { .. } | MappingSourceConfig::Inline(_) => {}
            }
        }
    }

    /// Paths of all file-backed mapping sources, in declared order.
    pub fn mapping_file_paths(&self) -> Vec<&Path> {
        self.extra_package_mappings
            .iter()
            .filter_map(MappingSourceConfig::file)
            .collect()
    }

    /// Materialize every mapping source in declared order, delegating file
    /// entries to `load_file`.
    pub fn mapping_sources_with<E>(
        &self,
        mut load_file: impl FnMut(&Path) -> std::result::Result<InlineMapping, E>,
    ) -> std::result::Result<Vec<InlineMapping>, E> {
        self.extra_package_mappings
            .iter()
            .map(|source| match source {
                MappingSourceConfig::Path(path) | MappingSourceConfig::File { file: path } => {
                    load_file(path.as_path())
                }
                MappingSourceConfig::Wrapped { mapping } | MappingSourceConfig::Inline(mapping) => {
                    Ok(mapping.clone())
                }
            })
            .collect()
    }
}

const ROBOSTACK_CHANNEL_PREFIX: &str = "robostack-";

/// Distribution named by the first `robostack-<distro>` channel.
///
/// Accepts short names (`robostack-humble`) and channel URLs, with or without
/// a trailing slash. `robostack-staging` is not a distribution and is skipped.
pub fn distro_from_channels<S: AsRef<str>>(channels: &[S]) -> Option<String> {
    channels.iter().find_map(|channel| {
        let name = channel.as_ref().trim().trim_end_matches('/').rsplit('/').next()?;
        let distro = name.strip_prefix(ROBOSTACK_CHANNEL_PREFIX)?;
        (!distro.is_empty() && distro != "staging").then(|| distro.to_string())
    })
}

fn absolute(path: PathBuf, root: &Path) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

/// Globs whose matches invalidate a cached build.
///
/// Python sources are only tracked for non-editable builds, since editable
/// installs pick up changes without rebuilding.
pub fn build_input_globs(config: &BackendConfig, editable: bool) -> Vec<String> {
    let mut globs: Vec<String> = BASE_INPUT_GLOBS.iter().map(|g| g.to_string()).collect();
    if !editable {
        globs.extend(PYTHON_INPUT_GLOBS.iter().map(|g| g.to_string()));
    }
    if let Some(extra) = &config.extra_input_globs {
        globs.extend(extra.iter().cloned());
    }
    globs
}
