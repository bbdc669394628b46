//! ROS distribution lookup.
//!
//! [`Distro`] answers whether a package is released in a distribution and
//! which generation the distribution belongs to. It is passed explicitly into
//! every resolution call. [`InMemoryDistro`] is a simple implementation for
//! embedders that already fetched the rosdistro index, and for tests.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Read-only view of a ROS distribution.
pub trait Distro {
    /// Distribution name, e.g. `"noetic"` or `"jazzy"`.
    fn name(&self) -> &str;

    /// Whether `package` is released in this distribution.
    fn has_package(&self, package: &str) -> bool;

    /// Whether this is a ROS 1 distribution.
    fn is_legacy_generation(&self) -> bool;

    /// Prefix of every conda package built from this distribution.
    fn package_prefix(&self) -> String {
        format!("ros-{}", self.name())
    }

    /// Conda package name of the ROS package `name`: `ros-<distro>-<name>`
    /// with underscores turned into dashes.
    fn package_name(&self, name: &str) -> String {
        format!("{}-{}", self.package_prefix(), name.replace('_', "-"))
    }
}

/// Generation of a ROS distribution, as reported by the rosdistro index
/// `distribution_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistroGeneration {
    /// ROS 1 (catkin based).
    Ros1,
    /// ROS 2 (ament based).
    Ros2,
}

impl fmt::Display for DistroGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistroGeneration::Ros1 => write!(f, "ros1"),
            DistroGeneration::Ros2 => write!(f, "ros2"),
        }
    }
}

/// Distribution backed by an in-memory package set.
#[derive(Debug, Clone)]
pub struct InMemoryDistro {
    name: String,
    generation: DistroGeneration,
    python_version: Option<String>,
    packages: HashSet<String>,
}

impl InMemoryDistro {
    /// Create a distribution with no released packages.
    pub fn new(name: impl Into<String>, generation: DistroGeneration) -> Self {
        Self {
            name: name.into(),
            generation,
            python_version: None,
            packages: HashSet::new(),
        }
    }

    /// Set the python version the distribution is built against.
    pub fn with_python_version(mut self, version: impl Into<String>) -> Self {
        self.python_version = Some(version.into());
        self
    }

    /// Add released packages.
    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages.extend(packages.into_iter().map(Into::into));
        self
    }

    /// Add a released package.
    pub fn add(&mut self, package: impl Into<String>) {
        self.packages.insert(package.into());
    }

    pub fn generation(&self) -> DistroGeneration {
        self.generation
    }

    pub fn python_version(&self) -> Option<&str> {
        self.python_version.as_deref()
    }

    /// Released package names, sorted.
    pub fn package_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.packages.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Distro for InMemoryDistro {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    fn is_legacy_generation(&self) -> bool {
        self.generation == DistroGeneration::Ros1
    }
}
