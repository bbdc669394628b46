//! Layered package mapping table.
//!
//! A mapping entry translates one rosdep key into the packages that provide
//! it. Entries come from several [`MappingSource`]s (the bundled robostack
//! table, user supplied overrides, ...) which [`MappingTable::load`] merges
//! into a single read-only table.
//!
//! ```yaml
//! boost:
//!   robostack: [libboost-devel]
//! opengl:
//!   robostack:
//!     linux: [REQUIRE_OPENGL]
//!     osx: [REQUIRE_OPENGL]
//!     win64: []
//! ros_environment:
//!   ros: [ros_environment]
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::platform::TargetPlatform;

/// Package names for a `conda` or `robostack` branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageList {
    /// Same packages on every platform.
    FlatList(Vec<String>),
    /// Packages keyed by platform token (`linux`, `win64`, `osx`).
    ByPlatform(IndexMap<String, Vec<String>>),
}

impl PackageList {
    /// Packages for `target`; a platform missing from a per-platform map
    /// yields an empty list.
    pub fn for_platform(&self, target: TargetPlatform) -> Vec<String> {
        match self {
            PackageList::FlatList(names) => names.clone(),
            PackageList::ByPlatform(by_platform) => by_platform
                .get(target.as_str())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl From<Vec<String>> for PackageList {
    fn from(names: Vec<String>) -> Self {
        PackageList::FlatList(names)
    }
}

/// One mapping-table entry.
///
/// Only one branch is consulted per resolution, in the order
/// `ros`, `robostack`, `conda` (see [`MappingEntry::branch`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// The key is itself released in the ROS distribution under these names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ros: Option<Vec<String>>,
    /// Plain conda packages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conda: Option<PackageList>,
    /// Conda packages as named by the robostack channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robostack: Option<PackageList>,
}

/// The branch of a [`MappingEntry`] selected for resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingBranch<'a> {
    Ros(&'a [String]),
    Conda(&'a PackageList),
}

impl MappingEntry {
    /// Entry pointing at other ROS packages.
    pub fn ros<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ros: Some(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Entry pointing at conda packages.
    pub fn conda(packages: impl Into<PackageList>) -> Self {
        Self {
            conda: Some(packages.into()),
            ..Self::default()
        }
    }

    /// Entry pointing at robostack-named conda packages.
    pub fn robostack(packages: impl Into<PackageList>) -> Self {
        Self {
            robostack: Some(packages.into()),
            ..Self::default()
        }
    }

    /// The branch to resolve with, or `None` if the entry has none.
    pub fn branch(&self) -> Option<MappingBranch<'_>> {
        if let Some(ros) = &self.ros {
            return Some(MappingBranch::Ros(ros));
        }
        self.robostack
            .as_ref()
            .or(self.conda.as_ref())
            .map(MappingBranch::Conda)
    }
}

/// A provider of mapping entries.
///
/// Reading entries from disk or the network is the implementor's concern;
/// the table only merges what sources hand over.
pub trait MappingSource {
    /// All entries of this source, keyed by rosdep name.
    fn entries(&self) -> IndexMap<String, MappingEntry>;
}

/// A mapping given inline, e.g. in the backend configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InlineMapping {
    entries: IndexMap<String, MappingEntry>,
}

impl InlineMapping {
    pub fn new(entries: IndexMap<String, MappingEntry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, MappingEntry)> for InlineMapping {
    fn from_iter<T: IntoIterator<Item = (String, MappingEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl MappingSource for InlineMapping {
    fn entries(&self) -> IndexMap<String, MappingEntry> {
        self.entries.clone()
    }
}

impl MappingSource for IndexMap<String, MappingEntry> {
    fn entries(&self) -> IndexMap<String, MappingEntry> {
        self.clone()
    }
}

impl<T: MappingSource + ?Sized> MappingSource for &T {
    fn entries(&self) -> IndexMap<String, MappingEntry> {
        (**self).entries()
    }
}

impl<T: MappingSource + ?Sized> MappingSource for Box<T> {
    fn entries(&self) -> IndexMap<String, MappingEntry> {
        (**self).entries()
    }
}

/// Merged, read-only name → entry table.
///
/// Keys keep the position at which they were first introduced; a later
/// source replaces the entry but not the position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: IndexMap<String, MappingEntry>,
}

impl MappingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `sources` in the order given; for a key present in several
    /// sources the last one wins.
    ///
    /// Sources of different kinds can be mixed through `&dyn MappingSource`
    /// or `Box<dyn MappingSource>`.
    pub fn load<S: MappingSource>(sources: &[S]) -> Self {
        let mut table = Self::new();
        for source in sources {
            table.merge(source);
        }
        if table.is_empty() {
            warn!("no package mappings loaded, dependencies resolve by name only");
        }
        debug!(
            sources = sources.len(),
            entries = table.len(),
            "loaded package mapping table"
        );
        table
    }

    /// Overlay the entries of `source` on top of this table.
    fn merge(&mut self, source: &dyn MappingSource) {
        self.entries.extend(source.entries());
    }

    pub fn get(&self, name: &str) -> Option<&MappingEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
