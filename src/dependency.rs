//! Manifest-level dependency declarations.
//!
//! A [`Dependency`] is one `<*_depend>` element of a `package.xml` after its
//! `condition` attribute has been evaluated. [`PackageDependencies`] groups
//! them by the role the manifest declares.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One declared dependency with optional version bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Upstream (rosdep) key.
    pub name: String,
    #[serde(default)]
    pub version_lt: Option<String>,
    #[serde(default)]
    pub version_lte: Option<String>,
    #[serde(default)]
    pub version_gt: Option<String>,
    #[serde(default)]
    pub version_gte: Option<String>,
    #[serde(default)]
    pub version_eq: Option<String>,
    /// Result of evaluating the `condition` attribute; `true` when absent.
    #[serde(default = "default_condition")]
    pub evaluated_condition: bool,
}

fn default_condition() -> bool {
    true
}

impl Dependency {
    /// An unconstrained, unconditional dependency.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_lt: None,
            version_lte: None,
            version_gt: None,
            version_gte: None,
            version_eq: None,
            evaluated_condition: true,
        }
    }

    /// Whether any version bound is set.
    pub fn has_bounds(&self) -> bool {
        [
            &self.version_lt,
            &self.version_lte,
            &self.version_gt,
            &self.version_gte,
            &self.version_eq,
        ]
        .iter()
        .any(|b| b.is_some())
    }
}

/// Dependency lists separated by `package.xml` role.
///
/// Each field corresponds to one manifest element:
/// - `buildtool_depends`: `<buildtool_depend>`
/// - `buildtool_export_depends`: `<buildtool_export_depend>`
/// - `build_depends`: `<build_depend>`
/// - `build_export_depends`: `<build_export_depend>`
/// - `exec_depends`: `<exec_depend>`
/// - `run_depends`: `<run_depend>` (format 1 manifests)
/// - `test_depends`: `<test_depend>`
///
/// `<depend>` is expected to have been expanded into build, build-export and
/// exec by the manifest parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageDependencies {
    pub buildtool_depends: Vec<Dependency>,
    pub buildtool_export_depends: Vec<Dependency>,
    pub build_depends: Vec<Dependency>,
    pub build_export_depends: Vec<Dependency>,
    pub exec_depends: Vec<Dependency>,
    pub run_depends: Vec<Dependency>,
    pub test_depends: Vec<Dependency>,
}

impl PackageDependencies {
    /// Iterate over all roles and their entries.
    pub fn iter_roles(&self) -> impl Iterator<Item = (DependencyRole, &[Dependency])> {
        [
            (DependencyRole::Buildtool, self.buildtool_depends.as_slice()),
            (
                DependencyRole::BuildtoolExport,
                self.buildtool_export_depends.as_slice(),
            ),
            (DependencyRole::Build, self.build_depends.as_slice()),
            (DependencyRole::BuildExport, self.build_export_depends.as_slice()),
            (DependencyRole::Exec, self.exec_depends.as_slice()),
            (DependencyRole::Run, self.run_depends.as_slice()),
            (DependencyRole::Test, self.test_depends.as_slice()),
        ]
        .into_iter()
        .filter(|(_, entries)| !entries.is_empty())
    }

    /// Entries of the given roles, in role order, whose condition holds.
    pub fn active(&self, roles: &[DependencyRole]) -> Vec<&Dependency> {
        roles
            .iter()
            .flat_map(|role| self.of_role(*role))
            .filter(|dep| dep.evaluated_condition)
            .collect()
    }

    /// Entries declared for a single role.
    pub fn of_role(&self, role: DependencyRole) -> &[Dependency] {
        match role {
            DependencyRole::Buildtool => &self.buildtool_depends,
            DependencyRole::BuildtoolExport => &self.buildtool_export_depends,
            DependencyRole::Build => &self.build_depends,
            DependencyRole::BuildExport => &self.build_export_depends,
            DependencyRole::Exec => &self.exec_depends,
            DependencyRole::Run => &self.run_depends,
            DependencyRole::Test => &self.test_depends,
        }
    }
}

/// `package.xml` dependency role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyRole {
    Buildtool,
    BuildtoolExport,
    Build,
    BuildExport,
    Exec,
    Run,
    Test,
}

impl fmt::Display for DependencyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyRole::Buildtool => write!(f, "buildtool_depend"),
            DependencyRole::BuildtoolExport => write!(f, "buildtool_export_depend"),
            DependencyRole::Build => write!(f, "build_depend"),
            DependencyRole::BuildExport => write!(f, "build_export_depend"),
            DependencyRole::Exec => write!(f, "exec_depend"),
            DependencyRole::Run => write!(f, "run_depend"),
            DependencyRole::Test => write!(f, "test_depend"),
        }
    }
}
