//! Build/host/run requirement classification.
//!
//! [`classify`] partitions a package's manifest dependencies by role,
//! resolves each of them, and flattens the specifiers into a
//! [`ConditionalRequirements`]:
//!
//! - **build**: `buildtool`, `buildtool_export`, `build`, `build_export` and
//!   `test` dependencies, plus `ros_workspace` on ROS 2 distributions;
//! - **host**: identical to build;
//! - **run**: `run`, `exec`, `build_export` and `buildtool_export`
//!   dependencies.
//!
//! [`merge_specs`] combines these with requirements declared elsewhere (the
//! project model, the [`standard_requirements`] toolchain) without
//! duplicating package names.

use rattler_conda_types::{MatchSpec, ParseStrictness};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::dependency::{Dependency, DependencyRole, PackageDependencies};
use crate::distro::Distro;
use crate::error::{ResolveError, Result};
use crate::mapping::MappingTable;
use crate::platform::TargetPlatform;
use crate::resolver::DependencyResolver;

/// Roles that end up in the build (and host) requirements.
pub const BUILD_ROLES: [DependencyRole; 5] = [
    DependencyRole::Buildtool,
    DependencyRole::BuildtoolExport,
    DependencyRole::Build,
    DependencyRole::BuildExport,
    DependencyRole::Test,
];

/// Roles that end up in the run requirements.
pub const RUN_ROLES: [DependencyRole; 4] = [
    DependencyRole::Run,
    DependencyRole::Exec,
    DependencyRole::BuildExport,
    DependencyRole::BuildtoolExport,
];

/// Dependency injected into the build requirements of ROS 2 packages.
pub const WORKSPACE_DEPENDENCY: &str = "ros_workspace";

/// Package specifiers per requirement section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalRequirements {
    pub build: Vec<String>,
    pub host: Vec<String>,
    pub run: Vec<String>,
}

impl ConditionalRequirements {
    /// Merge manifest-derived requirements into those of the project model.
    ///
    /// Each section is merged independently with [`merge_specs`], the model
    /// side acting as the base.
    pub fn merge(model: &Self, package: &Self) -> Result<Self> {
        Ok(Self {
            build: merge_specs(&model.build, &package.build)?,
            host: merge_specs(&model.host, &package.host)?,
            run: merge_specs(&model.run, &package.run)?,
        })
    }
}

/// Resolve every active dependency of a package into requirement sections.
///
/// Any error aborts the whole classification.
pub fn classify(
    dependencies: &PackageDependencies,
    distro: &dyn Distro,
    target: TargetPlatform,
    table: &MappingTable,
) -> Result<ConditionalRequirements> {
    let resolver = DependencyResolver::new(distro, target, table);
    for (role, entries) in dependencies.iter_roles() {
        trace!(%role, count = entries.len(), "manifest dependencies");
    }

    let mut build = resolve_all(&resolver, dependencies.active(&BUILD_ROLES))?;
    if !distro.is_legacy_generation() {
        build.extend(resolver.resolve(&Dependency::new(WORKSPACE_DEPENDENCY))?);
    }
    let run = resolve_all(&resolver, dependencies.active(&RUN_ROLES))?;

    debug!(
        distro = distro.name(),
        %target,
        build = build.len(),
        run = run.len(),
        "classified package requirements"
    );

    Ok(ConditionalRequirements {
        host: build.clone(),
        build,
        run,
    })
}

fn resolve_all(resolver: &DependencyResolver<'_>, deps: Vec<&Dependency>) -> Result<Vec<String>> {
    let mut specs = Vec::new();
    for dep in deps {
        specs.extend(resolver.resolve(dep)?);
    }
    Ok(specs)
}

/// Recipe template for the C compiler.
pub const COMPILER_C: &str = "${{ compiler('c') }}";

/// Recipe template for the C++ compiler.
pub const COMPILER_CXX: &str = "${{ compiler('cxx') }}";

const STANDARD_BUILD: [&str; 7] = [
    "ninja",
    "python",
    "setuptools",
    "git",
    "git-lfs",
    "cmake",
    "cpython",
];

const STANDARD_HOST: [&str; 4] = ["python", "numpy", "pip", "pkg-config"];

/// Toolchain every ROS package build needs regardless of its manifest.
pub fn standard_requirements(target: TargetPlatform) -> ConditionalRequirements {
    let mut build: Vec<String> = STANDARD_BUILD.iter().map(|s| s.to_string()).collect();
    match target {
        TargetPlatform::Linux => build.extend(["patch", "make", "coreutils"].map(String::from)),
        TargetPlatform::Osx => {
            build.extend(["patch", "make", "coreutils", "tapi"].map(String::from))
        }
        TargetPlatform::Win64 => build.push("m2-patch".to_string()),
    }
    build.extend([COMPILER_C, COMPILER_CXX].map(String::from));

    ConditionalRequirements {
        build,
        host: STANDARD_HOST.iter().map(|s| s.to_string()).collect(),
        run: Vec::new(),
    }
}

/// Merge `package` specifiers into `base`.
///
/// Specifiers are parsed as conda match specs and keyed by package name.
/// Specifiers whose package name is not yet present are appended. For a name
/// already present the version constraints are combined in place:
///
/// - a missing or `*` constraint yields to the other side;
/// - an `==` constraint wins over any inequality;
/// - otherwise both are kept, comma separated, base first.
///
/// A spec carrying a build string cannot be combined and fails with
/// [`ResolveError::ConflictingSpecs`]. Recipe templates such as
/// [`COMPILER_C`] are not match specs; they are deduplicated verbatim.
pub fn merge_specs(base: &[String], package: &[String]) -> Result<Vec<String>> {
    let mut merged: Vec<(String, ParsedSpec)> = base
        .iter()
        .map(|spec| -> Result<(String, ParsedSpec)> {
            Ok((spec.clone(), ParsedSpec::parse(spec)?))
        })
        .collect::<Result<_>>()?;

    for spec in package {
        let parsed = ParsedSpec::parse(spec)?;
        let Some(name) = parsed.name.clone() else {
            if !merged.iter().any(|(existing, _)| existing == spec) {
                merged.push((spec.clone(), parsed));
            }
            continue;
        };

        match merged
            .iter_mut()
            .find(|(_, existing)| existing.name.as_deref() == Some(name.as_str()))
        {
            None => merged.push((spec.clone(), parsed)),
            Some((text, existing)) => {
                let version = combine_constraints(&name, existing, &parsed)?;
                *text = match &version {
                    Some(v) => format!("{name} {v}"),
                    None => name.clone(),
                };
                existing.version = version;
            }
        }
    }

    Ok(merged.into_iter().map(|(text, _)| text).collect())
}

/// Name, version and build of one requirement string.
#[derive(Debug)]
struct ParsedSpec {
    /// `None` for recipe templates.
    name: Option<String>,
    version: Option<String>,
    build: Option<String>,
}

impl ParsedSpec {
    fn parse(spec: &str) -> Result<Self> {
        if spec.trim_start().starts_with("${{") {
            return Ok(Self {
                name: None,
                version: None,
                build: None,
            });
        }
        let parsed = MatchSpec::from_str(spec, ParseStrictness::Lenient).map_err(|e| {
            ResolveError::InvalidMatchSpec {
                spec: spec.to_string(),
                reason: e.to_string(),
            }
        })?;
        let Some(name) = parsed.name else {
            return Err(ResolveError::InvalidMatchSpec {
                spec: spec.to_string(),
                reason: "missing package name".to_string(),
            });
        };
        Ok(Self {
            name: Some(name.as_normalized().to_string()),
            version: parsed.version.map(|v| v.to_string()),
            build: parsed.build.map(|b| b.to_string()),
        })
    }

    /// The version constraint, with `*` treated as absent.
    fn constraint(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| *v != "*")
    }
}

fn combine_constraints(
    package: &str,
    base: &ParsedSpec,
    other: &ParsedSpec,
) -> Result<Option<String>> {
    for spec in [base, other] {
        if let Some(build) = &spec.build {
            return Err(ResolveError::ConflictingSpecs {
                package: package.to_string(),
                reason: format!(
                    "constraint '{} {build}' contains spaces",
                    spec.version.as_deref().unwrap_or("*")
                ),
            });
        }
    }

    let combined = match (base.constraint(), other.constraint()) {
        (None, None) => None,
        (Some(c), None) | (None, Some(c)) => Some(c.to_string()),
        (Some(b), Some(o)) if b == o => Some(b.to_string()),
        (Some(b), _) if b.starts_with("==") => Some(b.to_string()),
        (_, Some(o)) if o.starts_with("==") => Some(o.to_string()),
        (Some(b), Some(o)) => Some(format!("{b},{o}")),
    };
    Ok(combined)
}
