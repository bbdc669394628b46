//! Translate ROS `package.xml` dependencies into conda package specifiers.
//!
//! This crate rewrites each manifest-level dependency declaration into one or
//! more literal conda match specs, resolving name translation through a
//! layered mapping table, ROS distribution prefixing, platform-conditional
//! pseudo packages, and version-bound validation. It does not install
//! anything and does no version solving.
//!
//! The pipeline for one package build:
//!
//! 1. [`MappingTable::load`] merges the configured [`MappingSource`]s;
//! 2. [`classify`] walks the manifest roles and, per active dependency,
//!    calls [`normalize`] and then [`resolve`];
//! 3. the resulting [`ConditionalRequirements`] may be merged with the
//!    project model's requirements via [`ConditionalRequirements::merge`].
//!
//! [`package_requirements`] runs steps 1 and 2 for a conda host platform;
//! [`recipe_requirements`] additionally adds the [`standard_requirements`]
//! toolchain and runs step 3.

mod config;
mod constraint;
mod dependency;
mod distro;
mod error;
mod mapping;
mod platform;
mod requirements;
mod resolver;

pub use config::{BackendConfig, MappingSourceConfig, build_input_globs, distro_from_channels};
pub use constraint::{Bound, NormalizedConstraint, Operator, normalize};
pub use dependency::{Dependency, DependencyRole, PackageDependencies};
pub use distro::{Distro, DistroGeneration, InMemoryDistro};
pub use error::{ResolveError, Result};
pub use mapping::{
    InlineMapping, MappingBranch, MappingEntry, MappingSource, MappingTable, PackageList,
};
pub use platform::TargetPlatform;
pub use rattler_conda_types::Platform;
pub use requirements::{
    BUILD_ROLES, COMPILER_C, COMPILER_CXX, ConditionalRequirements, RUN_ROLES,
    WORKSPACE_DEPENDENCY, classify, merge_specs, standard_requirements,
};
pub use resolver::{DISTRO_BUILD_TOOLS, DependencyResolver, REQUIRE_GL, REQUIRE_OPENGL, resolve};

/// Load the mapping table from `sources` and classify `dependencies` for
/// `host_platform`.
///
/// Fails with [`ResolveError::UnsupportedPlatform`] when the host is not a
/// linux, windows or osx subdir.
pub fn package_requirements<S: MappingSource>(
    dependencies: &PackageDependencies,
    distro: &dyn Distro,
    host_platform: Platform,
    sources: &[S],
) -> Result<ConditionalRequirements> {
    let target = TargetPlatform::from_host(host_platform)?;
    let table = MappingTable::load(sources);
    classify(dependencies, distro, target, &table)
}

/// Full requirement set of a recipe: the project model's requirements, then
/// those derived from the manifest, then the standard toolchain.
pub fn recipe_requirements<S: MappingSource>(
    model: &ConditionalRequirements,
    dependencies: &PackageDependencies,
    distro: &dyn Distro,
    host_platform: Platform,
    sources: &[S],
) -> Result<ConditionalRequirements> {
    let target = TargetPlatform::from_host(host_platform)?;
    let package = package_requirements(dependencies, distro, host_platform, sources)?;
    let package = ConditionalRequirements::merge(&package, &standard_requirements(target))?;
    ConditionalRequirements::merge(model, &package)
}
