//! Dependency name resolution.
//!
//! [`resolve`] turns one manifest dependency plus its normalized constraint
//! into conda package specifiers. The lookup order is:
//!
//! 1. distribution build tools (`ament_cmake`, ...) always map to the
//!    distribution's own package, unconstrained;
//! 2. names missing from the [`MappingTable`] become `ros-<distro>-<name>` if
//!    the distribution releases them, otherwise pass through unchanged;
//! 3. a `ros` branch maps to one distribution package per listed name;
//! 4. a `robostack`/`conda` branch maps to plain conda packages, after
//!    expanding the `REQUIRE_GL`/`REQUIRE_OPENGL` pseudo packages.
//!
//! Output order follows the mapping entry; nothing is sorted or deduplicated.

use tracing::{debug, trace};

use crate::constraint::{NormalizedConstraint, normalize};
use crate::dependency::Dependency;
use crate::distro::Distro;
use crate::error::{ResolveError, Result};
use crate::mapping::{MappingBranch, MappingTable, PackageList};
use crate::platform::TargetPlatform;

/// Packages that are part of every distribution's build toolchain.
pub const DISTRO_BUILD_TOOLS: [&str; 4] = [
    "ament_cmake",
    "ament_python",
    "rosidl_default_generators",
    "ros_workspace",
];

/// Pseudo package requesting the OpenGL development headers.
pub const REQUIRE_GL: &str = "REQUIRE_GL";

/// Pseudo package requesting OpenGL plus the X11 client libraries.
pub const REQUIRE_OPENGL: &str = "REQUIRE_OPENGL";

/// Resolve `dep` to package specifiers.
///
/// `constraint` must be the result of [`normalize`] for `dep`.
pub fn resolve(
    dep: &Dependency,
    constraint: &NormalizedConstraint,
    distro: &dyn Distro,
    target: TargetPlatform,
    table: &MappingTable,
) -> Result<Vec<String>> {
    if DISTRO_BUILD_TOOLS.contains(&dep.name.as_str()) {
        if dep.has_bounds() {
            debug!(dependency = %dep.name, "ignoring version bounds on distribution build tool");
        }
        trace!(dependency = %dep.name, "distribution build tool");
        return Ok(vec![distro.package_name(&dep.name)]);
    }

    let Some(entry) = table.get(&dep.name) else {
        if distro.has_package(&dep.name) {
            trace!(dependency = %dep.name, distro = distro.name(), "released in distribution");
            return Ok(vec![format!(
                "{}{constraint}",
                distro.package_name(&dep.name)
            )]);
        }
        trace!(dependency = %dep.name, "not mapped, passing through");
        return Ok(vec![format!("{}{constraint}", dep.name)]);
    };

    match entry.branch() {
        Some(MappingBranch::Ros(names)) => {
            trace!(dependency = %dep.name, count = names.len(), "mapped to ros packages");
            Ok(names
                .iter()
                .map(|name| format!("{}{constraint}", distro.package_name(name)))
                .collect())
        }
        Some(MappingBranch::Conda(list)) => {
            trace!(dependency = %dep.name, %target, "mapped to conda packages");
            conda_packages(&dep.name, list, constraint, target)
        }
        None => Err(ResolveError::UnknownMappingEntry(dep.name.clone())),
    }
}

fn conda_packages(
    dependency: &str,
    list: &PackageList,
    constraint: &NormalizedConstraint,
    target: TargetPlatform,
) -> Result<Vec<String>> {
    let mut packages = list.for_platform(target);
    let mut additional: Vec<String> = Vec::new();

    if take_token(&mut packages, REQUIRE_GL) && target.is_linux() {
        additional.push("libgl-devel".into());
    }
    if take_token(&mut packages, REQUIRE_OPENGL) {
        if target.is_linux() {
            additional.extend(["libgl-devel".into(), "libopengl-devel".into()]);
        }
        if target.is_unix() {
            additional.extend(["xorg-libx11".into(), "xorg-libxext".into()]);
        }
    }

    if !constraint.is_any() {
        match packages.as_mut_slice() {
            [single] if !single.contains(' ') => single.push_str(&constraint.to_string()),
            [single] => {
                return Err(ResolveError::AmbiguousVersionApplication {
                    dependency: dependency.to_string(),
                    reason: format!(
                        "the package map already constrains it as '{single}'"
                    ),
                });
            }
            many => {
                return Err(ResolveError::AmbiguousVersionApplication {
                    dependency: dependency.to_string(),
                    reason: format!(
                        "Version specifier can only be used for one package, but found {} packages in the package map",
                        many.len()
                    ),
                });
            }
        }
    }

    packages.extend(additional);
    Ok(packages)
}

/// Remove every occurrence of `token`, reporting whether it was present.
fn take_token(packages: &mut Vec<String>, token: &str) -> bool {
    let before = packages.len();
    packages.retain(|p| p != token);
    packages.len() != before
}

/// Resolution context for one package build.
///
/// Bundles the distribution, platform and mapping table so callers can
/// normalize and resolve dependencies one at a time.
pub struct DependencyResolver<'a> {
    distro: &'a dyn Distro,
    target: TargetPlatform,
    table: &'a MappingTable,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(distro: &'a dyn Distro, target: TargetPlatform, table: &'a MappingTable) -> Self {
        Self {
            distro,
            target,
            table,
        }
    }

    /// Normalize the bounds of `dep` and resolve it.
    pub fn resolve(&self, dep: &Dependency) -> Result<Vec<String>> {
        let constraint = normalize(dep)?;
        resolve(dep, &constraint, self.distro, self.target, self.table)
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::distro::{DistroGeneration, InMemoryDistro};
    use crate::mapping::{InlineMapping, MappingEntry};

    fn noetic() -> InMemoryDistro {
        InMemoryDistro::new("noetic", DistroGeneration::Ros1)
            .with_packages(["roscpp", "std_msgs", "rviz"])
    }

    fn table(entries: &[(&str, MappingEntry)]) -> MappingTable {
        let source: InlineMapping = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        MappingTable::load(&[source])
    }

    fn flat(names: &[&str]) -> PackageList {
        PackageList::FlatList(names.iter().map(|s| s.to_string()).collect())
    }

    fn range(spec: &str) -> NormalizedConstraint {
        // Helper only accepts the forms used below.
        let mut dep = Dependency::new("x");
        for part in spec.trim().split(',') {
            if let Some(v) = part.strip_prefix(">=") {
                dep.version_gte = Some(v.into());
            } else if let Some(v) = part.strip_prefix('<') {
                dep.version_lt = Some(v.into());
            }
        }
        normalize(&dep).unwrap()
    }

    fn run(
        name: &str,
        constraint: &NormalizedConstraint,
        target: TargetPlatform,
        table: &MappingTable,
    ) -> Result<Vec<String>> {
        resolve(&Dependency::new(name), constraint, &noetic(), target, table)
    }

    #[test]
    fn build_tools_ignore_table() {
        let t = table(&[("ament_cmake", MappingEntry::conda(flat(&["cmake"])))]);
        let specs = run(
            "ament_cmake",
            &NormalizedConstraint::Any,
            TargetPlatform::Linux,
            &t,
        )
        .unwrap();
        assert_eq!(specs, vec!["ros-noetic-ament-cmake"]);

        let specs = run(
            "ros_workspace",
            &range(">=1.0"),
            TargetPlatform::Linux,
            &MappingTable::new(),
        )
        .unwrap();
        assert_eq!(specs, vec!["ros-noetic-ros-workspace"]);
    }

    #[test]
    fn unmapped_distro_package() {
        let specs = run(
            "roscpp",
            &range("<2.0.0"),
            TargetPlatform::Linux,
            &MappingTable::new(),
        )
        .unwrap();
        assert_eq!(specs, vec!["ros-noetic-roscpp <2.0.0"]);

        let specs = run(
            "std_msgs",
            &NormalizedConstraint::Any,
            TargetPlatform::Win64,
            &MappingTable::new(),
        )
        .unwrap();
        assert_eq!(specs, vec!["ros-noetic-std-msgs"]);
    }

    #[test]
    fn unmapped_foreign_package_passes_through() {
        let specs = run(
            "python3_numpy",
            &range(">=1.20"),
            TargetPlatform::Osx,
            &MappingTable::new(),
        )
        .unwrap();
        assert_eq!(specs, vec!["python3_numpy >=1.20"]);
    }

    #[test]
    fn ros_branch_shares_constraint() {
        let t = table(&[(
            "rviz_bundle",
            MappingEntry::ros(["rviz", "rviz_common"]),
        )]);
        let specs = run("rviz_bundle", &range(">=1.14"), TargetPlatform::Linux, &t).unwrap();
        assert_eq!(
            specs,
            vec!["ros-noetic-rviz >=1.14", "ros-noetic-rviz-common >=1.14"]
        );
    }

    #[test]
    fn conda_single_package_takes_constraint() {
        let t = table(&[("qt5", MappingEntry::conda(flat(&["qt-main"])))]);
        let specs = run("qt5", &range(">=5.15.0,<5.16.0"), TargetPlatform::Linux, &t).unwrap();
        assert_eq!(specs, vec!["qt-main >=5.15.0,<5.16.0"]);
    }

    #[test]
    fn conda_multiple_packages_reject_constraint() {
        let t = table(&[("qt5", MappingEntry::conda(flat(&["qt-main", "qt-webengine"])))]);
        let err = run("qt5", &range(">=5.15.0"), TargetPlatform::Linux, &t).unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousVersionApplication { .. }));
        assert!(err.to_string().contains("found 2 packages"));

        // Without a constraint the list is returned as is.
        let specs = run("qt5", &NormalizedConstraint::Any, TargetPlatform::Linux, &t).unwrap();
        assert_eq!(specs, vec!["qt-main", "qt-webengine"]);
    }

    #[test]
    fn conda_preconstrained_package_rejects_constraint() {
        let t = table(&[("eigen", MappingEntry::conda(flat(&["eigen >=3.3"])))]);
        let err = run("eigen", &range("<4"), TargetPlatform::Linux, &t).unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousVersionApplication { .. }));

        let specs = run("eigen", &NormalizedConstraint::Any, TargetPlatform::Linux, &t).unwrap();
        assert_eq!(specs, vec!["eigen >=3.3"]);
    }

    #[test]
    fn conda_empty_list_rejects_constraint() {
        let mut by_platform = IndexMap::new();
        by_platform.insert("linux".to_string(), vec!["libusb".to_string()]);
        let t = table(&[("libusb", MappingEntry::conda(PackageList::ByPlatform(by_platform)))]);

        assert!(run("libusb", &NormalizedConstraint::Any, TargetPlatform::Win64, &t)
            .unwrap()
            .is_empty());
        assert!(matches!(
            run("libusb", &range(">=1.0"), TargetPlatform::Win64, &t),
            Err(ResolveError::AmbiguousVersionApplication { .. })
        ));
    }

    #[test]
    fn robostack_preferred_over_conda() {
        let entry = MappingEntry {
            conda: Some(flat(&["from-conda"])),
            robostack: Some(flat(&["from-robostack"])),
            ..MappingEntry::default()
        };
        let t = table(&[("dual", entry)]);
        let specs = run("dual", &NormalizedConstraint::Any, TargetPlatform::Linux, &t).unwrap();
        assert_eq!(specs, vec!["from-robostack"]);
    }

    #[test]
    fn opengl_expansion_on_linux() {
        let t = table(&[("gl_stack", MappingEntry::conda(flat(&["foo", REQUIRE_OPENGL])))]);
        let specs = run("gl_stack", &NormalizedConstraint::Any, TargetPlatform::Linux, &t).unwrap();
        assert_eq!(
            specs,
            vec![
                "foo",
                "libgl-devel",
                "libopengl-devel",
                "xorg-libx11",
                "xorg-libxext"
            ]
        );
    }

    #[test]
    fn opengl_expansion_per_platform() {
        let t = table(&[("gl_stack", MappingEntry::conda(flat(&[REQUIRE_OPENGL])))]);
        let osx = run("gl_stack", &NormalizedConstraint::Any, TargetPlatform::Osx, &t).unwrap();
        assert_eq!(osx, vec!["xorg-libx11", "xorg-libxext"]);
        let win = run("gl_stack", &NormalizedConstraint::Any, TargetPlatform::Win64, &t).unwrap();
        assert!(win.is_empty());
    }

    #[test]
    fn gl_expansion_linux_only() {
        let t = table(&[("gl", MappingEntry::conda(flat(&[REQUIRE_GL, "glew"])))]);
        let linux = run("gl", &NormalizedConstraint::Any, TargetPlatform::Linux, &t).unwrap();
        assert_eq!(linux, vec!["glew", "libgl-devel"]);
        let osx = run("gl", &NormalizedConstraint::Any, TargetPlatform::Osx, &t).unwrap();
        assert_eq!(osx, vec!["glew"]);
    }

    #[test]
    fn constraint_applies_before_expansion_packages() {
        let t = table(&[("glew", MappingEntry::conda(flat(&["glew", REQUIRE_GL])))]);
        let specs = run("glew", &range(">=2.1"), TargetPlatform::Linux, &t).unwrap();
        assert_eq!(specs, vec!["glew >=2.1", "libgl-devel"]);
    }

    #[test]
    fn empty_entry_is_unknown() {
        let t = table(&[("broken", MappingEntry::default())]);
        let err = run("broken", &NormalizedConstraint::Any, TargetPlatform::Linux, &t).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownMappingEntry(ref n) if n == "broken"));
    }

    #[test]
    fn resolver_normalizes_first() {
        let distro = noetic();
        let t = MappingTable::new();
        let resolver = DependencyResolver::new(&distro, TargetPlatform::Linux, &t);

        let dep = Dependency {
            version_eq: Some("1.15.0".into()),
            ..Dependency::new("roscpp")
        };
        assert_eq!(resolver.resolve(&dep).unwrap(), vec!["ros-noetic-roscpp==1.15.0"]);

        let dep = Dependency {
            version_eq: Some("1.15.0".into()),
            version_lt: Some("2.0".into()),
            ..Dependency::new("roscpp")
        };
        assert!(matches!(
            resolver.resolve(&dep),
            Err(ResolveError::ConflictingConstraints { .. })
        ));
    }
}
