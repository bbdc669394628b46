//! Example: turn the dependencies of a small ROS package into conda specs.
//!
//! Builds a jazzy distribution with a handful of released packages, layers a
//! project override over a robostack-style mapping table, and classifies the
//! same manifest for linux-64, osx-arm64 and win-64 to show how
//! platform-keyed entries and the OpenGL pseudo packages expand. The
//! distribution is detected from the channel list and the standard
//! toolchain is added on top of the manifest requirements.

use rosdep_conda::{
    BackendConfig, ConditionalRequirements, Dependency, DistroGeneration, InMemoryDistro,
    InlineMapping, PackageDependencies, Platform, package_requirements, recipe_requirements,
};
use serde_json::json;

fn robostack() -> InlineMapping {
    serde_json::from_value(json!({
        "eigen": { "robostack": ["eigen"] },
        "boost": { "robostack": ["libboost-devel", "libboost-python-devel"] },
        "opengl": {
            "robostack": {
                "linux": ["REQUIRE_OPENGL"],
                "osx": ["REQUIRE_OPENGL"],
                "win64": []
            }
        },
        "libusb-1.0": {
            "robostack": { "linux": ["libusb"], "osx": ["libusb"], "win64": [] }
        },
        "python3-numpy": { "robostack": ["numpy"] }
    }))
    .unwrap()
}

fn manifest() -> PackageDependencies {
    PackageDependencies {
        buildtool_depends: vec![Dependency::new("ament_cmake")],
        build_depends: vec![
            Dependency::new("rclcpp"),
            Dependency {
                version_gte: Some("3.3".into()),
                ..Dependency::new("eigen")
            },
            Dependency::new("opengl"),
            Dependency::new("libusb-1.0"),
            Dependency::new("my_vendor_lib"),
        ],
        build_export_depends: vec![Dependency::new("sensor_msgs")],
        exec_depends: vec![Dependency::new("python3-numpy"), Dependency::new("boost")],
        test_depends: vec![Dependency::new("ament_lint_auto")],
        ..PackageDependencies::default()
    }
}

fn print(platform: Platform, reqs: &ConditionalRequirements) {
    println!("== {platform} ==");
    println!("  build: {:?}", reqs.build);
    println!("  host:  {:?}", reqs.host);
    println!("  run:   {:?}", reqs.run);
}

fn main() {
    // The distribution is taken from the robostack channel.
    let config = BackendConfig::from_value_with_channels(
        json!({
            "extra-package-mappings": [
                { "mapping": { "my_vendor_lib": { "conda": ["vendor-lib", "vendor-lib-devel"] } } }
            ]
        }),
        &["https://prefix.dev/robostack-jazzy", "conda-forge"],
    )
    .unwrap();

    let distro = InMemoryDistro::new(config.distro(), DistroGeneration::Ros2)
        .with_python_version("3.12")
        .with_packages(["rclcpp", "sensor_msgs", "ament_lint_auto"]);

    let mut sources = vec![robostack()];
    sources.extend(
        config
            .mapping_sources_with(|path| Err(format!("no loader for {}", path.display())))
            .unwrap(),
    );

    let deps = manifest();
    for platform in [Platform::Linux64, Platform::OsxArm64, Platform::Win64] {
        let model = ConditionalRequirements::default();
        match recipe_requirements(&model, &deps, &distro, platform, &sources) {
            Ok(reqs) => print(platform, &reqs),
            Err(e) => println!("== {platform} ==\n  error: {e}"),
        }
    }

    // A version bound on a multi-package entry is rejected.
    let ambiguous = PackageDependencies {
        build_depends: vec![Dependency {
            version_gte: Some("1.0".into()),
            ..Dependency::new("my_vendor_lib")
        }],
        ..PackageDependencies::default()
    };
    if let Err(e) = package_requirements(&ambiguous, &distro, Platform::Linux64, &sources) {
        println!("expected failure: {e}");
    }
}
