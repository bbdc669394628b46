//! Error type shared by every resolution stage.
//!
//! All variants are terminal for the package being processed: inputs are
//! already in memory, so nothing is retried.

use thiserror::Error;

/// Errors raised while turning manifest dependencies into package specifiers.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A version bound is empty or does not parse as a version.
    #[error("incorrect version specification in package.xml for '{dependency}': {reason}")]
    InvalidVersionConstraint { dependency: String, reason: String },

    /// Mutually exclusive version bounds were combined.
    #[error("dependency '{dependency}' cannot be specified by both {conflict}")]
    ConflictingConstraints {
        dependency: String,
        conflict: &'static str,
    },

    /// A constraint could not be attached to exactly one unconstrained
    /// mapped package.
    #[error("version specifier for '{dependency}' cannot be applied: {reason}")]
    AmbiguousVersionApplication { dependency: String, reason: String },

    /// A mapping entry exists but has no `ros`, `conda` or `robostack` branch.
    #[error("unknown package map entry: {0}")]
    UnknownMappingEntry(String),

    /// The host platform is not linux, windows or osx.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Two specifiers for the same package could not be combined.
    #[error("cannot merge specifiers for '{package}': {reason}")]
    ConflictingSpecs { package: String, reason: String },

    /// A requirement string is not a valid match spec.
    #[error("cannot parse package specifier '{spec}': {reason}")]
    InvalidMatchSpec { spec: String, reason: String },

    /// Neither the configuration nor the channel list names a distribution.
    #[error(
        "ROS distro must be either set in the backend configuration or derivable from a robostack channel"
    )]
    MissingDistro,

    /// The backend configuration object is malformed.
    #[error("invalid backend configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
