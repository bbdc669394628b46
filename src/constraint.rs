//! Version bound normalization.
//!
//! `package.xml` expresses version requirements as up to five attributes
//! (`version_lt`, `version_lte`, `version_gt`, `version_gte`, `version_eq`).
//! [`normalize`] validates them and folds them into a [`NormalizedConstraint`]
//! whose [`Display`](fmt::Display) form is the nameless part of a conda
//! match spec.
//!
//! | Bounds | Rendered |
//! |--------|----------|
//! | none | `""` |
//! | `eq=1.2` | `"==1.2"` |
//! | `gte=1.0` | `" >=1.0"` |
//! | `gt=1.0`, `lte=2.0` | `" >1.0,<=2.0"` |
//!
//! Inequalities are rendered with a leading space so the result can be
//! appended directly to a package name.

use std::fmt;
use std::str::FromStr;

use rattler_conda_types::Version;

use crate::dependency::Dependency;
use crate::error::{ResolveError, Result};

/// Comparison operator of a single bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Greater => write!(f, ">"),
            Operator::GreaterOrEqual => write!(f, ">="),
            Operator::Less => write!(f, "<"),
            Operator::LessOrEqual => write!(f, "<="),
        }
    }
}

/// One side of a version range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bound {
    pub operator: Operator,
    /// The version exactly as written in the manifest.
    pub version: String,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// Canonical constraint derived from a dependency's bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NormalizedConstraint {
    /// No bound given.
    #[default]
    Any,
    /// `version_eq`.
    Exact(String),
    /// At most one lower and at most one upper bound; never both `None`.
    Range {
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
}

impl NormalizedConstraint {
    /// Whether this constraint renders as the empty string.
    pub fn is_any(&self) -> bool {
        matches!(self, NormalizedConstraint::Any)
    }
}

impl fmt::Display for NormalizedConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedConstraint::Any => Ok(()),
            NormalizedConstraint::Exact(version) => write!(f, "=={version}"),
            NormalizedConstraint::Range { lower, upper } => {
                let mut sep = " ";
                for bound in [lower, upper].into_iter().flatten() {
                    write!(f, "{sep}{bound}")?;
                    sep = ",";
                }
                Ok(())
            }
        }
    }
}

/// Validate the bounds of `dep` and fold them into a constraint.
///
/// Fails with [`ResolveError::InvalidVersionConstraint`] for empty or
/// unparsable versions and with [`ResolveError::ConflictingConstraints`] when
/// `<` and `<=`, `>` and `>=`, or `==` and any inequality are combined.
pub fn normalize(dep: &Dependency) -> Result<NormalizedConstraint> {
    for version in [
        &dep.version_gt,
        &dep.version_gte,
        &dep.version_lt,
        &dep.version_lte,
        &dep.version_eq,
    ]
    .into_iter()
    .flatten()
    {
        check_version(&dep.name, version)?;
    }

    let conflict = |conflict| ResolveError::ConflictingConstraints {
        dependency: dep.name.clone(),
        conflict,
    };

    if dep.version_lt.is_some() && dep.version_lte.is_some() {
        return Err(conflict("`<` and `<=`"));
    }
    if dep.version_gt.is_some() && dep.version_gte.is_some() {
        return Err(conflict("`>` and `>=`"));
    }

    let lower = bound(Operator::Greater, &dep.version_gt)
        .or_else(|| bound(Operator::GreaterOrEqual, &dep.version_gte));
    let upper = bound(Operator::Less, &dep.version_lt)
        .or_else(|| bound(Operator::LessOrEqual, &dep.version_lte));

    match (&dep.version_eq, lower, upper) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
            Err(conflict("`==` and some inequality"))
        }
        (Some(eq), None, None) => Ok(NormalizedConstraint::Exact(eq.clone())),
        (None, None, None) => Ok(NormalizedConstraint::Any),
        (None, lower, upper) => Ok(NormalizedConstraint::Range { lower, upper }),
    }
}

fn bound(operator: Operator, version: &Option<String>) -> Option<Bound> {
    version.as_ref().map(|version| Bound {
        operator,
        version: version.clone(),
    })
}

fn check_version(dependency: &str, version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(ResolveError::InvalidVersionConstraint {
            dependency: dependency.to_string(),
            reason: "version is empty string (\"\")".to_string(),
        });
    }
    Version::from_str(version).map_err(|e| ResolveError::InvalidVersionConstraint {
        dependency: dependency.to_string(),
        reason: format!("cannot parse version '{version}': {e}"),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep() -> Dependency {
        Dependency::new("roscpp")
    }

    fn some(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn rendered(dep: &Dependency) -> String {
        normalize(dep).unwrap().to_string()
    }

    #[test]
    fn no_bounds_is_empty() {
        let c = normalize(&dep()).unwrap();
        assert!(c.is_any());
        assert_eq!(c.to_string(), "");
    }

    #[test]
    fn equality() {
        let d = Dependency {
            version_eq: some("1.2.3"),
            ..dep()
        };
        assert_eq!(rendered(&d), "==1.2.3");
    }

    #[test]
    fn single_bounds_have_leading_space() {
        let d = Dependency {
            version_lt: some("2.0.0"),
            ..dep()
        };
        assert_eq!(rendered(&d), " <2.0.0");

        let d = Dependency {
            version_gte: some("1.0"),
            ..dep()
        };
        assert_eq!(rendered(&d), " >=1.0");
    }

    #[test]
    fn lower_before_upper() {
        let d = Dependency {
            version_lte: some("5.16.0"),
            version_gt: some("5.15.0"),
            ..dep()
        };
        assert_eq!(rendered(&d), " >5.15.0,<=5.16.0");

        let d = Dependency {
            version_lt: some("5.16.0"),
            version_gte: some("5.15.0"),
            ..dep()
        };
        assert_eq!(rendered(&d), " >=5.15.0,<5.16.0");
    }

    #[test]
    fn equality_with_inequality_conflicts() {
        for d in [
            Dependency {
                version_eq: some("1.0"),
                version_lt: some("2.0"),
                ..dep()
            },
            Dependency {
                version_eq: some("1.0"),
                version_lte: some("2.0"),
                ..dep()
            },
            Dependency {
                version_eq: some("1.0"),
                version_gt: some("0.5"),
                ..dep()
            },
            Dependency {
                version_eq: some("1.0"),
                version_gte: some("0.5"),
                ..dep()
            },
        ] {
            let err = normalize(&d).unwrap_err();
            assert!(
                matches!(err, ResolveError::ConflictingConstraints { conflict, .. } if conflict.contains("==")),
                "{d:?}"
            );
        }
    }

    #[test]
    fn both_upper_bounds_conflict() {
        let d = Dependency {
            version_lt: some("2.0"),
            version_lte: some("2.0"),
            ..dep()
        };
        assert!(matches!(
            normalize(&d),
            Err(ResolveError::ConflictingConstraints { .. })
        ));
    }

    #[test]
    fn both_lower_bounds_conflict() {
        let d = Dependency {
            version_gt: some("1.0"),
            version_gte: some("1.0"),
            ..dep()
        };
        let err = normalize(&d).unwrap_err();
        assert_eq!(
            err.to_string(),
            "dependency 'roscpp' cannot be specified by both `>` and `>=`"
        );
    }

    #[test]
    fn empty_version_is_invalid() {
        let d = Dependency {
            version_gte: some(""),
            ..dep()
        };
        let err = normalize(&d).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidVersionConstraint { ref dependency, .. } if dependency == "roscpp"
        ));
    }

    #[test]
    fn unparsable_version_is_invalid() {
        let d = Dependency {
            version_lt: some("1.0$beta"),
            ..dep()
        };
        assert!(matches!(
            normalize(&d),
            Err(ResolveError::InvalidVersionConstraint { .. })
        ));
    }

    #[test]
    fn validation_runs_before_conflict_checks() {
        let d = Dependency {
            version_lt: some(""),
            version_lte: some("2.0"),
            ..dep()
        };
        assert!(matches!(
            normalize(&d),
            Err(ResolveError::InvalidVersionConstraint { .. })
        ));
    }
}
