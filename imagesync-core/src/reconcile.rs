//! Reconciliation engine: decide which declared images must be built.
//!
//! Decision per image line, given the declared version `V` and the highest
//! registry version `W`:
//!
//! | Observed      | Comparison | Decision     | In build set |
//! |---------------|------------|--------------|--------------|
//! | none          | -          | `FirstBuild` | yes          |
//! | `W`           | `V > W`    | `Newer`      | yes          |
//! | `W`           | `V == W`   | `UpToDate`   | no           |
//! | `W`           | `V < W`    | `Drift`      | no           |
//!
//! `Drift` means the config lags behind the registry. The registry is
//! authoritative for "already built", so it is reported and never rebuilt.
//!
//! Both entry points are pure: same inputs, same output, same order.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::ConfigError;
use crate::snapshot::HighestVersionMap;
use crate::types::{BuildSet, ImageName, ImageSpec};
use crate::version::{compare, Version};

/// Outcome for a single image line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "kebab-case")]
pub enum LineDecision {
    /// No valid tag for this line exists in the registry.
    FirstBuild,
    /// Declared version is newer than anything published.
    Newer { observed: Version },
    /// Declared version is already published.
    UpToDate { observed: Version },
    /// Registry holds a newer version than the one declared.
    Drift { observed: Version },
}

impl LineDecision {
    pub fn needs_build(&self) -> bool {
        matches!(self, LineDecision::FirstBuild | LineDecision::Newer { .. })
    }

    pub fn observed(&self) -> Option<&Version> {
        match self {
            LineDecision::FirstBuild => None,
            LineDecision::Newer { observed }
            | LineDecision::UpToDate { observed }
            | LineDecision::Drift { observed } => Some(observed),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineDecision::FirstBuild => "first build",
            LineDecision::Newer { .. } => "newer",
            LineDecision::UpToDate { .. } => "up to date",
            LineDecision::Drift { .. } => "drift",
        }
    }
}

/// Decision for one declared image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineOutcome {
    pub name: ImageName,
    pub declared: Version,
    #[serde(flatten)]
    pub decision: LineDecision,
}

/// Full reconciliation result: per-line decisions plus the derived build set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub lines: Vec<LineOutcome>,
    pub build_set: BuildSet,
}

impl Reconciliation {
    /// Lines whose declared version is behind the registry.
    pub fn drifted(&self) -> impl Iterator<Item = &LineOutcome> {
        self.lines
            .iter()
            .filter(|line| matches!(line.decision, LineDecision::Drift { .. }))
    }
}

/// Reconcile desired against observed and return only the build set.
pub fn reconcile(
    desired: &[ImageSpec],
    observed: &HighestVersionMap,
) -> Result<BuildSet, ConfigError> {
    reconcile_report(desired, observed).map(|r| r.build_set)
}

/// Reconcile desired against observed, keeping every per-line decision.
///
/// Fails with [`ConfigError::NoImagesDeclared`] before comparing anything when
/// `desired` is empty.
pub fn reconcile_report(
    desired: &[ImageSpec],
    observed: &HighestVersionMap,
) -> Result<Reconciliation, ConfigError> {
    if desired.is_empty() {
        return Err(ConfigError::NoImagesDeclared);
    }

    let mut lines = Vec::with_capacity(desired.len());
    let mut to_build = Vec::new();
    for spec in desired {
        let decision = decide(&spec.declared_version, observed.get(&spec.name));
        if decision.needs_build() {
            to_build.push(spec.clone());
        }
        lines.push(LineOutcome {
            name: spec.name.clone(),
            declared: spec.declared_version.clone(),
            decision,
        });
    }

    Ok(Reconciliation {
        lines,
        build_set: BuildSet::new(to_build),
    })
}

fn decide(declared: &Version, observed: Option<&Version>) -> LineDecision {
    let Some(observed) = observed else {
        return LineDecision::FirstBuild;
    };
    let observed = observed.clone();
    match compare(declared, &observed) {
        Ordering::Greater => LineDecision::Newer { observed },
        Ordering::Equal => LineDecision::UpToDate { observed },
        Ordering::Less => LineDecision::Drift { observed },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{ParseVersion, VersionScheme};

    fn v(raw: &str) -> Version {
        VersionScheme::Dotted.parse(raw).unwrap()
    }

    fn spec(name: &str, version: &str) -> ImageSpec {
        ImageSpec {
            name: ImageName::from(name),
            declared_version: v(version),
        }
    }

    fn observed(entries: &[(&str, &str)]) -> HighestVersionMap {
        entries
            .iter()
            .map(|(name, version)| (ImageName::from(*name), v(version)))
            .collect()
    }

    #[test]
    fn first_build_and_newer_preserve_input_order() {
        let desired = vec![spec("a", "1.3.0"), spec("b", "2.0.0")];
        let set = reconcile(&desired, &observed(&[("a", "1.2.0")])).unwrap();
        let names: Vec<_> = set.iter().map(|s| s.name.0.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(set.get(&ImageName::from("a")).unwrap().as_str(), "1.3.0");
        assert_eq!(set.get(&ImageName::from("b")).unwrap().as_str(), "2.0.0");
    }

    #[test]
    fn equal_versions_yield_empty_build_set() {
        let desired = vec![spec("a", "1.2.0")];
        let set = reconcile(&desired, &observed(&[("a", "1.2.0")])).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn older_declared_version_is_drift_not_error() {
        let desired = vec![spec("a", "1.1.0"), spec("b", "3.0.0")];
        let report =
            reconcile_report(&desired, &observed(&[("a", "1.2.0"), ("b", "2.9.9")])).unwrap();
        assert_eq!(report.build_set.len(), 1);
        assert!(report.build_set.get(&ImageName::from("b")).is_some());

        let drift: Vec<_> = report.drifted().map(|l| l.name.0.as_str()).collect();
        assert_eq!(drift, ["a"]);
        assert_eq!(
            report.lines[0].decision.observed().map(|o| o.as_str()),
            Some("1.2.0")
        );
    }

    #[test]
    fn empty_desired_is_a_configuration_error() {
        let err = reconcile(&[], &observed(&[("a", "1.0.0")])).unwrap_err();
        assert!(matches!(err, ConfigError::NoImagesDeclared));
    }

    #[test]
    fn reconcile_is_deterministic() {
        let desired = vec![spec("c", "1.0.0"), spec("a", "2.0.0"), spec("b", "0.1.0")];
        let obs = observed(&[("a", "1.0.0"), ("b", "0.1.0")]);
        let first = reconcile_report(&desired, &obs).unwrap();
        let second = reconcile_report(&desired, &obs).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.build_set).unwrap(),
            serde_json::to_string(&second.build_set).unwrap()
        );
    }

    #[test]
    fn decision_labels() {
        assert_eq!(LineDecision::FirstBuild.label(), "first build");
        assert!(LineDecision::FirstBuild.needs_build());
        assert!(!LineDecision::Drift { observed: v("1") }.needs_build());
    }

    #[test]
    fn line_outcome_json_shape() {
        let desired = vec![spec("a", "1.3.0")];
        let report = reconcile_report(&desired, &observed(&[("a", "1.2.0")])).unwrap();
        let json = serde_json::to_value(&report.lines[0]).unwrap();
        assert_eq!(json["name"], "a");
        assert_eq!(json["declared"], "1.3.0");
        assert_eq!(json["decision"], "newer");
        assert_eq!(json["observed"], "1.2.0");
    }
}
