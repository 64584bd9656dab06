//! Version model: parse raw version strings into a totally ordered [`Version`].
//!
//! The grammar is pluggable: anything implementing [`ParseVersion`] can feed
//! the snapshot reducer and the reconciliation engine. [`VersionScheme`] ships
//! the two grammars used by image configs and registry tags today:
//!
//! | Scheme       | Accepts                          | Components          |
//! |--------------|----------------------------------|---------------------|
//! | `dotted`     | `1.2.0`, `v10`, `0.0.15`         | `[1, 2]`, `[10]`, `[0, 0, 15]` |
//! | `date-build` | `20240115`, `20240115-3`         | `[20240115]`, `[20240115, 3]`  |
//!
//! Ordering is lexicographic over numeric components; trailing zero
//! components carry no weight, so `1.2` and `1.2.0` compare equal.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A raw string that cannot be placed in the version order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty version string")]
    Empty,

    #[error("invalid version '{raw}': {reason}")]
    Invalid { raw: String, reason: String },
}

fn invalid(raw: &str, reason: impl Into<String>) -> ParseError {
    ParseError::Invalid {
        raw: raw.to_string(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// A parsed, comparable version.
///
/// Equality, ordering and hashing look only at the numeric components; the
/// raw string is kept for display and for building image tags.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    components: Vec<u64>,
}

impl Version {
    /// Build a version from already-decomposed components.
    ///
    /// Custom [`ParseVersion`] implementations use this to hand their result
    /// to the engine.
    pub fn from_components(raw: impl Into<String>, mut components: Vec<u64>) -> Self {
        while components.last() == Some(&0) {
            components.pop();
        }
        Version {
            raw: raw.into(),
            components,
        }
    }

    /// The string this version was parsed from, trimmed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Significant numeric components (trailing zeros removed).
    pub fn components(&self) -> &[u64] {
        &self.components
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt(f)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Three-way comparison under the version total order.
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp(b)
}

// ---------------------------------------------------------------------------
// Parsing strategy
// ---------------------------------------------------------------------------

/// A version grammar.
pub trait ParseVersion {
    fn parse(&self, raw: &str) -> Result<Version, ParseError>;
}

/// Built-in version grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionScheme {
    /// `v?N(.N)*`
    #[default]
    Dotted,
    /// `YYYYMMDD([-.]N)?`
    DateBuild,
}

impl ParseVersion for VersionScheme {
    fn parse(&self, raw: &str) -> Result<Version, ParseError> {
        match self {
            VersionScheme::Dotted => parse_dotted(raw),
            VersionScheme::DateBuild => parse_date_build(raw),
        }
    }
}

impl fmt::Display for VersionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionScheme::Dotted => write!(f, "dotted"),
            VersionScheme::DateBuild => write!(f, "date-build"),
        }
    }
}

impl FromStr for VersionScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dotted" => Ok(VersionScheme::Dotted),
            "date-build" => Ok(VersionScheme::DateBuild),
            other => Err(format!(
                "unknown version scheme '{other}'; expected: dotted, date-build"
            )),
        }
    }
}

fn parse_dotted(raw: &str) -> Result<Version, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    let body = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    if body.is_empty() {
        return Err(invalid(raw, "no numeric components"));
    }

    let components = body
        .split('.')
        .map(|part| parse_component(raw, part))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Version::from_components(trimmed, components))
}

fn parse_date_build(raw: &str) -> Result<Version, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let (date, build) = match trimmed.split_once(|c: char| c == '-' || c == '.') {
        Some((date, build)) => (date, Some(build)),
        None => (trimmed, None),
    };

    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(raw, format!("'{date}' is not a YYYYMMDD date")));
    }
    NaiveDate::parse_from_str(date, "%Y%m%d")
        .map_err(|_| invalid(raw, format!("'{date}' is not a calendar date")))?;

    let mut components = vec![parse_component(raw, date)?];
    if let Some(build) = build {
        components.push(parse_component(raw, build)?);
    }
    Ok(Version::from_components(trimmed, components))
}

fn parse_component(raw: &str, part: &str) -> Result<u64, ParseError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(raw, format!("component '{part}' is not a number")));
    }
    part.parse::<u64>()
        .map_err(|_| invalid(raw, format!("component '{part}' is out of range")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dotted(raw: &str) -> Version {
        VersionScheme::Dotted.parse(raw).expect("parse")
    }

    #[rstest]
    #[case("1.2.0", &[1, 2])]
    #[case("v10", &[10])]
    #[case("V3.1", &[3, 1])]
    #[case("0.0.15", &[0, 0, 15])]
    #[case(" 2.0 ", &[2])]
    fn dotted_components(#[case] raw: &str, #[case] expected: &[u64]) {
        assert_eq!(dotted(raw).components(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("v")]
    #[case("1..2")]
    #[case("1.2-rc1")]
    #[case("latest")]
    #[case("1.x")]
    #[case("99999999999999999999999")]
    fn dotted_rejects(#[case] raw: &str) {
        assert!(VersionScheme::Dotted.parse(raw).is_err(), "'{raw}' should not parse");
    }

    #[rstest]
    #[case("20240115", &[20240115])]
    #[case("20240115-3", &[20240115, 3])]
    #[case("20240115.12", &[20240115, 12])]
    fn date_build_components(#[case] raw: &str, #[case] expected: &[u64]) {
        let v = VersionScheme::DateBuild.parse(raw).expect("parse");
        assert_eq!(v.components(), expected);
    }

    #[rstest]
    #[case("2024011")]
    #[case("20241345")]
    #[case("20240115-")]
    #[case("20240115-b")]
    #[case("1.2.0")]
    fn date_build_rejects(#[case] raw: &str) {
        assert!(VersionScheme::DateBuild.parse(raw).is_err(), "'{raw}' should not parse");
    }

    #[test]
    fn numeric_not_lexical_ordering() {
        assert!(dotted("v9") < dotted("v10"));
        assert!(dotted("1.9.0") < dotted("1.10.0"));
    }

    #[test]
    fn trailing_zeros_are_not_significant() {
        assert_eq!(dotted("1.2"), dotted("1.2.0"));
        assert_eq!(compare(&dotted("1.2.0.0"), &dotted("v1.2")), Ordering::Equal);
        assert!(dotted("1.2") < dotted("1.2.1"));
    }

    #[test]
    fn display_keeps_raw_string() {
        assert_eq!(dotted("v1.2.0").to_string(), "v1.2.0");
        assert_eq!(dotted("v1.2.0").as_str(), "v1.2.0");
    }

    #[test]
    fn compare_is_antisymmetric_and_transitive() {
        let a = dotted("0.9.9");
        let b = dotted("1.0.0");
        let c = dotted("1.0.10");
        let all = [&a, &b, &c];

        for x in all {
            for y in all {
                assert_eq!(compare(x, y), compare(y, x).reverse());
            }
        }
        assert_eq!(compare(&a, &b), Ordering::Less);
        assert_eq!(compare(&b, &c), Ordering::Less);
        assert_eq!(compare(&a, &c), Ordering::Less);
    }

    #[test]
    fn date_build_without_suffix_precedes_same_day_builds() {
        let scheme = VersionScheme::DateBuild;
        let day = scheme.parse("20240115").unwrap();
        let build = scheme.parse("20240115-1").unwrap();
        let next_day = scheme.parse("20240116").unwrap();
        assert!(day < build);
        assert!(build < next_day);
    }

    #[test]
    fn scheme_from_str() {
        assert_eq!("dotted".parse::<VersionScheme>(), Ok(VersionScheme::Dotted));
        assert_eq!("Date-Build".parse::<VersionScheme>(), Ok(VersionScheme::DateBuild));
        assert!("semver".parse::<VersionScheme>().is_err());
    }

    #[test]
    fn scheme_yaml_names() {
        let scheme: VersionScheme = serde_yaml::from_str("date-build").expect("deserialize");
        assert_eq!(scheme, VersionScheme::DateBuild);
        assert_eq!(scheme.to_string(), "date-build");
    }
}
