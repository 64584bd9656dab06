//! Registry snapshot reducer.
//!
//! Collapses the raw tag listing of a registry repository into the highest
//! parsed version per image line. The result does not depend on listing
//! order: every group keeps its maximum under the version total order, and
//! among equal versions the lexicographically greatest spelling is kept.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::types::{ImageName, RegistryImageRecord};
use crate::version::{compare, ParseError, ParseVersion, Version};

/// Highest observed version per image line.
pub type HighestVersionMap = BTreeMap<ImageName, Version>;

/// A registry record whose tag could not be parsed and was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedTag {
    pub name: ImageName,
    pub tag: String,
    pub error: ParseError,
}

/// Reduced snapshot plus the records that did not take part in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub highest: HighestVersionMap,
    pub rejected: Vec<RejectedTag>,
}

/// Reduce `records` to one maximum version per image line.
pub fn reduce<P>(records: &[RegistryImageRecord], parser: &P) -> HighestVersionMap
where
    P: ParseVersion + ?Sized,
{
    reduce_snapshot(records, parser).highest
}

/// Like [`reduce`], but also reports the unparsable tags that were skipped.
///
/// Rejected tags are sorted by `(name, tag)` so the report is as
/// order-independent as the map.
pub fn reduce_snapshot<P>(records: &[RegistryImageRecord], parser: &P) -> Snapshot
where
    P: ParseVersion + ?Sized,
{
    let mut snapshot = Snapshot::default();
    for record in records {
        let version = match parser.parse(&record.tag) {
            Ok(version) => version,
            Err(error) => {
                snapshot.rejected.push(RejectedTag {
                    name: record.name.clone(),
                    tag: record.tag.clone(),
                    error,
                });
                continue;
            }
        };

        match snapshot.highest.get_mut(&record.name) {
            Some(current) => {
                // Equal versions spelled differently (`1.2`, `1.2.0`) keep the
                // greater raw string, so the kept spelling is order-independent.
                let replace = match compare(&version, current) {
                    Ordering::Greater => true,
                    Ordering::Equal => version.as_str() > current.as_str(),
                    Ordering::Less => false,
                };
                if replace {
                    *current = version;
                }
            }
            None => {
                snapshot.highest.insert(record.name.clone(), version);
            }
        }
    }
    snapshot
        .rejected
        .sort_by(|a, b| (&a.name, &a.tag).cmp(&(&b.name, &b.tag)));
    snapshot
}
