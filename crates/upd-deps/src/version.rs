//! Version comparison and selection policy

use crate::types::DependencyState;
use crate::{Error, Result};
use node_semver::Version;
use std::cmp::Ordering;
use upd_info::PackageMetadata;

/// How the target version is chosen from registry metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// The version the `latest` distribution tag points at
    #[default]
    Latest,
    /// The greatest published version, pre-releases included
    Greatest,
}

/// Parse a version, padding partial versions (`1` and `1.2`) with `.0`
pub fn parse_version(raw: &str) -> Result<Version> {
    Version::parse(&pad_version(raw))
        .map_err(|e| Error::InvalidVersion(raw.to_string(), e.to_string()))
}

fn pad_version(raw: &str) -> String {
    let raw = raw.trim();
    let core_end = raw.find(['-', '+']).unwrap_or(raw.len());
    let (core, suffix) = raw.split_at(core_end);
    match core.split('.').count() {
        1 => format!("{}.0.0{}", core, suffix),
        2 => format!("{}.0{}", core, suffix),
        _ => raw.to_string(),
    }
}

/// Compare two versions
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering> {
    Ok(parse_version(a)?.cmp(&parse_version(b)?))
}

/// Pick the target version for a package
///
/// # Errors
/// Returns [`Error::Policy`] if the metadata has no `latest` tag
/// ([`SelectionMode::Latest`]) or no parseable version
/// ([`SelectionMode::Greatest`])
pub fn select_version(metadata: &PackageMetadata, mode: SelectionMode) -> Result<String> {
    match mode {
        SelectionMode::Latest => metadata
            .latest()
            .map(str::to_string)
            .ok_or_else(|| Error::Policy {
                package: metadata.name.clone(),
                reason: "no \"latest\" version found".to_string(),
            }),
        SelectionMode::Greatest => metadata
            .versions
            .iter()
            .filter_map(|raw| Version::parse(raw).ok().map(|version| (version, raw)))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, raw)| raw.clone())
            .ok_or_else(|| Error::Policy {
                package: metadata.name.clone(),
                reason: "no valid published version found".to_string(),
            }),
    }
}

/// Decide between keeping and updating a declared version
///
/// Equal strings and declared versions at or above the target are kept.
///
/// # Errors
/// Returns [`Error::Policy`] if either version cannot be compared
pub fn decide(package: &str, old: &str, new: &str) -> Result<DependencyState> {
    if old == new {
        return Ok(DependencyState::Kept);
    }
    let ordering = compare_versions(old, new).map_err(|e| Error::Policy {
        package: package.to_string(),
        reason: e.to_string(),
    })?;
    Ok(match ordering {
        Ordering::Less => DependencyState::Updated,
        Ordering::Equal | Ordering::Greater => DependencyState::Kept,
    })
}


#[cfg(feature = "property-tests")]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: version comparison is transitive
        #[test]
        fn version_comparison_is_transitive(
            a in r"(0|[1-9][0-9]{0,2})\.(0|[1-9][0-9]{0,2})\.(0|[1-9][0-9]{0,2})",
            b in r"(0|[1-9][0-9]{0,2})\.(0|[1-9][0-9]{0,2})\.(0|[1-9][0-9]{0,2})",
            c in r"(0|[1-9][0-9]{0,2})\.(0|[1-9][0-9]{0,2})\.(0|[1-9][0-9]{0,2})"
        ) {
            let ab = compare_versions(&a, &b).unwrap();
            let bc = compare_versions(&b, &c).unwrap();
            let ac = compare_versions(&a, &c).unwrap();
            if ab == Ordering::Less && bc == Ordering::Less {
                prop_assert_eq!(ac, Ordering::Less);
            }
        }

        /// Property: a declared version is never "updated" to itself or below
        #[test]
        fn decide_never_downgrades(
            old in r"(0|[1-9][0-9]{0,2})\.(0|[1-9][0-9]{0,2})\.(0|[1-9][0-9]{0,2})",
            new in r"(0|[1-9][0-9]{0,2})\.(0|[1-9][0-9]{0,2})\.(0|[1-9][0-9]{0,2})"
        ) {
            let state = decide("p", &old, &new).unwrap();
            let ordering = compare_versions(&old, &new).unwrap();
            prop_assert_eq!(state == DependencyState::Updated, ordering == Ordering::Less);
        }
    }
}
