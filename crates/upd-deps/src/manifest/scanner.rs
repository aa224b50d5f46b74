//! Dependency declaration scanning

use super::patterns::PatternFilter;
use crate::types::{DependencyEntry, DependencySection, DependencyState};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// A plain version, optionally prefixed by `^` or `~`
static PLAIN_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[\^~]\s*)?(\d+[^<>=|\s]*)\s*$").expect("static regex is valid")
});

/// Version inside a specifier that names one plain version
///
/// Returns `None` for ranges, tags, URLs and other specifiers that cannot
/// be upgraded by substituting a version.
///
/// ```
/// use upd_deps::manifest::extract_version;
///
/// assert_eq!(extract_version("^1.2.3"), Some("1.2.3"));
/// assert_eq!(extract_version(" ~ 2.0 "), Some("2.0"));
/// assert_eq!(extract_version(">=1.0.0"), None);
/// assert_eq!(extract_version("latest"), None);
/// ```
pub fn extract_version(specifier: &str) -> Option<&str> {
    PLAIN_VERSION
        .captures(specifier)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// All dependency declarations of one manifest
///
/// Entries keep scan order (section by section, see
/// [`DependencySection::SCAN_ORDER`]); the same name declared in several
/// sections yields several independent entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyCatalog {
    entries: Vec<DependencyEntry>,
}

impl DependencyCatalog {
    /// Scan the dependency sections of a manifest
    ///
    /// Sections that are not objects are ignored.
    pub fn scan(manifest: &Value, filter: &PatternFilter) -> Self {
        let mut entries = Vec::new();
        for section in DependencySection::SCAN_ORDER {
            let Some(declarations) = manifest.get(section.as_str()).and_then(Value::as_object)
            else {
                continue;
            };
            for (name, specifier) in declarations {
                entries.push(classify(name, section, specifier, filter));
            }
        }
        Self { entries }
    }

    /// All entries in scan order
    pub fn entries(&self) -> &[DependencyEntry] {
        &self.entries
    }

    /// All entries in scan order, mutably
    pub fn entries_mut(&mut self) -> &mut [DependencyEntry] {
        &mut self.entries
    }

    /// Distinct names, in the order they were first seen
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.name.as_str()) {
                names.push(&entry.name);
            }
        }
        names
    }

    /// Distinct names with at least one entry awaiting a registry lookup
    pub fn names_to_check(&self) -> Vec<String> {
        self.names()
            .into_iter()
            .filter(|name| {
                self.entries_named(name)
                    .any(|entry| entry.state == DependencyState::Check)
            })
            .map(str::to_string)
            .collect()
    }

    /// Entries declaring `name`, in scan order
    pub fn entries_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DependencyEntry> {
        self.entries.iter().filter(move |entry| entry.name == name)
    }

    /// Entries declaring `name`, mutably
    pub fn entries_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut DependencyEntry> {
        self.entries.iter_mut().filter(move |entry| entry.name == name)
    }

    /// Entries grouped by name, groups in first-seen order
    pub fn grouped(&self) -> Vec<&DependencyEntry> {
        self.names()
            .into_iter()
            .flat_map(|name| self.entries_named(name))
            .collect()
    }

    /// Number of entries in `state`
    pub fn count(&self, state: DependencyState) -> usize {
        self.entries.iter().filter(|entry| entry.state == state).count()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest declares no dependencies
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn classify(
    name: &str,
    section: DependencySection,
    specifier: &Value,
    filter: &PatternFilter,
) -> DependencyEntry {
    let text = match specifier {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    let mut entry = DependencyEntry::new(name, section, text);

    if !filter.is_included(name) {
        entry.state = DependencyState::Ignored;
        return entry;
    }

    match specifier.as_str().and_then(extract_version) {
        Some(version) => {
            entry.extracted_version = Some(version.to_string());
            entry.state = DependencyState::Check;
        }
        None => entry.state = DependencyState::Skipped,
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest() -> Value {
        json!({
            "name": "demo",
            "dependencies": {
                "react": "^17.0.2",
                "lodash": "4.17.20",
                "left-pad": "github:stevemao/left-pad",
                "typescript": ">=4.0.0 <5"
            },
            "devDependencies": {
                "react": "~17.0.1",
                "jest": "26"
            },
            "peerDependencies": "react",
            "optionalDependencies": {
                "fsevents": "2.3.2",
                "weird": 3
            }
        })
    }

    fn states(catalog: &DependencyCatalog) -> Vec<(String, &'static str, &'static str)> {
        catalog
            .grouped()
            .into_iter()
            .map(|e| (e.name.clone(), e.section.as_str(), e.state.as_str()))
            .collect()
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(extract_version("1.2.3"), Some("1.2.3"));
        assert_eq!(extract_version("^1.2.3-beta.1"), Some("1.2.3-beta.1"));
        assert_eq!(extract_version("  ~1.2  "), Some("1.2"));
        assert_eq!(extract_version("17"), Some("17"));
        assert_eq!(extract_version("1.x"), Some("1.x"));
        assert_eq!(extract_version("1.0.0 || 2.0.0"), None);
        assert_eq!(extract_version("<2"), None);
        assert_eq!(extract_version("*"), None);
        assert_eq!(extract_version("file:../lib"), None);
        assert_eq!(extract_version(""), None);
    }

    #[test]
    fn test_scan_classifies_entries() {
        let catalog = DependencyCatalog::scan(&manifest(), &PatternFilter::all());
        assert_eq!(
            states(&catalog),
            vec![
                ("fsevents".into(), "optionalDependencies", "check"),
                ("weird".into(), "optionalDependencies", "skipped"),
                ("react".into(), "devDependencies", "check"),
                ("react".into(), "dependencies", "check"),
                ("jest".into(), "devDependencies", "check"),
                ("lodash".into(), "dependencies", "check"),
                ("left-pad".into(), "dependencies", "skipped"),
                ("typescript".into(), "dependencies", "skipped"),
            ]
        );
    }

    #[test]
    fn test_duplicate_names_are_independent_entries() {
        let catalog = DependencyCatalog::scan(&manifest(), &PatternFilter::all());
        let react: Vec<_> = catalog.entries_named("react").collect();
        assert_eq!(react.len(), 2);
        assert_eq!(react[0].extracted_version.as_deref(), Some("17.0.1"));
        assert_eq!(react[1].extracted_version.as_deref(), Some("17.0.2"));
    }

    #[test]
    fn test_names_to_check_are_unique_and_ordered() {
        let catalog = DependencyCatalog::scan(&manifest(), &PatternFilter::all());
        assert_eq!(
            catalog.names_to_check(),
            vec!["fsevents", "react", "jest", "lodash"]
        );
    }

    #[test]
    fn test_excluded_names_are_ignored() {
        let filter = PatternFilter::new(["!react", "!left-pad"]).unwrap();
        let catalog = DependencyCatalog::scan(&manifest(), &filter);

        assert_eq!(catalog.count(DependencyState::Ignored), 3);
        assert!(catalog
            .entries_named("left-pad")
            .all(|e| e.state == DependencyState::Ignored));
        assert!(!catalog.names_to_check().contains(&"react".to_string()));
    }

    #[test]
    fn test_non_string_specifier_keeps_json_text() {
        let catalog = DependencyCatalog::scan(&manifest(), &PatternFilter::all());
        let weird = catalog.entries_named("weird").next().unwrap();
        assert_eq!(weird.original_specifier, "3");
        assert_eq!(weird.state, DependencyState::Skipped);
    }

    #[test]
    fn test_manifest_without_sections() {
        let catalog = DependencyCatalog::scan(&json!({"name": "empty"}), &PatternFilter::all());
        assert!(catalog.is_empty());
        assert!(catalog.names_to_check().is_empty());
    }
}
