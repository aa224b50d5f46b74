//! In-place specifier rewriting

use crate::document::Document;
use crate::query::{Bindings, Query};
use crate::types::{DependencyEntry, DependencyState};
use crate::{Error, Result};
use tracing::debug;

/// Locates the specifier of `{module}` inside section `{section}`
pub const SPECIFIER_QUERY: &str = "//member[key={section}]//member[key={module}]/*[pos=2]";

/// Replace the first occurrence of `old_version` inside `specifier`
///
/// Prefixes and surrounding text are kept: `^1.2.3` becomes `^2.0.0`.
///
/// # Errors
/// Returns [`Error::PatchConsistency`] if the replacement leaves the
/// specifier unchanged
pub fn rewrite_specifier(
    package: &str,
    specifier: &str,
    old_version: &str,
    new_version: &str,
) -> Result<String> {
    let rewritten = specifier.replacen(old_version, new_version, 1);
    if rewritten == specifier {
        return Err(Error::PatchConsistency {
            package: package.to_string(),
            specifier: specifier.to_string(),
            old_version: old_version.to_string(),
            new_version: new_version.to_string(),
        });
    }
    Ok(rewritten)
}

/// Writes updated specifiers into the document tree
///
/// Every updated entry must address exactly one specifier node; anything
/// else aborts the whole patch.
#[derive(Debug, Clone)]
pub struct PatchApplier {
    query: Query,
}

impl PatchApplier {
    /// Create an applier using [`SPECIFIER_QUERY`]
    ///
    /// # Errors
    /// Returns an error if the query fails to compile
    pub fn new() -> Result<Self> {
        Ok(Self {
            query: Query::compile(SPECIFIER_QUERY)?,
        })
    }

    /// Patch every [`DependencyState::Updated`] entry
    ///
    /// Fills in each entry's `target_specifier` and replaces the matching
    /// string leaf. Returns the number of patched nodes.
    ///
    /// # Errors
    /// Returns [`Error::PatchConsistency`] if a specifier cannot be
    /// rewritten and [`Error::QueryCardinality`] if an entry's specifier
    /// node is missing or ambiguous
    pub fn apply(&self, document: &mut Document, entries: &mut [DependencyEntry]) -> Result<usize> {
        let mut patched = 0;
        for entry in entries
            .iter_mut()
            .filter(|entry| entry.state == DependencyState::Updated)
        {
            let (Some(old_version), Some(new_version)) =
                (&entry.extracted_version, &entry.target_version)
            else {
                return Err(Error::Other(format!(
                    "updated module \"{}\" has no version to substitute",
                    entry.name
                )));
            };
            let specifier = rewrite_specifier(
                &entry.name,
                &entry.original_specifier,
                old_version,
                new_version,
            )?;

            let bindings = Bindings::new()
                .bind("section", entry.section.as_str())
                .bind("module", entry.name.as_str());
            let path = self.query.execute_one(document, &bindings)?;
            document.set_string(&path, &specifier)?;

            debug!(
                package = %entry.name,
                section = %entry.section,
                from = %entry.original_specifier,
                to = %specifier,
                "patched specifier"
            );
            entry.target_specifier = specifier;
            patched += 1;
        }
        Ok(patched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DependencySection;

    fn updated(name: &str, section: DependencySection, spec: &str, old: &str, new: &str) -> DependencyEntry {
        let mut entry = DependencyEntry::new(name, section, spec);
        entry.extracted_version = Some(old.to_string());
        entry.target_version = Some(new.to_string());
        entry.state = DependencyState::Updated;
        entry
    }

    #[test]
    fn test_rewrite_keeps_prefix() {
        assert_eq!(rewrite_specifier("a", "^1.2.3", "1.2.3", "2.0.0").unwrap(), "^2.0.0");
        assert_eq!(rewrite_specifier("a", " ~ 1.2 ", "1.2", "1.3.0").unwrap(), " ~ 1.3.0 ");
    }

    #[test]
    fn test_rewrite_replaces_first_occurrence_only() {
        assert_eq!(rewrite_specifier("a", "1.1.1", "1", "2.0.0").unwrap(), "2.0.0.1.1");
    }

    #[test]
    fn test_rewrite_without_change_is_inconsistent() {
        let result = rewrite_specifier("a", "^1.2.3", "9.9.9", "2.0.0");
        assert!(matches!(result, Err(Error::PatchConsistency { .. })));
    }

    #[test]
    fn test_apply_touches_only_updated_entries() {
        let text = "{\n  \"dependencies\": { \"a\": \"^1.0.0\", \"b\": \"1.0.0\" },\n  \"devDependencies\": { \"a\": \"~1.0.0\" }\n}\n";
        let mut doc = Document::parse(text).unwrap();
        let mut entries = vec![
            updated("a", DependencySection::DevDependencies, "~1.0.0", "1.0.0", "1.4.0"),
            DependencyEntry::new("b", DependencySection::Dependencies, "1.0.0"),
            updated("a", DependencySection::Dependencies, "^1.0.0", "1.0.0", "1.4.0"),
        ];

        let patched = PatchApplier::new().unwrap().apply(&mut doc, &mut entries).unwrap();

        assert_eq!(patched, 2);
        assert_eq!(entries[0].target_specifier, "~1.4.0");
        assert_eq!(entries[2].target_specifier, "^1.4.0");
        assert_eq!(
            doc.serialize(),
            "{\n  \"dependencies\": { \"a\": \"^1.4.0\", \"b\": \"1.0.0\" },\n  \"devDependencies\": { \"a\": \"~1.4.0\" }\n}\n"
        );
    }

    #[test]
    fn test_apply_aborts_on_ambiguous_declaration() {
        let text = r#"{"dependencies": {"a": "1.0.0", "a": "1.0.0"}}"#;
        let mut doc = Document::parse(text).unwrap();
        let mut entries = vec![updated("a", DependencySection::Dependencies, "1.0.0", "1.0.0", "2.0.0")];

        let result = PatchApplier::new().unwrap().apply(&mut doc, &mut entries);

        assert!(matches!(result, Err(Error::QueryCardinality { matches: 2, .. })));
        assert_eq!(doc.serialize(), text);
    }

    #[test]
    fn test_apply_aborts_when_declaration_is_missing() {
        let mut doc = Document::parse(r#"{"dependencies": {}}"#).unwrap();
        let mut entries = vec![updated("a", DependencySection::Dependencies, "1.0.0", "1.0.0", "2.0.0")];

        let result = PatchApplier::new().unwrap().apply(&mut doc, &mut entries);
        assert!(matches!(result, Err(Error::QueryCardinality { matches: 0, .. })));
    }
}
