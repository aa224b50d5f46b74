//! End-to-end manifest upgrades
//!
//! parse → scan → resolve → select → patch → persist. Everything before
//! persisting is side-effect free, and any fatal error returns before the
//! manifest is written.

use crate::document::Document;
use crate::manifest::{DependencyCatalog, EmbeddedArgs, PatternFilter};
use crate::patch::PatchApplier;
use crate::pipeline::{ResolutionPipeline, DEFAULT_CONCURRENCY};
use crate::traits::{PackageRegistry, ProgressSink};
use crate::types::{DependencyState, ResolutionResult, Row};
use crate::update::FileUpdater;
use crate::version::{decide, select_version, SelectionMode};
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use upd_fs::FileSystem;

/// Settings for one upgrade run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Package name patterns (see [`PatternFilter`]); the manifest's
    /// embedded arguments are prepended
    pub patterns: Vec<String>,
    /// Maximum concurrent registry lookups
    pub concurrency: usize,
    /// How the target version is chosen
    pub mode: SelectionMode,
    /// Compute everything but never write the manifest
    pub dry_run: bool,
}

impl Default for UpgradeOptions {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            mode: SelectionMode::default(),
            dry_run: false,
        }
    }
}

/// Outcome of an upgrade run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    /// One row per declaration, grouped by name in first-seen order
    pub rows: Vec<Row>,
    /// Number of rewritten declarations
    pub updated: usize,
    /// Number of declarations whose lookup or version selection failed
    pub errors: usize,
    /// New manifest text, present when something was updated
    pub document: Option<String>,
    /// Whether the manifest was written back
    pub written: bool,
}

impl UpgradeReport {
    /// Whether any declaration was rewritten
    pub fn any_updates(&self) -> bool {
        self.updated > 0
    }
}

/// Upgrades manifests against a package registry
pub struct Upgrader<R> {
    registry: R,
    options: UpgradeOptions,
    patcher: PatchApplier,
}

impl<R: PackageRegistry> Upgrader<R> {
    /// Create an upgrader
    ///
    /// # Errors
    /// Returns an error if the specifier query fails to compile
    pub fn new(registry: R, options: UpgradeOptions) -> Result<Self> {
        Ok(Self {
            registry,
            options,
            patcher: PatchApplier::new()?,
        })
    }

    /// Options this upgrader runs with
    pub fn options(&self) -> &UpgradeOptions {
        &self.options
    }

    /// Upgrade manifest text without touching any file
    ///
    /// # Errors
    /// Returns an error if the manifest is malformed, the patterns are
    /// invalid, or a declaration cannot be patched consistently. Registry
    /// and version selection failures only mark the affected rows.
    pub async fn upgrade_text(
        &self,
        text: &str,
        progress: &mut dyn ProgressSink,
    ) -> Result<UpgradeReport> {
        let mut document = Document::parse(text)?;
        let manifest = document.to_value();

        let mut patterns = EmbeddedArgs::from_manifest(&manifest)?
            .map(EmbeddedArgs::into_args)
            .unwrap_or_default();
        patterns.extend(self.options.patterns.iter().cloned());
        let filter = PatternFilter::new(&patterns)?;

        let mut catalog = DependencyCatalog::scan(&manifest, &filter);
        let names = catalog.names_to_check();
        info!(
            declarations = catalog.len(),
            lookups = names.len(),
            "scanned manifest"
        );

        let results = ResolutionPipeline::new(&self.registry, self.options.concurrency)
            .resolve(&names, progress)
            .await;
        for result in &results {
            settle(&mut catalog, result, self.options.mode);
        }

        self.patcher.apply(&mut document, catalog.entries_mut())?;

        let updated = catalog.count(DependencyState::Updated);
        let errors = catalog.count(DependencyState::Error);
        Ok(UpgradeReport {
            rows: catalog.grouped().into_iter().map(Row::from).collect(),
            updated,
            errors,
            document: (updated > 0).then(|| document.serialize()),
            written: false,
        })
    }

    /// Upgrade a manifest file, writing it back unless this is a dry run
    ///
    /// # Errors
    /// Returns [`Error::FileNotFound`] if `path` does not exist, any error of
    /// [`Upgrader::upgrade_text`], or an IO error while writing
    pub async fn upgrade_file<F: FileSystem>(
        &self,
        fs: &Arc<F>,
        path: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<UpgradeReport> {
        if !fs.exists(path).await? {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = fs.read_to_string(path).await?;
        let mut report = self.upgrade_text(&text, progress).await?;

        if let Some(contents) = &report.document {
            FileUpdater::new(self.options.dry_run)
                .update_file(fs, path, contents)
                .await?;
            report.written = !self.options.dry_run;
            if report.written {
                info!(path = %path.display(), updated = report.updated, "wrote manifest");
            }
        }
        Ok(report)
    }
}

/// Apply one lookup result to the entries awaiting it
fn settle(catalog: &mut DependencyCatalog, result: &ResolutionResult, mode: SelectionMode) {
    let selected = match &result.outcome {
        Ok(metadata) => select_version(metadata, mode).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(reason) = &selected {
        if result.outcome.is_ok() {
            warn!(package = %result.name, %reason, "no version selected");
        }
    }

    for entry in catalog
        .entries_named_mut(&result.name)
        .filter(|entry| entry.state == DependencyState::Check)
    {
        let version = match &selected {
            Ok(version) => version,
            Err(reason) => {
                entry.fail(reason.clone());
                continue;
            }
        };

        let decision = match entry.extracted_version.as_deref() {
            Some(old) => decide(&entry.name, old, version),
            None => Err(Error::Policy {
                package: entry.name.clone(),
                reason: "declared version is unknown".to_string(),
            }),
        };
        entry.target_version = Some(version.clone());
        entry.target_specifier = version.clone();
        match decision {
            Ok(state) => entry.state = state,
            Err(e) => entry.fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NoProgress;
    use crate::types::DependencySection;
    use std::collections::HashMap;
    use upd_info::PackageMetadata;

    struct FixedRegistry(HashMap<&'static str, (&'static str, Vec<&'static str>)>);

    #[async_trait::async_trait]
    impl PackageRegistry for FixedRegistry {
        async fn fetch_package(&self, name: &str) -> upd_info::Result<PackageMetadata> {
            let (latest, versions) = self
                .0
                .get(name)
                .ok_or_else(|| upd_info::Error::PackageNotFound(name.to_string()))?;
            let tags = (!latest.is_empty()).then(|| ("latest".to_string(), latest.to_string()));
            Ok(PackageMetadata::new(
                name,
                tags,
                versions.iter().map(|v| v.to_string()),
            ))
        }
    }

    fn registry() -> FixedRegistry {
        FixedRegistry(HashMap::from([
            ("react", ("18.2.0", vec!["17.0.2", "18.2.0", "19.0.0-rc.1"])),
            ("lodash", ("4.17.21", vec!["4.17.20", "4.17.21"])),
            ("jest", ("29.7.0", vec!["29.7.0"])),
            ("untagged", ("", vec!["1.0.0"])),
        ]))
    }

    const MANIFEST: &str = r#"{
    "name": "demo",
    "dependencies": {
        "react": "^17.0.2",
        "lodash": "4.17.21",
        "ghost": "1.0.0",
        "untagged": "~0.9.0",
        "local": "file:../local"
    },
    "devDependencies": {
        "react": "~18.3.0",
        "jest": "26"
    }
}
"#;

    fn row<'a>(report: &'a UpgradeReport, name: &str, section: DependencySection) -> &'a Row {
        report
            .rows
            .iter()
            .find(|r| r.name == name && r.section == section)
            .unwrap()
    }

    #[tokio::test]
    async fn test_upgrade_text_states() {
        let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();
        let report = upgrader.upgrade_text(MANIFEST, &mut NoProgress).await.unwrap();

        use DependencySection::*;
        assert_eq!(row(&report, "react", Dependencies).state, DependencyState::Updated);
        assert_eq!(row(&report, "react", Dependencies).new_specifier, "^18.2.0");
        assert_eq!(row(&report, "react", DevDependencies).state, DependencyState::Kept);
        assert_eq!(row(&report, "react", DevDependencies).new_specifier, "18.2.0");
        assert_eq!(row(&report, "lodash", Dependencies).state, DependencyState::Kept);
        assert_eq!(row(&report, "jest", DevDependencies).new_specifier, "29.7.0");
        assert_eq!(row(&report, "ghost", Dependencies).state, DependencyState::Error);
        assert_eq!(row(&report, "untagged", Dependencies).state, DependencyState::Error);
        assert_eq!(row(&report, "local", Dependencies).state, DependencyState::Skipped);

        assert_eq!(report.updated, 2);
        assert_eq!(report.errors, 2);
        assert!(report.any_updates());
        assert!(!report.written);

        let expected = MANIFEST
            .replace("\"^17.0.2\"", "\"^18.2.0\"")
            .replace("\"26\"", "\"29.7.0\"");
        assert_eq!(report.document.as_deref(), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn test_rows_are_grouped_by_first_seen_name() {
        let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();
        let report = upgrader.upgrade_text(MANIFEST, &mut NoProgress).await.unwrap();

        let order: Vec<_> = report
            .rows
            .iter()
            .map(|r| format!("{}:{}", r.name, r.section))
            .collect();
        assert_eq!(
            order,
            vec![
                "react:devDependencies",
                "react:dependencies",
                "jest:devDependencies",
                "lodash:dependencies",
                "ghost:dependencies",
                "untagged:dependencies",
                "local:dependencies",
            ]
        );
    }

    #[tokio::test]
    async fn test_greatest_mode() {
        let options = UpgradeOptions {
            mode: SelectionMode::Greatest,
            patterns: vec!["react".to_string()],
            ..UpgradeOptions::default()
        };
        let upgrader = Upgrader::new(registry(), options).unwrap();
        let report = upgrader.upgrade_text(MANIFEST, &mut NoProgress).await.unwrap();

        let react = row(&report, "react", DependencySection::Dependencies);
        assert_eq!(react.new_specifier, "^19.0.0-rc.1");
        assert_eq!(
            row(&report, "lodash", DependencySection::Dependencies).state,
            DependencyState::Ignored
        );
    }

    #[tokio::test]
    async fn test_embedded_patterns_are_honoured() {
        let text = r#"{"upd": "!react", "dependencies": {"react": "17.0.0", "jest": "26.0.0"}}"#;
        let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();
        let report = upgrader.upgrade_text(text, &mut NoProgress).await.unwrap();

        assert_eq!(report.rows[0].state, DependencyState::Ignored);
        assert_eq!(report.rows[1].state, DependencyState::Updated);
    }

    #[tokio::test]
    async fn test_invalid_embedded_patterns_are_fatal() {
        let text = r#"{"upd": 42, "dependencies": {"react": "17.0.0"}}"#;
        let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();
        let result = upgrader.upgrade_text(text, &mut NoProgress).await;
        assert!(matches!(result, Err(Error::InvalidEmbeddedArgs(_))));
    }

    #[tokio::test]
    async fn test_nothing_to_update_has_no_document() {
        let text = r#"{"dependencies": {"jest": "29.7.0"}}"#;
        let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();
        let report = upgrader.upgrade_text(text, &mut NoProgress).await.unwrap();
        assert_eq!(report.updated, 0);
        assert!(report.document.is_none());
    }

    #[tokio::test]
    async fn test_malformed_manifest() {
        let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();
        let result = upgrader.upgrade_text("{\"dependencies\": ", &mut NoProgress).await;
        assert!(matches!(result, Err(Error::Parse { line: 1, .. })));
    }
}
