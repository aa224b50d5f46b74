//! Integration tests for upd-deps
//!
//! These tests run complete upgrades against in-memory registries, on both
//! the native and the in-memory filesystem.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use upd_deps::{
    DependencySection, DependencyState, Error, NoProgress, PackageRegistry, UpgradeOptions,
    Upgrader,
};
use upd_fs::{MemoryFileSystem, NativeFileSystem};
use upd_info::PackageMetadata;

/// Registry serving fixed `latest` tags; unknown names are 404s
struct FakeRegistry {
    latest: HashMap<String, String>,
}

impl FakeRegistry {
    fn new(packages: &[(&str, &str)]) -> Self {
        Self {
            latest: packages
                .iter()
                .map(|(name, version)| (name.to_string(), version.to_string()))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl PackageRegistry for FakeRegistry {
    async fn fetch_package(&self, name: &str) -> upd_info::Result<PackageMetadata> {
        let version = self
            .latest
            .get(name)
            .ok_or_else(|| upd_info::Error::PackageNotFound(name.to_string()))?;
        Ok(PackageMetadata::new(
            name,
            [("latest".to_string(), version.clone())],
            [version.clone()],
        ))
    }
}

fn registry() -> FakeRegistry {
    FakeRegistry::new(&[
        ("react", "18.2.0"),
        ("react-dom", "18.2.0"),
        ("typescript", "5.4.5"),
        ("@types/node", "20.11.0"),
    ])
}

const MANIFEST: &str = r#"{
    "name": "demo",
    // comments survive upgrades
    "dependencies": {
        "react":     "^17.0.2",
        "react-dom": "^17.0.2"
    },
    "devDependencies": {
        "typescript": "~4.9.5", /* pinned minor */
        "@types/node": "18"
    },
    "upd": []
}
"#;

fn upgraded_manifest() -> String {
    MANIFEST
        .replacen("\"^17.0.2\"", "\"^18.2.0\"", 2)
        .replace("\"~4.9.5\"", "\"~5.4.5\"")
        .replace("\"18\"", "\"20.11.0\"")
}

#[tokio::test]
async fn test_upgrade_file_preserves_formatting() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("package.json");
    std::fs::write(&path, MANIFEST).unwrap();
    let fs = Arc::new(NativeFileSystem::new(temp_dir.path()).unwrap());

    let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();
    let report = upgrader
        .upgrade_file(&fs, &path, &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.updated, 4);
    assert!(report.written);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), upgraded_manifest());
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let fs = Arc::new(MemoryFileSystem::new("/project").unwrap());
    fs.add_file("/project/package.json", MANIFEST).unwrap();
    let path = Path::new("/project/package.json");
    let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();

    upgrader.upgrade_file(&fs, path, &mut NoProgress).await.unwrap();
    let after_first = fs.contents(path).unwrap();

    let report = upgrader.upgrade_file(&fs, path, &mut NoProgress).await.unwrap();

    assert_eq!(report.updated, 0);
    assert!(!report.written);
    assert!(report
        .rows
        .iter()
        .all(|row| row.state == DependencyState::Kept));
    assert_eq!(fs.contents(path).unwrap(), after_first);
}

#[tokio::test]
async fn test_dry_run_leaves_file_untouched() {
    let fs = Arc::new(MemoryFileSystem::new("/project").unwrap());
    fs.add_file("/project/package.json", MANIFEST).unwrap();
    let path = Path::new("/project/package.json");

    let options = UpgradeOptions {
        dry_run: true,
        ..UpgradeOptions::default()
    };
    let upgrader = Upgrader::new(registry(), options).unwrap();
    let report = upgrader.upgrade_file(&fs, path, &mut NoProgress).await.unwrap();

    assert_eq!(report.updated, 4);
    assert!(!report.written);
    assert_eq!(report.document.as_deref(), Some(upgraded_manifest().as_str()));
    assert_eq!(fs.contents(path).unwrap(), MANIFEST);
    assert_eq!(fs.len(), 1);
}

#[tokio::test]
async fn test_ambiguous_declaration_aborts_without_writing() {
    let text = r#"{
  "dependencies": { "react": "^17.0.2" },
  "workspaces": { "dependencies": { "react": "^17.0.2" } }
}"#;
    let fs = Arc::new(MemoryFileSystem::new("/project").unwrap());
    fs.add_file("/project/package.json", text).unwrap();
    let path = Path::new("/project/package.json");

    let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();
    let result = upgrader.upgrade_file(&fs, path, &mut NoProgress).await;

    assert!(matches!(
        result,
        Err(Error::QueryCardinality { matches: 2, .. })
    ));
    assert_eq!(fs.contents(path).unwrap(), text);
}

#[tokio::test]
async fn test_ambiguity_is_detected_in_dry_run_too() {
    let text = r#"{"dependencies": {"react": "17.0.0", "react": "17.0.0"}}"#;
    let options = UpgradeOptions {
        dry_run: true,
        ..UpgradeOptions::default()
    };
    let upgrader = Upgrader::new(registry(), options).unwrap();
    let result = upgrader.upgrade_text(text, &mut NoProgress).await;
    assert!(matches!(result, Err(Error::QueryCardinality { .. })));
}

#[tokio::test]
async fn test_pattern_inclusion() {
    let options = UpgradeOptions {
        patterns: vec!["react*".to_string(), "!react-dom".to_string()],
        ..UpgradeOptions::default()
    };
    let upgrader = Upgrader::new(registry(), options).unwrap();
    let report = upgrader.upgrade_text(MANIFEST, &mut NoProgress).await.unwrap();

    let states: Vec<_> = report
        .rows
        .iter()
        .map(|row| (row.name.as_str(), row.state))
        .collect();
    assert_eq!(
        states,
        vec![
            ("typescript", DependencyState::Ignored),
            ("@types/node", DependencyState::Ignored),
            ("react", DependencyState::Updated),
            ("react-dom", DependencyState::Ignored),
        ]
    );
    assert_eq!(report.updated, 1);
}

#[tokio::test]
async fn test_negated_scope_pattern() {
    let options = UpgradeOptions {
        patterns: vec!["!@types/*".to_string()],
        ..UpgradeOptions::default()
    };
    let upgrader = Upgrader::new(registry(), options).unwrap();
    let report = upgrader.upgrade_text(MANIFEST, &mut NoProgress).await.unwrap();

    let ignored: Vec<_> = report
        .rows
        .iter()
        .filter(|row| row.state == DependencyState::Ignored)
        .map(|row| row.name.as_str())
        .collect();
    assert_eq!(ignored, vec!["@types/node"]);
    assert_eq!(report.updated, 3);
}

#[tokio::test]
async fn test_partial_failure_isolation() {
    let text = r#"{
  "dependencies": {
    "react": "17.0.0",
    "does-not-exist": "1.0.0",
    "typescript": "4.0.0"
  }
}"#;
    let fs = Arc::new(MemoryFileSystem::new("/project").unwrap());
    fs.add_file("/project/package.json", text).unwrap();
    let path = Path::new("/project/package.json");

    let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();
    let report = upgrader.upgrade_file(&fs, path, &mut NoProgress).await.unwrap();

    assert_eq!(report.errors, 1);
    assert_eq!(report.updated, 2);
    assert!(report.written);

    let failed = report
        .rows
        .iter()
        .find(|row| row.name == "does-not-exist")
        .unwrap();
    assert_eq!(failed.state, DependencyState::Error);
    assert_eq!(failed.section, DependencySection::Dependencies);
    assert!(failed.message.as_deref().unwrap().contains("does-not-exist"));

    let expected = r#"{
  "dependencies": {
    "react": "18.2.0",
    "does-not-exist": "1.0.0",
    "typescript": "5.4.5"
  }
}"#;
    assert_eq!(fs.contents(path).unwrap(), expected);
    assert_eq!(report.document.as_deref(), Some(expected));
}

#[tokio::test]
async fn test_missing_manifest() {
    let fs = Arc::new(MemoryFileSystem::new("/project").unwrap());
    let upgrader = Upgrader::new(registry(), UpgradeOptions::default()).unwrap();

    let result = upgrader
        .upgrade_file(&fs, Path::new("/project/package.json"), &mut NoProgress)
        .await;

    assert!(matches!(result, Err(Error::FileNotFound(p)) if p.ends_with("package.json")));
}
