//! Core types for dependency upgrades

use std::fmt;
use upd_info::PackageMetadata;

/// Dependency section of a package manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencySection {
    /// `dependencies`
    Dependencies,
    /// `devDependencies`
    DevDependencies,
    /// `peerDependencies`
    PeerDependencies,
    /// `optionalDependencies`
    OptionalDependencies,
}

impl DependencySection {
    /// Order in which sections are scanned
    ///
    /// When a name is declared in several sections, the row group for that
    /// name appears where the name was first seen in this order.
    pub const SCAN_ORDER: [DependencySection; 4] = [
        DependencySection::OptionalDependencies,
        DependencySection::PeerDependencies,
        DependencySection::DevDependencies,
        DependencySection::Dependencies,
    ];

    /// Manifest key of this section
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencySection::Dependencies => "dependencies",
            DependencySection::DevDependencies => "devDependencies",
            DependencySection::PeerDependencies => "peerDependencies",
            DependencySection::OptionalDependencies => "optionalDependencies",
        }
    }
}

impl fmt::Display for DependencySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a dependency entry
///
/// `Todo` moves to `Ignored`, `Check` or `Skipped` during the scan; `Check`
/// moves to `Kept`, `Updated` or `Error` once the registry answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyState {
    /// Not classified yet
    Todo,
    /// Excluded by the inclusion patterns
    Ignored,
    /// Awaiting a registry lookup
    Check,
    /// Specifier is not a plain version (git URL, range, tag, ...)
    Skipped,
    /// Already at or above the selected version
    Kept,
    /// Specifier was rewritten
    Updated,
    /// Lookup or version selection failed
    Error,
}

impl DependencyState {
    /// Lower-case label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyState::Todo => "todo",
            DependencyState::Ignored => "ignored",
            DependencyState::Check => "check",
            DependencyState::Skipped => "skipped",
            DependencyState::Kept => "kept",
            DependencyState::Updated => "updated",
            DependencyState::Error => "error",
        }
    }
}

impl fmt::Display for DependencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(section, name)` declaration of a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    /// Package name as declared
    pub name: String,
    /// Section the declaration lives in
    pub section: DependencySection,
    /// Specifier text as declared (JSON text for non-string values)
    pub original_specifier: String,
    /// Version extracted from the specifier when it is a plain version
    pub extracted_version: Option<String>,
    /// Specifier after the upgrade; equals the original until resolved
    pub target_specifier: String,
    /// Version selected from the registry
    pub target_version: Option<String>,
    /// Current state
    pub state: DependencyState,
    /// Why the entry ended in [`DependencyState::Error`]
    pub failure: Option<String>,
}

impl DependencyEntry {
    /// Create an unclassified entry
    pub fn new(
        name: impl Into<String>,
        section: DependencySection,
        specifier: impl Into<String>,
    ) -> Self {
        let specifier = specifier.into();
        Self {
            name: name.into(),
            section,
            target_specifier: specifier.clone(),
            original_specifier: specifier,
            extracted_version: None,
            target_version: None,
            state: DependencyState::Todo,
            failure: None,
        }
    }

    /// Mark the entry as failed
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.state = DependencyState::Error;
        self.failure = Some(reason.into());
    }
}

/// Outcome of one registry lookup
#[derive(Debug)]
pub struct ResolutionResult {
    /// Package name as declared in the manifest
    pub name: String,
    /// Registry metadata or the reason the lookup failed
    pub outcome: upd_info::Result<PackageMetadata>,
}

impl ResolutionResult {
    /// Whether the lookup failed
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Progress of the resolution pipeline, emitted after every completed lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Lookups finished so far (successful or not)
    pub completed: usize,
    /// Lookups in this run
    pub total: usize,
    /// Sum of response body sizes received so far
    pub cumulative_bytes: usize,
    /// Name of the package that just finished
    pub current_name: String,
}

/// One line of the upgrade report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Package name
    pub name: String,
    /// Section of the declaration
    pub section: DependencySection,
    /// Specifier before the upgrade
    pub old_specifier: String,
    /// Specifier after the upgrade (or the selected version for kept entries)
    pub new_specifier: String,
    /// Final state
    pub state: DependencyState,
    /// Failure reason for error rows
    pub message: Option<String>,
}

impl From<&DependencyEntry> for Row {
    fn from(entry: &DependencyEntry) -> Self {
        Self {
            name: entry.name.clone(),
            section: entry.section,
            old_specifier: entry.original_specifier.clone(),
            new_specifier: entry.target_specifier.clone(),
            state: entry.state,
            message: entry.failure.clone(),
        }
    }
}
