//! Seams between the upgrade engine and its collaborators

use crate::types::ProgressEvent;
use upd_info::PackageMetadata;

/// Source of package metadata
///
/// Implemented for [`upd_info::RegistryClient`]; tests provide in-memory
/// registries. Failures are reported as data by the pipeline and never
/// abort a run.
#[async_trait::async_trait]
pub trait PackageRegistry: Send + Sync {
    /// Fetch metadata for a package
    ///
    /// # Errors
    /// Returns an error if the package does not exist, the request fails or
    /// times out, or the response cannot be decoded
    async fn fetch_package(&self, name: &str) -> upd_info::Result<PackageMetadata>;
}

/// Receiver of pipeline progress
///
/// Called on the task driving the pipeline, once per completed lookup, in
/// completion order.
pub trait ProgressSink {
    /// A lookup finished
    fn on_progress(&mut self, event: &ProgressEvent);

    /// All lookups finished
    fn finish(&mut self) {}
}

/// Progress sink that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _event: &ProgressEvent) {}
}
