//! Bounded-concurrency registry resolution
//!
//! Lookups run at most `concurrency` at a time. Each lookup carries the slot
//! it was submitted in, so results come back in submission order no matter
//! which lookup finishes first. Failures are captured per name and never
//! cancel the remaining lookups.

use crate::traits::{PackageRegistry, ProgressSink};
use crate::types::{ProgressEvent, ResolutionResult};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// Concurrent lookups when none is configured
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Resolves package names against a registry
pub struct ResolutionPipeline<'a, R: PackageRegistry + ?Sized> {
    registry: &'a R,
    concurrency: usize,
}

impl<'a, R: PackageRegistry + ?Sized> ResolutionPipeline<'a, R> {
    /// Create a pipeline; a concurrency of 0 is treated as 1
    pub fn new(registry: &'a R, concurrency: usize) -> Self {
        Self {
            registry,
            concurrency: concurrency.max(1),
        }
    }

    /// Effective concurrency limit
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Look up every name, one result per name in the order given
    ///
    /// Names are lowercased for the registry request; results keep the
    /// name as given. `progress` sees one event per finished lookup, in
    /// completion order.
    pub async fn resolve(
        &self,
        names: &[String],
        progress: &mut dyn ProgressSink,
    ) -> Vec<ResolutionResult> {
        let total = names.len();
        let registry = self.registry;
        let mut slots: Vec<Option<ResolutionResult>> = (0..total).map(|_| None).collect();

        let mut lookups = stream::iter(names.iter().enumerate())
            .map(|(slot, name)| async move {
                let outcome = registry.fetch_package(&name.to_lowercase()).await;
                (slot, outcome)
            })
            .buffer_unordered(self.concurrency);

        let mut completed = 0;
        let mut cumulative_bytes = 0;
        while let Some((slot, outcome)) = lookups.next().await {
            let name = &names[slot];
            completed += 1;
            match &outcome {
                Ok(metadata) => {
                    cumulative_bytes += metadata.bytes;
                    debug!(package = %name, bytes = metadata.bytes, "resolved package");
                }
                Err(e) => warn!(package = %name, error = %e, "package lookup failed"),
            }

            progress.on_progress(&ProgressEvent {
                completed,
                total,
                cumulative_bytes,
                current_name: name.clone(),
            });
            slots[slot] = Some(ResolutionResult {
                name: name.clone(),
                outcome,
            });
        }
        progress.finish();

        slots.into_iter().flatten().collect()
    }
}
