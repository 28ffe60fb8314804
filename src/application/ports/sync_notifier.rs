use crate::domain::entities::SyncReport;

/// User-visible sync events. Implementations forward to whatever
/// notification surface the host application has; the default logs.
pub trait SyncNotifier: Send + Sync {
    /// Connectivity lost; writes will be queued locally.
    fn working_offline(&self);

    /// Items are waiting for the next sync cycle.
    fn pending_mutations(&self, count: u32);

    /// A sync cycle finished.
    fn sync_completed(&self, report: &SyncReport);

    /// A sync cycle could not run to completion; it will be retried.
    fn sync_failed(&self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl SyncNotifier for TracingNotifier {
    fn working_offline(&self) {
        tracing::info!(target: "offline::notify", "working offline");
    }

    fn pending_mutations(&self, count: u32) {
        tracing::info!(target: "offline::notify", count, "mutations pending sync");
    }

    fn sync_completed(&self, report: &SyncReport) {
        tracing::info!(
            target: "offline::notify",
            succeeded = report.succeeded,
            failed = report.failed,
            remaining = report.remaining,
            "sync cycle completed"
        );
    }

    fn sync_failed(&self, message: &str) {
        tracing::warn!(target: "offline::notify", error = message, "sync failed, will retry");
    }
}
