pub mod cache_status;
pub mod cached_record;
pub mod commands;
pub mod connectivity;
pub mod queue_entry;
pub mod sync_report;

pub use cache_status::{CacheStatusSnapshot, EntityTypeStatus};
pub use cached_record::CachedRecord;
pub use commands::{QueueEntryDraft, RecordFilter};
pub use connectivity::ConnectivityState;
pub use queue_entry::QueueEntry;
pub use sync_report::SyncReport;
