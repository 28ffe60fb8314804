pub mod local_store;
pub mod remote_api;
pub mod sync_notifier;

pub use local_store::LocalStore;
pub use remote_api::{ApiFailure, RemoteApi};
pub use sync_notifier::{SyncNotifier, TracingNotifier};
