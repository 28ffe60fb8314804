pub mod connectivity_monitor;
pub mod offline_facade;
pub mod sync_engine;

pub use connectivity_monitor::ConnectivityMonitor;
pub use offline_facade::{OfflineFacade, ReadOutcome, WriteOutcome};
pub use sync_engine::{EngineState, ReconcileReport, SyncEngine};
