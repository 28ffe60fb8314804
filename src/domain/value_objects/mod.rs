pub mod entity_id;
pub mod entity_type;
pub mod metadata_key;
pub mod mutation_kind;
pub mod payload;
pub mod queue_id;
pub mod sync_status;

pub use entity_id::EntityId;
pub use entity_type::EntityType;
pub use metadata_key::MetadataKey;
pub use mutation_kind::MutationKind;
pub use payload::EntityPayload;
pub use queue_id::QueueId;
pub use sync_status::SyncStatus;
