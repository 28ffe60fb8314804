use crate::domain::entities::queue_entry::QueueEntryStatus;
use crate::domain::entities::{CachedRecord, QueueEntry};
use crate::domain::value_objects::{
    EntityId, EntityPayload, EntityType, MutationKind, QueueId, SyncStatus,
};
use crate::infrastructure::store::rows::{CachedEntityRow, QueueEntryRow};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};

pub fn cached_record_from_row(row: CachedEntityRow) -> Result<CachedRecord, AppError> {
    let entity_type = EntityType::parse(&row.entity_type).map_err(AppError::Validation)?;
    let entity_id = EntityId::new(row.entity_id).map_err(AppError::Validation)?;
    let data = EntityPayload::from_json_str(&row.data).map_err(AppError::Validation)?;
    let sync_status = SyncStatus::parse(&row.sync_status).map_err(AppError::Validation)?;

    Ok(CachedRecord::new(
        entity_type,
        entity_id,
        data,
        sync_status,
        row.last_synced.map(timestamp_to_datetime),
        timestamp_to_datetime(row.updated_at),
    ))
}

pub fn queue_entry_from_row(row: QueueEntryRow) -> Result<QueueEntry, AppError> {
    let id = QueueId::new(row.id).map_err(AppError::Validation)?;
    let entity_type = EntityType::parse(&row.entity_type).map_err(AppError::Validation)?;
    let entity_id = EntityId::new(row.entity_id).map_err(AppError::Validation)?;
    let kind = MutationKind::parse(&row.kind).map_err(AppError::Validation)?;
    let payload = EntityPayload::from_json_str(&row.payload).map_err(AppError::Validation)?;
    let status = QueueEntryStatus::parse(&row.status).map_err(AppError::Validation)?;
    let retry_count = u32::try_from(row.retry_count)
        .map_err(|_| AppError::Validation("retry_count cannot be negative".to_string()))?;

    Ok(QueueEntry {
        id,
        entity_type,
        entity_id,
        kind,
        payload,
        status,
        retry_count,
        last_attempt: row.last_attempt.map(timestamp_to_datetime),
        last_error: row.last_error,
        created_at: timestamp_to_datetime(row.created_at),
    })
}

pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .or_else(|| DateTime::<Utc>::from_timestamp_millis(ts))
        .unwrap_or_else(Utc::now)
}

pub fn datetime_to_timestamp(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}
