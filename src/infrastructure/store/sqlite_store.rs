use crate::application::ports::LocalStore;
use crate::domain::entities::{
    CacheStatusSnapshot, CachedRecord, EntityTypeStatus, QueueEntry, QueueEntryDraft, RecordFilter,
};
use crate::domain::value_objects::{
    EntityId, EntityType, MetadataKey, MutationKind, QueueId, SyncStatus,
};
use crate::infrastructure::store::mappers::{
    cached_record_from_row, datetime_to_timestamp, queue_entry_from_row, timestamp_to_datetime,
};
use crate::infrastructure::store::rows::{CachedEntityRow, MetadataRow, QueueEntryRow};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Pool, Row, Sqlite};

/// SQLite-backed `LocalStore`. One logical table per concern: the
/// entity mirror, the mutation queue, and sync metadata.
pub struct SqliteLocalStore {
    pool: Pool<Sqlite>,
}

impl SqliteLocalStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn queue_entry_by_id(&self, id: QueueId) -> Result<QueueEntry, AppError> {
        let row = sqlx::query_as::<_, QueueEntryRow>(
            r#"
            SELECT * FROM mutation_queue
            WHERE id = ?1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Queue entry {id} does not exist")))?;

        queue_entry_from_row(row)
    }

    async fn has_pending_create(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> Result<bool, AppError> {
        let existing = sqlx::query(
            r#"
            SELECT id FROM mutation_queue
            WHERE entity_type = ?1 AND entity_id = ?2 AND kind = 'create'
              AND status IN ('pending', 'failed')
            LIMIT 1
            "#,
        )
        .bind(entity_type.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing.is_some())
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn get(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> Result<Option<CachedRecord>, AppError> {
        let row = sqlx::query_as::<_, CachedEntityRow>(
            r#"
            SELECT * FROM cached_entities
            WHERE entity_type = ?1 AND entity_id = ?2
            "#,
        )
        .bind(entity_type.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(cached_record_from_row).transpose()
    }

    async fn list(
        &self,
        entity_type: EntityType,
        filter: RecordFilter,
    ) -> Result<Vec<CachedRecord>, AppError> {
        let mut sql = String::from(
            "SELECT * FROM cached_entities WHERE entity_type = ?",
        );
        if filter.sync_status.is_some() {
            sql.push_str(" AND sync_status = ?");
        }
        sql.push_str(" ORDER BY updated_at DESC, entity_id ASC");
        if filter.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }
        if filter.offset.is_some() {
            sql.push_str(" OFFSET ?");
        }

        let mut query = sqlx::query_as::<_, CachedEntityRow>(&sql).bind(entity_type.as_str());
        if let Some(status) = filter.sync_status {
            query = query.bind(status.as_str());
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit as i64);
        }
        if let Some(offset) = filter.offset {
            query = query.bind(offset as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(cached_record_from_row).collect()
    }

    async fn put(&self, record: CachedRecord) -> Result<(), AppError> {
        let data = serde_json::to_string(record.data.as_json())?;

        sqlx::query(
            r#"
            INSERT INTO cached_entities (
                entity_type, entity_id, data, sync_status, last_synced, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(entity_type, entity_id) DO UPDATE SET
                data = excluded.data,
                sync_status = excluded.sync_status,
                last_synced = excluded.last_synced,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.entity_type.as_str())
        .bind(record.entity_id.as_str())
        .bind(&data)
        .bind(record.sync_status.as_str())
        .bind(record.last_synced.map(datetime_to_timestamp))
        .bind(datetime_to_timestamp(record.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, entity_type: EntityType, id: &EntityId) -> Result<(), AppError> {
        sqlx::query(
            r#"
            DELETE FROM cached_entities
            WHERE entity_type = ?1 AND entity_id = ?2
            "#,
        )
        .bind(entity_type.as_str())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn enqueue_mutation(&self, draft: QueueEntryDraft) -> Result<QueueId, AppError> {
        let has_create = self
            .has_pending_create(draft.entity_type, &draft.entity_id)
            .await?;

        if has_create {
            return match draft.kind {
                MutationKind::Create => Err(AppError::InvalidSequence(format!(
                    "A create for {} {} is already queued",
                    draft.entity_type, draft.entity_id
                ))),
                _ => Err(AppError::InvalidSequence(format!(
                    "{} {} has an unconfirmed create; merge into its payload instead",
                    draft.entity_type, draft.entity_id
                ))),
            };
        }

        let payload = serde_json::to_string(draft.payload.as_json())?;
        let created_at = Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO mutation_queue (
                entity_type, entity_id, kind, payload, status, retry_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, 'pending', 0, ?5)
            "#,
        )
        .bind(draft.entity_type.as_str())
        .bind(draft.entity_id.as_str())
        .bind(draft.kind.as_str())
        .bind(&payload)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        QueueId::new(result.last_insert_rowid()).map_err(AppError::Validation)
    }

    async fn pending_mutations(&self) -> Result<Vec<QueueEntry>, AppError> {
        let rows = sqlx::query_as::<_, QueueEntryRow>(
            r#"
            SELECT * FROM mutation_queue
            WHERE status = 'pending'
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(queue_entry_from_row).collect()
    }

    async fn mutations_for_entity(
        &self,
        entity_type: EntityType,
        id: &EntityId,
    ) -> Result<Vec<QueueEntry>, AppError> {
        let rows = sqlx::query_as::<_, QueueEntryRow>(
            r#"
            SELECT * FROM mutation_queue
            WHERE entity_type = ?1 AND entity_id = ?2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(entity_type.as_str())
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(queue_entry_from_row).collect()
    }

    async fn update_mutation_payload(&self, id: QueueId, payload: Value) -> Result<(), AppError> {
        let payload = serde_json::to_string(&payload)?;
        let result = sqlx::query(
            r#"
            UPDATE mutation_queue
            SET payload = ?1
            WHERE id = ?2
            "#,
        )
        .bind(&payload)
        .bind(id.value())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Queue entry {id} does not exist"
            )));
        }
        Ok(())
    }

    async fn remove_mutation(&self, id: QueueId) -> Result<(), AppError> {
        sqlx::query(r#"DELETE FROM mutation_queue WHERE id = ?1"#)
            .bind(id.value())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_attempt(
        &self,
        id: QueueId,
        error: Option<&str>,
    ) -> Result<QueueEntry, AppError> {
        let now = Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            UPDATE mutation_queue
            SET retry_count = retry_count + 1,
                last_attempt = ?1,
                last_error = ?2
            WHERE id = ?3
            "#,
        )
        .bind(now)
        .bind(error)
        .bind(id.value())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Queue entry {id} does not exist"
            )));
        }
        self.queue_entry_by_id(id).await
    }

    async fn mark_mutation_failed(&self, id: QueueId, error: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE mutation_queue
            SET status = 'failed', last_error = ?1
            WHERE id = ?2
            "#,
        )
        .bind(error)
        .bind(id.value())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Queue entry {id} does not exist"
            )));
        }
        Ok(())
    }

    async fn purge_entity(&self, entity_type: EntityType, id: &EntityId) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let records = sqlx::query(
            r#"
            DELETE FROM cached_entities
            WHERE entity_type = ?1 AND entity_id = ?2
            "#,
        )
        .bind(entity_type.as_str())
        .bind(id.as_str())
        .execute(&mut *tx)
        .await?;

        let mutations = sqlx::query(
            r#"
            DELETE FROM mutation_queue
            WHERE entity_type = ?1 AND entity_id = ?2
            "#,
        )
        .bind(entity_type.as_str())
        .bind(id.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(records.rows_affected() + mutations.rows_affected())
    }

    async fn rewrite_entity_id(
        &self,
        entity_type: EntityType,
        from: &EntityId,
        to: &EntityId,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE cached_entities
            SET entity_id = ?1
            WHERE entity_type = ?2 AND entity_id = ?3
            "#,
        )
        .bind(to.as_str())
        .bind(entity_type.as_str())
        .bind(from.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE mutation_queue
            SET entity_id = ?1
            WHERE entity_type = ?2 AND entity_id = ?3
            "#,
        )
        .bind(to.as_str())
        .bind(entity_type.as_str())
        .bind(from.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn set_sync_status(
        &self,
        entity_type: EntityType,
        id: &EntityId,
        status: SyncStatus,
        last_synced: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE cached_entities
            SET sync_status = ?1,
                last_synced = COALESCE(?2, last_synced)
            WHERE entity_type = ?3 AND entity_id = ?4
            "#,
        )
        .bind(status.as_str())
        .bind(last_synced.map(datetime_to_timestamp))
        .bind(entity_type.as_str())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_server_state(
        &self,
        entity_type: EntityType,
        records: Vec<CachedRecord>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            let data = serde_json::to_string(record.data.as_json())?;
            sqlx::query(
                r#"
                INSERT INTO cached_entities (
                    entity_type, entity_id, data, sync_status, last_synced, updated_at
                ) VALUES (?1, ?2, ?3, 'synced', ?4, ?5)
                ON CONFLICT(entity_type, entity_id) DO UPDATE SET
                    data = excluded.data,
                    sync_status = 'synced',
                    last_synced = excluded.last_synced,
                    updated_at = excluded.updated_at
                WHERE cached_entities.sync_status = 'synced'
                "#,
            )
            .bind(entity_type.as_str())
            .bind(record.entity_id.as_str())
            .bind(&data)
            .bind(record.last_synced.map(datetime_to_timestamp))
            .bind(datetime_to_timestamp(record.updated_at))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_metadata(&self, key: &MetadataKey) -> Result<Option<Value>, AppError> {
        let row = sqlx::query_as::<_, MetadataRow>(
            r#"
            SELECT * FROM sync_metadata
            WHERE key = ?1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Ok::<_, AppError>(serde_json::from_str(&row.value)?))
            .transpose()
    }

    async fn set_metadata(&self, key: &MetadataKey, value: Value) -> Result<(), AppError> {
        let raw = serde_json::to_string(&value)?;
        let now = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO sync_metadata (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key.as_str())
        .bind(&raw)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cache_status(&self) -> Result<CacheStatusSnapshot, AppError> {
        let totals = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                SUM(CASE WHEN sync_status = 'pending' THEN 1 ELSE 0 END) AS pending,
                SUM(CASE WHEN sync_status = 'failed' THEN 1 ELSE 0 END) AS failed
            FROM cached_entities
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let total_records: i64 = totals.try_get("total").unwrap_or(0);
        let pending_records: i64 = totals.try_get::<Option<i64>, _>("pending")?.unwrap_or(0);
        let failed_records: i64 = totals.try_get::<Option<i64>, _>("failed")?.unwrap_or(0);

        let queue_row = sqlx::query(r#"SELECT COUNT(*) AS count FROM mutation_queue"#)
            .fetch_one(&self.pool)
            .await?;
        let queued_mutations: i64 = queue_row.try_get("count").unwrap_or(0);

        let per_type = sqlx::query(
            r#"
            SELECT
                entity_type,
                COUNT(*) AS record_count,
                SUM(CASE WHEN sync_status = 'pending' THEN 1 ELSE 0 END) AS pending_count,
                SUM(CASE WHEN sync_status = 'failed' THEN 1 ELSE 0 END) AS failed_count,
                MAX(last_synced) AS last_synced
            FROM cached_entities
            GROUP BY entity_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entity_types = Vec::with_capacity(per_type.len());
        for row in per_type {
            let raw_type: String = row.try_get("entity_type")?;
            let entity_type = EntityType::parse(&raw_type).map_err(AppError::Validation)?;
            entity_types.push(EntityTypeStatus {
                entity_type,
                record_count: row.try_get::<i64, _>("record_count").unwrap_or(0) as u64,
                pending_count: row
                    .try_get::<Option<i64>, _>("pending_count")?
                    .unwrap_or(0) as u64,
                failed_count: row.try_get::<Option<i64>, _>("failed_count")?.unwrap_or(0)
                    as u64,
                last_synced: row
                    .try_get::<Option<i64>, _>("last_synced")?
                    .map(timestamp_to_datetime),
            });
        }

        Ok(CacheStatusSnapshot {
            total_records: total_records as u64,
            pending_records: pending_records as u64,
            failed_records: failed_records as u64,
            queued_mutations: queued_mutations as u64,
            entity_types,
        })
    }

    async fn evict_stale(&self, older_than: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM cached_entities
            WHERE sync_status = 'synced'
              AND last_synced IS NOT NULL
              AND last_synced < ?1
            "#,
        )
        .bind(datetime_to_timestamp(older_than))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::EntityPayload;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_store() -> SqliteLocalStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        SqliteLocalStore::new(pool)
    }

    fn survey(id: &str, title: &str) -> CachedRecord {
        CachedRecord::from_server(
            EntityType::Survey,
            EntityId::new(id.into()).unwrap(),
            EntityPayload::new(json!({"id": id, "title": title})).unwrap(),
        )
    }

    fn draft(kind: MutationKind, id: &str) -> QueueEntryDraft {
        QueueEntryDraft::new(
            EntityType::Survey,
            EntityId::new(id.into()).unwrap(),
            kind,
            EntityPayload::new(json!({"title": "Park survey"})).unwrap(),
        )
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let store = setup_store().await;
        let record = survey("srv-1", "Park survey");

        store.put(record.clone()).await.unwrap();
        let fetched = store
            .get(EntityType::Survey, &record.entity_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched.entity_id, record.entity_id);
        assert_eq!(fetched.data, record.data);
        assert_eq!(fetched.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn list_filters_by_status_and_paginates() {
        let store = setup_store().await;
        for i in 0..5 {
            store.put(survey(&format!("srv-{i}"), "s")).await.unwrap();
        }
        let pending = CachedRecord::proposed(
            EntityType::Survey,
            EntityId::new("tmp-x".into()).unwrap(),
            EntityPayload::new(json!({"title": "draft"})).unwrap(),
        );
        store.put(pending).await.unwrap();

        let all = store
            .list(EntityType::Survey, RecordFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 6);

        let only_pending = store
            .list(
                EntityType::Survey,
                RecordFilter::with_status(SyncStatus::Pending),
            )
            .await
            .unwrap();
        assert_eq!(only_pending.len(), 1);

        let limited = store
            .list(
                EntityType::Survey,
                RecordFilter {
                    sync_status: None,
                    limit: Some(2),
                    offset: Some(1),
                },
            )
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn enqueue_rejects_update_behind_unconfirmed_create() {
        let store = setup_store().await;

        store
            .enqueue_mutation(draft(MutationKind::Create, "tmp-1"))
            .await
            .unwrap();

        let err = store
            .enqueue_mutation(draft(MutationKind::Update, "tmp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSequence(_)));

        let err = store
            .enqueue_mutation(draft(MutationKind::Create, "tmp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSequence(_)));
    }

    #[tokio::test]
    async fn record_attempt_updates_retry_state() {
        let store = setup_store().await;
        let id = store
            .enqueue_mutation(draft(MutationKind::Create, "tmp-1"))
            .await
            .unwrap();

        let entry = store.record_attempt(id, Some("timeout")).await.unwrap();
        assert_eq!(entry.retry_count, 1);
        assert_eq!(entry.last_error.as_deref(), Some("timeout"));
        assert!(entry.last_attempt.is_some());

        let entry = store.record_attempt(id, Some("timeout")).await.unwrap();
        assert_eq!(entry.retry_count, 2);
    }

    #[tokio::test]
    async fn failed_entries_leave_the_pending_queue_but_are_retained() {
        let store = setup_store().await;
        let id = store
            .enqueue_mutation(draft(MutationKind::Create, "tmp-1"))
            .await
            .unwrap();

        store.mark_mutation_failed(id, "422: bad title").await.unwrap();

        assert!(store.pending_mutations().await.unwrap().is_empty());
        let retained = store
            .mutations_for_entity(EntityType::Survey, &EntityId::new("tmp-1".into()).unwrap())
            .await
            .unwrap();
        assert_eq!(retained.len(), 1);
        assert_eq!(retained[0].last_error.as_deref(), Some("422: bad title"));
    }

    #[tokio::test]
    async fn purge_removes_record_and_queue_entries() {
        let store = setup_store().await;
        let temp = EntityId::new("tmp-1".into()).unwrap();
        store
            .put(CachedRecord::proposed(
                EntityType::Survey,
                temp.clone(),
                EntityPayload::new(json!({"title": "local only"})).unwrap(),
            ))
            .await
            .unwrap();
        store
            .enqueue_mutation(draft(MutationKind::Create, "tmp-1"))
            .await
            .unwrap();

        let purged = store.purge_entity(EntityType::Survey, &temp).await.unwrap();
        assert_eq!(purged, 2);
        assert!(store
            .get(EntityType::Survey, &temp)
            .await
            .unwrap()
            .is_none());
        assert!(store.pending_mutations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rewrite_entity_id_touches_record_and_queue() {
        let store = setup_store().await;
        let temp = EntityId::new("tmp-1".into()).unwrap();
        let server = EntityId::new("srv-42".into()).unwrap();

        store
            .put(CachedRecord::proposed(
                EntityType::Feedback,
                temp.clone(),
                EntityPayload::new(json!({"body": "x"})).unwrap(),
            ))
            .await
            .unwrap();
        store
            .enqueue_mutation(QueueEntryDraft::new(
                EntityType::Feedback,
                temp.clone(),
                MutationKind::Create,
                EntityPayload::new(json!({"body": "x"})).unwrap(),
            ))
            .await
            .unwrap();

        store
            .rewrite_entity_id(EntityType::Feedback, &temp, &server)
            .await
            .unwrap();

        assert!(store
            .get(EntityType::Feedback, &temp)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get(EntityType::Feedback, &server)
            .await
            .unwrap()
            .is_some());
        let entries = store
            .mutations_for_entity(EntityType::Feedback, &server)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn apply_server_state_skips_pending_rows() {
        let store = setup_store().await;
        let pending_id = EntityId::new("fb-1".into()).unwrap();
        store
            .put(CachedRecord::proposed(
                EntityType::Feedback,
                pending_id.clone(),
                EntityPayload::new(json!({"body": "local edit"})).unwrap(),
            ))
            .await
            .unwrap();

        let server_copy = CachedRecord::from_server(
            EntityType::Feedback,
            pending_id.clone(),
            EntityPayload::new(json!({"body": "server version"})).unwrap(),
        );
        let fresh = CachedRecord::from_server(
            EntityType::Feedback,
            EntityId::new("fb-2".into()).unwrap(),
            EntityPayload::new(json!({"body": "new"})).unwrap(),
        );
        store
            .apply_server_state(EntityType::Feedback, vec![server_copy, fresh])
            .await
            .unwrap();

        let local = store
            .get(EntityType::Feedback, &pending_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(local.sync_status, SyncStatus::Pending);
        assert_eq!(local.data.as_json()["body"], json!("local edit"));

        let fresh = store
            .get(EntityType::Feedback, &EntityId::new("fb-2".into()).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn metadata_roundtrip_and_upsert() {
        let store = setup_store().await;
        let key = MetadataKey::last_successful_sync();

        assert!(store.get_metadata(&key).await.unwrap().is_none());

        store.set_metadata(&key, json!(100)).await.unwrap();
        store.set_metadata(&key, json!(200)).await.unwrap();

        assert_eq!(store.get_metadata(&key).await.unwrap(), Some(json!(200)));
    }

    #[tokio::test]
    async fn cache_status_counts_by_type_and_status() {
        let store = setup_store().await;
        store.put(survey("srv-1", "a")).await.unwrap();
        store
            .put(CachedRecord::proposed(
                EntityType::Feedback,
                EntityId::new("tmp-9".into()).unwrap(),
                EntityPayload::new(json!({"body": "b"})).unwrap(),
            ))
            .await
            .unwrap();
        store
            .enqueue_mutation(QueueEntryDraft::new(
                EntityType::Feedback,
                EntityId::new("tmp-9".into()).unwrap(),
                MutationKind::Create,
                EntityPayload::new(json!({"body": "b"})).unwrap(),
            ))
            .await
            .unwrap();

        let status = store.cache_status().await.unwrap();
        assert_eq!(status.total_records, 2);
        assert_eq!(status.pending_records, 1);
        assert_eq!(status.queued_mutations, 1);
        assert_eq!(status.entity_types.len(), 2);
    }

    #[tokio::test]
    async fn evict_stale_spares_pending_records() {
        let store = setup_store().await;
        let mut old = survey("srv-1", "old");
        old.last_synced = Some(Utc::now() - chrono::Duration::hours(48));
        store.put(old).await.unwrap();
        store
            .put(CachedRecord::proposed(
                EntityType::Survey,
                EntityId::new("tmp-1".into()).unwrap(),
                EntityPayload::new(json!({"title": "draft"})).unwrap(),
            ))
            .await
            .unwrap();

        let evicted = store
            .evict_stale(Utc::now() - chrono::Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(evicted, 1);

        let remaining = store
            .list(EntityType::Survey, RecordFilter::default())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].sync_status, SyncStatus::Pending);
    }
}
