//! At-most-once dispatch keyed by `message_id`.
//!
//! The guard claims a key in the [`IdempotencyStore`] before running the
//! wrapped handler. The store's claim is the only synchronization point
//! between concurrent invocations: it must atomically insert an in-progress
//! record unless a live record already exists for the key.
//!
//! Record lifecycle:
//!
//! ```text
//! (absent) ──claim──► InProgress ──ok──► Completed (cached response)
//!                          │
//!                          └──err──► Failed (next claim replaces it)
//! ```
//!
//! Records past `expires_at`, failed records, and in-progress records past
//! their in-progress deadline are not live and can be claimed again.
//!
//! Every claim carries an owner token. Completing or failing a key is a no-op
//! for a caller whose claim has since been replaced, and the guard stops the
//! wrapped handler once its claim's in-progress deadline passes, so a
//! reclaimed key never has two running dispatches.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatcher::AlertHandler;
use crate::error::NotificationError;
use crate::types::DispatchResponse;

/// Idempotency record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdempotencyStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: String,
    pub status: IdempotencyStatus,

    /// Token of the invocation that claimed the key
    pub owner: Uuid,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// The record is ignored once this passes
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// An in-progress record is considered abandoned once this passes
    #[serde(with = "time::serde::rfc3339::option")]
    pub in_progress_expires_at: Option<OffsetDateTime>,

    /// Cached response of a completed invocation
    pub response: Option<DispatchResponse>,
}

impl IdempotencyRecord {
    /// A fresh claim with a new owner token.
    ///
    /// Fails when the configured windows push a timestamp out of range.
    pub fn in_progress(
        key: impl Into<String>,
        now: OffsetDateTime,
        settings: &IdempotencySettings,
    ) -> Result<Self, NotificationError> {
        let key = key.into();
        let out_of_range =
            || NotificationError::Store(format!("record timestamps for key {key} are out of range"));
        let expires_at = now
            .checked_add(settings.expires_after)
            .ok_or_else(out_of_range)?;
        let in_progress_expires_at = now
            .checked_add(settings.in_progress_timeout)
            .ok_or_else(out_of_range)?;

        Ok(Self {
            key,
            status: IdempotencyStatus::InProgress,
            owner: Uuid::new_v4(),
            created_at: now,
            expires_at,
            in_progress_expires_at: Some(in_progress_expires_at),
            response: None,
        })
    }

    /// Whether the record still blocks or answers invocations for its key.
    pub fn is_live(&self, now: OffsetDateTime) -> bool {
        if self.expires_at <= now {
            return false;
        }
        match self.status {
            IdempotencyStatus::Completed => true,
            IdempotencyStatus::Failed => false,
            IdempotencyStatus::InProgress => self
                .in_progress_expires_at
                .is_none_or(|deadline| deadline > now),
        }
    }
}

/// Validity windows for idempotency records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencySettings {
    pub expires_after: Duration,
    pub in_progress_timeout: Duration,
}

impl Default for IdempotencySettings {
    fn default() -> Self {
        Self {
            expires_after: Duration::hours(1),
            in_progress_timeout: Duration::seconds(30),
        }
    }
}

/// Outcome of claiming an idempotency key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns the key and must complete or fail it
    Acquired,
    /// A live record already exists
    Existing(IdempotencyRecord),
}

/// Storage for idempotency records
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Get the live record for a key, if any
    async fn get(
        &self,
        key: &str,
        now: OffsetDateTime,
    ) -> Result<Option<IdempotencyRecord>, NotificationError>;

    /// Atomically store an in-progress record unless a live one exists
    async fn create_in_progress(
        &self,
        record: IdempotencyRecord,
    ) -> Result<Claim, NotificationError>;

    /// Mark a key completed and cache its response.
    /// Does nothing unless `owner` still holds the claim.
    async fn complete(
        &self,
        key: &str,
        owner: Uuid,
        response: &DispatchResponse,
        expires_at: OffsetDateTime,
    ) -> Result<(), NotificationError>;

    /// Mark a key failed so the next invocation runs again.
    /// Does nothing unless `owner` still holds the claim.
    async fn fail(&self, key: &str, owner: Uuid) -> Result<(), NotificationError>;

    /// Delete records that are no longer live, returning how many were removed
    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64, NotificationError>;
}

#[async_trait]
impl<T: IdempotencyStore + ?Sized> IdempotencyStore for Arc<T> {
    async fn get(
        &self,
        key: &str,
        now: OffsetDateTime,
    ) -> Result<Option<IdempotencyRecord>, NotificationError> {
        (**self).get(key, now).await
    }

    async fn create_in_progress(
        &self,
        record: IdempotencyRecord,
    ) -> Result<Claim, NotificationError> {
        (**self).create_in_progress(record).await
    }

    async fn complete(
        &self,
        key: &str,
        owner: Uuid,
        response: &DispatchResponse,
        expires_at: OffsetDateTime,
    ) -> Result<(), NotificationError> {
        (**self).complete(key, owner, response, expires_at).await
    }

    async fn fail(&self, key: &str, owner: Uuid) -> Result<(), NotificationError> {
        (**self).fail(key, owner).await
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64, NotificationError> {
        (**self).purge_expired(now).await
    }
}

/// Idempotency store held in memory
#[derive(Debug)]
pub struct InMemoryIdempotencyStore {
    table: String,
    records: DashMap<String, IdempotencyRecord>,
}

impl InMemoryIdempotencyStore {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            records: DashMap::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn get(
        &self,
        key: &str,
        now: OffsetDateTime,
    ) -> Result<Option<IdempotencyRecord>, NotificationError> {
        Ok(self
            .records
            .get(key)
            .filter(|r| r.is_live(now))
            .map(|r| r.value().clone()))
    }

    async fn create_in_progress(
        &self,
        record: IdempotencyRecord,
    ) -> Result<Claim, NotificationError> {
        // The entry guard holds the shard lock across check and insert.
        match self.records.entry(record.key.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_live(record.created_at) {
                    return Ok(Claim::Existing(entry.get().clone()));
                }
                entry.insert(record);
                Ok(Claim::Acquired)
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(Claim::Acquired)
            }
        }
    }

    async fn complete(
        &self,
        key: &str,
        owner: Uuid,
        response: &DispatchResponse,
        expires_at: OffsetDateTime,
    ) -> Result<(), NotificationError> {
        let mut record = self
            .records
            .get_mut(key)
            .ok_or_else(|| NotificationError::Store(format!("no record for key {key}")))?;
        if record.owner != owner {
            debug!(message_id = key, "Claim was replaced; completion ignored");
            return Ok(());
        }
        record.status = IdempotencyStatus::Completed;
        record.response = Some(response.clone());
        record.expires_at = expires_at;
        record.in_progress_expires_at = None;
        Ok(())
    }

    async fn fail(&self, key: &str, owner: Uuid) -> Result<(), NotificationError> {
        if let Some(mut record) = self.records.get_mut(key) {
            if record.owner != owner {
                debug!(message_id = key, "Claim was replaced; failure ignored");
                return Ok(());
            }
            record.status = IdempotencyStatus::Failed;
            record.in_progress_expires_at = None;
        }
        Ok(())
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64, NotificationError> {
        let before = self.records.len();
        self.records.retain(|_, record| record.is_live(now));
        Ok(before.saturating_sub(self.records.len()) as u64)
    }
}

/// Handler stage that runs its inner handler at most once per `message_id`
pub struct IdempotencyGuard<H, S> {
    inner: H,
    store: S,
    settings: IdempotencySettings,
}

impl<H, S> IdempotencyGuard<H, S>
where
    H: AlertHandler,
    S: IdempotencyStore,
{
    pub fn new(inner: H, store: S, settings: IdempotencySettings) -> Self {
        Self {
            inner,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn idempotency_key(payload: &Value) -> Result<&str, NotificationError> {
        payload
            .get("message_id")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .ok_or(NotificationError::MissingIdempotencyKey)
    }

    fn replay(key: &str, record: IdempotencyRecord) -> Result<DispatchResponse, NotificationError> {
        match (record.status, record.response) {
            (IdempotencyStatus::Completed, Some(response)) => {
                info!(message_id = key, "Returning cached response for repeated invocation");
                Ok(response)
            }
            _ => {
                warn!(message_id = key, "Invocation already in progress");
                Err(NotificationError::ConcurrentInvocation(key.to_string()))
            }
        }
    }
}

#[async_trait]
impl<H, S> AlertHandler for IdempotencyGuard<H, S>
where
    H: AlertHandler,
    S: IdempotencyStore,
{
    async fn handle(&self, payload: &Value) -> Result<DispatchResponse, NotificationError> {
        let key = Self::idempotency_key(payload)?;
        let now = OffsetDateTime::now_utc();

        if let Some(existing) = self.store.get(key, now).await? {
            return Self::replay(key, existing);
        }

        let record = IdempotencyRecord::in_progress(key, now, &self.settings)?;
        let owner = record.owner;
        let deadline = record.in_progress_expires_at.unwrap_or(now);
        if let Claim::Existing(existing) = self.store.create_in_progress(record).await? {
            return Self::replay(key, existing);
        }
        debug!(message_id = key, "Idempotency key claimed");

        // The claim stops blocking duplicates at its deadline, so the
        // dispatch must not run past it.
        let budget = std::time::Duration::try_from(deadline - OffsetDateTime::now_utc())
            .unwrap_or(std::time::Duration::ZERO);
        let result = match tokio::time::timeout(budget, self.inner.handle(payload)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(message_id = key, "Dispatch cancelled at in-progress deadline");
                Err(NotificationError::DispatchTimeout(key.to_string()))
            }
        };

        match result {
            Ok(response) => {
                match OffsetDateTime::now_utc().checked_add(self.settings.expires_after) {
                    Some(expires_at) => {
                        if let Err(e) = self.store.complete(key, owner, &response, expires_at).await {
                            // The side effect already happened; the in-progress record
                            // keeps blocking duplicates until its deadline.
                            warn!(message_id = key, error = %e, "Failed to record completed invocation");
                        }
                    }
                    None => {
                        warn!(message_id = key, "Completed record expiry is out of range");
                    }
                }
                Ok(response)
            }
            Err(err) => {
                if let Err(e) = self.store.fail(key, owner).await {
                    warn!(message_id = key, error = %e, "Failed to record failed invocation");
                }
                Err(err)
            }
        }
    }
}
