//! Collection Store
//!
//! Owns one screen's snapshot of a remote collection. The snapshot only
//! ever changes by replacing it with a fresh `list` result: every mutation
//! is followed by a full re-fetch, never a local patch.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tokio_util::sync::CancellationToken;

use crate::api::RemoteCollection;
use crate::domain::{ClientError, ClientResult, Entity, FieldMap, Record, RecordId, ResourceSchema};
use crate::filter::{self, Query};
use crate::notify::{Notice, NoticeKey, NotificationSink, Operation};

/// Asked before a record is deleted
pub trait Confirm {
    /// `record` is `None` when the id is not in the current snapshot
    fn confirm(&self, record: Option<&Record>) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(Option<&Record>) -> bool,
{
    fn confirm(&self, record: Option<&Record>) -> bool {
        self(record)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The user said no; nothing was sent
    Declined,
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Counts a request as outstanding until dropped
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct CollectionStore<C> {
    remote: C,
    schema: Arc<ResourceSchema>,
    sink: Arc<dyn NotificationSink>,
    records: RwLock<Vec<Record>>,
    in_flight: AtomicUsize,
    cancel: CancellationToken,
}

impl<C> CollectionStore<C> {
    pub fn new(remote: C, schema: Arc<ResourceSchema>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            remote,
            schema,
            sink,
            records: RwLock::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            cancel: CancellationToken::new(),
        }
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn schema_arc(&self) -> Arc<ResourceSchema> {
        self.schema.clone()
    }

    /// The collection as last fetched
    pub fn records(&self) -> Vec<Record> {
        self.records.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn find(&self, id: &RecordId) -> Option<Record> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|r| r.has_id(id))
            .cloned()
    }

    /// The collection narrowed by `query`
    pub fn visible(&self, query: &Query) -> Vec<Record> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        filter::visible(&records, &self.schema, query)
    }

    /// Any request of this store still outstanding?
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Abort everything in flight; later results are discarded
    pub fn teardown(&self) {
        if !self.cancel.is_cancelled() {
            log::debug!("[{}] teardown", self.schema.key);
            self.cancel.cancel();
        }
    }
}

impl<C: RemoteCollection> CollectionStore<C> {
    fn key(&self, operation: Operation) -> NoticeKey {
        NoticeKey::new(&self.schema.key, operation)
    }

    fn replace(&self, records: Vec<Record>) {
        *self.records.write().unwrap_or_else(|e| e.into_inner()) = records;
    }

    async fn tracked<T>(&self, fut: impl Future<Output = T>) -> T {
        let _guard = InFlight::enter(&self.in_flight);
        fut.await
    }

    /// Initial fetch when the screen mounts
    pub async fn load(&self) -> ClientResult<Vec<Record>> {
        log::debug!("[{}] load", self.schema.key);
        self.reconcile().await
    }

    /// Replace the snapshot with the authoritative collection.
    /// On failure the previous snapshot stays and one error notice is shown.
    pub async fn reconcile(&self) -> ClientResult<Vec<Record>> {
        let token = self.cancel.child_token();
        match self.tracked(self.remote.list(&token)).await {
            Ok(records) => {
                log::debug!("[{}] {} records", self.schema.key, records.len());
                self.replace(records.clone());
                Ok(records)
            }
            Err(ClientError::Cancelled) => Err(ClientError::Cancelled),
            Err(err) => {
                log::warn!("[{}] list failed: {}", self.schema.key, err);
                self.sink.notify(Notice::error(
                    self.key(Operation::Load),
                    format!("Failed to load {}", self.schema.plural),
                ));
                Err(err)
            }
        }
    }

    /// Report the outcome of one mutation and re-fetch on success
    async fn mutate<T>(
        &self,
        operation: Operation,
        labels: (&str, &str, &str),
        fut: impl Future<Output = ClientResult<T>>,
    ) -> ClientResult<T> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let (loading, done, failed) = labels;
        let key = self.key(operation);
        let singular = &self.schema.singular;

        self.sink.notify(Notice::loading(key.clone(), format!("{} {}...", loading, singular)));
        match self.tracked(fut).await {
            Ok(value) => {
                self.sink.notify(Notice::success(
                    key,
                    format!("{} {} successfully", capitalize(singular), done),
                ));
                // The mutation stands even if the re-fetch fails; that failure
                // gets its own notice.
                let _ = self.reconcile().await;
                Ok(value)
            }
            Err(ClientError::Cancelled) => {
                self.sink.dismiss(&key);
                Err(ClientError::Cancelled)
            }
            Err(err) => {
                log::warn!("[{}] {} failed: {}", self.schema.key, operation.as_str(), err);
                self.sink.notify(Notice::error(key, format!("Failed to {} {}", failed, singular)));
                Err(err)
            }
        }
    }

    pub async fn create(&self, draft: &FieldMap) -> ClientResult<Option<Record>> {
        let token = self.cancel.child_token();
        self.mutate(
            Operation::Create,
            ("Adding", "added", "add"),
            self.remote.create(draft, &token),
        )
        .await
    }

    pub async fn update(&self, id: &RecordId, draft: &FieldMap) -> ClientResult<Option<Record>> {
        let token = self.cancel.child_token();
        self.mutate(
            Operation::Update,
            ("Updating", "updated", "update"),
            self.remote.update(id, draft, &token),
        )
        .await
    }

    /// Delete after `confirm` accepts
    pub async fn remove(&self, id: &RecordId, confirm: impl Confirm) -> ClientResult<RemoveOutcome> {
        if !confirm.confirm(self.find(id).as_ref()) {
            return Ok(RemoveOutcome::Declined);
        }
        let token = self.cancel.child_token();
        self.mutate(
            Operation::Remove,
            ("Deleting", "deleted", "delete"),
            self.remote.remove(id, &token),
        )
        .await?;
        Ok(RemoveOutcome::Removed)
    }
}
