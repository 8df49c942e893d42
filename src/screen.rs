//! Resource Screen
//!
//! One list screen: the collection store, its form and the current query.
//! Every built-in resource is an instance of this type configured by its
//! schema. Dropping the screen tears it down.

use std::sync::Arc;

use crate::api::{HttpCollection, RemoteCollection, Transport};
use crate::context::Session;
use crate::domain::{ClientResult, Record, RecordId, ResourceSchema};
use crate::filter::Query;
use crate::form::{FormController, FormError};
use crate::notify::NotificationSink;
use crate::resources;
use crate::store::{CollectionStore, Confirm, RemoveOutcome};

pub struct ResourceScreen<C> {
    store: CollectionStore<C>,
    form: FormController,
    query: Query,
    mounted: bool,
}

impl<C> ResourceScreen<C> {
    pub fn schema(&self) -> &ResourceSchema {
        self.store.schema()
    }

    pub fn store(&self) -> &CollectionStore<C> {
        &self.store
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn set_search(&mut self, text: &str) {
        self.query.set_search(text);
    }

    pub fn set_filter(&mut self, field: &str, value: &str) {
        self.query.set_filter(field, value);
    }

    pub fn set_tab(&mut self, name: &str) {
        self.query.set_tab(name);
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
    }

    /// What the list shows right now
    pub fn visible(&self) -> Vec<Record> {
        self.store.visible(&self.query)
    }

    pub fn teardown(&self) {
        self.store.teardown();
    }
}

impl<C: RemoteCollection> ResourceScreen<C> {
    /// A screen with an empty query and a create-mode form
    pub fn new(remote: C, schema: ResourceSchema, sink: Arc<dyn NotificationSink>) -> Self {
        let schema = Arc::new(schema);
        let form = FormController::new(schema.clone());
        Self {
            store: CollectionStore::new(remote, schema, sink),
            form,
            query: Query::new(),
            mounted: false,
        }
    }

    /// Initial fetch; later calls are no-ops
    pub async fn mount(&mut self) -> ClientResult<()> {
        if self.mounted {
            return Ok(());
        }
        self.mounted = true;
        self.store.load().await?;
        Ok(())
    }

    pub async fn refresh(&self) -> ClientResult<Vec<Record>> {
        self.store.reconcile().await
    }

    pub async fn submit(&self) -> Result<Option<Record>, FormError> {
        self.form.submit(&self.store).await
    }

    /// Load the record into the form for editing
    pub fn edit(&self, id: &RecordId) -> Result<(), FormError> {
        match self.store.find(id) {
            Some(record) => self.form.edit(&record),
            None => Err(FormError::Missing(id.clone())),
        }
    }

    pub async fn remove(&self, id: &RecordId, confirm: impl Confirm) -> ClientResult<RemoveOutcome> {
        self.store.remove(id, confirm).await
    }
}

impl<T: Transport> ResourceScreen<HttpCollection<T>> {
    /// Screen for the built-in resource mounted at `route`
    pub fn for_route(route: &str, transport: T, session: Session, sink: Arc<dyn NotificationSink>) -> Option<Self> {
        let schema = resources::by_route(route)?;
        let remote = HttpCollection::for_schema(transport, session, &schema);
        Some(Self::new(remote, schema, sink))
    }
}

impl<C> Drop for ResourceScreen<C> {
    fn drop(&mut self) {
        self.store.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MemoryBackend, Method};
    use crate::domain::FieldMap;
    use crate::notify::ToastBoard;
    use std::time::Duration;

    fn backend() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        let schema = resources::bids();
        backend.register(&schema);
        backend.seed(
            &schema.endpoint,
            vec![
                Record::draft(FieldMap::new())
                    .with("project", "Neon Nights")
                    .with("bidder", "Lena Park")
                    .with("status", "Pending"),
                Record::draft(FieldMap::new())
                    .with("project", "Starfall")
                    .with("bidder", "Omar Haddad")
                    .with("status", "Accepted"),
            ],
        );
        backend
    }

    fn screen(backend: &Arc<MemoryBackend>) -> ResourceScreen<HttpCollection<Arc<MemoryBackend>>> {
        let session = Session::with_token(backend.issue_token());
        let sink = Arc::new(ToastBoard::new(Duration::from_secs(4)));
        ResourceScreen::for_route("/dashboard/bids", backend.clone(), session, sink).unwrap()
    }

    #[tokio::test]
    async fn test_mount_fetches_once() {
        let backend = backend();
        let mut screen = screen(&backend);
        screen.mount().await.unwrap();
        screen.mount().await.unwrap();
        assert_eq!(backend.request_count(Method::Get), 1);
        assert_eq!(screen.visible().len(), 2);
    }

    #[tokio::test]
    async fn test_query_narrows_visible() {
        let backend = backend();
        let mut screen = screen(&backend);
        screen.mount().await.unwrap();

        screen.set_search("omar");
        assert_eq!(screen.visible()[0].text("project"), "Starfall");

        screen.clear_query();
        screen.set_filter("status", "Pending");
        assert_eq!(screen.visible().len(), 1);
        assert_eq!(screen.visible()[0].text("bidder"), "Lena Park");

        screen.set_filter("status", "Accepted");
        screen.set_tab("pending");
        assert!(screen.visible().is_empty());
    }

    #[tokio::test]
    async fn test_new_screen_starts_unfiltered() {
        let backend = backend();
        let mut first = screen(&backend);
        first.set_search("omar");
        drop(first);

        let second = screen(&backend);
        assert_eq!(second.query(), &Query::new());
    }

    #[tokio::test]
    async fn test_edit_unknown_record() {
        let backend = backend();
        let mut screen = screen(&backend);
        screen.mount().await.unwrap();
        assert_eq!(screen.edit(&RecordId::Num(99)), Err(FormError::Missing(RecordId::Num(99))));
        screen.edit(&RecordId::Num(2)).unwrap();
        assert_eq!(screen.form().value("bidder"), "Omar Haddad");
    }

    #[test]
    fn test_unknown_route() {
        let backend = backend();
        let sink = Arc::new(ToastBoard::new(Duration::from_secs(4)));
        assert!(ResourceScreen::for_route("/dashboard/nope", backend, Session::new(), sink).is_none());
    }

    #[tokio::test]
    async fn test_teardown_cancels_refresh() {
        let backend = backend();
        let screen = screen(&backend);
        screen.teardown();
        assert!(screen.store().is_torn_down());
        assert!(screen.refresh().await.unwrap_err().is_cancelled());
        assert!(backend.requests().is_empty());
    }
}
