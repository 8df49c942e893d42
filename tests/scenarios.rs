//! Dashboard Scenarios
//!
//! End-to-end flows through `ResourceScreen` against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use filmdesk::api::{Failure, Method};
use filmdesk::{
    resources, AuthClient, ClientError, FieldMap, FormError, HttpCollection, MemoryBackend, NoticeLevel, Operation,
    Record, RecordId, RemoveOutcome, ResourceScreen, Session, ToastBoard,
};

type Screen = ResourceScreen<HttpCollection<Arc<MemoryBackend>>>;

fn seeded_backend() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    for schema in resources::all() {
        backend.register(&schema);
    }
    backend.seed(
        "/projects",
        vec![
            Record::draft(FieldMap::new()).with("title", "Neon Nights").with("status", "In Progress"),
            Record::draft(FieldMap::new()).with("title", "Echoes").with("status", "Planning"),
            Record::draft(FieldMap::new()).with("title", "Echoes of Tomorrow").with("status", "Completed"),
        ],
    );
    backend
}

async fn open(backend: &Arc<MemoryBackend>, route: &str) -> (Screen, Arc<ToastBoard>) {
    let session = Session::with_token(backend.issue_token());
    let board = Arc::new(ToastBoard::new(Duration::from_secs(4)));
    let mut screen = ResourceScreen::for_route(route, backend.clone(), session, board.clone())
        .expect("built-in route");
    screen.mount().await.expect("initial load");
    (screen, board)
}

fn titles(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.text("title")).collect()
}

#[tokio::test]
async fn test_search_with_all_filter() {
    let backend = seeded_backend();
    let (mut screen, _) = open(&backend, "/dashboard/Projects").await;

    screen.set_search("echo");
    screen.set_filter("status", "All");
    assert_eq!(titles(&screen.visible()), vec!["Echoes", "Echoes of Tomorrow"]);

    screen.set_filter("status", "Completed");
    assert_eq!(titles(&screen.visible()), vec!["Echoes of Tomorrow"]);
}

#[tokio::test]
async fn test_create_without_required_field_sends_nothing() {
    let backend = seeded_backend();
    let (screen, board) = open(&backend, "/dashboard/team").await;
    let form = screen.form();
    form.set_field("name", "Michael Chen");
    form.set_field("role", "Cinematographer");
    form.set_field("project", "Echoes");
    form.set_field("phone", "555-0102");

    let err = screen.submit().await.expect_err("email is required");
    match err {
        FormError::Invalid(issues) => assert_eq!(issues[0].field, "email"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(backend.request_count(Method::Post), 0);
    assert!(board.history().is_empty());
}

#[tokio::test]
async fn test_create_then_collection_is_refetched() {
    let backend = seeded_backend();
    let (mut screen, board) = open(&backend, "/dashboard/Projects").await;
    let form = screen.form();
    form.set_field("title", "Sands of Time");
    form.set_field("status", "Planning");
    form.set_field("dueDate", "2025-06-30");
    form.set_field("budget", "3000000");
    form.set_field("team", "30");

    screen.submit().await.expect("create");
    assert_eq!(backend.request_count(Method::Get), 2);
    assert_eq!(screen.store().records(), backend.records("/projects"));

    screen.set_search("sands");
    assert_eq!(titles(&screen.visible()), vec!["Sands of Time"]);
    assert_eq!(board.active()[0].notice.message, "Project added successfully");
}

#[tokio::test]
async fn test_remove_then_collection_excludes_record() {
    let backend = seeded_backend();
    let (screen, board) = open(&backend, "/dashboard/Projects").await;

    let outcome = screen
        .remove(&RecordId::Num(2), |_: Option<&Record>| true)
        .await
        .expect("delete");
    assert_eq!(outcome, RemoveOutcome::Removed);
    assert!(screen.store().find(&RecordId::Num(2)).is_none());
    assert_eq!(titles(&screen.store().records()), vec!["Neon Nights", "Echoes of Tomorrow"]);
    assert_eq!(board.count(NoticeLevel::Success), 1);
}

#[tokio::test]
async fn test_failed_remove_keeps_collection_and_reports_once() {
    let backend = seeded_backend();
    let (screen, board) = open(&backend, "/dashboard/Projects").await;
    let before = screen.store().records();
    backend.fail_next(Method::Delete, Failure::Network);

    let err = screen
        .remove(&RecordId::Num(2), |_: Option<&Record>| true)
        .await
        .expect_err("network failure");
    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(screen.store().records(), before);
    assert_eq!(board.count(NoticeLevel::Error), 1);

    let active = board.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].notice.key.operation, Operation::Remove);
    assert_eq!(active[0].notice.message, "Failed to delete project");
}

#[tokio::test(start_paused = true)]
async fn test_double_submit_issues_one_request() {
    let backend = Arc::new(MemoryBackend::new().with_latency(Duration::from_millis(300)));
    let schema = resources::bids();
    backend.register(&schema);
    let session = Session::with_token(backend.issue_token());
    let board = Arc::new(ToastBoard::new(Duration::from_secs(4)));
    let screen = ResourceScreen::new(HttpCollection::for_schema(backend.clone(), session, &schema), schema, board);

    let form = screen.form();
    form.set_field("project", "Starfall");
    form.set_field("role", "Gaffer");
    form.set_field("bidder", "Lena Park");
    form.set_field("amount", "$12,000");

    let (first, second) = tokio::join!(screen.submit(), screen.submit());
    assert!(first.is_ok());
    assert_eq!(second.expect_err("suppressed"), FormError::Busy);
    assert_eq!(backend.request_count(Method::Post), 1);

    // Once resolved the form accepts the next submit
    form.set_field("project", "Echoes");
    form.set_field("role", "Editor");
    form.set_field("bidder", "Omar Haddad");
    form.set_field("amount", "$8,000");
    screen.submit().await.expect("second bid");
    assert_eq!(backend.records("/bids").len(), 2);
}

#[tokio::test]
async fn test_logout_blocks_every_screen() {
    let backend = seeded_backend();
    backend.add_account("sarah@example.com", "hunter22");
    let session = Session::new();
    let board = Arc::new(ToastBoard::new(Duration::from_secs(4)));
    let auth = AuthClient::new(backend.clone(), session.clone(), board.clone());
    auth.login("sarah@example.com", "hunter22", &Default::default())
        .await
        .expect("login");
    assert_eq!(board.count(NoticeLevel::Success), 1);

    let mut projects = ResourceScreen::for_route("/dashboard/Projects", backend.clone(), session.clone(), board.clone())
        .expect("projects route");
    projects.mount().await.expect("signed in load");
    assert_eq!(projects.visible().len(), 3);

    auth.logout();
    let err = projects.refresh().await.expect_err("signed out");
    assert!(matches!(err, ClientError::Auth(_)));
    // Previous snapshot survives the failed refresh
    assert_eq!(projects.visible().len(), 3);
    assert_eq!(board.count(NoticeLevel::Error), 1);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_discards_late_response() {
    let backend = Arc::new(MemoryBackend::new().with_latency(Duration::from_millis(500)));
    let schema = resources::equipment();
    backend.register(&schema);
    let session = Session::with_token(backend.issue_token());
    let board = Arc::new(ToastBoard::new(Duration::from_secs(4)));
    let screen = Arc::new(ResourceScreen::new(
        HttpCollection::for_schema(backend.clone(), session, &schema),
        schema,
        board.clone(),
    ));

    let pending = {
        let screen = screen.clone();
        tokio::spawn(async move { screen.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(screen.store().is_loading());
    screen.teardown();

    let result = pending.await.expect("task");
    assert_eq!(result, Err(ClientError::Cancelled));
    assert!(!screen.store().is_loading());
    assert!(board.history().is_empty());
    assert!(backend.requests().is_empty());
}
