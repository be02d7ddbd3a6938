use std::{
    fmt,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use anyhow::Context;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
};
use chrono::{Duration, Utc};
use cucumber::{given, then, when, World as _};
use planner::{
    config::AppConfig,
    db::{init_pool, run_migrations},
    routes::create_router,
    services::{
        mailer::{MailError, MailReceipt, Mailer, OutgoingMail},
        trips::CreateTrip,
    },
    state::AppState,
};
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Default)]
struct TestMailer {
    down: AtomicBool,
    sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for TestMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<MailReceipt, MailError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(MailError::Transport("connection refused".into()));
        }
        self.sent.lock().expect("mailer lock").push(mail);
        Ok(MailReceipt {
            transport: "test",
            detail: "queued".into(),
        })
    }
}

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    created: Vec<String>,
    last_error: Option<String>,
    last_status: Option<u16>,
}

impl AppWorld {
    fn test_state(&self) -> &TestState {
        self.state.as_ref().expect("state must be initialised first")
    }
}

struct TestState {
    app: AppState,
    mailer: Arc<TestMailer>,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url: database_url.clone(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            smtp_url: None,
            mail_from_name: "Equipe plann.er".into(),
            mail_from_address: "oi@plann.er".parse()?,
            public_base_url: "http://localhost:3000".into(),
        };

        let db = init_pool(&config.database_url).await?;
        run_migrations(&db).await?;

        let mailer = Arc::new(TestMailer::default());
        let app = AppState::new(config, db, mailer.clone());
        Ok(Self {
            app,
            mailer,
            _root: root,
        })
    }

    async fn trip_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM trips")
            .fetch_one(&self.app.db)
            .await
            .expect("count trips")
    }
}

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.created.clear();
    world.last_error = None;
    world.last_status = None;
}

#[given("the mail transport is down")]
async fn given_mail_down(world: &mut AppWorld) {
    world.test_state().mailer.down.store(true, Ordering::SeqCst);
}

#[when(
    regex = r#"^"([^"]+)" <([^>]+)> plans a trip to "([^"]+)" starting in (-?\d+) hours and lasting (-?\d+) hours$"#
)]
async fn when_plan_trip(
    world: &mut AppWorld,
    owner_name: String,
    owner_email: String,
    destination: String,
    starts_in: i64,
    lasts: i64,
) {
    let starts_at = Utc::now() + Duration::hours(starts_in);
    let input = CreateTrip {
        destination,
        starts_at,
        ends_at: starts_at + Duration::hours(lasts),
        owner_name,
        owner_email: owner_email.parse().expect("valid owner email"),
    };
    match world.test_state().app.trips.create(input).await {
        Ok(trip_id) => world.created.push(trip_id),
        Err(err) => world.last_error = Some(format!("{err:?}")),
    }
}

#[when(regex = r#"^a trip request for destination "([^"]*)" is posted$"#)]
async fn when_post_trip(world: &mut AppWorld, destination: String) {
    let starts_at = Utc::now() + Duration::days(1);
    let body = json!({
        "destination": destination,
        "starts_at": starts_at.to_rfc3339(),
        "ends_at": (starts_at + Duration::days(5)).to_rfc3339(),
        "owner_name": "Ana",
        "owner_email": "ana@x.com",
    });
    let request = Request::post("/trips")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    let response = create_router(world.test_state().app.clone())
        .oneshot(request)
        .await
        .expect("router response");
    world.last_status = Some(response.status().as_u16());
}

#[then("the trip is created")]
async fn then_trip_created(world: &mut AppWorld) {
    assert!(world.last_error.is_none(), "unexpected error: {:?}", world.last_error);
    let trip_id = world.created.last().expect("a trip id");
    assert!(!trip_id.is_empty());
}

#[then(regex = r#"^the trip has a single confirmed owner "([^"]+)" <([^>]+)>$"#)]
async fn then_single_owner(world: &mut AppWorld, name: String, email: String) {
    let trip_id = world.created.last().expect("a trip id").clone();
    let details = world
        .test_state()
        .app
        .trips
        .get(&trip_id)
        .await
        .expect("load trip")
        .expect("trip exists");
    assert_eq!(details.participants.len(), 1);
    let owner = &details.participants[0];
    assert_eq!(owner.name, name);
    assert_eq!(owner.email, email);
    assert!(owner.is_owner);
    assert!(owner.is_confirmed);
}

#[then(regex = r"^creation fails with (InvalidStartDate|InvalidEndDate)$")]
async fn then_creation_fails(world: &mut AppWorld, kind: String) {
    assert!(world.created.is_empty());
    assert_eq!(world.last_error.as_deref(), Some(kind.as_str()));
}

#[then(regex = r"^(\d+) trips are stored$")]
async fn then_trips_stored(world: &mut AppWorld, expected: i64) {
    assert_eq!(world.test_state().trip_count().await, expected);
}

#[then("every created trip has its own id")]
async fn then_distinct_ids(world: &mut AppWorld) {
    let mut ids = world.created.clone();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), world.created.len());
}

#[then(regex = r"^1 confirmation mail was sent to (\S+)$")]
async fn then_one_mail(world: &mut AppWorld, email: String) {
    let sent = world.test_state().mailer.sent.lock().expect("mailer lock");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.email.to_string(), email);
}

#[then(regex = r"^(\d+) confirmation mails were sent$")]
async fn then_mails_sent(world: &mut AppWorld, expected: usize) {
    let sent = world.test_state().mailer.sent.lock().expect("mailer lock");
    assert_eq!(sent.len(), expected);
}

#[then(regex = r"^the response status is (\d+)$")]
async fn then_status(world: &mut AppWorld, expected: u16) {
    assert_eq!(world.last_status, Some(expected));
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
