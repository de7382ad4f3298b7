//! End-to-end tests: inbound text through the command handler and state store.

use std::sync::Arc;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;

use liferhythm_bot::commands::{BUTTON_BACK, CommandHandler, DialogState, Reply, Sender};
use liferhythm_bot::config::BotSettings;
use liferhythm_bot::content::ContentStore;
use liferhythm_bot::state::{MemoryStore, StorageBackend, UserStateStore, open_store};

const USER: i64 = 1001;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

struct Harness {
    handler: CommandHandler,
    store: Arc<dyn UserStateStore>,
    rng: StdRng,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    fn with_store(store: Arc<dyn UserStateStore>) -> Self {
        let handler = CommandHandler::new(
            Arc::clone(&store),
            Arc::new(ContentStore::example()),
            BotSettings::default(),
        );
        Self {
            handler,
            store,
            rng: StdRng::seed_from_u64(1),
        }
    }

    async fn send_on(&mut self, text: &str, today: NaiveDate) -> Reply {
        self.handler.handle_on(&Sender::new(USER), text, today, &mut self.rng).await
    }

    async fn send(&mut self, text: &str) -> Reply {
        self.send_on(text, day(10)).await
    }
}

fn body(reply: &Reply) -> String {
    reply.chunks.concat()
}

#[tokio::test]
async fn biorhythm_without_dob_asks_to_set_it_first() {
    let mut harness = Harness::new();

    let reply = harness.send("/biorhythm").await;
    assert!(body(&reply).contains("Set your date of birth first: /setdob YYYY-MM-DD"));
}

#[tokio::test]
async fn water_adds_up_per_day() {
    let mut harness = Harness::new();

    harness.send("/water").await;
    harness.send("/water").await;
    assert_eq!(harness.store.get_water(USER, day(10)).await.unwrap(), 500);

    // A new day starts from zero.
    let reply = harness.send_on("/stats", day(11)).await;
    assert!(body(&reply).contains("Water today: 0 ml"));
    assert_eq!(harness.store.get_water(USER, day(10)).await.unwrap(), 500);
}

#[tokio::test]
async fn water_set_then_reset() {
    let mut harness = Harness::new();

    harness.send("/water set 1000").await;
    assert_eq!(harness.store.get_water(USER, day(10)).await.unwrap(), 1000);

    harness.send("/water reset").await;
    assert_eq!(harness.store.get_water(USER, day(10)).await.unwrap(), 0);
}

#[tokio::test]
async fn negative_water_changes_nothing() {
    let mut harness = Harness::new();

    harness.send("/water 300").await;
    let reply = harness.send("/water -300").await;
    assert!(!reply.success);
    assert_eq!(harness.store.get_water(USER, day(10)).await.unwrap(), 300);
}

#[tokio::test]
async fn menu_button_then_count() {
    let mut harness = Harness::new();

    let reply = harness.send("🥗 Nutrition").await;
    assert_eq!(
        harness.handler.dialog_state(USER).await,
        DialogState::AwaitingCount {
            topic: "nutrition".to_owned()
        }
    );
    let keyboard = reply.keyboard.unwrap();
    assert_eq!(keyboard.rows.last().unwrap(), &vec![BUTTON_BACK.to_owned()]);

    let reply = harness.send("7").await;
    let text = body(&reply);
    assert!(text.contains("7. "));
    assert!(!text.contains("8. "));
    assert_eq!(harness.handler.dialog_state(USER).await, DialogState::Idle);
}

#[tokio::test]
async fn unknown_command_changes_no_state() {
    let mut harness = Harness::new();

    harness.send("🌀 Yoga").await;
    let reply = harness.send("/teleport now").await;

    assert!(!reply.success);
    assert!(body(&reply).contains("didn't understand"));
    assert_eq!(
        harness.handler.dialog_state(USER).await,
        DialogState::AwaitingCount {
            topic: "yoga".to_owned()
        }
    );
    assert_eq!(harness.store.user_count().await.unwrap(), 0);
}

#[tokio::test]
async fn setdob_enables_biorhythm() {
    let mut harness = Harness::new();

    assert!(harness.send("/setdob 1990-08-20").await.success);
    let record = harness.store.get_or_create(USER).await.unwrap();
    assert_eq!(record.date_of_birth, NaiveDate::from_ymd_opt(1990, 8, 20));

    let reply = harness.send("/bio").await;
    assert!(reply.success);
    assert!(body(&reply).contains("Emotional:"));
}

#[tokio::test]
async fn setprofile_merges_fields() {
    let mut harness = Harness::new();

    harness.send("/setprofile goal=loss").await;
    let reply = harness.send("/setprofile height=180 weight=82.5 unknownField=x").await;
    assert!(body(&reply).contains("unknownField"));

    let record = harness.store.get_or_create(USER).await.unwrap();
    assert_eq!(record.height_cm, Some(180.0));
    assert_eq!(record.weight_kg, Some(82.5));
    assert_eq!(record.goal.as_deref(), Some("loss"));
    assert_eq!(record.age, None);
}

#[tokio::test]
async fn sqlite_backend_serves_the_same_flow() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StorageBackend::Sqlite(dir.path().join("bot.db"));

    {
        let mut harness = Harness::with_store(open_store(&backend).unwrap());
        harness.send("/water 400").await;
        harness.send("/setdob 2000-01-01").await;
    }

    let mut harness = Harness::with_store(open_store(&backend).unwrap());
    assert!(body(&harness.send("/stats").await).contains("400 ml"));
    assert!(harness.send("/biorhythm").await.success);
}

#[tokio::test]
async fn json_backend_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StorageBackend::Json(dir.path().join("state.json"));

    {
        let mut harness = Harness::with_store(open_store(&backend).unwrap());
        harness.send("/water").await;
    }

    let harness = Harness::with_store(open_store(&backend).unwrap());
    assert_eq!(harness.store.get_water(USER, day(10)).await.unwrap(), 250);
}

#[tokio::test]
async fn oversized_water_is_refused_by_every_backend() {
    let dir = tempfile::tempdir().unwrap();
    let backends = [
        StorageBackend::Memory,
        StorageBackend::Json(dir.path().join("state.json")),
        StorageBackend::Sqlite(dir.path().join("bot.db")),
    ];

    for backend in &backends {
        let mut harness = Harness::with_store(open_store(backend).unwrap());
        harness.send("/water 500").await;

        for text in ["/water 9223372036854775807", "/water set 9223372036854775807", "/water 10001"] {
            let reply = harness.send(text).await;
            assert!(!reply.success, "{text} on {}", backend.name());
            assert!(body(&reply).contains("too large"), "{text} on {}", backend.name());
        }
        assert_eq!(harness.store.get_water(USER, day(10)).await.unwrap(), 500);
    }
}

#[tokio::test]
async fn challenge_counts_days_at_goal() {
    let mut harness = Harness::new();

    for d in [4, 6, 9] {
        harness.send_on("/water set 2000", day(d)).await;
    }
    harness.send_on("/water 1000", day(10)).await;

    let text = body(&harness.send("/challenges").await);
    assert!(text.contains("Today: 1000 / 2000 ml (50%)"));
    assert!(text.contains("Goal reached on 3 of the last 7 days"));

    // Day 4 falls out of the window a week later.
    let text = body(&harness.send_on("/challenges", day(11)).await);
    assert!(text.contains("Goal reached on 2 of the last 7 days"));
}
