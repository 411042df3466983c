//! Presence Integration Tests
//!
//! Two sessions share a medium while tokio time is paused, so heartbeat,
//! poll and expiry interact on a deterministic timeline.

use std::sync::Arc;
use std::time::Duration;

use stitchflow::core::SharedClock;
use stitchflow::presence::{
    MemoryMedium, PresenceFilter, PresenceMedium, PresenceSession, PresenceTiming, StorageMedium,
    GENERAL_NOTES,
};
use stitchflow::store::FileStore;
use stitchflow::{Clock, UserProfile};

/// Wall clock that follows tokio's (paused) time.
#[derive(Debug)]
struct TokioClock {
    start: tokio::time::Instant,
    base: i64,
}

impl Clock for TokioClock {
    fn now_millis(&self) -> i64 {
        self.base + self.start.elapsed().as_millis() as i64
    }
}

fn tokio_clock() -> SharedClock {
    Arc::new(TokioClock { start: tokio::time::Instant::now(), base: 1_717_000_000_000 })
}

fn profile(id: &str, name: &str) -> UserProfile {
    UserProfile { id: id.to_string(), name: name.to_string(), ..UserProfile::default() }
}

#[tokio::test(start_paused = true)]
async fn test_stopped_session_lingers_then_expires() {
    let medium: Arc<dyn PresenceMedium> = Arc::new(MemoryMedium::new());
    let clock = tokio_clock();
    let timing = PresenceTiming::default();

    let alice = PresenceSession::new(
        "p1",
        &profile("user_1", "Alice"),
        Arc::clone(&medium),
        Arc::clone(&clock),
        timing,
    )
    .start()
    .await;
    let bob = PresenceSession::new(
        "p1",
        &profile("user_2", "Bob"),
        Arc::clone(&medium),
        Arc::clone(&clock),
        timing,
    )
    .start()
    .await;
    bob.focus_section(GENERAL_NOTES).await;

    // Alice's first timed poll picks Bob up
    tokio::time::sleep(Duration::from_millis(2_100)).await;
    let editor = alice.section_editor(GENERAL_NOTES).expect("Bob is editing");
    assert_eq!(editor.user_name, "Bob");
    assert!(bob.collaborators().contains_key("user_1"));

    bob.stop();

    // No tombstone: Bob is still listed until his entry expires
    tokio::time::sleep(Duration::from_millis(2_900)).await;
    assert!(alice.collaborators().contains_key("user_2"));

    tokio::time::sleep(Duration::from_millis(8_000)).await;
    assert!(alice.collaborators().is_empty());
    assert!(alice.section_editor(GENERAL_NOTES).is_none());

    // Alice kept heartbeating the whole time
    let filter = PresenceFilter::new("p1", clock.now_millis(), timing.expiry);
    let live = medium.snapshot(&filter).await.unwrap();
    let users: Vec<&str> = live.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(users, vec!["user_1"]);

    alice.stop();
}

#[tokio::test(start_paused = true)]
async fn test_observer_sees_both_editors_until_one_expires() {
    let medium: Arc<dyn PresenceMedium> = Arc::new(MemoryMedium::new());
    let clock = tokio_clock();
    let start = |id: &str, name: &str| {
        PresenceSession::new(
            "p1",
            &profile(id, name),
            Arc::clone(&medium),
            Arc::clone(&clock),
            PresenceTiming::default(),
        )
        .start()
    };

    let observer = start("user_0", "Olga").await;
    let a = start("user_1", "Alice").await;
    let b = start("user_2", "Bob").await;
    a.focus_section(GENERAL_NOTES).await;
    b.focus_section(GENERAL_NOTES).await;

    tokio::time::sleep(Duration::from_millis(2_100)).await;
    let seen = observer.collaborators();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen["user_1"].active_section, GENERAL_NOTES);
    assert_eq!(seen["user_2"].active_section, GENERAL_NOTES);

    // Bob stops heartbeating; Alice keeps going
    b.stop();
    tokio::time::sleep(Duration::from_millis(11_000)).await;

    let seen = observer.collaborators();
    assert_eq!(seen.keys().collect::<Vec<_>>(), vec!["user_1"]);
    assert_eq!(observer.section_editor(GENERAL_NOTES).map(|c| c.user_name), Some("Alice".to_string()));

    a.stop();
    observer.stop();
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_arrivals() {
    let medium: Arc<dyn PresenceMedium> = Arc::new(MemoryMedium::new());
    let clock = tokio_clock();

    let alice = PresenceSession::new(
        "p1",
        &profile("user_1", "Alice"),
        Arc::clone(&medium),
        Arc::clone(&clock),
        PresenceTiming::default(),
    )
    .start()
    .await;
    let mut updates = alice.subscribe();
    assert!(updates.borrow_and_update().is_empty());

    let _carol = PresenceSession::new(
        "p1",
        &profile("user_3", "Carol"),
        Arc::clone(&medium),
        clock,
        PresenceTiming::default(),
    )
    .start()
    .await;

    updates.changed().await.unwrap();
    assert!(updates.borrow().contains_key("user_3"));
}

#[tokio::test(start_paused = true)]
async fn test_other_projects_are_invisible() {
    let medium: Arc<dyn PresenceMedium> = Arc::new(MemoryMedium::new());
    let clock = tokio_clock();

    let alice = PresenceSession::new(
        "p1",
        &profile("user_1", "Alice"),
        Arc::clone(&medium),
        Arc::clone(&clock),
        PresenceTiming::default(),
    )
    .start()
    .await;
    let _dave = PresenceSession::new(
        "p2",
        &profile("user_4", "Dave"),
        Arc::clone(&medium),
        clock,
        PresenceTiming::default(),
    )
    .start()
    .await;

    tokio::time::sleep(Duration::from_millis(4_500)).await;
    assert!(alice.collaborators().is_empty());
}

#[tokio::test]
async fn test_file_backed_sessions_share_a_directory() {
    let temp = tempfile::tempdir().unwrap();
    let clock: SharedClock = Arc::new(stitchflow::ManualClock::new(1_717_000_000_000));

    // Two processes would each open their own FileStore on the same directory
    let first = Arc::new(StorageMedium::new(Arc::new(FileStore::open(temp.path()).unwrap())));
    let second = Arc::new(StorageMedium::new(Arc::new(FileStore::open(temp.path()).unwrap())));

    let alice = PresenceSession::new(
        "p1",
        &profile("user_1", "Alice"),
        first,
        Arc::clone(&clock),
        PresenceTiming::default(),
    );
    let bob = PresenceSession::new(
        "p1",
        &profile("user_2", "Bob"),
        second,
        clock,
        PresenceTiming::default(),
    );

    alice.focus_section(GENERAL_NOTES).await;
    bob.announce().await;

    let seen_by_bob = bob.poll().await;
    assert_eq!(seen_by_bob.len(), 1);
    assert_eq!(seen_by_bob["user_1"].active_section, GENERAL_NOTES);
    assert!(alice.poll().await.contains_key("user_2"));
}
