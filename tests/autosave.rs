//! End-to-end autosave behaviour on a paused clock.
//!
//! `MemoryStore::hold_updates` parks every `update` until the gate is
//! released, which makes "a save is in flight" a state the tests can stand in.

use engpad::config::NotepadConfig;
use engpad::events::MessageLevel;
use engpad::model::{Document, DocumentId, DocumentKind};
use engpad::session::{SaveOutcome, Session};
use engpad::store::fs::FileStore;
use engpad::store::memory::MemoryStore;
use engpad::store::DocumentStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, Instant};

type TestSession = Session<Arc<MemoryStore>>;

fn setup() -> (Arc<MemoryStore>, TestSession) {
    let store = Arc::new(MemoryStore::new());
    let session = Session::new(store.clone(), &NotepadConfig::default());
    (store, session)
}

async fn new_doc(session: &TestSession) -> DocumentId {
    session
        .create_document(DocumentKind::Markdown, None, None)
        .await
        .unwrap()
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Let spawned tasks run without moving the clock meaningfully.
async fn settle() {
    sleep(ms(1)).await;
}

fn contents(store: &MemoryStore, id: DocumentId) -> Vec<String> {
    store.updates_for(id).into_iter().map(|w| w.content).collect()
}

#[tokio::test(start_paused = true)]
async fn last_edit_is_persisted_across_an_in_flight_save() {
    let (store, session) = setup();
    let id = new_doc(&session).await;
    store.hold_updates();

    session.apply_edit(id, "a").unwrap();
    sleep(ms(1_100)).await;
    assert!(session.document_state(id).unwrap().is_saving);

    session.apply_edit(id, "ab").unwrap();
    session.apply_edit(id, "abc").unwrap();
    sleep(ms(1_100)).await;
    // The second timer fired while the first write was parked.
    assert!(!session.has_pending_save(id));
    assert!(session.document_state(id).unwrap().is_dirty);

    store.release_updates();
    settle().await;

    assert_eq!(contents(&store, id), vec!["a", "abc"]);
    assert_eq!(store.get(id).await.unwrap().unwrap().content, "abc");
    let state = session.document_state(id).unwrap();
    assert!(!state.is_dirty && !state.is_saving);
    assert_eq!(store.peak_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn edit_during_save_without_follow_up_timer_stays_dirty() {
    let (store, session) = setup();
    let id = new_doc(&session).await;
    let gate = store.hold_updates();

    session.apply_edit(id, "one").unwrap();
    sleep(ms(1_100)).await;
    session.apply_edit(id, "two").unwrap();

    gate.add_permits(1);
    settle().await;
    assert_eq!(contents(&store, id), vec!["one"]);
    assert!(session.document_state(id).unwrap().is_dirty);

    // The timer armed by "two" is still pending and finishes the job.
    store.release_updates();
    sleep(ms(1_100)).await;
    assert_eq!(contents(&store, id), vec!["one", "two"]);
    assert!(!session.document_state(id).unwrap().is_dirty);
}

#[tokio::test(start_paused = true)]
async fn at_most_one_write_in_flight_per_document() {
    let (store, session) = setup();
    let id = new_doc(&session).await;
    store.hold_updates();

    session.apply_edit(id, "first").unwrap();
    sleep(ms(1_100)).await;
    session.apply_edit(id, "second").unwrap();

    let flusher = {
        let session = session.clone();
        tokio::spawn(async move { session.save_document(id).await })
    };
    settle().await;
    assert_eq!(session.sweep().await, 0);
    assert!(!flusher.is_finished());

    let mut status = session.subscribe_status();
    store.release_updates();
    assert_eq!(flusher.await.unwrap().unwrap(), SaveOutcome::Saved);

    assert_eq!(store.peak_in_flight(), 1);
    assert_eq!(contents(&store, id), vec!["first", "second"]);
    assert!(!status.borrow_and_update()[&id].is_saving);
}

#[tokio::test(start_paused = true)]
async fn closing_a_dirty_tab_flushes_before_the_tab_goes_away() {
    let (store, session) = setup();
    let id = new_doc(&session).await;
    let tab = session.tab_for(id).unwrap();
    store.hold_updates();

    session.apply_edit(id, "unsaved words").unwrap();
    let closer = {
        let session = session.clone();
        tokio::spawn(async move { session.close_tab(tab).await })
    };
    settle().await;

    // Write is parked: the tab must still be there.
    assert_eq!(session.tabs().len(), 1);
    assert!(store.updates().is_empty());

    store.release_updates();
    closer.await.unwrap().unwrap();
    assert!(session.tabs().is_empty());
    assert_eq!(contents(&store, id), vec!["unsaved words"]);

    // The cancelled debounce timer never writes again.
    sleep(ms(5_000)).await;
    assert_eq!(store.updates().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn closing_a_clean_tab_writes_nothing() {
    let (store, session) = setup();
    let id = new_doc(&session).await;
    session.close_tab(session.tab_for(id).unwrap()).await.unwrap();
    assert!(store.updates().is_empty());
    assert!(session.active_tab().is_none());
}

#[tokio::test(start_paused = true)]
async fn delete_wins_over_an_in_flight_save() {
    let (store, session) = setup();
    let id = new_doc(&session).await;
    store.hold_updates();

    session.apply_edit(id, "doomed").unwrap();
    sleep(ms(1_100)).await;
    assert!(session.document_state(id).unwrap().is_saving);

    session.delete_document(id).await.unwrap();
    store.release_updates();
    settle().await;

    assert!(store.get(id).await.unwrap().is_none());
    assert!(store.is_empty());
    assert!(session.document(id).is_none());
    assert!(session.tabs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn untitled_documents_are_numbered() {
    let (_store, session) = setup();
    let (a, b, c) = tokio::join!(
        session.create_document(DocumentKind::Markdown, None, None),
        session.create_document(DocumentKind::Markdown, None, None),
        session.create_document(DocumentKind::Markdown, None, None),
    );
    let mut titles: Vec<String> = [a, b, c]
        .into_iter()
        .map(|id| session.document(id.unwrap()).unwrap().title)
        .collect();
    titles.sort();
    assert_eq!(
        titles,
        vec![
            "Untitled Document",
            "Untitled Document 1",
            "Untitled Document 2"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn typing_burst_produces_one_write() {
    let (store, session) = setup();
    let id = session
        .create_document(
            DocumentKind::Code {
                language: "javascript".into(),
            },
            None,
            None,
        )
        .await
        .unwrap();

    let mut typed = String::new();
    let mut last_keystroke = Instant::now();
    for i in 0..50 {
        typed.push(char::from(b'a' + (i % 26) as u8));
        session.apply_edit(id, typed.clone()).unwrap();
        last_keystroke = Instant::now();
        if i < 49 {
            sleep(ms(200)).await;
        }
    }

    sleep(ms(3_000)).await;
    let writes = store.updates_for(id);
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].content.chars().count(), 50);
    assert_eq!(writes[0].content, typed);

    let after = writes[0].at.duration_since(last_keystroke);
    assert!(after >= ms(1_000) && after < ms(1_050), "wrote after {:?}", after);
}

#[tokio::test(start_paused = true)]
async fn large_documents_wait_longer() {
    let (store, session) = setup();
    let id = new_doc(&session).await;

    session.apply_edit(id, "x".repeat(10_000)).unwrap();
    sleep(ms(1_500)).await;
    assert!(store.updates().is_empty());
    sleep(ms(600)).await;
    assert_eq!(store.updates().len(), 1);

    session.apply_edit(id, "y".repeat(100_000)).unwrap();
    sleep(ms(2_500)).await;
    assert_eq!(store.updates().len(), 1);
    sleep(ms(600)).await;
    assert_eq!(store.updates().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn delete_shortly_after_edit_does_not_resurrect() {
    let (store, session) = setup();
    let id = new_doc(&session).await;

    session.apply_edit(id, "typed").unwrap();
    sleep(ms(10)).await;
    session.delete_document(id).await.unwrap();

    sleep(ms(10_000)).await;
    assert!(store.get(id).await.unwrap().is_none());
    assert!(store.updates_for(id).is_empty());
    assert!(!session.has_pending_save(id));
}

#[tokio::test(start_paused = true)]
async fn failed_save_keeps_content_and_sweep_recovers() {
    let (store, session) = setup();
    let id = new_doc(&session).await;
    let mut notices = session.subscribe_notices();
    let sweeper = session.spawn_backup_sweep();

    store.set_fail_writes(true);
    session.apply_edit(id, "precious").unwrap();
    sleep(ms(1_100)).await;

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, MessageLevel::Error);
    assert_eq!(notice.document, Some(id));
    let state = session.document_state(id).unwrap();
    assert!(state.is_dirty && !state.is_saving);
    assert_eq!(session.document(id).unwrap().content, "precious");

    store.set_fail_writes(false);
    sleep(ms(5_000)).await;
    sweeper.abort();

    assert_eq!(store.get(id).await.unwrap().unwrap().content, "precious");
    assert!(!session.document_state(id).unwrap().is_dirty);
}

#[tokio::test(start_paused = true)]
async fn sweep_leaves_documents_with_pending_timers_alone() {
    let (store, session) = setup();
    let id = new_doc(&session).await;

    session.apply_edit(id, "typing").unwrap();
    assert_eq!(session.sweep().await, 0);
    assert!(store.updates().is_empty());

    sleep(ms(1_100)).await;
    assert_eq!(store.updates().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn record_removed_behind_our_back_is_not_recreated() {
    let (store, session) = setup();
    let id = new_doc(&session).await;
    let mut notices = session.subscribe_notices();

    store.remove(id).await.unwrap();
    session.apply_edit(id, "orphan").unwrap();
    sleep(ms(1_100)).await;

    assert!(store.get(id).await.unwrap().is_none());
    assert_eq!(notices.recv().await.unwrap().level, MessageLevel::Warning);

    session.apply_edit(id, "orphan 2").unwrap();
    sleep(ms(1_100)).await;
    assert!(store.is_empty());
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn create_then_get_round_trips_in_both_stores() {
    let dir = TempDir::new().unwrap();
    let file_store = FileStore::new(dir.path());
    let memory_store = MemoryStore::new();

    let mut doc = Document::new(
        DocumentKind::Code {
            language: "python".into(),
        },
        "script".into(),
        "print('hi')\n".into(),
    );
    doc.tags = vec!["ops".into()];

    for store in [&file_store as &dyn DocumentStore, &memory_store] {
        let id = store.create(&doc).await.unwrap();
        let got = store.get(id).await.unwrap().unwrap();

        assert_eq!(got.id, Some(id));
        assert!(got.updated_at >= doc.updated_at);
        let mut expected = doc.clone();
        expected.id = Some(id);
        expected.updated_at = got.updated_at;
        assert_eq!(got, expected);
    }
}

#[tokio::test]
async fn file_backed_session_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let config = NotepadConfig {
        short_delay_ms: 20,
        medium_delay_ms: 40,
        long_delay_ms: 60,
        sweep_interval_ms: 100,
    };

    let id = {
        let session = Session::new(FileStore::new(dir.path()), &config);
        let id = session
            .create_document(DocumentKind::Text, None, Some("journal".into()))
            .await
            .unwrap();
        session.apply_edit(id, "day one").unwrap();
        sleep(ms(300)).await;
        assert!(!session.document_state(id).unwrap().is_dirty);
        id
    };

    let reopened = Session::new(FileStore::new(dir.path()), &config);
    assert_eq!(reopened.load_documents().await.unwrap(), 1);
    let doc = reopened.document(id).unwrap();
    assert_eq!(doc.title, "journal");
    assert_eq!(doc.content, "day one");
}
