//! Draft auto-save timing: immediate saves are observable at once, debounced
//! saves only after the window, and a newer save supersedes an older one.
//! The window is shrunk so the suite stays fast.

use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use postvault::drafts::{DraftStore, SaveStatus};

const WINDOW: Duration = Duration::from_millis(100);

#[test]
fn immediate_save_is_observable_right_away() {
    let dir = TempDir::new().unwrap();
    let store = DraftStore::with_debounce(dir.path(), WINDOW).unwrap();

    assert_eq!(store.save("post-1", "hello", true).unwrap(), SaveStatus::Saved);
    let draft = store.load("post-1").expect("immediate save must be visible");
    assert_eq!(draft.content, "hello");
    assert_eq!(draft.version, 1);
    assert_eq!(draft.device_id, store.device_id());
}

#[test]
fn debounced_save_is_invisible_inside_the_window() {
    let dir = TempDir::new().unwrap();
    let store = DraftStore::with_debounce(dir.path(), WINDOW).unwrap();

    assert_eq!(store.save("post-1", "draft v1", false).unwrap(), SaveStatus::Scheduled);
    assert!(
        store.load("post-1").is_none(),
        "debounced content must not land before the window elapses"
    );

    thread::sleep(WINDOW + Duration::from_millis(150));
    let draft = store.load("post-1").expect("debounced save must land after the window");
    assert_eq!(draft.content, "draft v1");
}

#[test]
fn newer_save_supersedes_the_pending_one() {
    let dir = TempDir::new().unwrap();
    let store = DraftStore::with_debounce(dir.path(), WINDOW).unwrap();

    store.save("post-1", "first", false).unwrap();
    thread::sleep(Duration::from_millis(30));
    store.save("post-1", "second", false).unwrap();

    thread::sleep(WINDOW + Duration::from_millis(150));
    let draft = store.load("post-1").unwrap();
    assert_eq!(draft.content, "second", "only the latest content is ever persisted");
}

#[test]
fn immediate_save_cancels_a_pending_debounce() {
    let dir = TempDir::new().unwrap();
    let store = DraftStore::with_debounce(dir.path(), WINDOW).unwrap();

    store.save("post-1", "stale pending", false).unwrap();
    store.save("post-1", "written now", true).unwrap();

    thread::sleep(WINDOW + Duration::from_millis(150));
    let draft = store.load("post-1").unwrap();
    assert_eq!(
        draft.content, "written now",
        "the superseded debounce must not resurrect old content"
    );
}

#[test]
fn flush_all_lands_pending_saves_early() {
    let dir = TempDir::new().unwrap();
    let store = DraftStore::with_debounce(dir.path(), Duration::from_secs(30)).unwrap();

    store.save("post-1", "pending", false).unwrap();
    assert!(store.load("post-1").is_none());
    store.flush_all().unwrap();
    assert_eq!(store.load("post-1").unwrap().content, "pending");
}

#[test]
fn delete_wins_against_a_firing_debounce_timer() {
    let dir = TempDir::new().unwrap();
    // A 1 ms window makes the timer fire right around the delete, so the
    // loop repeatedly exercises the timer/delete interleaving.
    let store = DraftStore::with_debounce(dir.path(), Duration::from_millis(1)).unwrap();

    for i in 0..50 {
        let id = format!("post-{}", i);
        store.save(&id, "content", false).unwrap();
        thread::sleep(Duration::from_millis(1));
        store.delete(&id).unwrap();
    }

    thread::sleep(Duration::from_millis(100));
    for i in 0..50 {
        let id = format!("post-{}", i);
        assert!(
            store.load(&id).is_none(),
            "deleted draft {} must not be resurrected by its timer",
            id
        );
    }
}

#[test]
fn delete_drops_both_pending_and_persisted_state() {
    let dir = TempDir::new().unwrap();
    let store = DraftStore::with_debounce(dir.path(), WINDOW).unwrap();

    store.save("post-1", "persisted", true).unwrap();
    store.save("post-1", "pending edit", false).unwrap();
    store.delete("post-1").unwrap();

    thread::sleep(WINDOW + Duration::from_millis(150));
    assert!(
        store.load("post-1").is_none(),
        "a deleted draft must not reappear from a stale debounce"
    );
}
