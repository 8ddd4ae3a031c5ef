//! Cross-thread behaviour of the file-backed store.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rsvp_store::{InviteStore, RedbInviteStore, StoreOptions};
use rsvp_types::{InviteMap, InviteRecord};

// ============================================================================
// Fixtures
// ============================================================================

fn generation(tag: &str, size: usize) -> InviteMap {
    (0..size)
        .map(|i| {
            (
                format!("{tag}-{i:03}"),
                InviteRecord::new(vec![format!("Гость {tag}")], 1),
            )
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn snapshots_never_mix_generations() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RedbInviteStore::open(dir.path().join("rsvp.redb")).unwrap());
    let a = generation("a", 50);
    let b = generation("b", 50);
    store.replace_all_invites(&a).unwrap();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for round in 0..20 {
                let next = if round % 2 == 0 { &b } else { &a };
                store.replace_all_invites(next).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..50 {
                    let snapshot = store.get_all_invites().unwrap();
                    assert_eq!(snapshot.len(), 50);
                    let first = snapshot.keys().next().unwrap().split('-').next().unwrap().to_string();
                    assert!(
                        snapshot.keys().all(|id| id.starts_with(&first)),
                        "snapshot mixed two datasets"
                    );
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn views_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rsvp.redb");
    let mut dataset = InviteMap::new();
    dataset.insert("id-1".into(), InviteRecord::new(vec!["Иван".into()], 0));

    {
        let store = Arc::new(RedbInviteStore::open(&path).unwrap());
        store.seed(&dataset).unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..5 {
                        store.get_invite("id-1").unwrap().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        store.close().unwrap();
    }

    let store = RedbInviteStore::open(&path).unwrap();
    let all = store.get_all_invites().unwrap();
    assert_eq!(all["id-1"].viewed_at.len(), 40);
    store.close().unwrap();
}

#[test]
fn second_handle_waits_for_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rsvp.redb");
    let first = RedbInviteStore::open(&path).unwrap();

    let closer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        first.close().unwrap();
    });

    let second = RedbInviteStore::open_with(
        &path,
        StoreOptions {
            lock_timeout: Duration::from_secs(5),
        },
    )
    .unwrap();
    closer.join().unwrap();
    assert!(second.get_all_invites().unwrap().is_empty());
    second.close().unwrap();
}
