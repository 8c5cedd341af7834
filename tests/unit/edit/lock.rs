use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Barrier, mpsc};
use std::time::Duration;

use super::*;

fn key(dir: &str) -> BookKey {
    (Scope::Global, dir.to_string())
}

#[test]
fn entries_are_dropped_after_use() {
    let locks = BookLocks::new();
    let out = locks.with_lock(&key("b1"), || {
        assert_eq!(locks.active(), 1);
        7
    });
    assert_eq!(out, 7);
    assert_eq!(locks.active(), 0);
}

#[test]
fn same_book_is_serialized() {
    let locks = BookLocks::new();
    let inside = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            std::thread::spawn(move || {
                locks.with_lock(&key("b1"), || {
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                });
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(locks.active(), 0);
}

#[test]
fn different_books_run_in_parallel() {
    let locks = BookLocks::new();
    let barrier = Arc::new(Barrier::new(2));
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|dir| {
            let locks = locks.clone();
            let barrier = barrier.clone();
            let tx = tx.clone();
            std::thread::spawn(move || {
                // Both holders must be inside at once for the barrier to release.
                locks.with_lock(&key(dir), || {
                    barrier.wait();
                    tx.send(dir).unwrap();
                });
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    drop(tx);
    assert_eq!(rx.iter().count(), 2);
}

#[test]
fn user_and_global_keys_are_distinct() {
    let locks = BookLocks::new();
    locks.with_lock(&key("b1"), || {
        locks.with_lock(&(Scope::User("u1".into()), "b1".to_string()), || {
            assert_eq!(locks.active(), 2);
        });
    });
    assert_eq!(locks.active(), 0);
}

#[test]
fn poisoned_lock_is_recovered() {
    let locks = BookLocks::new();
    let l2 = locks.clone();
    let r = std::thread::spawn(move || {
        l2.with_lock(&key("b1"), || panic!("boom"));
    })
    .join();
    assert!(r.is_err());
    assert_eq!(locks.with_lock(&key("b1"), || 1), 1);
}
