//! Integration tests for the single-flight concurrent map

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use servicekit::collections::ConcurrentMap;

#[test]
fn test_generator_runs_once_for_concurrent_callers() {
    let map: Arc<ConcurrentMap<String, i32>> = Arc::new(ConcurrentMap::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(100));

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let map = Arc::clone(&map);
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                map.load_or_store("x".to_string(), |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    42
                })
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 42);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(map.load(&"x".to_string()), Some(42));
}

#[test]
fn test_store_load_delete_clear() {
    let map = ConcurrentMap::new();
    map.store("a", 1);
    map.store("a", 2);
    assert_eq!(map.load(&"a"), Some(2));

    map.delete(&"a");
    assert_eq!(map.load(&"a"), None);
    map.delete(&"never-stored");

    map.store("b", 1);
    map.store("c", 2);
    map.clear();
    assert!(map.is_empty());
    assert!(map.keys().is_empty());
}

#[test]
fn test_failed_generator_stores_nothing() {
    let map: ConcurrentMap<&str, u8> = ConcurrentMap::new();
    let result: Result<u8, String> = map.try_load_or_store("k", |_| Err("boom".to_string()));
    assert_eq!(result, Err("boom".to_string()));
    assert_eq!(map.load(&"k"), None);

    assert_eq!(map.try_load_or_store("k", |_| Ok::<_, String>(9)), Ok(9));
    assert_eq!(map.try_load_or_store("k", |_| Err::<u8, _>("unused".to_string())), Ok(9));
}

#[test]
fn test_range_visits_each_key_once() {
    let map = ConcurrentMap::new();
    for i in 0..50 {
        map.store(i, i * 2);
    }

    let mut seen = HashSet::new();
    map.range(|k, v| {
        assert_eq!(*v, k * 2);
        assert!(seen.insert(*k), "key {} visited twice", k);
        true
    });
    assert_eq!(seen.len(), 50);
}

#[test]
fn test_range_stops_early_and_tolerates_writes() {
    let map = ConcurrentMap::new();
    for i in 0..10 {
        map.store(i, i);
    }

    let mut visited = 0;
    map.range(|k, _| {
        visited += 1;
        map.delete(k);
        visited < 3
    });
    assert_eq!(visited, 3);
    assert_eq!(map.len(), 7);
}
