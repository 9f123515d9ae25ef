use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[test]
fn construction_does_no_io() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("cache");
    let cache = CacheService::new(&root);
    assert_eq!(cache.read(CacheNamespace::Geocode, "paris,france").unwrap(), None);
    assert!(!root.exists());
}

#[test]
fn write_then_read_lands_in_namespace_dir() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheService::new(dir.path());

    cache
        .write(CacheNamespace::Network, "40.7128,-74.0060,12000", b"{}")
        .unwrap();
    let path = cache.entry_path(CacheNamespace::Network, "40.7128,-74.0060,12000");
    assert!(path.starts_with(dir.path().join("network")));
    assert_eq!(
        cache
            .read(CacheNamespace::Network, "40.7128,-74.0060,12000")
            .unwrap()
            .as_deref(),
        Some(&b"{}"[..])
    );
    assert_eq!(
        cache.read(CacheNamespace::Geocode, "40.7128,-74.0060,12000").unwrap(),
        None
    );
}

#[test]
fn distinct_keys_never_share_a_file() {
    // Same slug, different keys.
    let a = entry_stem("new york,usa");
    let b = entry_stem("new-york,usa");
    let c = entry_stem("new york, usa");
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert!(a.starts_with("new_york_usa-"));
    assert_eq!(entry_stem("東京"), entry_stem("東京"));
    assert_eq!(entry_stem("東京").len(), 16);
}

#[test]
fn corrupt_json_reads_as_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheService::new(dir.path());
    cache.write(CacheNamespace::Geocode, "k", b"{not json").unwrap();
    let v: Option<serde_json::Value> = cache.read_json(CacheNamespace::Geocode, "k").unwrap();
    assert!(v.is_none());
}

#[test]
fn clear_removes_entries_and_recreates_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("c");
    let cache = CacheService::new(&root);
    cache.write_json(CacheNamespace::Geocode, "k", &1u32).unwrap();
    std::fs::create_dir_all(cache.entry_dir(CacheNamespace::Fonts, "Roboto")).unwrap();

    cache.clear().unwrap();
    assert!(root.is_dir());
    assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);

    // Clearing a root that never existed is fine too.
    let fresh = CacheService::new(dir.path().join("never"));
    fresh.clear().unwrap();
    assert!(dir.path().join("never").is_dir());
}

#[test]
fn guard_is_shared_per_key() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheService::new(dir.path()));
    let inside = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let handles = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let inside = Arc::clone(&inside);
            let max_seen = Arc::clone(&max_seen);
            std::thread::spawn(move || {
                let guard = cache.guard(CacheNamespace::Geocode, "same");
                let _held = guard.lock();
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(2));
                inside.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect::<Vec<_>>();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
}

#[test]
fn released_guards_are_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheService::new(dir.path());
    let slots = |cache: &CacheService| cache.guards.lock().unwrap().len();

    for i in 0..50 {
        let guard = cache.guard(CacheNamespace::Network, &format!("key-{i}"));
        let _held = guard.lock();
    }
    assert!(slots(&cache) <= 1);

    let held = cache.guard(CacheNamespace::Geocode, "busy");
    let again = cache.guard(CacheNamespace::Geocode, "other");
    drop(again);
    let same = cache.guard(CacheNamespace::Geocode, "busy");
    assert!(Arc::ptr_eq(&held.0, &same.0));
    assert_eq!(slots(&cache), 1);
}

#[test]
fn write_atomic_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.bin");
    write_atomic(&path, b"first").unwrap();
    write_atomic(&path, b"second").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"second");
    assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
}
