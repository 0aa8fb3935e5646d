//! Concurrent access tests
//!
//! Readers of the persisted state file must never observe a torn write,
//! and the memory repository must stay consistent while one thread mutates
//! it and another walks it.

use repo_store::{
    ChangeEvent, ChangeListener, MemoryRepository, NormalizedPath, Repository, io,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

#[test]
fn test_readers_never_see_partial_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("known.toml");
    io::write_atomic(&path, b"version = \"1.0\"\n").unwrap();

    let writers = 4;
    let barrier = Arc::new(Barrier::new(writers + 1));
    let done = Arc::new(AtomicBool::new(false));

    let handles: Vec<_> = (0..writers)
        .map(|writer| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..25 {
                    let body = format!("version = \"1.0\"\n# writer {writer} pass {i}\n");
                    io::write_atomic(&path, body.as_bytes()).unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let path = path.clone();
        let barrier = Arc::clone(&barrier);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            barrier.wait();
            while !done.load(Ordering::SeqCst) {
                let content = io::read_locked(&path).unwrap();
                assert!(content.starts_with("version = \"1.0\"\n"), "torn read: {content:?}");
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    reader.join().unwrap();

    // No temp files left behind
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

struct Counter(AtomicUsize);

impl ChangeListener for Counter {
    fn on_change(&self, _event: &ChangeEvent) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_memory_repository_walk_during_writes() {
    let repo = Arc::new(MemoryRepository::new());
    let counter = Arc::new(Counter(AtomicUsize::new(0)));
    repo.subscribe(counter.clone());

    let files = 200;
    let writer = {
        let repo = Arc::clone(&repo);
        thread::spawn(move || {
            for i in 0..files {
                repo.write_file(format!("/libs/app{}/install/b{i}.jar", i % 10), b"x")
                    .unwrap();
            }
        })
    };

    let walker = {
        let repo = Arc::clone(&repo);
        thread::spawn(move || {
            for _ in 0..50 {
                // Every listed child must be readable as the kind it was listed as
                for app in repo.list(&NormalizedPath::new("/")).unwrap_or_default() {
                    for child in repo.list(&app.path).unwrap_or_default() {
                        assert!(repo.node(&child.path).unwrap().is_some());
                    }
                }
            }
        })
    };

    writer.join().unwrap();
    walker.join().unwrap();

    let mut bundles = 0;
    for app in repo.list(&NormalizedPath::new("/libs")).unwrap() {
        bundles += repo.list(&app.path.join("install")).unwrap().len();
    }
    assert_eq!(bundles, files);
    // Implicit ancestor folders are not reported, only the files
    assert_eq!(counter.0.load(Ordering::SeqCst), files);
}
