use crabbing_tree::{Tree, TreeError};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Barrier;
use std::thread;

fn has(listing: &str, name: &str) -> bool {
    listing.split(',').any(|n| n == name)
}

#[test]
fn concurrent_identical_creates_have_one_winner() {
    const THREADS: usize = 8;
    let tree = Tree::new();
    let start = Barrier::new(THREADS);
    let results = thread::scope(|scope| {
        let handles = (0..THREADS)
            .map(|_| scope.spawn(|| {
                start.wait();
                tree.create("/x/")
            }))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results {
        assert!(matches!(result, Ok(()) | Err(TreeError::AlreadyExists)));
    }
    assert_eq!(tree.list("/"), Some("x".to_owned()));
}

#[test]
fn concurrent_identical_removes_have_one_winner() {
    const THREADS: usize = 8;
    let tree = Tree::new();
    assert_eq!(tree.create("/x/"), Ok(()));
    let start = Barrier::new(THREADS);
    let results = thread::scope(|scope| {
        let handles = (0..THREADS)
            .map(|_| scope.spawn(|| {
                start.wait();
                tree.remove("/x/")
            }))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results {
        assert!(matches!(result, Ok(()) | Err(TreeError::NotFound)));
    }
    assert_eq!(tree.list("/"), Some(String::new()));
}

#[test]
fn distinct_creates_all_win() {
    let tree = Tree::new();
    let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let start = Barrier::new(names.len());
    thread::scope(|scope| {
        for name in names {
            let tree = &tree;
            let start = &start;
            scope.spawn(move || {
                start.wait();
                assert_eq!(tree.create(&format!("/{name}/")), Ok(()));
            });
        }
    });
    assert_eq!(tree.list("/"), Some(names.join(",")));
}

#[test]
fn churn_on_disjoint_subtrees() {
    let tree = Tree::new();
    assert_eq!(tree.create("/a/"), Ok(()));
    assert_eq!(tree.create("/b/"), Ok(()));
    thread::scope(|scope| {
        for parent in ["/a/", "/b/"] {
            let tree = &tree;
            scope.spawn(move || {
                for _ in 0..500 {
                    let path = format!("{parent}t/");
                    assert_eq!(tree.create(&path), Ok(()));
                    assert!(tree.list(parent).is_some());
                    assert_eq!(tree.remove(&path), Ok(()));
                }
            });
        }
    });
    assert_eq!(tree.list("/a/"), Some(String::new()));
    assert_eq!(tree.list("/b/"), Some(String::new()));
}

#[test]
fn a_moved_folder_is_never_seen_twice() {
    let tree = Tree::new();
    for path in ["/a/", "/a/b/", "/a/b/c/", "/a/d/"] {
        assert_eq!(tree.create(path), Ok(()));
    }
    thread::scope(|scope| {
        let mover = scope.spawn(|| {
            assert_eq!(tree.mv("/a/b/c/", "/a/d/c/"), Ok(()));
        });
        // Reading the target before the source: once "c" shows up under
        // /a/d/, the detach from /a/b/ has already happened.
        while !mover.is_finished() {
            let in_target = tree.list("/a/d/").is_some_and(|l| has(&l, "c"));
            let in_source = tree.list("/a/b/").is_some_and(|l| has(&l, "c"));
            assert!(!(in_target && in_source), "folder observed in two places");
        }
        mover.join().unwrap();
    });
    assert_eq!(tree.list("/a/b/"), Some(String::new()));
    assert_eq!(tree.list("/a/d/"), Some("c".to_owned()));
}

#[test]
fn readers_inside_a_bouncing_subtree() {
    let tree = Tree::new();
    for path in ["/m/", "/m/a/", "/m/a/b/", "/m/a/b/c/"] {
        assert_eq!(tree.create(path), Ok(()));
    }
    let done = AtomicBool::new(false);
    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..200 {
                assert_eq!(tree.mv("/m/a/", "/m/z/"), Ok(()));
                assert_eq!(tree.mv("/m/z/", "/m/a/"), Ok(()));
            }
            done.store(true, Ordering::SeqCst);
        });
        for _ in 0..3 {
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    if let Some(listing) = tree.list("/m/a/b/") {
                        assert_eq!(listing, "c");
                    }
                    if let Some(listing) = tree.list("/m/a/") {
                        assert_eq!(listing, "b");
                    }
                }
            });
        }
    });
    assert_eq!(tree.list("/m/a/b/"), Some("c".to_owned()));
}

#[test]
fn crossing_moves_do_not_deadlock() {
    for _ in 0..50 {
        let tree = Tree::new();
        assert_eq!(tree.create("/a/"), Ok(()));
        assert_eq!(tree.create("/b/"), Ok(()));
        let start = Barrier::new(2);
        let (one, two) = thread::scope(|scope| {
            let first = scope.spawn(|| {
                start.wait();
                tree.mv("/a/", "/b/a/")
            });
            let second = scope.spawn(|| {
                start.wait();
                tree.mv("/b/", "/a/b/")
            });
            (first.join().unwrap(), second.join().unwrap())
        });
        // The common-ancestor lock serializes the two moves; whichever
        // runs second finds its endpoints gone.
        assert!(one.is_ok() != two.is_ok(), "{one:?} vs {two:?}");
        for result in [one, two] {
            assert!(matches!(result, Ok(()) | Err(TreeError::NotFound)));
        }
    }
}

#[test]
fn contested_moves_of_one_source_have_one_winner() {
    let tree = Tree::new();
    assert_eq!(tree.create("/s/"), Ok(()));
    let start = Barrier::new(2);
    let results = thread::scope(|scope| {
        let handles = ["/ta/", "/tb/"].map(|target| {
            let tree = &tree;
            let start = &start;
            scope.spawn(move || {
                start.wait();
                tree.mv("/s/", target)
            })
        });
        handles.map(|handle| handle.join().unwrap())
    });
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    let listing = tree.list("/").unwrap();
    assert!(listing == "ta" || listing == "tb", "root holds {listing:?}");
}

#[test]
fn randomized_workload_terminates_consistently() {
    const THREADS: usize = 6;
    const STEPS: usize = 400;
    let pool = [
        "/a/", "/b/", "/c/", "/a/x/", "/a/y/", "/b/x/", "/b/x/z/", "/c/z/",
    ];
    let tree = Tree::new();
    thread::scope(|scope| {
        for _ in 0..THREADS {
            let tree = &tree;
            scope.spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..STEPS {
                    let path = pool[rng.gen_range(0..pool.len())];
                    match rng.gen_range(0..4) {
                        0 => {
                            let _ = tree.create(path);
                        }
                        1 => {
                            let _ = tree.remove(path);
                        }
                        2 => {
                            let _ = tree.list(path);
                        }
                        _ => {
                            let other = pool[rng.gen_range(0..pool.len())];
                            let _ = tree.mv(path, other);
                        }
                    }
                }
            });
        }
    });
    // The tree is still fully traversable afterwards.
    let mut stack = vec!["/".to_owned()];
    while let Some(path) = stack.pop() {
        let listing = tree.list(&path).expect("reachable folder vanished");
        for name in listing.split(',').filter(|n| !n.is_empty()) {
            stack.push(format!("{path}{name}/"));
        }
    }
}
