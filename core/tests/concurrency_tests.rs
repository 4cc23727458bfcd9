use qsearch_core::{Corpus, EngineConfig, SearchEngine, TfIdfVectorizer};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

const THREADS: usize = 8;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn engine_is_shareable_across_threads() {
    assert_send_sync::<SearchEngine>();
    assert_send_sync::<TfIdfVectorizer>();
}

fn questions() -> Corpus {
    Corpus::from_texts([
        "How do I use Error handling in Java?",
        "Error Handling in Swift 3",
        "Java BufferedReader error",
        "If block error handling in bash",
        "java ATM program simulation with exception handling - no error neither full output?",
    ])
}

#[test]
fn concurrent_first_queries_load_one_snapshot() {
    let dir = tempdir().unwrap();
    let config = EngineConfig::new(dir.path());
    let expected = SearchEngine::build(questions(), &config)
        .unwrap()
        .most_similar("error handling in java", 3)
        .unwrap();

    let engine = Arc::new(SearchEngine::open(&config).unwrap());
    assert!(!engine.vectorizer().is_resident());

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let hits = engine.most_similar("error handling in java", 3).unwrap();
                (hits, engine.vectorizer().fitted().unwrap())
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(engine.vectorizer().is_resident());
    let resident = engine.vectorizer().fitted().unwrap();
    for (hits, snapshot) in &results {
        assert_eq!(hits, &expected);
        assert!(Arc::ptr_eq(snapshot, &resident));
    }
}

#[test]
fn scoped_readers_see_identical_results() {
    let dir = tempdir().unwrap();
    let config = EngineConfig::new(dir.path());
    SearchEngine::build(questions(), &config).unwrap();
    let engine = SearchEngine::open(&config).unwrap();
    engine.warm_up().unwrap();

    let queries = ["java", "error handling", "bash block", "swift"];
    let baseline: Vec<_> = queries
        .iter()
        .map(|q| engine.most_similar(q, 5).unwrap())
        .collect();

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for (q, expected) in queries.iter().zip(&baseline) {
                    assert_eq!(&engine.most_similar(q, 5).unwrap(), expected);
                }
            });
        }
    });
}
