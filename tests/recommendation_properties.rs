use std::sync::Arc;
use std::thread;

use cuberec::{
    BuildOptions, CardIndex, Collection, CooccurrenceRecommender, Snapshot, SnapshotHandle,
    build_parallel, build_sequential,
};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

const EPS: f64 = 1e-9;

fn card_pool(size: usize) -> Vec<String> {
    (0..size).map(|i| format!("card {i:03}")).collect()
}

/// Random cubes drawn from a skewed pool so some cards are far more popular
/// than others, like a real cube corpus.
fn random_corpus(rng: &mut StdRng, pool: &[String], cubes: usize) -> Vec<Collection> {
    let staples = &pool[..pool.len() / 5];
    (0..cubes)
        .map(|_| {
            let size = rng.random_range(0..40);
            let mut cards: Vec<String> = staples
                .choose_multiple(rng, size / 2)
                .cloned()
                .collect();
            cards.extend(pool.choose_multiple(rng, size - size / 2).cloned());
            // Scraped lists sometimes repeat a card.
            if let Some(first) = cards.first().cloned()
                && rng.random_bool(0.1)
            {
                cards.push(first);
            }
            Collection::new(cards)
        })
        .collect()
}

fn random_cube(rng: &mut StdRng, pool: &[String]) -> Collection {
    let size = rng.random_range(0..25);
    let mut cards: Vec<String> = pool.choose_multiple(rng, size).cloned().collect();
    if rng.random_bool(0.3) {
        cards.push("a custom card".to_string());
    }
    Collection::new(cards)
}

fn fixture() -> (StdRng, Vec<String>, Snapshot) {
    let mut rng = StdRng::seed_from_u64(0xC0BE);
    let pool = card_pool(120);
    let corpus = random_corpus(&mut rng, &pool, 200);
    let snapshot = Snapshot::build(&corpus, BuildOptions::default());
    (rng, pool, snapshot)
}

#[test]
fn worked_example_from_three_cubes() {
    let corpus = vec![
        Collection::new(["A", "B", "C"]),
        Collection::new(["A", "B"]),
        Collection::new(["B", "C", "D"]),
    ];
    let snapshot = Snapshot::build(&corpus, BuildOptions::default());
    let index = snapshot.index();
    let m = snapshot.matrix();
    let id = |key: &str| index.get(key).unwrap();

    assert_eq!(m.co_occurrence(id("A"), id("B")), 2);
    assert_eq!(m.co_occurrence(id("B"), id("C")), 2);
    assert_eq!(m.co_occurrence(id("A"), id("C")), 1);
    assert_eq!(m.co_occurrence(id("C"), id("D")), 1);
    assert_eq!(m.co_occurrence(id("B"), id("D")), 1);
    assert_eq!(m.co_occurrence(id("A"), id("D")), 0);
    assert_eq!(
        ["A", "B", "C", "D"].map(|key| m.total_count(id(key))),
        [2, 3, 2, 1]
    );

    let aff = snapshot.affinity();
    assert!((aff.affinity(id("A"), id("B")) - 1.0).abs() < EPS);
    assert!((aff.affinity(id("B"), id("A")) - 2.0 / 3.0).abs() < EPS);

    let engine = CooccurrenceRecommender::new(&snapshot);
    let recs = engine.recommend(&Collection::new(["A", "B"]), 2);
    assert_eq!(recs.keys().collect::<Vec<_>>(), vec!["C", "D"]);
    assert!((recs.cards()[0].score - 7.0 / 6.0).abs() < EPS);
    assert!((recs.cards()[1].score - 1.0 / 3.0).abs() < EPS);

    let cuts = engine.suggest_cuts(&Collection::new(["A", "B", "C"]), 1);
    assert_eq!(cuts.keys().collect::<Vec<_>>(), vec!["B"]);

    let empty = engine.recommend(&Collection::default(), 5);
    assert_eq!(empty.keys().collect::<Vec<_>>(), vec!["A", "B", "C", "D"]);
    assert!(empty.cards().iter().all(|card| card.score == 0.0));
}

#[test]
fn empty_cube_returns_first_keys_in_order() {
    let (_, _, snapshot) = fixture();
    let engine = CooccurrenceRecommender::new(&snapshot);
    let recs = engine.recommend(&Collection::default(), 5);

    let mut keys: Vec<&str> = snapshot.index().keys().iter().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(recs.keys().collect::<Vec<_>>(), keys[..5].to_vec());
}

#[test]
fn recommendations_stay_outside_the_cube() {
    let (mut rng, pool, snapshot) = fixture();
    let engine = CooccurrenceRecommender::new(&snapshot);
    for _ in 0..100 {
        let cube = random_cube(&mut rng, &pool);
        let n = rng.random_range(0..30);
        let recs = engine.recommend(&cube, n);
        assert!(recs.len() <= n);
        assert!(recs.keys().all(|key| !cube.contains(key)));
        assert!(
            recs.cards()
                .windows(2)
                .all(|w| w[0].score > w[1].score
                    || (w[0].score == w[1].score && w[0].key < w[1].key))
        );
    }
}

#[test]
fn oversized_amount_returns_every_candidate() {
    let (mut rng, pool, snapshot) = fixture();
    let engine = CooccurrenceRecommender::new(&snapshot);
    let cube = random_cube(&mut rng, &pool);
    let known = snapshot.index().resolve(&cube).len();
    let recs = engine.recommend(&cube, 10_000);
    assert_eq!(recs.len(), snapshot.index().len() - known);
}

#[test]
fn cuts_stay_inside_the_cube() {
    let (mut rng, pool, snapshot) = fixture();
    let engine = CooccurrenceRecommender::new(&snapshot);
    for _ in 0..100 {
        let cube = random_cube(&mut rng, &pool);
        let n = rng.random_range(0..30);
        let cuts = engine.suggest_cuts(&cube, n);
        assert!(cuts.len() <= n);
        assert!(cuts.keys().all(|key| cube.contains(key)));
        assert!(
            cuts.cards()
                .windows(2)
                .all(|w| w[0].score < w[1].score
                    || (w[0].score == w[1].score && w[0].key < w[1].key))
        );
    }
}

#[test]
fn queries_are_deterministic() {
    let (mut rng, pool, snapshot) = fixture();
    let engine = CooccurrenceRecommender::new(&snapshot);
    for _ in 0..20 {
        let cube = random_cube(&mut rng, &pool);
        assert_eq!(engine.recommend(&cube, 15), engine.recommend(&cube, 15));
        assert_eq!(engine.suggest_cuts(&cube, 15), engine.suggest_cuts(&cube, 15));
    }
}

#[test]
fn matrix_is_symmetric_and_bounded() {
    let (_, _, snapshot) = fixture();
    let m = snapshot.matrix();
    assert_eq!(m.validate(), Ok(()));
    for (i, _) in snapshot.index().iter() {
        for (j, count) in m.row(i) {
            assert_eq!(m.co_occurrence(j, i), count);
            assert!(count <= m.total_count(i).min(m.total_count(j)));
        }
    }
}

#[test]
fn rebuild_is_order_independent() {
    let mut rng = StdRng::seed_from_u64(7);
    let pool = card_pool(60);
    let corpus = random_corpus(&mut rng, &pool, 150);
    let index = CardIndex::from_corpus(&corpus);

    let first = build_sequential(&index, &corpus);
    let again = build_sequential(&index, &corpus);
    assert_eq!(first, again);

    let mut shuffled = corpus.clone();
    shuffled.shuffle(&mut rng);
    assert_eq!(build_sequential(&index, &shuffled), first);
    assert_eq!(build_parallel(&index, &shuffled), first);
}

#[test]
fn concurrent_queries_during_swap() {
    let (mut rng, pool, snapshot) = fixture();
    let cubes: Vec<Collection> = (0..8).map(|_| random_cube(&mut rng, &pool)).collect();
    let expected: Vec<_> = cubes
        .iter()
        .map(|cube| CooccurrenceRecommender::new(&snapshot).recommend(cube, 10))
        .collect();

    let handle = Arc::new(SnapshotHandle::new(snapshot.clone()));
    thread::scope(|scope| {
        for (cube, want) in cubes.iter().zip(&expected) {
            let handle = Arc::clone(&handle);
            scope.spawn(move || {
                for _ in 0..20 {
                    let current = handle.load();
                    let got = CooccurrenceRecommender::new(&current).recommend(cube, 10);
                    assert_eq!(&got, want);
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..5 {
                handle.replace(snapshot.clone());
            }
        });
    });
}
