//! Item stream tests

use conveyor_sorter::core::{
    Generation, LevelConfig, SimpleRng, Spawner, StreamEvent, ORDER_CATALOG,
};
use conveyor_sorter::types::{Freshness, Product, ProductId, ProductKind};

fn config() -> LevelConfig {
    LevelConfig::for_level_with_order(1, ORDER_CATALOG[0])
}

/// Run the stream to its natural end, collecting every event.
fn run_to_end(spawner: &mut Spawner, rng: &mut SimpleRng) -> Vec<StreamEvent> {
    let mut out = Vec::new();
    while let Some(dt) = spawner.until_next_event() {
        spawner.advance(dt, rng, &mut out);
        if spawner.is_exhausted() && spawner.belt().is_empty() {
            break;
        }
    }
    out
}

fn count(events: &[StreamEvent], pred: impl Fn(&StreamEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[test]
fn test_untouched_stream_exhausts_once() {
    let config = config();
    let mut rng = SimpleRng::new(4);
    let mut spawner = Spawner::new(&config, Generation(0), Vec::new());

    let events = run_to_end(&mut spawner, &mut rng);
    let spawned = count(&events, |e| matches!(e, StreamEvent::Spawned(_)));
    let missed = count(&events, |e| matches!(e, StreamEvent::Missed(_)));
    let exhausted = count(&events, |e| matches!(e, StreamEvent::Exhausted));

    assert_eq!(spawned as u32, config.max_stream());
    assert_eq!(missed, spawned);
    assert_eq!(exhausted, 1);
    assert_eq!(spawner.emitted(), config.max_stream());

    // The ticker is done; only time passes.
    let mut late = Vec::new();
    spawner.advance(60_000, &mut rng, &mut late);
    assert!(late.is_empty());
}

#[test]
fn test_stop_silences_everything() {
    let config = config();
    let mut rng = SimpleRng::new(4);
    let mut spawner = Spawner::new(&config, Generation(0), Vec::new());

    let mut out = Vec::new();
    spawner.advance(config.spawn_interval_ms * 2, &mut rng, &mut out);
    assert_eq!(out.len(), 2);
    assert!(!spawner.belt().is_empty());

    spawner.stop();
    out.clear();
    spawner.advance(120_000, &mut rng, &mut out);
    assert!(out.is_empty());
    assert!(spawner.belt().is_empty());
    assert_eq!(spawner.until_next_event(), None);
    assert_eq!(spawner.emitted(), 2);
}

#[test]
fn test_items_only_come_from_the_recipe_or_universe() {
    let config = config();
    let mut rng = SimpleRng::new(17);
    let mut spawner = Spawner::new(&config, Generation(3), Vec::new());

    let events = run_to_end(&mut spawner, &mut rng);
    let mut required = 0;
    for event in &events {
        if let StreamEvent::Spawned(item) = event {
            assert_eq!(item.ticket.generation, Generation(3));
            assert_eq!(item.product.id.generation, 3);
            assert!(!item.product.from_carry_over);
            assert!(item.lane < config.lanes);
            if config.order.requires(item.product.kind) {
                required += 1;
                // Required kinds are never generated rotten.
                assert_ne!(item.product.freshness, Freshness::Rotten);
            }
        }
    }
    // Biased towards the recipe.
    assert!(required * 2 > config.max_stream());
}

#[test]
fn test_carry_over_is_emitted_first_and_capped() {
    let config = config();
    let cap = config.max_stream() as usize;
    let carried: Vec<Product> = (0..cap as u32 + 5)
        .map(|serial| {
            Product::new(ProductId::new(0, serial), ProductKind::Potato, Freshness::Fresh)
                .carry_over_copy()
                .unwrap()
        })
        .collect();

    let mut rng = SimpleRng::new(8);
    let mut spawner = Spawner::new(&config, Generation(1), carried.clone());
    assert_eq!(spawner.carry_over_pending(), cap);

    let events = run_to_end(&mut spawner, &mut rng);
    let emitted: Vec<Product> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Spawned(item) => Some(item.product),
            _ => None,
        })
        .collect();
    assert_eq!(emitted, carried[..cap].to_vec());
    assert!(emitted
        .iter()
        .all(|p| p.from_carry_over && p.freshness == Freshness::Acceptable));
}

#[test]
fn test_same_seed_same_stream() {
    let config = config();
    let run = |seed| {
        let mut rng = SimpleRng::new(seed);
        let mut spawner = Spawner::new(&config, Generation(0), Vec::new());
        run_to_end(&mut spawner, &mut rng)
    };
    assert_eq!(run(21), run(21));
}
