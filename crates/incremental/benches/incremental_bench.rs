//! Benchmarks for cardtree-incremental.
//!
//! Target: a single incremental change well under a full reload.

use cardtree_core::{AbstractCard, CardSetId, PhysicalCardId};
use cardtree_incremental::{CardSetView, ExtraLevels, ParentCountMode, ShowMode, ViewModes};
use cardtree_store::MemoryStore;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const TYPES: [&str; 4] = ["Vampire", "Master", "Action", "Reaction"];

struct Bench {
    store: MemoryStore,
    focus: CardSetId,
    parent: CardSetId,
    printings: Vec<PhysicalCardId>,
}

fn setup(cards: u32) -> Bench {
    let mut store = MemoryStore::new();
    let expansion = store.add_expansion("Jyhad");
    let mut printings = Vec::new();
    for id in 0..cards {
        let card = store.add_abstract_card(AbstractCard::new(
            id,
            format!("Card {id}"),
            TYPES[id as usize % TYPES.len()],
        ));
        printings.extend(store.unspecified_printing(card));
        printings.extend(store.add_printing(card, expansion).ok());
    }
    let parent = store.create_card_set("Parent", None, true).unwrap();
    let focus = store.create_card_set("Focus", Some(parent), true).unwrap();
    let child = store.create_card_set("Child", Some(focus), true).unwrap();
    let sibling = store.create_card_set("Sibling", Some(parent), true).unwrap();
    for (i, pc) in printings.iter().enumerate() {
        store.add_cards(parent, *pc, i % 4).unwrap();
        store.add_cards(focus, *pc, i % 3).unwrap();
        store.add_cards(child, *pc, i % 2).unwrap();
        store.add_cards(sibling, *pc, (i + 1) % 2).unwrap();
    }
    Bench {
        store,
        focus,
        parent,
        printings,
    }
}

fn modes() -> ViewModes {
    ViewModes::new(
        ExtraLevels::ExpansionsAndCardSets,
        ShowMode::ParentCards,
        ParentCountMode::MinusSetsInUse,
        false,
    )
}

fn bench_full_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for size in [100, 1000] {
        let bench = setup(size);
        group.bench_with_input(BenchmarkId::new("full_load", size), &bench, |b, bench| {
            let mut view = CardSetView::new(bench.focus);
            view.set_modes(modes());
            b.iter(|| {
                view.load(black_box(&bench.store));
                view.tree().row_count()
            })
        });
    }

    group.finish();
}

fn bench_single_change(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_change");

    for size in [100, 1000] {
        let mut bench = setup(size);
        let mut view = CardSetView::new(bench.focus);
        view.set_modes(modes());
        view.load(&bench.store);
        let pc = bench.printings[bench.printings.len() / 2];

        for (name, set) in [("focus", bench.focus), ("parent", bench.parent)] {
            group.bench_function(BenchmarkId::new(name, size), |b| {
                b.iter(|| {
                    bench.store.add_card(set, pc).unwrap();
                    view.apply_change(&bench.store, set, black_box(pc), 1);
                    bench.store.remove_card(set, pc).unwrap();
                    view.apply_change(&bench.store, set, black_box(pc), -1)
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_full_load, bench_single_change);
criterion_main!(benches);
