use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use groundsearch::grounding::attr;
use groundsearch::interface::{search, SearchOptions};
use groundsearch::oracle::Uniform;
use groundsearch::phrase::{Category, Phrase, PhraseTree};
use groundsearch::space::{generate_search_space, Scope};
use groundsearch::symbols::SymbolDictionary;
use groundsearch::world::{Object, Pose, World};

fn blocks(n: usize) -> World {
    let mut world = World::new();
    for i in 0..n {
        world.keep(Object::new(
            format!("b{}", i),
            "block",
            if i % 2 == 0 { "red" } else { "blue" },
            Pose::at(i as f64, 0.0, 0.0),
        ));
    }
    world
}

fn dictionary() -> SymbolDictionary {
    SymbolDictionary::new()
        .with_classes(["object", "region", "container", "region_container", "constraint"])
        .with_strings(attr::OBJECT_TYPE, ["block"])
        .with_strings(attr::CONTAINER_TYPE, ["group", "row"])
        .with_strings(attr::SPATIAL_RELATION, ["near", "on"])
        .with_strings(attr::CONSTRAINT_TYPE, ["place"])
}

// "put the block near the blocks"
fn instruction() -> PhraseTree {
    let mut tree = PhraseTree::new();
    let object = tree.add(Phrase::new(Category::NounPhrase).word("NN", "block"));
    let group = tree.add(Phrase::new(Category::NounPhrase).word("NNS", "blocks"));
    let region = tree.add(Phrase::new(Category::PrepositionalPhrase).word("IN", "near").child(group));
    tree.add_root(
        Phrase::new(Category::VerbPhrase)
            .word("VB", "put")
            .child(object)
            .child(region),
    );
    tree
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let dictionary = dictionary();
    for n in [4, 8, 12] {
        let world = blocks(n);
        c.bench_function(&format!("containers {}", n), |b| {
            b.iter(|| generate_search_space(black_box(&dictionary), black_box(&world), Scope::Concrete))
        });
    }

    let world = blocks(4);
    let tree = instruction();
    for width in [1, 4, 16] {
        let options = SearchOptions::new(width).scope(Scope::Concrete);
        c.bench_function(&format!("beam width {}", width), |b| {
            b.iter(|| search(black_box(&tree), &world, &dictionary, &Uniform, &options, None))
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
