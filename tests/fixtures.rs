use std::time::Duration;

use groundsearch::config::SearchConfig;
use groundsearch::grounding::{attr, GroundingClass};
use groundsearch::interface::{search, SearchOptions};
use groundsearch::oracle::Uniform;
use groundsearch::phrase::PhraseTree;
use groundsearch::space::{generate_search_space, Scope};
use groundsearch::symbols::SymbolDictionary;
use groundsearch::world::{ObjectId, World};

const WORLD: &str = r#"[
    {"id": "left_block", "object_type": "block", "color": "red",
     "pose": {"position": [0.0, 0.1, 0.0], "orientation": [0.0, 0.0, 0.0, 1.0]}},
    {"id": "right_block", "object_type": "block", "color": "green",
     "pose": {"position": [0.0, -0.1, 0.0], "orientation": [0.0, 0.0, 0.0, 1.0]}},
    {"id": "tray", "object_type": "tray", "color": "grey"}
]"#;

const DICTIONARY: &str = r#"{
    "classes": ["object", "region", "abstract_container"],
    "strings": {
        "object_type": ["block", "tray"],
        "object_color": ["green", "red"],
        "spatial_relation": ["left_of", "on"]
    },
    "ints": {"number": [1, 2], "index": [0]}
}"#;

const TREE: &str = r#"{
    "nodes": [
        {"category": "NounPhrase", "words": [{"pos": "DT", "text": "the"}, {"pos": "NN", "text": "tray"}], "children": []},
        {"category": "PrepositionalPhrase", "words": [{"pos": "IN", "text": "on"}], "children": [0]}
    ],
    "root": 1
}"#;

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn world_fixture_loads_in_order() {
    setup();
    let world: World = serde_json::from_str(WORLD).expect("world fixture");
    assert_eq!(world.len(), 3);
    assert_eq!(world.object_types(), vec!["block", "tray"]);
    let tray = world.get(&ObjectId::from("tray")).expect("tray kept");
    assert_eq!(tray.color(), "grey");
    let left = world.get(&ObjectId::from("left_block")).expect("left block kept");
    let right = world.get(&ObjectId::from("right_block")).expect("right block kept");
    assert!((left.pose().distance(right.pose()) - 0.2).abs() < 1e-9);
}

#[test]
fn dictionary_fixture_drives_generation() {
    setup();
    let world: World = serde_json::from_str(WORLD).expect("world fixture");
    let dictionary: SymbolDictionary = serde_json::from_str(DICTIONARY).expect("dictionary fixture");
    assert!(dictionary.contains_int(attr::NUMBER, 2));
    let space = generate_search_space(&dictionary, &world, Scope::Concrete);
    assert_eq!(space.candidates(GroundingClass::Object).len(), 3);
    assert_eq!(space.candidates(GroundingClass::Region).len(), 2 * 3);
    // two types, two numbers, one index, two colors
    assert_eq!(space.candidates(GroundingClass::AbstractContainer).len(), 8);
    assert!(space.candidates(GroundingClass::Container).is_empty());
}

#[test]
fn grounded_trees_serialize() {
    setup();
    let world: World = serde_json::from_str(WORLD).expect("world fixture");
    let dictionary: SymbolDictionary = serde_json::from_str(DICTIONARY).expect("dictionary fixture");
    let tree: PhraseTree = serde_json::from_str(TREE).expect("tree fixture");
    let ranked = search(&tree, &world, &dictionary, &Uniform, &SearchOptions::new(2), None)
        .expect("search");
    assert_eq!(ranked.len(), 2);
    let json = serde_json::to_value(&ranked[0]).expect("serializable");
    assert_eq!(json["tree"]["category"], "PrepositionalPhrase");
    assert_eq!(json["tree"]["children"][0]["words"][1]["text"], "tray");
}

#[test]
fn config_file_overrides_defaults() {
    setup();
    let path = std::env::temp_dir().join(format!("groundsearch-{}.toml", std::process::id()));
    std::fs::write(&path, "beam_width = 12\ntime_budget_ms = 500\n").expect("write config");
    let loaded = SearchConfig::load(path.to_str());
    std::fs::remove_file(&path).expect("remove config");
    let config = loaded.expect("load config");
    assert_eq!(config.beam_width, 12);
    assert_eq!(config.rule_beam_width, 4);
    let options = config.options();
    assert_eq!(options.beam_width, 12);
    assert_eq!(options.time_budget, Some(Duration::from_millis(500)));
}

#[test]
fn missing_config_file_is_an_error() {
    setup();
    assert!(SearchConfig::load(Some("/nonexistent/groundsearch.toml")).is_err());
}
