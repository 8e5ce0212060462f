use groundsearch::beam::Ranked;
use groundsearch::error::{GroundingError, Result};
use groundsearch::grounding::{attr, Cv, Denotation, Grounding, GroundingClass};
use groundsearch::hierarchical::infer_dictionaries;
use groundsearch::interface::{hierarchical_search, SearchOptions};
use groundsearch::oracle::ScoreRequest;
use groundsearch::phrase::{Category, GroundedPhrase, Phrase, PhraseTree};
use groundsearch::symbols::SymbolDictionary;
use groundsearch::world::{Object, Pose, World};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn world() -> World {
    World::new()
        .with(Object::new("a", "block", "red", Pose::default()))
        .with(Object::new("b", "block", "blue", Pose::default()))
        .with(Object::new("c", "ball", "red", Pose::default()))
}

fn dictionary() -> SymbolDictionary {
    SymbolDictionary::new()
        .with_classes(["object", "region"])
        .with_strings(attr::OBJECT_TYPE, ["ball", "block"])
}

fn the_block() -> PhraseTree {
    let mut tree = PhraseTree::new();
    tree.add_root(Phrase::new(Category::NounPhrase).word("DT", "the").word("NN", "block"));
    tree
}

fn oracle(request: &ScoreRequest<'_>) -> Result<Vec<f64>> {
    Ok(match request.candidate {
        Grounding::ObjectType(t) if t == "block" => vec![0.1, 0.9],
        Grounding::ObjectType(_) => vec![0.9, 0.1],
        Grounding::Object(id) if id.as_str() == "a" => vec![0.3, 0.7],
        Grounding::Object(_) => vec![0.6, 0.4],
        _ => return Err(GroundingError::oracle(format!("unexpected {}", request.candidate))),
    })
}

fn grounded(denotations: Vec<Denotation>) -> GroundedPhrase {
    GroundedPhrase {
        category: Category::NounPhrase,
        words: Vec::new(),
        denotations,
        children: Vec::new(),
    }
}

#[test]
fn identical_dictionaries_are_merged() {
    setup();
    let block = Denotation::new(Grounding::ObjectType("block".into()), Cv::True);
    let ball = Denotation::new(Grounding::ObjectType("ball".into()), Cv::True);
    let rules = vec![
        Ranked { probability: 0.5, tree: grounded(vec![block.clone()]) },
        Ranked { probability: 0.3, tree: grounded(vec![ball]) },
        Ranked { probability: 0.2, tree: grounded(vec![block]) },
    ];
    let hypotheses = infer_dictionaries(&rules, &dictionary());
    assert_eq!(hypotheses.len(), 2);
    assert!((hypotheses[0].probability - 0.7).abs() < 1e-12);
    assert!(hypotheses[0].dictionary.contains_string(attr::OBJECT_TYPE, "block"));
    assert!(hypotheses[0].dictionary.has_class(GroundingClass::Object));
    // object_type is not named by the original dictionary
    assert!(!hypotheses[0].dictionary.has_class(GroundingClass::ObjectType));
    assert!((hypotheses[1].probability - 0.3).abs() < 1e-12);
}

#[test]
fn second_stage_is_weighted_by_the_rule_stage() {
    setup();
    let options = SearchOptions::new(4).rule_beam_width(2);
    let ranked = hierarchical_search(&the_block(), &world(), &dictionary(), &oracle, &options, None)
        .expect("hierarchical search");
    // four solutions over {a, b} weighted by 0.81, one empty solution weighted by 0.09
    let expected = [0.42 * 0.81, 0.28 * 0.81, 0.18 * 0.81, 0.12 * 0.81, 0.09];
    assert_eq!(ranked.len(), expected.len());
    for (solution, expected) in ranked.iter().zip(expected) {
        assert!((solution.probability - expected).abs() < 1e-12, "{} != {}", solution.probability, expected);
    }
    assert_eq!(
        ranked[0].tree.denotations,
        vec![Denotation::new(Grounding::object("a"), Cv::True)]
    );
    // the ball never makes it into the concrete stage
    for solution in &ranked {
        assert!(solution
            .tree
            .denotations
            .iter()
            .all(|d| d.grounding != Grounding::object("c")));
    }
    assert!(ranked[4].tree.denotations.is_empty());
}

#[test]
fn empty_tree_fails_before_any_stage() {
    setup();
    let err = hierarchical_search(
        &PhraseTree::new(),
        &world(),
        &dictionary(),
        &oracle,
        &SearchOptions::new(4),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, GroundingError::EmptyPhraseTree));
}
