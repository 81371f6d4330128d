//! Property-based checks over sentences drawn from the embedded grammar's words.
//!
//! Whatever the word order, a parse must keep the walls in place, order every
//! link left to right and keep the sublinkage cursor consistent.

use linkparser::{Dictionary, OptionsPatch, Sentence};
use proptest::prelude::*;

/// Words the grammar knows, plus one it does not
fn word_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "the", "a", "cat", "dog", "ball", "hill", "runs", "rolled", "bumped", "was", "wet", "big", "with", "down",
        "and", "blorgle",
    ])
}

fn sentence_strategy() -> impl Strategy<Value = String> {
    (prop::collection::vec(word_strategy(), 1..7), prop_oneof![Just("."), Just("!"), Just("")])
        .prop_map(|(words, end)| format!("{}{}", words.join(" "), end))
}

fn limited() -> OptionsPatch {
    OptionsPatch { linkage_limit: Some(20), ..OptionsPatch::default() }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_walls_bracket_every_sentence(text in sentence_strategy()) {
        let dict = Dictionary::new().unwrap();
        let sentence = Sentence::new(&text, &dict);

        let words = sentence.words();
        prop_assert_eq!(words.first().copied(), Some("LEFT-WALL"));
        prop_assert_eq!(words.last().copied(), Some("RIGHT-WALL"));
        prop_assert!(words.len() >= 3);
    }

    #[test]
    fn test_links_run_left_to_right(text in sentence_strategy()) {
        let dict = Dictionary::new().unwrap();
        let mut sentence = Sentence::new(&text, &dict);
        sentence.parse_with(limited()).unwrap();

        prop_assert!(sentence.is_parsed());
        prop_assert!(sentence.linkages().len() <= 20);
        for linkage in sentence.linkages() {
            prop_assert_eq!(linkage.num_words(), sentence.length());
            for link in linkage.links() {
                prop_assert!(link.left_index < link.right_index, "{} in {:?}", link.label.clone().unwrap_or_default(), text);
                prop_assert!((link.right_index as usize) < linkage.num_words());
            }
        }
    }

    #[test]
    fn test_sublinkage_cursor(text in sentence_strategy()) {
        let dict = Dictionary::new().unwrap();
        let mut sentence = Sentence::new(&text, &dict);
        sentence.parse_with(limited()).unwrap();

        for linkage in sentence.linkages().to_vec() {
            let mut linkage = linkage;
            let count = linkage.num_sublinkages();
            prop_assert!(count >= 1);
            prop_assert_eq!(linkage.has_conjunction(), count > 1);

            // 1. Every index below the count is reachable, the count itself is not
            for index in 0..count {
                prop_assert!(linkage.set_current_sublinkage(index).is_ok());
                prop_assert_eq!(linkage.current_sublinkage(), index);
            }
            prop_assert!(linkage.set_current_sublinkage(count).is_err());

            // 2. The union is added at most once
            let added = linkage.compute_union();
            prop_assert_eq!(added, count > 1);
            prop_assert!(!linkage.compute_union());
            prop_assert_eq!(linkage.num_sublinkages(), count + usize::from(added));
        }
    }
}
