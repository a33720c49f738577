//! Cross-format invariants: canonicalization idempotence, sort-key order
//! and parent references, over generated documents.

use lml_core::text::{parse_text, serialize};
use lml_core::{parse_braces, DocumentData};
use proptest::prelude::*;

/// Generated text-format sources built from valid fragments; arbitrary
/// bytes would only exercise the degrade path.
fn source_strategy() -> impl Strategy<Value = String> {
    let word = "[a-z]{1,8}";
    let sentence = proptest::collection::vec(word, 1..8).prop_map(|w| w.join(" "));
    let fragment = prop_oneof![
        sentence.clone().prop_map(|s| format!("# {s}\n")),
        sentence.clone().prop_map(|s| format!("## {s}\n")),
        sentence.clone().prop_map(|s| format!("{s}.\n")),
        sentence.clone().prop_map(|s| format!("> {s}\n")),
        sentence
            .clone()
            .prop_map(|s| format!("@equation(label: eq:{})\nx + {s}\n", s.len())),
        sentence
            .clone()
            .prop_map(|s| format!("@list\n- {s}\n- again {s}\n")),
        sentence.clone().prop_map(|s| format!("@code(rust)\nlet x = \"{s}\";\n")),
        Just("---\n".to_string()),
        Just("> \n".to_string()),
        sentence
            .clone()
            .prop_map(|s| format!("@lemma(label: th:{})\n{s}\n", s.len())),
        sentence.prop_map(|s| format!("@theorem\n{s}\n")),
    ];
    proptest::collection::vec(fragment, 1..12).prop_map(|f| f.join("\n"))
}

fn assert_ordered(doc: &DocumentData) {
    let keys: Vec<_> = doc.blocks.iter().map(|b| b.sort_key.clone()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted, "sort keys must increase in document order");
}

fn assert_parents_precede(doc: &DocumentData) {
    for (index, block) in doc.blocks.iter().enumerate() {
        if let Some(parent) = &block.parent_id {
            let position = doc
                .blocks
                .iter()
                .position(|b| &b.id == parent)
                .unwrap_or_else(|| panic!("parent {parent} of {} missing", block.id));
            assert!(position < index, "parent must appear before its child");
        }
    }
}

proptest! {
    #[test]
    fn canonicalization_is_idempotent(source in source_strategy()) {
        let first = parse_text(&source);
        let second = parse_text(&serialize(&first));
        prop_assert_eq!(&first, &second);
        // And a second canonicalization changes nothing further.
        let third = parse_text(&serialize(&second));
        prop_assert_eq!(&second, &third);
    }

    #[test]
    fn sort_keys_are_strictly_increasing(source in source_strategy()) {
        let doc = parse_text(&source);
        assert_ordered(&doc);
        let keys: Vec<_> = doc.blocks.iter().map(|b| &b.sort_key).collect();
        for pair in keys.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn validator_clean_sources_parse(source in source_strategy()) {
        let report = lml_core::validate(&source);
        if report.valid {
            // Agreement: zero errors implies a full parse (which never
            // panics and yields one block per scanner event).
            let _ = parse_text(&source);
        }
    }
}

#[test]
fn brace_documents_keep_parents_in_order() {
    let doc = parse_braces(
        "@section \"Top\" {\n@p { one }\n@subsection \"Mid\" {\n@p { two }\n@subsubsection \"Leaf\" {\n@p { three }\n}\n}\n}",
    );
    assert_ordered(&doc);
    assert_parents_precede(&doc);
    assert_eq!(doc.blocks.iter().filter(|b| b.parent_id.is_none()).count(), 1);
}

#[test]
fn text_documents_have_no_dangling_parents() {
    let doc = parse_text("# A\n\npara\n\n@equation\nx\n");
    assert_parents_precede(&doc);
}
