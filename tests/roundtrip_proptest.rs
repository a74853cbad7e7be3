//! Property tests for the filter grammar and the full/delta pipeline.

use proptest::prelude::*;
use search_params::{Blueprint, BlueprintSet, FilterGrammar, ParamValue, SearchParams};

// -- Strategy helpers --

fn arb_literal() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.:-]{0,11}"
}

fn arb_operators(tokens: [&'static str; 2]) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(tokens.to_vec()), 0..=5)
        .prop_map(|ops| ops.into_iter().map(str::to_string).collect())
}

fn wrap_manually(ops: &[String], literal: &str) -> String {
    ops.iter()
        .rev()
        .fold(literal.to_string(), |inner, op| format!("{op}({inner})"))
}

fn arb_filters() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        (arb_operators(["NOT", "!"]), prop::sample::select(vec!["type:pe", "type:elf", "os:linux", "size:big"])),
        0..6,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(ops, lit)| wrap_manually(&ops, lit))
            .collect()
    })
}

fn alerts() -> BlueprintSet {
    BlueprintSet::builder()
        .field("query", Blueprint::string(""))
        .field("rows", Blueprint::number(25.0).min(1.0).max(100.0))
        .field("sort", Blueprint::enumeration("asc", ["asc", "desc"]))
        .field("live", Blueprint::boolean(false))
        .field("limit", Blueprint::number(10.0).nullable(true))
        .field("label", Blueprint::string("all").nullable(true))
        .field("filters", Blueprint::filters(["type:pe", "os:linux"]))
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn grammar_round_trip_default_tokens(ops in arb_operators(["NOT", "!"]), literal in arb_literal()) {
        let grammar = FilterGrammar::default();
        let raw = wrap_manually(&ops, &literal);
        let entry = grammar.unwrap(&raw);
        prop_assert_eq!(&entry.literal, &literal);
        prop_assert_eq!(&entry.operators, &ops);
        prop_assert_eq!(grammar.wrap(&entry), raw);
    }

    #[test]
    fn grammar_round_trip_custom_tokens(ops in arb_operators(["NEG", "DROP"]), literal in arb_literal()) {
        let grammar = FilterGrammar::new("NEG", "DROP");
        let raw = wrap_manually(&ops, &literal);
        prop_assert_eq!(grammar.wrap(&grammar.unwrap(&raw)), raw);
    }

    #[test]
    fn rightmost_entry_wins(literal in arb_literal(), ops in arb_operators(["NOT", "!"])) {
        let grammar = FilterGrammar::default();
        let last = wrap_manually(&ops, &literal);
        let cleaned = grammar.clean(&[literal.clone(), last.clone()]);
        if ops.first().map(String::as_str) == Some("!") {
            prop_assert!(cleaned.is_empty());
        } else {
            prop_assert_eq!(cleaned, vec![last]);
        }
    }

    #[test]
    fn full_of_delta_reproduces_state(
        query in "[a-z ]{0,8}",
        rows in 1u32..=100,
        desc in any::<bool>(),
        live in any::<bool>(),
        filters in arb_filters(),
        limit in prop::option::of(0u32..50),
        label in prop::option::of("[a-z]{1,6}"),
    ) {
        let set = alerts();
        let mut search = SearchParams::new();
        search.append("query", query);
        search.append("rows", rows.to_string());
        search.append("sort", if desc { "desc" } else { "asc" });
        search.append("live", live.to_string());
        search.append("limit", limit.map_or_else(|| "null".to_string(), |n| n.to_string()));
        search.append("label", label.unwrap_or_else(|| "null".to_string()));
        for f in &filters {
            search.append("filters", f.clone());
        }

        let state = set.full(&search);
        let encoded = set.delta(state.values()).to_string();
        let restored = set.full(&SearchParams::parse(&encoded));
        prop_assert_eq!(restored.values(), state.values());
    }

    #[test]
    fn delta_is_idempotent(filters in arb_filters(), rows in 1u32..=100) {
        let set = alerts();
        let mut search: SearchParams = filters.iter().map(|f| ("filters", f.as_str())).collect();
        search.append("rows", rows.to_string());

        let once = set.delta(set.full(&search).values()).to_string();
        let restored = set.full(&SearchParams::parse(&once));
        let twice = set.delta(restored.values()).to_string();
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn null_round_trips_through_delta() {
    let set = alerts();
    let state = set.full(&SearchParams::parse("limit=null&label=null"));
    assert_eq!(state.get("limit"), Some(&ParamValue::Null));
    assert_eq!(state.get("label"), Some(&ParamValue::Null));

    let encoded = set.delta(state.values()).to_string();
    assert_eq!(encoded, "label=null&limit=null");
    assert_eq!(set.full(&SearchParams::parse(&encoded)).values(), state.values());
}

#[test]
fn dedupe_keeps_rightmost_negation() {
    let grammar = FilterGrammar::default();
    assert_eq!(grammar.clean(&["a", "NOT(a)"]), vec!["NOT(a)".to_string()]);
    assert_eq!(
        grammar.union(&["type:pe"], &["NOT(type:pe)"]),
        vec!["NOT(type:pe)".to_string()]
    );
    assert_eq!(
        alerts().full(&SearchParams::parse("filters=!(os:linux)")).get("filters"),
        Some(&ParamValue::from(vec!["type:pe"]))
    );
}
