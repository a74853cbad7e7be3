//! End-to-end resolution against the alerts page parameters.

use pretty_assertions::assert_eq;
use search_params::{Blueprint, BlueprintSet, ParamValue, ParamValues, SearchParams};

fn alerts() -> BlueprintSet {
    BlueprintSet::builder()
        .field("query", Blueprint::string(""))
        .field("rows", Blueprint::number(25.0).min(1.0).max(100.0))
        .field("filters", Blueprint::filters(["type:pe"]))
        .build()
        .unwrap()
}

#[test]
fn alerts_query_resolves_full_state() {
    let set = alerts();
    let search = SearchParams::parse("?query=evil&filters=NOT(type:pe)&filters=type:elf");
    let resolved = set.full(&search);

    let mut expected = ParamValues::new();
    expected.insert("query".into(), "evil".into());
    expected.insert("rows".into(), 25.into());
    expected.insert("filters".into(), vec!["type:elf", "NOT(type:pe)"].into());
    assert_eq!(resolved.values(), &expected);
}

#[test]
fn alerts_query_delta_is_minimal() {
    let set = alerts();
    let search = SearchParams::parse("?query=evil&filters=NOT(type:pe)&filters=type:elf");
    let delta = set.delta(&search);

    assert!(delta.get("rows").is_none());
    let encoded = delta.to_string();
    assert_eq!(encoded, "filters=NOT%28type%3Ape%29&filters=type%3Aelf&query=evil");

    let decoded: Vec<(String, String)> = SearchParams::parse(&encoded)
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(
        decoded,
        vec![
            ("filters".to_string(), "NOT(type:pe)".to_string()),
            ("filters".to_string(), "type:elf".to_string()),
            ("query".to_string(), "evil".to_string()),
        ]
    );
}

#[test]
fn delta_is_stable_when_reapplied() {
    let set = alerts();
    let search = SearchParams::parse("query=evil&rows=40&filters=!(type:pe)&filters=NOT(os:linux)");
    let once = set.delta(set.full(&search).values()).to_string();
    let restored = set.full(&SearchParams::parse(&once));
    let twice = set.delta(restored.values()).to_string();
    assert_eq!(once, twice);
}

#[test]
fn number_bounds_clamp_default_and_input() {
    let set = BlueprintSet::new([("n", Blueprint::number(5.0).min(10.0).max(20.0))]).unwrap();
    assert_eq!(set.defaults().get("n"), Some(&ParamValue::Number(10.0)));
    assert_eq!(
        set.full(&SearchParams::parse("n=100")).get("n"),
        Some(&ParamValue::Number(20.0))
    );
    assert_eq!(
        set.full(&SearchParams::parse("n=abc")).get("n"),
        Some(&ParamValue::Number(10.0))
    );
}

#[test]
fn locked_field_ignores_input() {
    let set = BlueprintSet::new([("mode", Blueprint::string("x").locked(true))]).unwrap();
    let resolved = set.full(&SearchParams::parse("mode=y"));
    assert_eq!(resolved.get("mode"), Some(&ParamValue::from("x")));
    assert!(set.delta(&SearchParams::parse("mode=y")).values().is_empty());
}

#[test]
fn enum_outside_options_falls_back() {
    let set = BlueprintSet::new([("sort", Blueprint::enumeration("asc", ["asc", "desc"]))]).unwrap();
    assert_eq!(
        set.full(&SearchParams::parse("sort=sideways")).get("sort"),
        Some(&ParamValue::from("asc"))
    );
    assert_eq!(
        set.full(&SearchParams::parse("sort=desc")).get("sort"),
        Some(&ParamValue::from("desc"))
    );
}

#[test]
fn from_params_skips_default_union() {
    let set = alerts();
    let resolved = set.from_params(&SearchParams::parse("filters=type:elf&filters=type:elf"));
    assert_eq!(resolved.get("filters"), Some(&ParamValue::from(vec!["type:elf"])));
}
