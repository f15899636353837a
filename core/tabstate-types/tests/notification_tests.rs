use pretty_assertions::assert_eq;
use serde_json::json;
use tabstate_types::{
    empty_state, shallow_merge, ChangeNotification, ContextId, Error, SlotName,
};

// ── Notifications ────────────────────────────────────────────────

#[test]
fn parse_state_reads_json() {
    let n = ChangeNotification::new("slot", Some(r#"{"x":1}"#.into()));
    assert_eq!(n.parse_state().unwrap(), json!({"x": 1}));
}

#[test]
fn missing_value_reads_as_empty_state() {
    let n = ChangeNotification::new("slot", None);
    assert_eq!(n.parse_state().unwrap(), empty_state());
}

#[test]
fn empty_value_reads_as_empty_state() {
    let n = ChangeNotification::new("slot", Some(String::new()));
    assert_eq!(n.parse_state().unwrap(), json!({}));
}

#[test]
fn invalid_value_is_a_serialization_error() {
    let n = ChangeNotification::new("slot", Some("{not json".into()));
    assert!(matches!(n.parse_state(), Err(Error::Serialization(_))));
}

#[test]
fn is_for_matches_exact_slot() {
    let n = ChangeNotification::new("globalStatesession", None);
    assert!(n.is_for(&SlotName::new("globalStatesession")));
    assert!(!n.is_for(&SlotName::new("globalStatelocal")));
}

#[test]
fn source_is_optional_on_the_wire() {
    let plain: ChangeNotification =
        serde_json::from_str(r#"{"key":"k","new_value":"{}"}"#).unwrap();
    assert_eq!(plain.source, None);

    let ctx = ContextId::new();
    let tagged = ChangeNotification::new("k", None).with_source(ctx);
    let text = serde_json::to_string(&tagged).unwrap();
    let back: ChangeNotification = serde_json::from_str(&text).unwrap();
    assert_eq!(back.source, Some(ctx));
}

// ── Shallow merge ────────────────────────────────────────────────

#[test]
fn overlay_wins_on_overlap() {
    let merged = shallow_merge(&json!({"a": 1, "b": 2}), &json!({"b": 3, "c": 4}));
    assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
}

#[test]
fn merge_is_shallow() {
    let merged = shallow_merge(
        &json!({"nested": {"a": 1, "b": 2}}),
        &json!({"nested": {"a": 9}}),
    );
    assert_eq!(merged, json!({"nested": {"a": 9}}));
}

#[test]
fn scalar_overlay_keeps_base() {
    for overlay in [json!(null), json!(7), json!(true)] {
        assert_eq!(shallow_merge(&json!({"a": 1}), &overlay), json!({"a": 1}));
    }
}

#[test]
fn array_overlay_spreads_by_index() {
    assert_eq!(
        shallow_merge(&json!({"a": 1, "0": "old"}), &json!(["x", "y"])),
        json!({"a": 1, "0": "x", "1": "y"})
    );
}

#[test]
fn string_overlay_spreads_characters() {
    assert_eq!(shallow_merge(&json!({}), &json!("hi")), json!({"0": "h", "1": "i"}));
}

#[test]
fn non_object_base_still_yields_object() {
    assert_eq!(shallow_merge(&json!(null), &json!({"b": 2})), json!({"b": 2}));
}

#[test]
fn merge_with_empty_keeps_base() {
    assert_eq!(shallow_merge(&json!({"a": 1}), &empty_state()), json!({"a": 1}));
}

// ── Context ids ──────────────────────────────────────────────────

#[test]
fn context_ids_are_unique_and_display_as_uuids() {
    let a = ContextId::new();
    let b = ContextId::new();
    assert_ne!(a, b);
    assert_eq!(a.to_string().len(), 36);
    assert_eq!(serde_json::to_string(&a).unwrap(), format!("\"{a}\""));
}
