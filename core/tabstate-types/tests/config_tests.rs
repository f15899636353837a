use tabstate_types::{resolve, Error, SlotConfig, SlotName, StorageKind, DEFAULT_KEY};

// ── Defaults ─────────────────────────────────────────────────────

#[test]
fn default_config() {
    let config = SlotConfig::default();
    assert_eq!(config.group, "");
    assert_eq!(config.kind, StorageKind::Session);
    assert_eq!(config.key, DEFAULT_KEY);
}

#[test]
fn default_slot_name() {
    assert_eq!(resolve(&SlotConfig::default()).as_str(), "globalStatesession");
}

// ── Resolution ───────────────────────────────────────────────────

#[test]
fn resolve_concatenates_group_key_kind() {
    let config = SlotConfig::default()
        .with_group("app.")
        .with_key("cart")
        .with_kind(StorageKind::Local);
    assert_eq!(config.resolve(), SlotName::new("app.cartlocal"));
}

#[test]
fn resolve_is_deterministic() {
    let a = SlotConfig::default().with_group("g").with_key("k");
    let b = SlotConfig::default().with_group("g").with_key("k");
    assert_eq!(resolve(&a), resolve(&b));
    assert_eq!(resolve(&a), resolve(&a));
}

#[test]
fn kind_separates_slots() {
    let local = SlotConfig::default().with_kind(StorageKind::Local);
    let session = SlotConfig::default().with_kind(StorageKind::Session);
    assert_ne!(local.resolve(), session.resolve());
}

#[test]
fn group_separates_slots() {
    let a = SlotConfig::default().with_group("a");
    let b = SlotConfig::default().with_group("b");
    assert_ne!(a.resolve(), b.resolve());
}

// ── Storage kind ─────────────────────────────────────────────────

#[test]
fn storage_kind_round_trips_through_str() {
    for kind in [StorageKind::Local, StorageKind::Session] {
        assert_eq!(kind.to_string().parse::<StorageKind>().unwrap(), kind);
    }
}

#[test]
fn storage_kind_rejects_unknown() {
    let err = "cookie".parse::<StorageKind>().unwrap_err();
    assert!(matches!(err, Error::InvalidStorageKind(ref s) if s == "cookie"));
}

// ── Deserialization ──────────────────────────────────────────────

#[test]
fn deserialize_empty_object_uses_defaults() {
    let config: SlotConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, SlotConfig::default());
}

#[test]
fn deserialize_partial_config() {
    let config: SlotConfig = serde_json::from_str(r#"{"kind":"local","group":"shop"}"#).unwrap();
    assert_eq!(config.kind, StorageKind::Local);
    assert_eq!(config.group, "shop");
    assert_eq!(config.key, DEFAULT_KEY);
    assert_eq!(config.resolve().as_str(), "shopglobalStatelocal");
}

#[test]
fn deserialize_rejects_unknown_kind() {
    assert!(serde_json::from_str::<SlotConfig>(r#"{"kind":"cookie"}"#).is_err());
}
