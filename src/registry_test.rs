use super::*;

fn update(id: &str, x: Option<f64>, y: Option<f64>) -> PositionUpdate {
    PositionUpdate { id: id.into(), name: format!("{id}-name"), color: "#123456".into(), x, y }
}

#[test]
fn new_registry_is_empty() {
    let registry = Registry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert!(registry.snapshot().is_empty());
}

#[test]
fn first_upsert_inserts_full_record() {
    let mut registry = Registry::new();
    let conn = Uuid::new_v4();

    assert_eq!(registry.upsert_position(conn, update("a", Some(0.1), Some(0.2))), Upsert::Inserted);

    let record = registry.get("a").unwrap();
    assert_eq!(record.conn, conn);
    assert_eq!(record.user.name, "a-name");
    assert_eq!(record.user.color, "#123456");
    assert_eq!(record.user.x, Some(0.1));
}

#[test]
fn repeated_upserts_never_duplicate() {
    let mut registry = Registry::new();
    let conn = Uuid::new_v4();

    for i in 0..50 {
        let v = f64::from(i) / 50.0;
        registry.upsert_position(conn, update("a", Some(v), Some(v)));
    }

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.snapshot()[0].x, Some(49.0 / 50.0));
}

#[test]
fn update_moves_position_but_keeps_name_and_color() {
    let mut registry = Registry::new();
    let conn = Uuid::new_v4();
    registry.upsert_position(conn, update("a", Some(0.1), Some(0.1)));

    let renamed = PositionUpdate {
        id: "a".into(),
        name: "impostor".into(),
        color: "#000000".into(),
        x: Some(0.9),
        y: None,
    };
    assert_eq!(registry.upsert_position(conn, renamed), Upsert::Updated);

    let user = &registry.get("a").unwrap().user;
    assert_eq!(user.name, "a-name");
    assert_eq!(user.color, "#123456");
    assert_eq!(user.x, Some(0.9));
    assert_eq!(user.y, None);
}

#[test]
fn update_from_other_connection_keeps_original_owner() {
    let mut registry = Registry::new();
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    registry.upsert_position(owner, update("a", Some(0.1), Some(0.1)));
    registry.upsert_position(other, update("a", Some(0.2), Some(0.2)));

    assert_eq!(registry.get("a").unwrap().conn, owner);
    assert!(registry.remove_connection(other).is_empty());
    assert_eq!(registry.len(), 1);
}

#[test]
fn snapshot_preserves_insertion_order() {
    let mut registry = Registry::new();
    for id in ["c", "a", "b"] {
        registry.upsert_position(Uuid::new_v4(), update(id, None, None));
    }
    let ids: Vec<String> = registry.snapshot().into_iter().map(|u| u.id).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn remove_connection_drops_every_owned_record() {
    let mut registry = Registry::new();
    let shared = Uuid::new_v4();
    let kept = Uuid::new_v4();
    registry.upsert_position(shared, update("a", None, None));
    registry.upsert_position(kept, update("b", None, None));
    registry.upsert_position(shared, update("c", None, None));

    let removed: Vec<String> = registry.remove_connection(shared).into_iter().map(|u| u.id).collect();

    assert_eq!(removed, vec!["a", "c"]);
    assert_eq!(registry.len(), 1);
    assert!(registry.get("b").is_some());
}

#[test]
fn remove_unknown_connection_is_noop() {
    let mut registry = Registry::new();
    registry.upsert_position(Uuid::new_v4(), update("a", None, None));
    assert!(registry.remove_connection(Uuid::new_v4()).is_empty());
    assert_eq!(registry.len(), 1);
}

#[test]
fn recipients_pair_ids_with_connections() {
    let mut registry = Registry::new();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    registry.upsert_position(a, update("a", None, None));
    registry.upsert_position(b, update("b", Some(0.5), Some(0.5)));

    assert_eq!(registry.recipients(), vec![("a".to_string(), a), ("b".to_string(), b)]);
}
