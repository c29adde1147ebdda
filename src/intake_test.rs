use super::*;
use crate::protocol::ClickEvent;
use crate::state::test_helpers::connect;

fn position_frame(id: &str, x: f64, y: f64) -> String {
    serde_json::json!({
        "type": "positionChange",
        "data": {"id": id, "name": format!("user-{id}"), "color": "#abcdef", "x": x, "y": y}
    })
    .to_string()
}

fn click_frame(id: &str, x: f64, y: f64) -> String {
    serde_json::json!({"type": "click", "data": {"id": id, "x": x, "y": y}}).to_string()
}

#[test]
fn first_position_change_inserts_and_binds() {
    let mut presence = Presence::new(8);
    let (conn, _rx) = connect(&mut presence);

    let outcome = handle_text(&mut presence, conn, &position_frame("a", 0.1, 0.2)).unwrap();

    assert_eq!(outcome, Intake::Position(Upsert::Inserted));
    assert_eq!(presence.connections[&conn].user_id.as_deref(), Some("a"));
    let record = presence.registry.get("a").unwrap();
    assert_eq!(record.conn, conn);
    assert_eq!(record.user.x, Some(0.1));
}

#[test]
fn repeated_position_changes_update_in_place() {
    let mut presence = Presence::new(8);
    let (conn, _rx) = connect(&mut presence);

    handle_text(&mut presence, conn, &position_frame("a", 0.1, 0.2)).unwrap();
    let outcome = handle_text(&mut presence, conn, &position_frame("a", 0.7, 0.8)).unwrap();

    assert_eq!(outcome, Intake::Position(Upsert::Updated));
    assert_eq!(presence.registry.len(), 1);
    assert_eq!(presence.registry.get("a").unwrap().user.y, Some(0.8));
}

#[test]
fn click_is_queued_without_touching_registry() {
    let mut presence = Presence::new(8);
    let (conn, _rx) = connect(&mut presence);

    let outcome = handle_text(&mut presence, conn, &click_frame("a", 0.3, 0.4)).unwrap();

    assert_eq!(outcome, Intake::Click { queued: true });
    assert!(presence.registry.is_empty());
    assert_eq!(presence.clicks.drain_all(), vec![ClickEvent { id: "a".into(), x: 0.3, y: 0.4 }]);
}

#[test]
fn click_from_unbound_connection_is_still_queued() {
    let mut presence = Presence::new(8);
    let (conn, _rx) = connect(&mut presence);

    handle_text(&mut presence, conn, &click_frame("ghost", 0.5, 0.5)).unwrap();

    assert!(presence.connections[&conn].user_id.is_none());
    assert_eq!(presence.clicks.len(), 1);
}

#[test]
fn out_of_range_click_is_forwarded_as_is() {
    let mut presence = Presence::new(8);
    let (conn, _rx) = connect(&mut presence);

    handle_text(&mut presence, conn, &click_frame("a", 3.5, -1.0)).unwrap();

    let queued = presence.clicks.drain_all();
    assert_eq!(queued[0].x, 3.5);
    assert_eq!(queued[0].y, -1.0);
}

#[test]
fn full_click_queue_reports_drop() {
    let mut presence = Presence::new(1);
    let (conn, _rx) = connect(&mut presence);

    assert_eq!(handle_text(&mut presence, conn, &click_frame("a", 0.1, 0.1)).unwrap(), Intake::Click { queued: true });
    assert_eq!(handle_text(&mut presence, conn, &click_frame("a", 0.2, 0.2)).unwrap(), Intake::Click { queued: false });
    assert_eq!(presence.clicks.len(), 1);
}

#[test]
fn malformed_frame_leaves_state_untouched() {
    let mut presence = Presence::new(8);
    let (conn, _rx) = connect(&mut presence);

    let err = handle_text(&mut presence, conn, "definitely not json").unwrap_err();

    assert_eq!(err.error_code(), "E_MALFORMED");
    assert!(presence.registry.is_empty());
    assert!(presence.clicks.is_empty());
    assert_eq!(presence.connection_count(), 1);
}

#[test]
fn unknown_type_is_rejected() {
    let mut presence = Presence::new(8);
    let (conn, _rx) = connect(&mut presence);

    let err = handle_text(&mut presence, conn, r#"{"type":"scroll","data":{}}"#).unwrap_err();
    assert_eq!(err.error_code(), "E_UNKNOWN_TYPE");
}
