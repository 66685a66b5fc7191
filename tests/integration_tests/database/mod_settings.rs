use crate::integration_tests::_support::{memory_client, orders_client, orders_settings};
use nexusgate::{Acknowledgment, DbError, ReadMode, ReadPreference, WriteConcern};
use std::time::Duration;

#[test]
fn database_copies_client_settings_at_mint() {
    let (_transport, client) = orders_client();
    let db = client.database("orders");
    assert_eq!(db.settings().unwrap(), orders_settings());
}

#[test]
fn client_changes_do_not_reach_existing_databases() {
    let (_transport, mut client) = memory_client();
    client.set_write_concern(WriteConcern::majority()).unwrap();
    let before = client.database("orders").settings().unwrap();

    client.set_write_concern(WriteConcern::nodes(1)).unwrap();
    let after = client.database("orders");
    assert_eq!(before.write_concern.acknowledgment(), Some(&Acknowledgment::Majority));
    assert_eq!(after.write_concern().unwrap().acknowledgment(), Some(&Acknowledgment::Nodes(1)));
}

#[test]
fn collection_snapshot_is_not_retroactive() {
    let (_transport, client) = orders_client();
    let mut db = client.database("orders");
    let items = db.collection("items").unwrap();

    db.set_read_preference(ReadPreference::secondary()).unwrap();
    assert_eq!(items.read_preference().mode(), ReadMode::Primary);
    assert_eq!(db.collection("items").unwrap().read_preference().mode(), ReadMode::Secondary);
    assert_eq!(db.coll("logs").unwrap().read_preference().mode(), ReadMode::Secondary);
}

#[test]
fn collection_changes_do_not_leak_back() {
    let (_transport, client) = orders_client();
    let db = client.database("orders");
    let mut items = db.collection("items").unwrap();
    items.set_write_concern(WriteConcern::nodes(3)).unwrap();
    assert_eq!(db.write_concern().unwrap().acknowledgment(), Some(&Acknowledgment::Majority));
    assert_eq!(db.coll("items").unwrap().settings(), orders_settings());
}

#[test]
fn named_accessor_and_shorthand_agree() {
    let (_transport, client) = orders_client();
    let db = client.database("orders");
    let a = db.collection("items").unwrap();
    let b = db.coll("items").unwrap();
    assert_eq!(a.name(), b.name());
    assert_eq!(a.database_name(), "orders");
    assert_eq!(a.namespace(), b.namespace());
    assert_eq!(a.settings(), b.settings());
}

#[test]
fn setters_reject_structurally_invalid_values() {
    let (_transport, client) = memory_client();
    let mut db = client.database("orders");
    let bad_rp = ReadPreference::primary().with_max_staleness(Duration::from_secs(120));
    assert!(matches!(db.set_read_preference(bad_rp), Err(DbError::InvalidArgument(_))));
    let bad_wc = WriteConcern::unacknowledged().with_journal(true);
    assert!(matches!(db.set_write_concern(bad_wc), Err(DbError::InvalidArgument(_))));
    assert_eq!(db.read_preference().unwrap().mode(), ReadMode::Primary);
    assert!(db.write_concern().unwrap().is_server_default());
}

#[test]
fn setting_getters_return_copies() {
    let (_transport, client) = memory_client();
    let mut db = client.database("orders");
    let rp = ReadPreference::nearest().with_max_staleness(Duration::from_secs(90));
    db.set_read_preference(rp.clone()).unwrap();
    let mut copy = db.read_preference().unwrap();
    assert_eq!(copy, rp);
    copy = ReadPreference::primary();
    assert_eq!(copy.mode(), ReadMode::Primary);
    assert_eq!(db.read_preference().unwrap(), rp);
}

#[test]
fn moved_handle_keeps_its_settings() {
    let (_transport, client) = memory_client();
    let mut db = client.database("orders");
    db.set_write_concern(WriteConcern::majority().with_journal(true)).unwrap();
    let moved = db.take();
    assert_eq!(moved.write_concern().unwrap().journal(), Some(true));
}
