use crate::integration_tests::_support::memory_client;
use bson::doc;
use nexusgate::{Database, DbError, ReadPreference, WriteConcern};

fn assert_precondition<T: std::fmt::Debug>(r: Result<T, DbError>) {
    assert!(matches!(r, Err(DbError::PreconditionViolation(_))), "expected precondition violation, got {r:?}");
}

#[test]
fn default_handle_is_invalid() {
    let db = Database::default();
    assert!(!db.is_valid());
}

#[test]
fn every_operation_on_an_invalid_handle_is_a_precondition_violation() {
    let mut db = Database::default();
    assert_precondition(db.name());
    assert_precondition(db.run_command(&doc! { "ping": 1 }));
    assert_precondition(db.stats());
    assert_precondition(db.has_collection("items"));
    assert_precondition(db.list_collections(None));
    assert_precondition(db.list_collection_names(None));
    assert_precondition(db.create_collection("items", None));
    assert_precondition(db.drop());
    assert_precondition(db.collection("items"));
    assert_precondition(db.coll("items"));
    assert_precondition(db.settings());
    assert_precondition(db.read_preference());
    assert_precondition(db.write_concern());
    assert_precondition(db.set_read_preference(ReadPreference::secondary()));
    assert_precondition(db.set_write_concern(WriteConcern::majority()));
}

#[test]
fn minting_a_database_is_local() {
    let (transport, client) = memory_client();
    let db = client.database("orders");
    assert!(db.is_valid());
    assert_eq!(db.name().unwrap(), "orders");
    assert!(transport.commands().is_empty());
}

#[test]
fn take_moves_state_and_invalidates_source() {
    let (transport, client) = memory_client();
    let mut a = client.database("orders");
    let b = a.take();
    assert!(!a.is_valid());
    assert!(b.is_valid());
    assert_eq!(b.name().unwrap(), "orders");

    assert_precondition(a.run_command(&doc! { "ping": 1 }));
    assert_precondition(a.has_collection("items"));
    assert!(transport.commands().is_empty());
    assert!(b.run_command(&doc! { "ping": 1 }).is_ok());
}

#[test]
fn take_from_invalid_handle_is_idempotent() {
    let (_transport, client) = memory_client();
    let mut a = client.database("orders");
    let _b = a.take();
    let c = a.take();
    assert!(!a.is_valid());
    assert!(!c.is_valid());
}

#[test]
fn move_assign_replaces_target_state() {
    let (_transport, client) = memory_client();
    let mut source = client.database("orders");
    let mut target = client.database("billing");
    assert_eq!(target.name().unwrap(), "billing");
    target = source.take();
    assert_eq!(target.name().unwrap(), "orders");
    assert!(!source.is_valid());

    // assigning over with an invalid source leaves the target invalid too
    target = source.take();
    assert!(!target.is_valid());
}

#[test]
fn dropping_a_handle_has_no_remote_side_effect() {
    let (transport, client) = memory_client();
    let db = client.database("orders");
    db.create_collection("items", None).unwrap();
    transport.clear_commands();
    drop(db);
    assert!(transport.commands().is_empty());
    assert_eq!(transport.collection_names("orders"), vec!["items".to_string()]);
}

#[test]
fn plain_rust_moves_keep_the_handle_valid() {
    let (_transport, client) = memory_client();
    let db = client.database("orders");
    let moved = db;
    assert!(moved.is_valid());
    let boxed = Box::new(moved);
    assert_eq!(boxed.name().unwrap(), "orders");
}
