use crate::integration_tests::_support::{memory_client, orders_client};
use bson::{Bson, doc};
use nexusgate::errors::code;
use nexusgate::{DbError, OperationError, ReadMode, ReadPreference, TransportError};

#[test]
fn ping_returns_the_full_reply() {
    let (transport, client) = memory_client();
    let reply = client.database("orders").run_command(&doc! { "ping": 1 }).unwrap();
    assert_eq!(reply.get("ok"), Some(&Bson::Double(1.0)));
    let sent = transport.commands();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].database, "orders");
    assert_eq!(sent[0].command, doc! { "ping": 1 });
}

#[test]
fn unknown_command_is_an_operation_error() {
    let (_transport, client) = memory_client();
    let err = client.database("orders").run_command(&doc! { "frobnicate": 1 }).unwrap_err();
    match err {
        DbError::Operation(OperationError::Command { code, code_name, .. }) => {
            assert_eq!(code, code::COMMAND_NOT_FOUND);
            assert_eq!(code_name, "CommandNotFound");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_command_is_rejected_locally() {
    let (transport, client) = memory_client();
    let err = client.database("orders").run_command(&doc! {}).unwrap_err();
    assert!(matches!(err, DbError::InvalidArgument(_)));
    assert!(transport.commands().is_empty());
}

#[test]
fn run_command_never_adds_a_write_concern() {
    let (transport, client) = orders_client();
    let db = client.database("orders");
    db.run_command(&doc! { "create": "items" }).unwrap();
    assert_eq!(transport.commands_named("create")[0].command, doc! { "create": "items" });
}

#[test]
fn read_like_commands_follow_the_read_preference() {
    let (transport, client) = memory_client();
    let mut db = client.database("orders");
    db.set_read_preference(ReadPreference::secondary_preferred()).unwrap();
    db.run_command(&doc! { "ping": 1 }).unwrap();
    db.stats().unwrap();
    db.run_command(&doc! { "create": "items" }).unwrap();

    let modes: Vec<ReadMode> = transport.commands().iter().map(|c| c.read_preference.mode()).collect();
    assert_eq!(modes, vec![ReadMode::SecondaryPreferred, ReadMode::SecondaryPreferred, ReadMode::Primary]);
}

#[test]
fn stats_counts_collections() {
    let (_transport, client) = memory_client();
    let db = client.database("orders");
    db.create_collection("items", None).unwrap();
    db.create_collection("logs", None).unwrap();
    let stats = db.stats().unwrap();
    assert_eq!(stats.get_str("db").unwrap(), "orders");
    assert_eq!(stats.get_i64("collections").unwrap(), 2);
}

#[test]
fn transport_failure_is_distinguishable_from_rejection() {
    let (transport, client) = memory_client();
    let db = client.database("orders");
    transport.fail_next(TransportError::ConnectionLost("reset by peer".into()));
    let err = db.run_command(&doc! { "ping": 1 }).unwrap_err();
    assert!(err.is_transport());
    assert!(err.is_operation());
    assert_eq!(err.code(), None);

    let err = db.run_command(&doc! { "nope": 1 }).unwrap_err();
    assert!(!err.is_transport());
    assert!(err.is_operation());
}

#[test]
fn transport_failure_during_create_mints_nothing() {
    let (transport, client) = memory_client();
    let db = client.database("orders");
    transport.fail_next(TransportError::Timeout("no reply in 30s".into()));
    assert!(db.create_collection("items", None).unwrap_err().is_transport());
    assert!(transport.collection_names("orders").is_empty());
    assert!(db.is_valid());
}
