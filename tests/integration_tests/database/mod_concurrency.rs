use crate::integration_tests::_support::memory_client;
use nexusgate::{Client, Collection, Database, ReadMode, ReadPreference, WriteConcern};
use std::thread;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn handles_are_send_and_sync() {
    assert_send_sync::<Client>();
    assert_send_sync::<Database<'_>>();
    assert_send_sync::<Collection<'_>>();
}

#[test]
fn databases_minted_per_thread_share_one_client() {
    let (transport, client) = memory_client();
    let mut results: Vec<(String, bool, ReadMode)> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let client = &client;
                s.spawn(move || {
                    let mut db = client.database("orders");
                    db.set_read_preference(ReadPreference::secondary_preferred()).unwrap();
                    db.set_write_concern(WriteConcern::nodes(i)).unwrap();
                    let name = format!("c{i}");
                    let coll = db.create_collection(&name, None).unwrap();
                    assert_eq!(coll.write_concern(), WriteConcern::nodes(i));
                    (name.clone(), db.has_collection(&name).unwrap(), coll.read_preference().mode())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let expected: Vec<String> = (0..8).map(|i| format!("c{i}")).collect();
    assert_eq!(results.iter().map(|(n, _, _)| n.clone()).collect::<Vec<_>>(), expected);
    assert!(results.iter().all(|(_, exists, mode)| *exists && *mode == ReadMode::SecondaryPreferred));
    assert_eq!(transport.collection_names("orders"), expected);
    assert_eq!(client.read_preference().mode(), ReadMode::Primary);
}

#[test]
fn a_database_handle_can_move_to_another_thread() {
    let (_transport, client) = memory_client();
    let db = client.database("orders");
    db.create_collection("items", None).unwrap();
    let names = thread::scope(|s| s.spawn(move || db.list_collection_names(None).unwrap()).join().unwrap());
    assert_eq!(names, vec!["items".to_string()]);
}
