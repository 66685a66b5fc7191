// Shared fixtures: a client over an in-memory transport the test can still inspect.
use nexusgate::{Client, MemoryTransport, ReadPreference, Settings, WriteConcern};
use std::sync::Arc;

pub fn memory_client() -> (Arc<MemoryTransport>, Client) {
    memory_client_over(MemoryTransport::new())
}

/// Turns command recording on for `transport` so tests can inspect traffic.
pub fn memory_client_over(transport: MemoryTransport) -> (Arc<MemoryTransport>, Client) {
    let transport = Arc::new(transport.with_recording());
    let client = Client::new(Arc::clone(&transport));
    (transport, client)
}

/// `{readPreference: primary, writeConcern: majority}`
pub fn orders_settings() -> Settings {
    Settings::new(ReadPreference::primary(), WriteConcern::majority())
}

pub fn orders_client() -> (Arc<MemoryTransport>, Client) {
    let (transport, mut client) = memory_client();
    client.set_read_preference(ReadPreference::primary()).unwrap();
    client.set_write_concern(WriteConcern::majority()).unwrap();
    (transport, client)
}
