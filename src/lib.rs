//! Gateway handles for a remote document store.
//!
//! A [`Client`] (the session) mints [`Database`] handles, which mint
//! [`Collection`] handles. Each level copies the read/write [`Settings`] of its
//! parent at the moment it is created, so later changes never reach handles
//! that already exist.
//!
//! ```
//! use bson::doc;
//! use nexusgate::{Client, MemoryTransport};
//!
//! let client = Client::new(MemoryTransport::new());
//! let orders = client.database("orders");
//! orders.create_collection("logs", Some(doc! { "capped": true, "size": 1024 })).unwrap();
//! assert!(orders.has_collection("logs").unwrap());
//! assert!(!orders.has_collection("items").unwrap());
//! ```

pub mod client;
pub mod collection;
pub mod command;
pub mod config;
pub mod cursor;
pub mod database;
pub mod errors;
pub mod logger;
pub mod query;
pub mod settings;
pub mod transport;
pub mod types;

pub use client::Client;
pub use collection::Collection;
pub use config::{ClientOptions, LoggingOptions};
pub use cursor::Cursor;
pub use database::Database;
pub use errors::{DbError, OperationError, TransportError};
pub use settings::{Acknowledgment, ReadMode, ReadPreference, Settings, WriteConcern};
pub use transport::{MemoryTransport, RecordedCommand, Transport};
pub use types::Namespace;
