//! The seam between the gateway handles and whatever actually talks to the server.

pub mod memory;

pub use memory::{MemoryTransport, RecordedCommand};

use crate::errors::TransportError;
use crate::settings::ReadPreference;
use bson::Document;
use std::sync::Arc;

/// Delivers one command document to a database and returns the raw reply.
///
/// A reply with `ok: 0` is still `Ok` here; interpreting it is the caller's
/// job. `Err` is reserved for failures below the command layer. Implementors
/// must tolerate concurrent calls from handles that share one session.
pub trait Transport: Send + Sync {
    /// # Errors
    /// Returns a [`TransportError`] when the command could not be delivered or
    /// no reply was received.
    fn execute(
        &self,
        command: &Document,
        database: &str,
        read_preference: &ReadPreference,
    ) -> Result<Document, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(
        &self,
        command: &Document,
        database: &str,
        read_preference: &ReadPreference,
    ) -> Result<Document, TransportError> {
        (**self).execute(command, database, read_preference)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(
        &self,
        command: &Document,
        database: &str,
        read_preference: &ReadPreference,
    ) -> Result<Document, TransportError> {
        (**self).execute(command, database, read_preference)
    }
}
