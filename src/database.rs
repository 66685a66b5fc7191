//! Database handle: names one database on the remote store and mediates
//! access to the collections inside it.

use crate::client::Client;
use crate::collection::Collection;
use crate::command::is_read_like;
use crate::cursor::Cursor;
use crate::errors::{DbError, OperationError};
use crate::settings::{ReadPreference, Settings, WriteConcern};
use crate::types::Namespace;
use bson::{Bson, Document, doc};
use log::trace;

/// A handle to a named database.
///
/// A handle is valid when it was minted by [`Client::database`] and has not
/// been emptied by [`Database::take`]. `Database::default()` is invalid. Every
/// operation on an invalid handle fails with
/// [`DbError::PreconditionViolation`]; dropping, taking from and assigning over
/// an invalid handle are always fine.
///
/// The handle owns a copy of the client's settings taken when it was minted.
/// Changing them later only affects collections minted afterwards:
///
/// ```
/// use nexusgate::{Client, MemoryTransport, ReadMode, ReadPreference};
///
/// let client = Client::new(MemoryTransport::new());
/// let mut orders = client.database("orders");
/// let items = orders.collection("items").unwrap();
/// orders.set_read_preference(ReadPreference::secondary()).unwrap();
/// assert_eq!(items.read_preference().mode(), ReadMode::Primary);
/// assert_eq!(orders.coll("logs").unwrap().read_preference().mode(), ReadMode::Secondary);
/// ```
#[derive(Debug, Default)]
pub struct Database<'c> {
    inner: Option<DatabaseInner<'c>>,
}

#[derive(Debug)]
struct DatabaseInner<'c> {
    client: &'c Client,
    name: String,
    settings: Settings,
}

impl<'c> Database<'c> {
    pub(crate) fn new(client: &'c Client, name: &str) -> Self {
        Self {
            inner: Some(DatabaseInner {
                client,
                name: name.to_string(),
                settings: client.settings(),
            }),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Moves the handle's state out, leaving `self` invalid. Taking from an
    /// invalid handle returns another invalid handle.
    ///
    /// Move-assignment is `*dst = src.take()`.
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self { inner: self.inner.take() }
    }

    fn inner(&self) -> Result<&DatabaseInner<'c>, DbError> {
        self.inner.as_ref().ok_or_else(invalid_handle)
    }

    fn inner_mut(&mut self) -> Result<&mut DatabaseInner<'c>, DbError> {
        self.inner.as_mut().ok_or_else(invalid_handle)
    }

    /// # Errors
    /// `PreconditionViolation` on an invalid handle.
    pub fn name(&self) -> Result<&str, DbError> {
        Ok(&self.inner()?.name)
    }

    /// Runs an arbitrary command against this database and returns the full
    /// reply.
    ///
    /// Read-like commands are routed with the handle's read preference, all
    /// others go to the primary. No write concern is attached; embed one in
    /// `command` if it is needed.
    ///
    /// # Errors
    /// `OperationError::Command` when the server rejects the command,
    /// `OperationError::Transport` when it could not be delivered.
    pub fn run_command(&self, command: &Document) -> Result<Document, DbError> {
        let inner = self.inner()?;
        if command.is_empty() {
            return Err(DbError::InvalidArgument("command document is empty".into()));
        }
        let rp = if is_read_like(command) {
            inner.settings.read_preference.clone()
        } else {
            ReadPreference::primary()
        };
        inner.client.execute(&inner.name, command, &rp)
    }

    /// Server-side statistics (`dbStats`).
    ///
    /// # Errors
    /// Propagates command failures.
    pub fn stats(&self) -> Result<Document, DbError> {
        self.run_command(&doc! { "dbStats": 1 })
    }

    /// Explicitly creates collection `name`; `options` (capped, size,
    /// validator, ...) are passed through untouched.
    ///
    /// # Errors
    /// An empty name is rejected locally as `InvalidNamespace`. Everything else
    /// (conflicting options, other naming rules) is decided by the server.
    pub fn create_collection(
        &self,
        name: &str,
        options: Option<Document>,
    ) -> Result<Collection<'c>, DbError> {
        let inner = self.inner()?;
        if name.is_empty() {
            return Err(OperationError::invalid_namespace(&format!("{}.", inner.name)).into());
        }
        let mut command = doc! { "create": name };
        for (key, value) in options.unwrap_or_default() {
            if key != "create" {
                command.insert(key, value);
            }
        }
        attach_write_concern(&mut command, &inner.settings.write_concern);
        inner.client.execute(&inner.name, &command, &ReadPreference::primary())?;
        Ok(mint(inner, name))
    }

    /// Drops this database and everything in it. The handle stays valid.
    ///
    /// # Errors
    /// Propagates command failures.
    pub fn drop(&self) -> Result<(), DbError> {
        let inner = self.inner()?;
        let mut command = doc! { "dropDatabase": 1 };
        attach_write_concern(&mut command, &inner.settings.write_concern);
        inner.client.execute(&inner.name, &command, &ReadPreference::primary())?;
        Ok(())
    }

    /// Whether a collection called `name` exists. Absence is `Ok(false)`.
    ///
    /// # Errors
    /// Only when the underlying listing itself fails.
    pub fn has_collection(&self, name: &str) -> Result<bool, DbError> {
        let mut cursor = self.list(Some(doc! { "name": name }), true)?;
        cursor.next().transpose().map(|first| first.is_some())
    }

    /// Lazily enumerates collection descriptions matching `filter` (all
    /// collections when `None` or empty).
    ///
    /// # Errors
    /// When the initial `listCollections` fails; later batch failures surface
    /// through the cursor.
    pub fn list_collections(&self, filter: Option<Document>) -> Result<Cursor<'c>, DbError> {
        self.list(filter, false)
    }

    /// Names of the collections matching `filter`, fully drained.
    ///
    /// # Errors
    /// Any listing failure, including one mid-enumeration.
    pub fn list_collection_names(&self, filter: Option<Document>) -> Result<Vec<String>, DbError> {
        self.list(filter, true)?
            .map(|entry| {
                let entry = entry?;
                match entry.get("name") {
                    Some(Bson::String(name)) => Ok(name.clone()),
                    _ => Err(DbError::MalformedReply("collection entry without a name".into())),
                }
            })
            .collect()
    }

    fn list(&self, filter: Option<Document>, name_only: bool) -> Result<Cursor<'c>, DbError> {
        let inner = self.inner()?;
        let mut command = doc! { "listCollections": 1 };
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            command.insert("filter", filter);
        }
        if name_only {
            command.insert("nameOnly", true);
        }
        command.insert("cursor", Document::new());
        let rp = inner.settings.read_preference.clone();
        let reply = inner.client.execute(&inner.name, &command, &rp)?;
        let fallback = Namespace::new(inner.name.as_str(), "$cmd.listCollections");
        Cursor::from_reply(inner.client, fallback, rp, &reply)
    }

    /// Mints a handle for collection `name`. Local only: the collection does
    /// not have to exist.
    ///
    /// # Errors
    /// `PreconditionViolation` on an invalid handle.
    pub fn collection(&self, name: &str) -> Result<Collection<'c>, DbError> {
        Ok(mint(self.inner()?, name))
    }

    /// Shorthand for [`Database::collection`].
    ///
    /// # Errors
    /// Same as [`Database::collection`].
    pub fn coll(&self, name: &str) -> Result<Collection<'c>, DbError> {
        self.collection(name)
    }

    /// # Errors
    /// `PreconditionViolation` on an invalid handle.
    pub fn settings(&self) -> Result<Settings, DbError> {
        Ok(self.inner()?.settings.clone())
    }

    /// # Errors
    /// `PreconditionViolation` on an invalid handle.
    pub fn read_preference(&self) -> Result<ReadPreference, DbError> {
        Ok(self.inner()?.settings.read_preference.clone())
    }

    /// Replaces the read preference for this handle and for collections minted
    /// from now on. Existing collection handles keep their copy.
    ///
    /// # Errors
    /// `PreconditionViolation` on an invalid handle, `InvalidArgument` when
    /// `rp` is structurally invalid.
    pub fn set_read_preference(&mut self, rp: ReadPreference) -> Result<(), DbError> {
        let inner = self.inner_mut()?;
        rp.validate()?;
        trace!("{}: read preference -> {}", inner.name, rp.mode().as_str());
        inner.settings.read_preference = rp;
        Ok(())
    }

    /// # Errors
    /// `PreconditionViolation` on an invalid handle.
    pub fn write_concern(&self) -> Result<WriteConcern, DbError> {
        Ok(self.inner()?.settings.write_concern.clone())
    }

    /// Replaces the write concern for this handle and for collections minted
    /// from now on. Not checked against the deployment.
    ///
    /// # Errors
    /// `PreconditionViolation` on an invalid handle, `InvalidArgument` when
    /// `wc` is structurally invalid.
    pub fn set_write_concern(&mut self, wc: WriteConcern) -> Result<(), DbError> {
        let inner = self.inner_mut()?;
        wc.validate()?;
        trace!("{}: write concern -> {:?}", inner.name, wc);
        inner.settings.write_concern = wc;
        Ok(())
    }
}

/// Named accessor and shorthand both end up here: one snapshot copy per mint.
fn mint<'c>(inner: &DatabaseInner<'c>, name: &str) -> Collection<'c> {
    Collection::new(inner.client, &inner.name, name, inner.settings.clone())
}

fn invalid_handle() -> DbError {
    DbError::PreconditionViolation("database handle is default-constructed or moved-from".into())
}

pub(crate) fn attach_write_concern(command: &mut Document, wc: &WriteConcern) {
    if !wc.is_server_default() && !command.contains_key("writeConcern") {
        command.insert("writeConcern", wc.to_document());
    }
}
