//! In-process document store speaking the command dialect the gateway uses.
//!
//! Useful for tests and for embedding without a server. It keeps the
//! catalogue only (databases, collections and their creation options); there
//! is no document storage.

use crate::command::command_name;
use crate::errors::{TransportError, code};
use crate::query::{Filter, eval_filter, parse_filter};
use crate::settings::ReadPreference;
use crate::transport::Transport;
use crate::types::{CollectionName, CursorId, DatabaseName, Namespace};
use bson::{Bson, Document, doc};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};

/// Size of a first batch when the command does not ask for one.
pub const DEFAULT_BATCH_SIZE: usize = 101;

/// Keys that travel with a `create` command but are not collection options.
const NON_OPTION_KEYS: &[&str] = &["create", "writeConcern", "comment", "lsid", "$db"];

/// One command as the transport received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    pub database: DatabaseName,
    pub command: Document,
    pub read_preference: ReadPreference,
}

impl RecordedCommand {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        command_name(&self.command)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CollectionEntry {
    options: Document,
}

#[derive(Debug)]
struct OpenCursor {
    namespace: Namespace,
    remaining: VecDeque<Document>,
}

type Catalog = HashMap<DatabaseName, BTreeMap<CollectionName, CollectionEntry>>;

pub struct MemoryTransport {
    databases: RwLock<Catalog>,
    cursors: Mutex<HashMap<CursorId, OpenCursor>>,
    next_cursor_id: AtomicI64,
    batch_size: usize,
    recording: bool,
    log: Mutex<Vec<RecordedCommand>>,
    transport_faults: Mutex<VecDeque<TransportError>>,
    command_faults: Mutex<HashMap<String, VecDeque<Document>>>,
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("databases", &self.databases.read().len())
            .field("open_cursors", &self.cursors.lock().len())
            .field("batch_size", &self.batch_size)
            .field("recording", &self.recording)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            databases: RwLock::new(HashMap::new()),
            cursors: Mutex::new(HashMap::new()),
            next_cursor_id: AtomicI64::new(1),
            batch_size: DEFAULT_BATCH_SIZE,
            recording: false,
            log: Mutex::new(Vec::new()),
            transport_faults: Mutex::new(VecDeque::new()),
            command_faults: Mutex::new(HashMap::new()),
        }
    }

    /// Default batch size for cursors (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Keeps a copy of every received command for [`Self::commands`]. Off by
    /// default; the log grows without bound while it is on.
    #[must_use]
    pub fn with_recording(mut self) -> Self {
        self.recording = true;
        self
    }

    /// The next command, whatever it is, fails below the command layer.
    pub fn fail_next(&self, error: TransportError) {
        self.transport_faults.lock().push_back(error);
    }

    /// The next command named `command` is rejected with the given server error.
    pub fn fail_command(&self, command: &str, code: i32, code_name: &str, message: &str) {
        self.command_faults
            .lock()
            .entry(command.to_string())
            .or_default()
            .push_back(error_reply(code, code_name, message));
    }

    /// Every command received so far, oldest first. Always empty unless the
    /// transport was built [`with_recording`](Self::with_recording).
    #[must_use]
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.log.lock().clone()
    }

    #[must_use]
    pub fn commands_named(&self, name: &str) -> Vec<RecordedCommand> {
        self.log.lock().iter().filter(|c| c.name() == Some(name)).cloned().collect()
    }

    pub fn clear_commands(&self) {
        self.log.lock().clear();
    }

    /// Number of server cursors still holding results.
    #[must_use]
    pub fn open_cursors(&self) -> usize {
        self.cursors.lock().len()
    }

    #[must_use]
    pub fn collection_names(&self, database: &str) -> Vec<CollectionName> {
        self.databases
            .read()
            .get(database)
            .map(|cols| cols.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn dispatch(&self, database: &str, command: &Document) -> Document {
        let Some(name) = command_name(command) else {
            return error_reply(code::BAD_VALUE, "BadValue", "empty command document");
        };
        match name {
            "ping" => doc! { "ok": 1.0 },
            "create" => self.create(database, command),
            "drop" => self.drop_collection(database, command),
            "dropDatabase" => self.drop_database(database),
            "listCollections" => self.list_collections(database, command),
            "getMore" => self.get_more(database, command),
            "killCursors" => self.kill_cursors(command),
            "dbStats" => self.db_stats(database),
            other => error_reply(
                code::COMMAND_NOT_FOUND,
                "CommandNotFound",
                &format!("no such command: '{other}'"),
            ),
        }
    }

    fn create(&self, database: &str, command: &Document) -> Document {
        let name = match command.get("create") {
            Some(Bson::String(name)) => name.clone(),
            _ => return type_mismatch("create", "string"),
        };
        if name.is_empty() || name.contains('$') || name.contains('\0') {
            return error_reply(
                code::INVALID_NAMESPACE,
                "InvalidNamespace",
                &format!("Invalid collection name: {database}.{name}"),
            );
        }
        let options: Document = command
            .iter()
            .filter(|(k, _)| !NON_OPTION_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if matches!(options.get("capped"), Some(Bson::Boolean(true))) && !options.contains_key("size") {
            return error_reply(
                code::INVALID_OPTIONS,
                "InvalidOptions",
                "the 'size' field is required when 'capped' is true",
            );
        }
        let mut dbs = self.databases.write();
        let cols = dbs.entry(database.to_string()).or_default();
        match cols.get(&name) {
            Some(existing) if existing.options == options => doc! { "ok": 1.0 },
            Some(_) => error_reply(
                code::NAMESPACE_EXISTS,
                "NamespaceExists",
                &format!("Collection {database}.{name} already exists with different options"),
            ),
            None => {
                cols.insert(name, CollectionEntry { options });
                doc! { "ok": 1.0 }
            }
        }
    }

    fn drop_collection(&self, database: &str, command: &Document) -> Document {
        let Some(Bson::String(name)) = command.get("drop") else {
            return type_mismatch("drop", "string");
        };
        let mut dbs = self.databases.write();
        let removed = dbs.get_mut(database).and_then(|cols| cols.remove(name));
        if dbs.get(database).is_some_and(BTreeMap::is_empty) {
            dbs.remove(database);
        }
        match removed {
            Some(_) => doc! { "ns": format!("{database}.{name}"), "ok": 1.0 },
            None => error_reply(code::NAMESPACE_NOT_FOUND, "NamespaceNotFound", "ns not found"),
        }
    }

    fn drop_database(&self, database: &str) -> Document {
        self.databases.write().remove(database);
        self.cursors.lock().retain(|_, c| c.namespace.database != database);
        doc! { "dropped": database, "ok": 1.0 }
    }

    fn list_collections(&self, database: &str, command: &Document) -> Document {
        let filter = match command.get("filter") {
            None | Some(Bson::Null) => Filter::True,
            Some(Bson::Document(f)) => match parse_filter(f) {
                Ok(filter) => filter,
                Err(e) => return error_reply(code::BAD_VALUE, "BadValue", &e.to_string()),
            },
            Some(_) => return type_mismatch("filter", "object"),
        };
        let name_only = matches!(command.get("nameOnly"), Some(Bson::Boolean(true)));
        let entries: VecDeque<Document> = {
            let dbs = self.databases.read();
            dbs.get(database)
                .into_iter()
                .flat_map(|cols| cols.iter())
                .map(|(name, entry)| {
                    doc! {
                        "name": name.as_str(),
                        "type": "collection",
                        "options": entry.options.clone(),
                        "info": { "readOnly": false },
                    }
                })
                .filter(|d| eval_filter(d, &filter))
                .map(|d| if name_only { name_only_entry(&d) } else { d })
                .collect()
        };
        let batch_size = requested_batch_size(command.get("cursor").and_then(Bson::as_document))
            .unwrap_or(self.batch_size);
        let namespace = Namespace::new(database, "$cmd.listCollections");
        self.open_cursor(namespace, entries, batch_size, "firstBatch")
    }

    fn open_cursor(
        &self,
        namespace: Namespace,
        mut remaining: VecDeque<Document>,
        batch_size: usize,
        batch_key: &str,
    ) -> Document {
        let take = batch_size.min(remaining.len());
        let batch: Vec<Document> = remaining.drain(..take).collect();
        let id = if remaining.is_empty() {
            0
        } else {
            let id = self.next_cursor_id.fetch_add(1, Ordering::Relaxed);
            self.cursors.lock().insert(id, OpenCursor { namespace: namespace.clone(), remaining });
            id
        };
        let mut cursor = doc! { "id": id, "ns": namespace.to_string() };
        cursor.insert(batch_key, batch);
        doc! { "cursor": cursor, "ok": 1.0 }
    }

    fn get_more(&self, database: &str, command: &Document) -> Document {
        let id = match command.get("getMore") {
            Some(Bson::Int64(id)) => *id,
            Some(Bson::Int32(id)) => i64::from(*id),
            _ => return type_mismatch("getMore", "long"),
        };
        let Some(mut open) = self.cursors.lock().remove(&id) else {
            return error_reply(code::CURSOR_NOT_FOUND, "CursorNotFound", &format!("cursor id {id} not found"));
        };
        let collection = command.get("collection").and_then(Bson::as_str).unwrap_or_default();
        if open.namespace.database != database || open.namespace.collection != collection {
            let ns = open.namespace.to_string();
            self.cursors.lock().insert(id, open);
            return error_reply(
                code::UNAUTHORIZED,
                "Unauthorized",
                &format!("requested getMore on {database}.{collection} but cursor belongs to {ns}"),
            );
        }
        let batch_size = requested_batch_size(Some(command)).unwrap_or(self.batch_size);
        let take = batch_size.min(open.remaining.len());
        let batch: Vec<Document> = open.remaining.drain(..take).collect();
        let ns = open.namespace.to_string();
        let next_id = if open.remaining.is_empty() {
            0
        } else {
            self.cursors.lock().insert(id, open);
            id
        };
        doc! { "cursor": { "id": next_id, "ns": ns, "nextBatch": batch }, "ok": 1.0 }
    }

    fn kill_cursors(&self, command: &Document) -> Document {
        let Some(Bson::Array(ids)) = command.get("cursors") else {
            return type_mismatch("cursors", "array");
        };
        let mut killed = Vec::new();
        let mut not_found = Vec::new();
        let mut cursors = self.cursors.lock();
        for id in ids {
            let id = match id {
                Bson::Int64(id) => *id,
                Bson::Int32(id) => i64::from(*id),
                _ => continue,
            };
            if cursors.remove(&id).is_some() {
                killed.push(id);
            } else {
                not_found.push(id);
            }
        }
        doc! { "cursorsKilled": killed, "cursorsNotFound": not_found, "ok": 1.0 }
    }

    fn db_stats(&self, database: &str) -> Document {
        let collections = self.databases.read().get(database).map_or(0, BTreeMap::len);
        doc! {
            "db": database,
            "collections": i64::try_from(collections).unwrap_or(i64::MAX),
            "views": 0_i64,
            "objects": 0_i64,
            "dataSize": 0.0,
            "ok": 1.0,
        }
    }
}

impl Transport for MemoryTransport {
    fn execute(
        &self,
        command: &Document,
        database: &str,
        read_preference: &ReadPreference,
    ) -> Result<Document, TransportError> {
        if self.recording {
            self.log.lock().push(RecordedCommand {
                database: database.to_string(),
                command: command.clone(),
                read_preference: read_preference.clone(),
            });
        }
        if let Some(fault) = self.transport_faults.lock().pop_front() {
            return Err(fault);
        }
        if let Some(name) = command_name(command)
            && let Some(reply) = self.command_faults.lock().get_mut(name).and_then(VecDeque::pop_front)
        {
            return Ok(reply);
        }
        Ok(self.dispatch(database, command))
    }
}

fn name_only_entry(entry: &Document) -> Document {
    doc! { "name": entry.get("name").cloned().unwrap_or(Bson::Null), "type": "collection" }
}

fn requested_batch_size(spec: Option<&Document>) -> Option<usize> {
    let n = match spec?.get("batchSize")? {
        Bson::Int32(n) => i64::from(*n),
        Bson::Int64(n) => *n,
        _ => return None,
    };
    usize::try_from(n).ok().filter(|n| *n > 0)
}

fn error_reply(code: i32, code_name: &str, message: &str) -> Document {
    doc! { "ok": 0.0, "errmsg": message, "code": code, "codeName": code_name }
}

fn type_mismatch(field: &str, expected: &str) -> Document {
    error_reply(code::TYPE_MISMATCH, "TypeMismatch", &format!("'{field}' must be of type {expected}"))
}
