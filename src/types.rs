use crate::errors::DbError;
use std::fmt;
use std::str::FromStr;

pub type DatabaseName = String;
pub type CollectionName = String;

/// Server-side cursor id; `0` means the server holds no more results.
pub type CursorId = i64;

/// A `database.collection` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: DatabaseName,
    pub collection: CollectionName,
}

impl Namespace {
    pub fn new(database: impl Into<DatabaseName>, collection: impl Into<CollectionName>) -> Self {
        Self { database: database.into(), collection: collection.into() }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

impl FromStr for Namespace {
    type Err = DbError;

    /// Splits on the first dot; collection names may themselves contain dots
    /// (`db.$cmd.listCollections`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((db, coll)) if !db.is_empty() && !coll.is_empty() => Ok(Self::new(db, coll)),
            _ => Err(DbError::MalformedReply(format!("invalid namespace '{s}'"))),
        }
    }
}
