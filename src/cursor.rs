//! Lazy, single-pass enumeration over a server-side cursor.

use crate::client::Client;
use crate::errors::DbError;
use crate::settings::ReadPreference;
use crate::types::{CursorId, Namespace};
use bson::{Bson, Document, doc};
use log::warn;
use std::collections::VecDeque;

/// Forward-only iterator over the documents of a server cursor.
///
/// Holds one batch at a time and issues `getMore` only once that batch is
/// drained. The first failure is yielded as `Err` and ends the iteration.
/// Dropping a cursor the server still holds sends `killCursors`.
pub struct Cursor<'c> {
    client: &'c Client,
    namespace: Namespace,
    read_preference: ReadPreference,
    id: CursorId,
    batch: VecDeque<Document>,
    finished: bool,
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("namespace", &self.namespace)
            .field("id", &self.id)
            .field("buffered", &self.batch.len())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<'c> Cursor<'c> {
    /// Builds a cursor from a `{cursor: {id, ns, firstBatch}}` reply.
    ///
    /// `fallback` names the cursor when the reply carries no `ns`. A reply
    /// whose `ns` cannot be parsed is an error, but the server cursor is still
    /// killed under `fallback`.
    pub(crate) fn from_reply(
        client: &'c Client,
        fallback: Namespace,
        read_preference: ReadPreference,
        reply: &Document,
    ) -> Result<Self, DbError> {
        let (id, ns, batch) = parse_cursor_reply(reply, "firstBatch")?;
        let parsed = ns.map(|ns| ns.parse::<Namespace>()).transpose();
        let mut cursor =
            Self { client, namespace: fallback, read_preference, id, batch, finished: false };
        if let Some(namespace) = parsed? {
            cursor.namespace = namespace;
        }
        Ok(cursor)
    }

    /// Server cursor id; `0` once the server has nothing more to send.
    #[must_use]
    pub fn id(&self) -> CursorId {
        self.id
    }

    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// True when no further document can be produced without error.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.finished || (self.id == 0 && self.batch.is_empty())
    }

    pub fn advance(&mut self) -> Option<Result<Document, DbError>> {
        if self.finished {
            return None;
        }
        while self.batch.is_empty() {
            if self.id == 0 {
                self.finished = true;
                return None;
            }
            if let Err(e) = self.get_more() {
                self.finished = true;
                return Some(Err(e));
            }
        }
        self.batch.pop_front().map(Ok)
    }

    /// Drains the remaining documents.
    ///
    /// # Errors
    /// The first failure encountered while fetching.
    pub fn to_vec(mut self) -> Result<Vec<Document>, DbError> {
        let mut out = Vec::with_capacity(self.batch.len());
        while let Some(d) = self.advance() {
            out.push(d?);
        }
        Ok(out)
    }

    fn get_more(&mut self) -> Result<(), DbError> {
        let command = doc! { "getMore": self.id, "collection": self.namespace.collection.as_str() };
        let reply = self.client.execute(&self.namespace.database, &command, &self.read_preference)?;
        let (id, _, batch) = parse_cursor_reply(&reply, "nextBatch")?;
        self.id = id;
        self.batch = batch;
        Ok(())
    }
}

impl Iterator for Cursor<'_> {
    type Item = Result<Document, DbError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        if self.id == 0 {
            return;
        }
        let command = doc! {
            "killCursors": self.namespace.collection.as_str(),
            "cursors": [self.id],
        };
        if let Err(e) = self.client.execute(&self.namespace.database, &command, &self.read_preference) {
            warn!("failed to kill cursor {} on {}: {e}", self.id, self.namespace);
        }
    }
}

fn parse_cursor_reply(
    reply: &Document,
    batch_key: &str,
) -> Result<(CursorId, Option<String>, VecDeque<Document>), DbError> {
    let Some(Bson::Document(cursor)) = reply.get("cursor") else {
        return Err(DbError::MalformedReply("reply has no 'cursor' document".into()));
    };
    let id = match cursor.get("id") {
        Some(Bson::Int64(id)) => *id,
        Some(Bson::Int32(id)) => i64::from(*id),
        _ => return Err(DbError::MalformedReply("cursor without a numeric 'id'".into())),
    };
    let ns = cursor.get("ns").and_then(Bson::as_str).map(str::to_string);
    let Some(Bson::Array(items)) = cursor.get(batch_key) else {
        return Err(DbError::MalformedReply(format!("cursor without '{batch_key}'")));
    };
    let batch = items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => Ok(d.clone()),
            other => Err(DbError::MalformedReply(format!("non-document in batch: {other}"))),
        })
        .collect::<Result<_, _>>()?;
    Ok((id, ns, batch))
}
