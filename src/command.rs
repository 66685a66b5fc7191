//! Command classification and reply interpretation.

use crate::errors::{OperationError, code};
use bson::{Bson, Document};

/// Commands that never write and may therefore be routed by read preference.
const READ_ONLY_COMMANDS: &[&str] = &[
    "buildInfo",
    "collStats",
    "count",
    "dbStats",
    "distinct",
    "find",
    "hello",
    "isMaster",
    "listCollections",
    "listIndexes",
    "ping",
    "serverStatus",
];

/// The command name is the first key of the command document.
#[must_use]
pub fn command_name(command: &Document) -> Option<&str> {
    command.keys().next().map(String::as_str)
}

/// Whether `command` may be served by a non-primary member.
///
/// `aggregate` is read-only unless its pipeline ends in `$out` or `$merge`.
#[must_use]
pub fn is_read_like(command: &Document) -> bool {
    match command_name(command) {
        Some("aggregate") => !aggregate_writes(command),
        Some(name) => READ_ONLY_COMMANDS.contains(&name),
        None => false,
    }
}

fn aggregate_writes(command: &Document) -> bool {
    let Some(Bson::Array(stages)) = command.get("pipeline") else {
        return false;
    };
    stages.last().and_then(Bson::as_document).is_some_and(|stage| {
        stage.contains_key("$out") || stage.contains_key("$merge")
    })
}

fn reply_ok(reply: &Document) -> bool {
    match reply.get("ok") {
        Some(Bson::Double(v)) => *v == 1.0,
        Some(Bson::Int32(v)) => *v == 1,
        Some(Bson::Int64(v)) => *v == 1,
        Some(Bson::Boolean(v)) => *v,
        _ => false,
    }
}

/// Passes a successful reply through; turns `ok: 0` into a structured error
/// carrying the server's code, code name and message verbatim.
///
/// # Errors
/// `OperationError::Command` when the reply is not `ok: 1`.
pub fn check_reply(reply: Document) -> Result<Document, OperationError> {
    if reply_ok(&reply) {
        return Ok(reply);
    }
    let code = match reply.get("code") {
        Some(Bson::Int32(c)) => *c,
        Some(Bson::Int64(c)) => i32::try_from(*c).unwrap_or(code::UNKNOWN),
        Some(Bson::Double(c)) => integral_code(*c),
        _ => code::UNKNOWN,
    };
    let code_name = reply.get("codeName").and_then(Bson::as_str).unwrap_or_default().to_string();
    let message = reply
        .get("errmsg")
        .and_then(Bson::as_str)
        .map_or_else(|| "command failed without an error message".to_string(), str::to_string);
    Err(OperationError::Command { code, code_name, message })
}

/// Doubles only count as a code when they hold an exact `i32`.
#[allow(clippy::cast_possible_truncation)]
fn integral_code(c: f64) -> i32 {
    if c.fract() == 0.0 && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&c) {
        c as i32
    } else {
        code::UNKNOWN
    }
}
