use crate::errors::DbError;
use bson::{Bson, Document};

use super::types::{CmpOp, Filter, MAX_IN_SET, MAX_NESTING};

/// Parses a match document such as
/// `{ "name": "logs", "options.capped": { "$exists": true } }`.
///
/// Top-level keys are implicitly AND-ed. Supported operators: `$and`, `$or`,
/// `$nor` at the top level; `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`,
/// `$nin`, `$exists`, `$not` (and `$regex` with the `regex` feature) per field.
///
/// # Errors
/// `InvalidArgument` for unknown operators or operands of the wrong type.
pub fn parse_filter(doc: &Document) -> Result<Filter, DbError> {
    parse_at(doc, 0)
}

fn parse_at(doc: &Document, depth: usize) -> Result<Filter, DbError> {
    if depth > MAX_NESTING {
        return Err(bad("filter nesting too deep"));
    }
    let mut clauses = Vec::with_capacity(doc.len());
    for (key, value) in doc {
        match key.as_str() {
            "$and" => clauses.push(Filter::And(parse_list(key, value, depth)?)),
            "$or" => clauses.push(Filter::Or(parse_list(key, value, depth)?)),
            "$nor" => clauses.push(Filter::Not(Box::new(Filter::Or(parse_list(key, value, depth)?)))),
            k if k.starts_with('$') => return Err(bad(&format!("unknown top level operator: {k}"))),
            path => clauses.push(parse_field(path, value, depth)?),
        }
    }
    Ok(collapse(clauses))
}

fn parse_list(op: &str, value: &Bson, depth: usize) -> Result<Vec<Filter>, DbError> {
    let Bson::Array(items) = value else {
        return Err(bad(&format!("{op} must be an array")));
    };
    if items.is_empty() {
        return Err(bad(&format!("{op} must be a nonempty array")));
    }
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => parse_at(d, depth + 1),
            _ => Err(bad(&format!("{op} entries must be documents"))),
        })
        .collect()
}

fn is_operator_doc(d: &Document) -> bool {
    d.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn parse_field(path: &str, value: &Bson, depth: usize) -> Result<Filter, DbError> {
    let Bson::Document(ops) = value else {
        return Ok(Filter::Cmp { path: path.to_string(), op: CmpOp::Eq, value: value.clone() });
    };
    if !is_operator_doc(ops) {
        return Ok(Filter::Cmp { path: path.to_string(), op: CmpOp::Eq, value: value.clone() });
    }
    let mut clauses = Vec::with_capacity(ops.len());
    for (op, operand) in ops {
        let p = path.to_string();
        let clause = match op.as_str() {
            "$eq" => Filter::Cmp { path: p, op: CmpOp::Eq, value: operand.clone() },
            "$ne" => Filter::Not(Box::new(Filter::Cmp { path: p, op: CmpOp::Eq, value: operand.clone() })),
            "$gt" => Filter::Cmp { path: p, op: CmpOp::Gt, value: operand.clone() },
            "$gte" => Filter::Cmp { path: p, op: CmpOp::Gte, value: operand.clone() },
            "$lt" => Filter::Cmp { path: p, op: CmpOp::Lt, value: operand.clone() },
            "$lte" => Filter::Cmp { path: p, op: CmpOp::Lte, value: operand.clone() },
            "$in" => Filter::In { path: p, values: set_operand(op, operand)? },
            "$nin" => Filter::Nin { path: p, values: set_operand(op, operand)? },
            "$exists" => Filter::Exists { path: p, exists: truthy(operand) },
            "$not" => match operand {
                Bson::Document(inner) if is_operator_doc(inner) => {
                    Filter::Not(Box::new(parse_field(path, operand, depth + 1)?))
                }
                _ => return Err(bad("$not needs an operator document")),
            },
            #[cfg(feature = "regex")]
            "$regex" => {
                let Bson::String(pattern) = operand else {
                    return Err(bad("$regex has to be a string"));
                };
                let case_insensitive = matches!(ops.get("$options"), Some(Bson::String(o)) if o.contains('i'));
                Filter::Regex { path: p, pattern: pattern.clone(), case_insensitive }
            }
            #[cfg(feature = "regex")]
            "$options" => continue,
            other => return Err(bad(&format!("unknown operator: {other}"))),
        };
        clauses.push(clause);
    }
    Ok(collapse(clauses))
}

fn set_operand(op: &str, operand: &Bson) -> Result<Vec<Bson>, DbError> {
    match operand {
        Bson::Array(values) => Ok(values.iter().take(MAX_IN_SET).cloned().collect()),
        _ => Err(bad(&format!("{op} needs an array"))),
    }
}

fn truthy(v: &Bson) -> bool {
    match v {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(d) => *d != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

fn collapse(mut clauses: Vec<Filter>) -> Filter {
    match clauses.len() {
        0 => Filter::True,
        1 => clauses.pop().unwrap_or(Filter::True),
        _ => Filter::And(clauses),
    }
}

fn bad(msg: &str) -> DbError {
    DbError::InvalidArgument(msg.to_string())
}
