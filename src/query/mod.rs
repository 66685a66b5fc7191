//! Match-expression parsing and evaluation, used by the in-memory transport
//! to answer filtered listings.

mod eval;
mod parse;
mod types;

pub use eval::{compare_bson, eval_filter};
pub use parse::parse_filter;
pub use types::{CmpOp, Filter};
