//! Repository layer: table-scoped queries against the EHR schema.

mod encounter;
mod form;
mod patient;

pub use encounter::*;
pub use form::*;
pub use patient::*;
