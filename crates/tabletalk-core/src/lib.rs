//! Core data model and text transforms for the tabletalk pipeline
//!
//! Schema cards, the few-shot example bank, prompt assembly, the output
//! sanitizer, and the read-only statement policy. Nothing in this crate
//! touches the network; every transform is deterministic and testable in
//! isolation.

mod policy;
mod prompt;
mod sanitize;
mod schema;

pub use policy::{check_statement, enforce_row_cap, PolicyViolation, FORBIDDEN_KEYWORDS};
pub use prompt::{PromptPolicy, PromptRequest};
pub use sanitize::sanitize;
pub use schema::{
    builtin_cards, load_cards, render_schema_context, ExampleBank, FewShotExample, SchemaCard,
    SchemaError,
};
