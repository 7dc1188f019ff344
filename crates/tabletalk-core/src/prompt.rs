//! Prompt assembly for SQL generation
//!
//! A `PromptRequest` is the fully rendered model input: the fixed system
//! instruction, the retrieved schema context, the few-shot block, and the
//! user question. It is immutable after assembly and carries a SHA-256
//! fingerprint for log correlation.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::schema::{render_schema_context, ExampleBank, SchemaCard};

/// Generation-time policy knobs rendered into the system instruction.
#[derive(Debug, Clone, Serialize)]
pub struct PromptPolicy {
    /// Target SQL dialect declared to the model.
    pub dialect: String,
    /// Row cap the model is told to apply to non-aggregated queries.
    pub row_cap: u32,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self {
            dialect: "MySQL".to_string(),
            row_cap: 100,
        }
    }
}

impl PromptPolicy {
    /// The fixed system instruction: SQL-only output, read-only statements,
    /// no fences, explicit columns, row cap, single dialect.
    pub fn system_instruction(&self) -> String {
        format!(
            "You are an expert {dialect} query generator.\n\
             Given the user question, the database schema context, and the examples, produce ONE valid {dialect} SELECT query.\n\
             Rules:\n\
             - Return ONLY the SQL, without ``` fences, comments, or any explanation.\n\
             - Use ONLY tables/columns from the provided schema context.\n\
             - Prefer explicit column names over SELECT *.\n\
             - If the query could be large and has no aggregation, add a LIMIT {cap}.\n\
             - Never perform DML/DDL (INSERT/UPDATE/DELETE/CREATE/DROP/ALTER).\n\
             - Double-check JOIN keys and date filters.\n\
             - The SQL dialect is {dialect}.",
            dialect = self.dialect,
            cap = self.row_cap,
        )
    }
}

/// Fully assembled model request. No further mutation after construction.
#[derive(Debug, Clone, Serialize)]
pub struct PromptRequest {
    pub system_instruction: String,
    pub schema_context: String,
    pub examples_block: String,
    pub question: String,
}

impl PromptRequest {
    /// Compose a request from retrieved cards, the static example bank, and
    /// the user question. Retrieval has already happened by the time this
    /// runs; assembly itself is pure.
    pub fn assemble(
        policy: &PromptPolicy,
        cards: &[SchemaCard],
        examples: &ExampleBank,
        question: &str,
    ) -> Self {
        Self {
            system_instruction: policy.system_instruction(),
            schema_context: render_schema_context(cards),
            examples_block: examples.render_block(),
            question: question.to_string(),
        }
    }

    /// The human-turn message paired with the system instruction.
    pub fn user_message(&self) -> String {
        format!(
            "Schema context:\n{}\n\nExamples:\n{}\n\nQuestion: {}\nSQL:",
            self.schema_context, self.examples_block, self.question
        )
    }

    /// SHA-256 over the serialized request, for deterministic log correlation.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("prompt request should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
