//! Schema cards and the few-shot example bank
//!
//! A schema card is a per-table description (columns, keys, notes) written
//! once and treated as read-only for the process lifetime. Cards are what
//! the vector index retrieves; the example bank is rendered verbatim into
//! every prompt.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read card file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse card file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Card file contains no cards")]
    Empty,
}

/// Per-table descriptive document. Identity is the table name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaCard {
    pub table: String,
    pub content: String,
}

impl SchemaCard {
    pub fn new(table: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            content: content.into(),
        }
    }
}

/// Load schema cards from a JSON file of `{table, content}` records.
pub fn load_cards<P: AsRef<Path>>(path: P) -> Result<Vec<SchemaCard>, SchemaError> {
    let contents = std::fs::read_to_string(path)?;
    let cards: Vec<SchemaCard> = serde_json::from_str(&contents)?;
    if cards.is_empty() {
        return Err(SchemaError::Empty);
    }
    Ok(cards)
}

/// Render cards as a schema-context block: a `## table` heading per card,
/// followed by its content, joined with blank lines.
pub fn render_schema_context(cards: &[SchemaCard]) -> String {
    cards
        .iter()
        .map(|c| format!("## {}\n{}", c.table, c.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Built-in card set for the `employees` sample database.
pub fn builtin_cards() -> Vec<SchemaCard> {
    vec![
        SchemaCard::new(
            "employees",
            "Table: employees\n\
             Columns:\n\
             - emp_no (INT, PK)\n\
             - birth_date (DATE)\n\
             - first_name (VARCHAR)\n\
             - last_name (VARCHAR)\n\
             - gender (ENUM('M','F'))\n\
             - hire_date (DATE)\n\
             Notes: Master list of employees.",
        ),
        SchemaCard::new(
            "salaries",
            "Table: salaries\n\
             Columns:\n\
             - emp_no (INT, FK employees.emp_no)\n\
             - salary (INT)\n\
             - from_date (DATE)\n\
             - to_date (DATE) -- '9999-01-01' means current\n\
             Notes: Salary history per employee.",
        ),
        SchemaCard::new(
            "titles",
            "Table: titles\n\
             Columns:\n\
             - emp_no (INT, FK employees.emp_no)\n\
             - title (VARCHAR)\n\
             - from_date (DATE)\n\
             - to_date (DATE)",
        ),
        SchemaCard::new(
            "departments",
            "Table: departments\n\
             Columns:\n\
             - dept_no (CHAR)\n\
             - dept_name (VARCHAR)",
        ),
        SchemaCard::new(
            "dept_emp",
            "Table: dept_emp\n\
             Columns:\n\
             - emp_no (INT, FK employees.emp_no)\n\
             - dept_no (CHAR, FK departments.dept_no)\n\
             - from_date (DATE)\n\
             - to_date (DATE)\n\
             Notes: Employee department assignments.",
        ),
        SchemaCard::new(
            "dept_manager",
            "Table: dept_manager\n\
             Columns:\n\
             - emp_no (INT, FK employees.emp_no)\n\
             - dept_no (CHAR, FK departments.dept_no)\n\
             - from_date (DATE)\n\
             - to_date (DATE)\n\
             Notes: Department managers over time.",
        ),
    ]
}

/// Worked (question, SQL) pair included in every prompt to steer output format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub question: String,
    pub sql: String,
}

impl FewShotExample {
    pub fn new(question: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            sql: sql.into(),
        }
    }
}

/// Static list of few-shot examples, loaded once and read-only thereafter.
#[derive(Debug, Clone)]
pub struct ExampleBank {
    examples: Vec<FewShotExample>,
}

impl ExampleBank {
    pub fn new(examples: Vec<FewShotExample>) -> Self {
        Self { examples }
    }

    /// The default bank: typical day-to-day queries over the employees schema.
    pub fn builtin() -> Self {
        Self::new(vec![
            FewShotExample::new(
                "How many employees are there?",
                "SELECT COUNT(*) AS total_employees FROM employees;",
            ),
            FewShotExample::new(
                "What is the average salary of current employees?",
                "SELECT AVG(s.salary) AS avg_salary_current \
                 FROM salaries s \
                 WHERE s.to_date = '9999-01-01';",
            ),
            FewShotExample::new(
                "Top 5 departments by number of current employees",
                "SELECT d.dept_name, COUNT(*) AS headcount \
                 FROM dept_emp de \
                 JOIN departments d ON d.dept_no = de.dept_no \
                 WHERE de.to_date = '9999-01-01' \
                 GROUP BY d.dept_name \
                 ORDER BY headcount DESC \
                 LIMIT 5;",
            ),
            FewShotExample::new(
                "Latest hire date per department (top 5)",
                "SELECT d.dept_name, MAX(e.hire_date) AS latest_hire \
                 FROM employees e \
                 JOIN dept_emp de ON de.emp_no = e.emp_no \
                 JOIN departments d ON d.dept_no = de.dept_no \
                 GROUP BY d.dept_name \
                 ORDER BY latest_hire DESC \
                 LIMIT 5;",
            ),
            FewShotExample::new(
                "Average salary by title in year 2010",
                "SELECT t.title, AVG(s.salary) AS avg_salary_2010 \
                 FROM titles t \
                 JOIN salaries s ON s.emp_no = t.emp_no \
                 WHERE s.from_date <= '2010-12-31' AND s.to_date >= '2010-01-01' \
                 GROUP BY t.title \
                 ORDER BY avg_salary_2010 DESC;",
            ),
        ])
    }

    pub fn examples(&self) -> &[FewShotExample] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Render as repeated `Q: <question>\nSQL:\n<sql>\n` blocks joined by
    /// blank lines.
    pub fn render_block(&self) -> String {
        self.examples
            .iter()
            .map(|ex| format!("Q: {}\nSQL:\n{}\n", ex.question, ex.sql))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
