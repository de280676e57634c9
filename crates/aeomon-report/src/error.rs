use thiserror::Error;

use aeomon_db::DbError;

/// Errors that abort a report run.
///
/// Per-prompt and per-URL failures never surface here: they are recorded on
/// their own rows and swallowed. What remains is the fatal class, mostly
/// database failures, which mark the report `failed`.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Db(#[from] DbError),
}
