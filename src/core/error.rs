use serde::{Deserialize, Serialize};
use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

/// 后端返回的结构化错误，原样透传给调用方
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    pub message: String,
    pub details: Option<String>,
    pub hint: Option<String>,
    pub code: Option<String>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            hint: None,
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if let Some(pg) = db_err.try_downcast_ref::<PgDatabaseError>() {
                return Self {
                    message: pg.message().to_string(),
                    details: pg.detail().map(str::to_string),
                    hint: pg.hint().map(str::to_string),
                    code: Some(pg.code().to_string()),
                };
            }
            return Self {
                message: db_err.message().to_string(),
                details: None,
                hint: None,
                code: db_err.code().map(|c| c.into_owned()),
            };
        }
        Self::new(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("empty query")]
    EmptyQuery,

    #[error("backend error: {0}")]
    Backend(BackendError),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        QueryError::Backend(err.into())
    }
}
