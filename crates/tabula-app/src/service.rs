// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ColumnType, ComparisonResult, RowId, RowPayload, RowValues, Schema, TableRows};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("cannot reach {url} -- is the server running? ({reason})")]
    Network { url: String, reason: String },

    #[error("{detail}")]
    Validation { detail: String },

    #[error("{detail}")]
    NotFound { detail: String },

    #[error("server error {status}: {detail}")]
    Server { status: u16, detail: String },

    #[error("decode {what}: {reason}")]
    Decode { what: String, reason: String },
}

impl ServiceError {
    /// Classifies a non-success HTTP status. `detail` is the server's message.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            400 | 409 | 422 => Self::Validation { detail },
            404 => Self::NotFound { detail },
            _ => Self::Server { status, detail },
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Remote table store. Every call is one request/response round trip.
pub trait TableService {
    fn list_tables(&self, database: &str) -> ServiceResult<Vec<String>>;
    fn create_table(&self, database: &str, table: &str) -> ServiceResult<()>;
    fn delete_table(&self, database: &str, table: &str) -> ServiceResult<()>;
    fn get_columns(&self, database: &str, table: &str) -> ServiceResult<Schema>;
    fn load_rows(&self, database: &str, table: &str) -> ServiceResult<TableRows>;
    fn get_row(&self, database: &str, table: &str, row_id: RowId) -> ServiceResult<RowValues>;
    fn add_row(&self, database: &str, table: &str, payload: &RowPayload) -> ServiceResult<()>;
    fn edit_row(
        &self,
        database: &str,
        table: &str,
        row_id: RowId,
        payload: &RowPayload,
    ) -> ServiceResult<()>;
    fn delete_row(&self, database: &str, table: &str, row_id: RowId) -> ServiceResult<()>;
    fn add_column(
        &self,
        database: &str,
        table: &str,
        name: &str,
        column_type: ColumnType,
    ) -> ServiceResult<()>;
    fn delete_column(&self, database: &str, table: &str, name: &str) -> ServiceResult<()>;
    fn compare(&self, database: &str, left: &str, right: &str) -> ServiceResult<ComparisonResult>;
}

pub trait DatabaseService {
    fn list_databases(&self) -> ServiceResult<Vec<String>>;
    fn create_database(&self, name: &str) -> ServiceResult<()>;
}
