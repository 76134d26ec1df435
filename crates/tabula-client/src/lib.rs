// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tabula_app::{
    ColumnType, ComparisonResult, DatabaseService, RowId, RowPayload, RowValues, Schema,
    ServiceError, ServiceResult, TableRows, TableService,
};
use tracing::{debug, warn};
use url::Url;

/// Blocking client for the table server's REST API.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed)
            .with_context(|| format!("server.base_url {trimmed:?} is not a valid URL"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "server.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Checks that the server answers the database listing.
    pub fn ping(&self) -> Result<()> {
        self.list_databases()
            .with_context(|| format!("ping table server at {}", self.base_url()))?;
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // http(s) URLs always have path segments; checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn send(
        &self,
        method: Method,
        url: Url,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> ServiceResult<Response> {
        let path = url.path().to_owned();
        let request = build(self.http.request(method.clone(), url));
        let response = request.send().map_err(|error| {
            warn!(%method, %path, %error, "request failed");
            connection_error(self.base_url(), &error)
        })?;

        let status = response.status();
        debug!(%method, %path, status = status.as_u16(), "response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let error = clean_error_response(status, &body);
        warn!(%method, %path, status = status.as_u16(), %error, "request rejected");
        Err(error)
    }

    fn execute(&self, method: Method, segments: &[&str]) -> ServiceResult<()> {
        self.send(method, self.endpoint(segments), |request| request)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, segments: &[&str], what: &str) -> ServiceResult<T> {
        let response = self.send(Method::GET, self.endpoint(segments), |request| request)?;
        decode(response, what)
    }
}

impl DatabaseService for Client {
    fn list_databases(&self) -> ServiceResult<Vec<String>> {
        let parsed: DatabasesResponse = self.fetch(&["all_databases"], "database list")?;
        Ok(parsed.databases)
    }

    fn create_database(&self, name: &str) -> ServiceResult<()> {
        self.execute(Method::POST, &[name, "create"])
    }
}

impl TableService for Client {
    fn list_tables(&self, database: &str) -> ServiceResult<Vec<String>> {
        let parsed: TablesResponse = self.fetch(&[database, "tables"], "table list")?;
        Ok(parsed.tables)
    }

    fn create_table(&self, database: &str, table: &str) -> ServiceResult<()> {
        self.execute(Method::POST, &[database, table, "create"])
    }

    fn delete_table(&self, database: &str, table: &str) -> ServiceResult<()> {
        self.execute(Method::DELETE, &[database, table, "delete"])
    }

    fn get_columns(&self, database: &str, table: &str) -> ServiceResult<Schema> {
        self.fetch(&[database, table, "get_columns"], "column schema")
    }

    fn load_rows(&self, database: &str, table: &str) -> ServiceResult<TableRows> {
        self.fetch(&[database, table, "rows"], "table rows")
    }

    fn get_row(&self, database: &str, table: &str, row_id: RowId) -> ServiceResult<RowValues> {
        let id = row_id.to_string();
        self.fetch(&[database, table, "row", &id], "row values")
    }

    fn add_row(&self, database: &str, table: &str, payload: &RowPayload) -> ServiceResult<()> {
        let url = self.endpoint(&[database, table, "add_row"]);
        self.send(Method::POST, url, |request| request.json(payload))?;
        Ok(())
    }

    fn edit_row(
        &self,
        database: &str,
        table: &str,
        row_id: RowId,
        payload: &RowPayload,
    ) -> ServiceResult<()> {
        let id = row_id.to_string();
        let url = self.endpoint(&[database, table, "row", &id, "edit"]);
        self.send(Method::PUT, url, |request| request.json(payload))?;
        Ok(())
    }

    fn delete_row(&self, database: &str, table: &str, row_id: RowId) -> ServiceResult<()> {
        let mut url = self.endpoint(&[database, table, "delete_row"]);
        url.query_pairs_mut()
            .append_pair("row_id", &row_id.to_string());
        self.send(Method::DELETE, url, |request| request)?;
        Ok(())
    }

    fn add_column(
        &self,
        database: &str,
        table: &str,
        name: &str,
        column_type: ColumnType,
    ) -> ServiceResult<()> {
        let mut url = self.endpoint(&[database, table, "add_column"]);
        url.query_pairs_mut()
            .append_pair("column_name", name)
            .append_pair("column_type", column_type.as_str());
        self.send(Method::POST, url, |request| request)?;
        Ok(())
    }

    fn delete_column(&self, database: &str, table: &str, name: &str) -> ServiceResult<()> {
        let mut url = self.endpoint(&[database, table, "delete_column"]);
        url.query_pairs_mut().append_pair("column_name", name);
        self.send(Method::DELETE, url, |request| request)?;
        Ok(())
    }

    fn compare(&self, database: &str, left: &str, right: &str) -> ServiceResult<ComparisonResult> {
        self.fetch(&[database, left, "compare", right], "comparison")
    }
}

fn decode<T: DeserializeOwned>(response: Response, what: &str) -> ServiceResult<T> {
    response.json().map_err(|error| ServiceError::Decode {
        what: what.to_owned(),
        reason: error.to_string(),
    })
}

fn connection_error(base_url: &str, error: &reqwest::Error) -> ServiceError {
    let reason = if error.is_timeout() {
        "request timed out".to_owned()
    } else {
        error.to_string()
    };
    ServiceError::Network {
        url: base_url.to_owned(),
        reason,
    }
}

/// Builds the error for a non-2xx response, preferring the body's `detail`.
fn clean_error_response(status: StatusCode, body: &str) -> ServiceError {
    let code = status.as_u16();
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(detail) = parsed.detail
    {
        let text = match detail {
            Value::String(text) => text,
            other => other.to_string(),
        };
        if !text.is_empty() {
            return ServiceError::from_status(code, text);
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 200 && !trimmed.starts_with('{') {
        return ServiceError::from_status(code, trimmed);
    }

    let reason = status.canonical_reason().unwrap_or("request failed");
    ServiceError::from_status(code, reason)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TablesResponse {
    #[serde(default)]
    tables: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DatabasesResponse {
    #[serde(default)]
    databases: Vec<String>,
}
