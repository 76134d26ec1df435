// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod seed;
pub mod store;

pub use seed::*;
pub use store::*;

use anyhow::{Context, Result, anyhow};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tabula_app::{RowId, RowValues, Schema};
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, warn};
use url::Url;

/// In-process table server on an ephemeral localhost port. Stops on drop.
pub struct FakeServer {
    base_url: String,
    server: Arc<Server>,
    store: Arc<Mutex<Store>>,
    worker: Option<JoinHandle<()>>,
}

impl FakeServer {
    pub fn start() -> Result<Self> {
        Self::start_with(Store::default())
    }

    pub fn start_with(store: Store) -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start fake table server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let server = Arc::new(server);
        let store = Arc::new(Mutex::new(store));

        let worker = {
            let server = Arc::clone(&server);
            let store = Arc::clone(&store);
            thread::Builder::new()
                .name("tabula-fake-server".to_owned())
                .spawn(move || {
                    for request in server.incoming_requests() {
                        handle(request, &store);
                    }
                })
                .context("spawn fake table server thread")?
        };

        debug!(%base_url, "fake table server listening");
        Ok(Self {
            base_url,
            server,
            store,
            worker: Some(worker),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Runs `f` against the live store, e.g. to seed or inspect it.
    pub fn with_store<T>(&self, f: impl FnOnce(&mut Store) -> T) -> T {
        f(&mut lock(&self.store))
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("fake table server thread panicked");
        }
    }
}

fn lock(store: &Mutex<Store>) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

fn handle(mut request: Request, store: &Mutex<Store>) {
    let method = request.method().clone();
    let path = request.url().to_owned();
    let mut body = String::new();

    let outcome = match request.as_reader().read_to_string(&mut body) {
        Ok(_) => route(&mut lock(store), &method, &path, &body),
        Err(error) => Err(StoreError::Malformed(format!("read request body: {error}"))),
    };

    let (status, payload) = match outcome {
        Ok(payload) => (200, payload),
        Err(error) => {
            let detail = serde_json::json!({ "detail": error.to_string() }).to_string();
            (error.status(), detail)
        }
    };
    debug!(%method, %path, status, "fake server response");

    let mut response = Response::from_string(payload).with_status_code(status);
    if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
        response = response.with_header(header);
    }
    if let Err(error) = request.respond(response) {
        warn!(%path, %error, "fake server could not respond");
    }
}

#[derive(Debug, Serialize)]
struct Message {
    message: String,
}

#[derive(Debug, Serialize)]
struct NamesBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    databases: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tables: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
struct RowBody<'a> {
    id: RowId,
    values: &'a RowValues,
}

#[derive(Debug, Serialize)]
struct RowsBody<'a> {
    columns: &'a [String],
    rows: Vec<RowBody<'a>>,
}

#[derive(Debug, Serialize)]
struct ComparisonBody<'a> {
    rows: &'a [RowValues],
    columns: &'a Schema,
}

#[derive(Debug, Deserialize)]
struct RowRequest {
    values: RowValues,
}

fn route(store: &mut Store, method: &Method, path: &str, body: &str) -> StoreResult<String> {
    let url = Url::parse(&format!("http://fake{path}"))
        .map_err(|error| StoreError::Malformed(format!("bad request path: {error}")))?;
    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match (method, segments.as_slice()) {
        (Method::Get, ["all_databases"]) => {
            let databases = store.list_databases();
            encode(&NamesBody {
                databases: Some(databases.as_slice()),
                tables: None,
            })
        }
        (Method::Post, [db, "create"]) => {
            store.create_database(db)?;
            message(format!("database {db:?} created"))
        }
        (Method::Get, [db, "tables"]) => {
            let tables = store.list_tables(db)?;
            encode(&NamesBody {
                databases: None,
                tables: Some(tables.as_slice()),
            })
        }
        (Method::Post, [db, table, "create"]) => {
            store.create_table(db, table)?;
            message(format!("table {table:?} created"))
        }
        (Method::Delete, [db, table, "delete"]) => {
            store.delete_table(db, table)?;
            message(format!("table {table:?} deleted"))
        }
        (Method::Get, [db, table, "get_columns"]) => encode(&store.columns(db, table)?),
        (Method::Get, [db, table, "rows"]) => {
            let rows = store.rows(db, table)?;
            encode(&RowsBody {
                columns: &rows.columns,
                rows: rows
                    .rows
                    .iter()
                    .map(|row| RowBody {
                        id: row.id,
                        values: &row.values,
                    })
                    .collect(),
            })
        }
        (Method::Post, [db, table, "add_column"]) => {
            let name = required_param(&query, "column_name")?;
            let column_type = required_param(&query, "column_type")?;
            store.add_column(db, table, name, column_type)?;
            message(format!("column {name:?} added"))
        }
        (Method::Delete, [db, table, "delete_column"]) => {
            let name = required_param(&query, "column_name")?;
            store.delete_column(db, table, name)?;
            message(format!("column {name:?} deleted"))
        }
        (Method::Post, [db, table, "add_row"]) => {
            let request = decode_row(body)?;
            store.add_row(db, table, &request.values)?;
            message("row added".to_owned())
        }
        (Method::Get, [db, table, "row", id]) => {
            let row_id = parse_row_id(id)?;
            encode(&store.row(db, table, row_id)?)
        }
        (Method::Put, [db, table, "row", id, "edit"]) => {
            let row_id = parse_row_id(id)?;
            let request = decode_row(body)?;
            store.edit_row(db, table, row_id, &request.values)?;
            message("row updated".to_owned())
        }
        (Method::Delete, [db, table, "delete_row"]) => {
            let row_id = parse_row_id(required_param(&query, "row_id")?)?;
            store.delete_row(db, table, row_id)?;
            message("row deleted".to_owned())
        }
        (Method::Get, [db, left, "compare", right]) => {
            let result = store.compare(db, left, right)?;
            encode(&ComparisonBody {
                rows: &result.rows,
                columns: &result.columns,
            })
        }
        _ => Err(StoreError::NotFound(format!("no route for {method} {path}"))),
    }
}

fn encode<T: Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value)
        .map_err(|error| StoreError::Malformed(format!("encode response: {error}")))
}

fn message(message: String) -> StoreResult<String> {
    encode(&Message { message })
}

fn decode_row(body: &str) -> StoreResult<RowRequest> {
    serde_json::from_str(body).map_err(|error| {
        StoreError::Malformed(format!("row body must be an object with values: {error}"))
    })
}

fn required_param<'a>(query: &'a HashMap<String, String>, name: &str) -> StoreResult<&'a str> {
    query
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| StoreError::Malformed(format!("query parameter {name} is required")))
}

fn parse_row_id(raw: &str) -> StoreResult<RowId> {
    raw.parse::<i64>()
        .map(RowId::new)
        .map_err(|_| StoreError::Malformed(format!("row id {raw:?} is not an integer")))
}
