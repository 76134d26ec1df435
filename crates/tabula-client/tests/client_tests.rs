// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::io::Read;
use std::thread;
use std::time::Duration;
use tabula_app::{
    ColumnType, DatabaseService, RowId, RowPayload, ServiceError, TableService,
};
use tabula_client::Client;
use tiny_http::{Header, Method, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn unreachable_server_is_a_network_error() -> Result<()> {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(100))?;
    let error = client
        .list_tables("db")
        .expect_err("nothing listens on port 1");
    assert!(error.is_network());
    assert!(error.to_string().contains("is the server running"));
    assert!(client.ping().is_err());
    Ok(())
}

#[test]
fn list_tables_uses_database_path() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.url(), "/shop/tables");
        request
            .respond(json_response(r#"{"tables":["orders","people"]}"#, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    assert_eq!(client.list_tables("shop")?, vec!["orders", "people"]);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn add_row_sends_values_with_nulls() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/shop/people/add_row");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("body readable");
        let parsed: serde_json::Value = serde_json::from_str(&body).expect("JSON body");
        assert_eq!(
            parsed,
            serde_json::json!({"values": {"age": null, "name": "Ada"}})
        );
        request
            .respond(json_response(r#"{"message":"ok"}"#, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let mut payload = RowPayload::default();
    payload.values.insert("name".to_owned(), Some("Ada".to_owned()));
    payload.values.insert("age".to_owned(), None);
    client.add_row("shop", "people", &payload)?;

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn query_parameters_are_encoded() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let expected = [
            (Method::Post, "/shop/people/add_column?column_name=start+time&column_type=timeInvl"),
            (Method::Delete, "/shop/people/delete_column?column_name=a%26b"),
            (Method::Delete, "/shop/people/delete_row?row_id=12"),
        ];
        for (method, url) in expected {
            let request = server.recv().expect("request expected");
            assert_eq!(request.method(), &method);
            assert_eq!(request.url(), url);
            request
                .respond(json_response("{}", 200))
                .expect("response should succeed");
        }
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    client.add_column("shop", "people", "start time", ColumnType::TimeInterval)?;
    client.delete_column("shop", "people", "a&b")?;
    client.delete_row("shop", "people", RowId::new(12))?;

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn rejection_detail_surfaces_verbatim() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/shop/people/row/3/edit");
        request
            .respond(json_response(
                r#"{"detail":"invalid data type in columns: age"}"#,
                400,
            ))
            .expect("response should succeed");

        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/shop/people/row/99");
        request
            .respond(json_response(r#"{"detail":"row not found"}"#, 404))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .edit_row("shop", "people", RowId::new(3), &RowPayload::default())
        .expect_err("server rejects");
    assert_eq!(
        error,
        ServiceError::Validation {
            detail: "invalid data type in columns: age".to_owned()
        }
    );
    let error = client
        .get_row("shop", "people", RowId::new(99))
        .expect_err("missing row");
    assert!(error.is_not_found());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn malformed_body_is_a_decode_error() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response("[1, 2", 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .load_rows("shop", "people")
        .expect_err("truncated JSON");
    assert!(matches!(error, ServiceError::Decode { .. }));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn list_databases_and_create() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/all_databases");
        request
            .respond(json_response(r#"{"databases":["shop"]}"#, 200))
            .expect("response should succeed");

        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Post);
        assert_eq!(request.url(), "/new%20db/create");
        request
            .respond(json_response("{}", 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    assert_eq!(client.list_databases()?, vec!["shop"]);
    client.create_database("new db")?;

    handle.join().expect("server thread should join");
    Ok(())
}
