// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use serde_json::{Value, json};
use std::time::Duration;
use tabula_app::{
    ColumnType, ConsoleCommand, ConsoleEvent, DatabaseConsole, DatabaseDirectory, FormMode,
    Selection, SelectorChoice, TableService,
};
use tabula_client::Client;
use tabula_testkit::{DEMO_DATABASE, FakeServer, demo_store};

fn start() -> Result<(FakeServer, Client)> {
    let server = FakeServer::start()?;
    let client = Client::new(server.base_url(), Duration::from_secs(2))?;
    Ok((server, client))
}

fn select(console: &mut DatabaseConsole<Client>, table: &str) -> Vec<ConsoleEvent> {
    console.dispatch(ConsoleCommand::Select(SelectorChoice::Table(
        table.to_owned(),
    )))
}

#[test]
fn create_database_table_columns_and_row() -> Result<()> {
    let (_server, client) = start()?;
    let mut directory = DatabaseDirectory::load(&client)?;
    assert!(directory.databases().is_empty());
    let database = directory.create(&client, "shop")?;

    let mut console = DatabaseConsole::new(client, database);
    console.dispatch(ConsoleCommand::RefreshTables);
    console.dispatch(ConsoleCommand::Select(SelectorChoice::Create));
    console.dispatch(ConsoleCommand::CreateTable("people".to_owned()));
    assert_eq!(
        console.selection(),
        &Selection::TableSelected("people".to_owned())
    );

    console.dispatch(ConsoleCommand::AddColumn {
        name: "name".to_owned(),
        column_type: ColumnType::String,
    });
    console.dispatch(ConsoleCommand::AddColumn {
        name: "age".to_owned(),
        column_type: ColumnType::Integer,
    });
    let view = console.view().expect("table view");
    assert_eq!(view.rendered.header, vec!["name", "age"]);

    console.dispatch(ConsoleCommand::OpenAddRow);
    let form = console.form_mut().expect("form open");
    form.set_value("name", "Ada");
    form.set_value("age", "36");
    let events = console.dispatch(ConsoleCommand::SubmitRow);
    assert!(events.contains(&ConsoleEvent::FormClosed));

    let view = console.view().expect("reloaded view");
    assert_eq!(view.rows.rows.len(), 1);
    let row = &view.rows.rows[0];
    assert!(row.id.get() > 0);
    assert_eq!(row.values.get("name"), Some(&json!("Ada")));
    assert_eq!(row.values.get("age"), Some(&json!(36)));
    Ok(())
}

#[test]
fn integer_column_rejects_text_and_keeps_form() -> Result<()> {
    let (server, client) = start()?;
    server.with_store(|store| -> Result<()> {
        store.create_database("db")?;
        store.create_table("db", "t")?;
        store.add_column("db", "t", "age", "integer")?;
        Ok(())
    })?;

    let mut console = DatabaseConsole::new(client, "db");
    console.dispatch(ConsoleCommand::RefreshTables);
    select(&mut console, "t");
    console.dispatch(ConsoleCommand::OpenAddRow);
    if let Some(form) = console.form_mut() {
        form.set_value("age", "abc");
    }

    console.dispatch(ConsoleCommand::SubmitRow);
    let form = console.form().expect("form stays open");
    assert_eq!(
        form.error.as_deref(),
        Some("invalid data type in columns: age")
    );
    assert_eq!(form.field("age").map(|f| f.value.as_str()), Some("abc"));
    assert!(console.view().is_some_and(|v| v.rows.rows.is_empty()));
    Ok(())
}

#[test]
fn edit_prefills_and_updates_row() -> Result<()> {
    let (server, client) = start()?;
    server.with_store(|store| -> Result<()> {
        store.create_database("db")?;
        store.create_table("db", "t")?;
        store.add_column("db", "t", "label", "string")?;
        store.add_column("db", "t", "grade", "char")?;
        let mut values = serde_json::Map::new();
        values.insert("label".to_owned(), json!("first"));
        values.insert("grade".to_owned(), json!("A"));
        store.add_row("db", "t", &values)?;
        Ok(())
    })?;

    let mut console = DatabaseConsole::new(client, "db");
    console.dispatch(ConsoleCommand::RefreshTables);
    select(&mut console, "t");
    let row_id = console
        .view()
        .and_then(|v| v.rendered.row_id_at(0))
        .expect("one row");

    let events = console.dispatch(ConsoleCommand::OpenEditRow(row_id));
    assert_eq!(events, vec![ConsoleEvent::FormOpened(FormMode::Edit(row_id))]);
    let form = console.form_mut().expect("edit form");
    assert_eq!(form.field("label").map(|f| f.value.as_str()), Some("first"));
    form.set_value("grade", "");

    console.dispatch(ConsoleCommand::SubmitRow);
    assert!(console.form().is_none());
    let values = console
        .service()
        .get_row("db", "t", row_id)
        .expect("row still exists");
    assert_eq!(values.get("grade"), Some(&Value::Null));
    Ok(())
}

#[test]
fn delete_flows_require_confirmation() -> Result<()> {
    let (server, client) = start()?;
    server.with_store(|store| -> Result<()> {
        store.create_database("db")?;
        store.create_table("db", "t")?;
        store.add_column("db", "t", "a", "integer")?;
        store.add_column("db", "t", "b", "string")?;
        let mut values = serde_json::Map::new();
        values.insert("a".to_owned(), json!("1"));
        values.insert("b".to_owned(), json!("x"));
        store.add_row("db", "t", &values)?;
        Ok(())
    })?;

    let mut console = DatabaseConsole::new(client, "db");
    console.dispatch(ConsoleCommand::RefreshTables);
    select(&mut console, "t");

    console.dispatch(ConsoleCommand::DeleteColumn("b".to_owned()));
    console.dispatch(ConsoleCommand::Decline);
    assert_eq!(console.view().map(|v| v.rendered.header.len()), Some(2));

    console.dispatch(ConsoleCommand::DeleteColumn("b".to_owned()));
    console.dispatch(ConsoleCommand::Confirm);
    assert_eq!(
        console.view().map(|v| v.rendered.header.clone()),
        Some(vec!["a".to_owned()])
    );

    let row_id = console
        .view()
        .and_then(|v| v.rendered.row_id_at(0))
        .expect("row survives");
    console.dispatch(ConsoleCommand::DeleteRow(row_id));
    console.dispatch(ConsoleCommand::Confirm);
    assert!(console.view().is_some_and(|v| v.rows.rows.is_empty()));

    console.dispatch(ConsoleCommand::DeleteTable);
    console.dispatch(ConsoleCommand::Confirm);
    assert_eq!(console.selection(), &Selection::NoTableSelected);
    assert!(console.service().list_tables("db")?.is_empty());
    Ok(())
}

#[test]
fn demo_comparison_matches_server_difference() -> Result<()> {
    let server = FakeServer::start_with(demo_store(11)?)?;
    let client = Client::new(server.base_url(), Duration::from_secs(2))?;
    let mut console = DatabaseConsole::new(client, DEMO_DATABASE);
    console.dispatch(ConsoleCommand::RefreshTables);

    let events = console.dispatch(ConsoleCommand::Compare {
        left: "inventory".to_owned(),
        right: "inventory_archive".to_owned(),
    });
    let expected = server.with_store(|store| {
        store
            .compare(DEMO_DATABASE, "inventory", "inventory_archive")
            .map(|result| result.rows.len())
    })?;
    assert_eq!(events, vec![ConsoleEvent::ComparisonReady { rows: expected }]);
    let view = console.comparison().expect("comparison view");
    assert_eq!(view.header.first().map(String::as_str), Some("product"));

    console.dispatch(ConsoleCommand::Compare {
        left: "inventory".to_owned(),
        right: "staff".to_owned(),
    });
    assert!(
        console
            .notice()
            .is_some_and(|n| n.message.contains("different columns"))
    );
    Ok(())
}

#[test]
fn stopped_server_clears_view_with_notice() -> Result<()> {
    let (server, client) = start()?;
    server.with_store(|store| -> Result<()> {
        store.create_database("db")?;
        store.create_table("db", "t")?;
        Ok(())
    })?;

    let mut console = DatabaseConsole::new(client, "db");
    console.dispatch(ConsoleCommand::RefreshTables);
    select(&mut console, "t");
    assert!(console.view().is_some());

    drop(server);
    console.dispatch(ConsoleCommand::Reload);
    assert!(console.view().is_none());
    assert!(
        console
            .notice()
            .is_some_and(|n| n.message.contains("is the server running"))
    );
    Ok(())
}
