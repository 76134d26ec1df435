// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::sync::mpsc::Sender;
use std::thread;
use tabula_app::{LoadTicket, TableService};
use tabula_client::Client;
use tabula_tui::InternalEvent;
use tracing::debug;

/// Drives the console against a live REST backend. Row loads run on their
/// own thread; the console's ticket check drops any that come back late.
pub struct ClientRuntime {
    client: Client,
}

impl ClientRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl tabula_tui::ConsoleRuntime for ClientRuntime {
    type Service = Client;

    fn service(&self) -> Client {
        self.client.clone()
    }

    fn spawn_load(
        &mut self,
        database: &str,
        ticket: LoadTicket,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let database = database.to_owned();
        debug!(%database, table = %ticket.table, seq = ticket.seq, "spawning row load");
        thread::Builder::new()
            .name("tabula-row-load".to_owned())
            .spawn(move || {
                let result = client.load_rows(&database, &ticket.table);
                let _ = tx.send(InternalEvent::RowsLoaded {
                    database,
                    ticket,
                    result,
                });
            })
            .context("spawn row load thread")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ClientRuntime;
    use anyhow::Result;
    use std::sync::mpsc;
    use std::time::Duration;
    use tabula_app::LoadTicket;
    use tabula_client::Client;
    use tabula_testkit::{DEMO_DATABASE, FakeServer, demo_store};
    use tabula_tui::{ConsoleRuntime, InternalEvent};

    #[test]
    fn spawned_load_reports_rows_for_ticket() -> Result<()> {
        let server = FakeServer::start_with(demo_store(3)?)?;
        let client = Client::new(server.base_url(), Duration::from_secs(2))?;
        let mut runtime = ClientRuntime::new(client);
        let (tx, rx) = mpsc::channel();
        let ticket = LoadTicket {
            seq: 7,
            table: "staff".to_owned(),
        };

        runtime.spawn_load(DEMO_DATABASE, ticket.clone(), tx)?;
        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::RowsLoaded {
                database,
                ticket: returned,
                result,
            } => {
                assert_eq!(database, DEMO_DATABASE);
                assert_eq!(returned, ticket);
                assert_eq!(result?.rows.len(), 6);
            }
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }
}
