// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use runtime::ClientRuntime;
use std::env;
use std::path::PathBuf;
use tabula_app::DatabaseService;
use tabula_client::Client;
use tabula_testkit::{DEMO_DATABASE, FakeServer, demo_store};

const DEMO_SEED: u64 = 20_260_101;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `tabula --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let log_dir = config.log_dir()?;
    let _log = logging::init(&log_dir, &config.log_level())?;

    // Held for the whole session; the demo backend stops when this drops.
    let demo_server = if options.demo {
        let store = demo_store(DEMO_SEED).context("seed demo data")?;
        Some(FakeServer::start_with(store)?)
    } else {
        None
    };

    let base_url = match (&demo_server, &options.server) {
        (Some(server), _) => server.base_url().to_owned(),
        (None, Some(server)) => server.clone(),
        (None, None) => config.base_url(),
    };
    let client = Client::new(&base_url, config.timeout()?).with_context(|| {
        format!(
            "invalid server settings in {}; fix [server].base_url or pass --server",
            options.config_path.display()
        )
    })?;
    tracing::info!(base_url = client.base_url(), demo = options.demo, "starting");

    if options.check_only {
        return client.ping().with_context(|| {
            format!(
                "server check failed for {}; start the server or pass --server <url>",
                client.base_url()
            )
        });
    }

    if options.list_databases {
        for name in client.list_databases()? {
            println!("{name}");
        }
        return Ok(());
    }

    let database = options
        .database
        .clone()
        .or_else(|| config.database().map(str::to_owned))
        .or_else(|| options.demo.then(|| DEMO_DATABASE.to_owned()));

    let mut runtime = ClientRuntime::new(client);
    tabula_tui::run_app(&mut runtime, database.as_deref())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    server: Option<String>,
    database: Option<String>,
    print_config_path: bool,
    print_example: bool,
    list_databases: bool,
    demo: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        server: None,
        database: None,
        print_config_path: false,
        print_example: false,
        list_databases: false,
        demo: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--server" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--server requires a base URL"))?;
                options.server = Some(value.as_ref().to_owned());
            }
            "--database" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--database requires a database name"))?;
                let name = value.as_ref().trim();
                if name.is_empty() {
                    return Err(anyhow::anyhow!(
                        "--database must not be blank; omit it to start on the database picker"
                    ));
                }
                options.database = Some(name.to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--list-databases" => {
                options.list_databases = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.demo && options.server.is_some() {
        return Err(anyhow::anyhow!(
            "--demo runs its own backend; drop --server or --demo"
        ));
    }

    Ok(options)
}

fn print_help() {
    println!("tabula - terminal console for tabular databases");
    println!("  --config <path>          Use a specific config path");
    println!("  --server <url>           Server base URL (overrides config and TABULA_SERVER_URL)");
    println!("  --database <name>        Open this database instead of the picker");
    println!("  --demo                   Run against an in-process backend with seeded data");
    println!("  --list-databases         Print the server's databases and exit");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and reach the server, then exit");
    println!("  --help                   Show this help");
}
