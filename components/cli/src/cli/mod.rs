use std::path::PathBuf;
use std::process;

use brc20_core::service::Service;
use brc20_core::{ledger, try_error, try_info, Context};
use clap::Parser;
use commands::{ConfigCommand, DatabaseCommand, NewConfigCommand, Protocol, ServiceCommand};
use config::{generate_toml_config, Config};

mod commands;

pub fn main() {
    let logger = hiro_system_kit::log::setup_logger();
    let _guard = hiro_system_kit::log::setup_global_logger(logger.clone());
    let ctx = Context {
        logger: Some(logger),
    };

    let opts: Protocol = match Protocol::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            println!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = hiro_system_kit::nestable_block_on(handle_command(opts, &ctx)) {
        try_error!(ctx, "{e}");
        std::thread::sleep(std::time::Duration::from_millis(500));
        process::exit(1);
    }
}

async fn handle_command(opts: Protocol, ctx: &Context) -> Result<(), String> {
    match opts {
        Protocol::Service(subcmd) => match subcmd {
            ServiceCommand::Start(cmd) => {
                let config = Config::from_file_path(&cmd.config_path)?;
                let mut pg_client = brc20_postgres::pg_connect_with_retry(&config.brc20_db).await;
                ledger::migrate(&mut pg_client).await?;

                let service = Service::new(&config, ctx)?;
                try_info!(ctx, "brc-20 indexer service started, awaiting blocks");

                let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
                ctrlc::set_handler(move || {
                    let _ = shutdown_tx.send(());
                })
                .map_err(|e| format!("unable to set ctrl-c handler: {e}"))?;
                service.run(&shutdown_rx);
                try_info!(ctx, "brc-20 indexer service shutting down");
            }
        },
        Protocol::Database(subcmd) => match subcmd {
            DatabaseCommand::Migrate(cmd) => {
                let config = Config::from_file_path(&cmd.config_path)?;
                let mut pg_client = brc20_postgres::pg_connect_with_retry(&config.brc20_db).await;
                ledger::migrate(&mut pg_client).await?;
                try_info!(ctx, "migrations applied");
            }
            DatabaseCommand::Reset(cmd) => {
                let config = Config::from_file_path(&cmd.config_path)?;
                let mut pg_client = brc20_postgres::pg_connect_with_retry(&config.brc20_db).await;
                brc20_postgres::pg_reset(&mut pg_client).await?;
                ledger::migrate(&mut pg_client).await?;
                try_info!(ctx, "database reset and re-migrated");
            }
        },
        Protocol::Config(subcmd) => match subcmd {
            ConfigCommand::New(cmd) => write_new_config(&cmd)?,
        },
    }
    Ok(())
}

fn write_new_config(cmd: &NewConfigCommand) -> Result<(), String> {
    use std::fs::File;
    use std::io::Write;
    let network = match (cmd.mainnet, cmd.testnet, cmd.regtest) {
        (true, false, false) => "mainnet",
        (false, true, false) => "testnet",
        (false, false, true) => "regtest",
        _ => return Err("Invalid network".into()),
    };
    let config_content = generate_toml_config(network);
    let mut file_path = PathBuf::new();
    file_path.push("Indexer.toml");
    let mut file = File::create(&file_path)
        .map_err(|e| format!("unable to open file {}\n{}", file_path.display(), e))?;
    file.write_all(config_content.as_bytes())
        .map_err(|e| format!("unable to write file {}\n{}", file_path.display(), e))?;
    println!("Created file Indexer.toml");
    Ok(())
}
