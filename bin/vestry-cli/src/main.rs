// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use vestry::{
    AttemptBudget, MemoryStore, MissingColumnStyle, Payload, RecordKey, RecordKind,
    RecordWriter, VestryConfig, WriteOutcome, WriteTarget, DEFAULT_ATTEMPT_BUDGET,
};

#[derive(Parser, Debug)]
#[command(name = "vestry", about = "Schema-tolerant record writer")]
struct Cli {
    /// Log at debug level instead of info.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug, Clone)]
struct RecordArgs {
    /// ledger, profile or category
    #[arg(long)]
    kind: RecordKind,

    /// JSON object file with the record's fields
    #[arg(long, value_name = "FILE")]
    payload: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a record to the configured REST store.
    Save {
        #[command(flatten)]
        record: RecordArgs,

        /// Update the row with this id instead of inserting.
        #[arg(long)]
        key: Option<String>,

        /// TOML config file; `VESTRY_*` variables are used when omitted.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Write a record to an in-memory table with the given columns.
    Simulate {
        #[command(flatten)]
        record: RecordArgs,

        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,

        /// Report missing columns the way the REST layer's schema cache does.
        #[arg(long)]
        schema_cache_messages: bool,

        #[arg(
            long,
            default_value_t = DEFAULT_ATTEMPT_BUDGET,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        budget: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.cmd).await {
        Ok(outcome) => report(&outcome),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cmd: Command) -> Result<WriteOutcome> {
    match cmd {
        Command::Save {
            record,
            key,
            config,
        } => {
            let config = match config {
                Some(path) => VestryConfig::load(&path)
                    .with_context(|| format!("loading config from {}", path.display()))?,
                None => VestryConfig::from_env().context("loading config from environment")?,
            };
            let payload = read_payload(record.kind, &record.payload)?;
            let writer = RecordWriter::from_config(&config)?;
            let target = WriteTarget {
                kind: record.kind,
                key: key.map(RecordKey::new),
            };
            info!(kind = %record.kind, update = target.is_update(), "Saving record");
            Ok(writer.save(&target, payload).await)
        }
        Command::Simulate {
            record,
            columns,
            schema_cache_messages,
            budget,
        } => {
            let payload = read_payload(record.kind, &record.payload)?;
            let style = if schema_cache_messages {
                MissingColumnStyle::SchemaCache
            } else {
                MissingColumnStyle::Postgres
            };
            let columns: Vec<&str> = columns.iter().map(|c| c.trim()).collect();
            let store = Arc::new(
                MemoryStore::new()
                    .with_style(style)
                    .with_table(record.kind.default_table(), columns.as_slice()),
            );
            let writer =
                RecordWriter::new(store.clone()).with_budget(AttemptBudget::new(budget));
            let outcome = writer
                .save(&WriteTarget::create(record.kind), payload)
                .await;

            for (number, attempt) in store.attempts().await.iter().enumerate() {
                debug!(attempt = number + 1, fields = ?attempt.fields, "Simulated attempt");
            }
            Ok(outcome)
        }
    }
}

fn read_payload(kind: RecordKind, path: &Path) -> Result<Payload> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading payload {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).context("payload is not valid JSON")?;
    Ok(Payload::from_json(kind, &value)?)
}

fn report(outcome: &WriteOutcome) -> ExitCode {
    match serde_json::to_string_pretty(outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: failed to render outcome: {e}"),
    }
    if outcome.is_persisted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
