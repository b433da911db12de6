//! Interactive session shell.
//!
//! Reads one command per line from stdin and runs it against a single
//! session, so edits (stage changes, status updates, drags) persist until
//! `reset` or exit.

use std::io::Write;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crm_core::quote::QuoteStatus;
use crm_core::request::RequestStatus;
use crm_core::workflow::{self, NewQuote, NewRequest};
use crm_core::Verdict;
use crm_store::BroadcastReceiver;

use super::{board, clients, deals, metrics, stages, Session};
use crate::output;

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Show the kanban board
    Board,
    /// List deals
    Deals(deals::DealsArgs),
    /// List clients
    Clients(clients::ClientsArgs),
    /// Show pipeline metrics
    Metrics,
    /// List stages
    Stages,
    /// Manage stages
    #[command(subcommand)]
    Stage(stages::StageCommands),
    /// Quotes
    #[command(subcommand)]
    Quote(QuoteCommands),
    /// Requests
    #[command(subcommand)]
    Request(RequestCommands),
    /// Drag a deal into another stage
    Move { deal_id: String, stage_id: String },
    /// Discard the session and reseed
    Reset,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Subcommand, Debug)]
enum QuoteCommands {
    /// Create a draft quote
    New {
        client_id: String,
        amount: f64,
        #[arg(long)]
        request: Option<String>,
        #[arg(long)]
        salesperson: Option<String>,
    },
    /// Change a quote's status
    Status { quote_id: String, status: String },
}

#[derive(Subcommand, Debug)]
enum RequestCommands {
    /// Create a request
    New {
        client_id: String,
        title: String,
        #[arg(long, default_value = "")]
        details: String,
    },
    /// Change a request's status
    Status { request_id: String, status: String },
}

pub async fn execute(mut session: Session) -> Result<()> {
    if let Some(rx) = session.store.subscribe() {
        tokio::spawn(log_events(rx));
    }

    println!("{}", "CRM session shell. Type 'help' for commands, 'quit' to leave.".dimmed());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "crm>".cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let args = match split_args(&line) {
            Ok(args) if args.is_empty() => continue,
            Ok(args) => args,
            Err(e) => {
                eprintln!("{} {}", "✗".red().bold(), e);
                continue;
            }
        };

        let parsed = match ShellLine::try_parse_from(&args) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Help and usage errors both render through clap.
                e.print().ok();
                continue;
            }
        };
        if matches!(parsed.command, ShellCommand::Quit) {
            break;
        }
        if let Err(e) = run(parsed.command, &mut session) {
            eprintln!("{} {:#}", "✗".red().bold(), e);
        }
    }
    Ok(())
}

fn run(command: ShellCommand, session: &mut Session) -> Result<()> {
    let now = Utc::now();
    match command {
        ShellCommand::Board => board::execute(session)?,
        ShellCommand::Deals(args) => deals::execute(session, args)?,
        ShellCommand::Clients(args) => clients::execute(session, args)?,
        ShellCommand::Metrics => metrics::execute(session)?,
        ShellCommand::Stages => stages::list(session)?,
        ShellCommand::Stage(cmd) => stages::execute(cmd, session)?,

        ShellCommand::Quote(QuoteCommands::New {
            client_id,
            amount,
            request,
            salesperson,
        }) => {
            let quote = workflow::create_quote(
                &mut session.store,
                NewQuote {
                    client_id,
                    request_id: request,
                    amount,
                    salesperson,
                    notes: None,
                },
                now,
            )?;
            println!(
                "{} Created quote #{} ({})",
                "✓".green().bold(),
                quote.quote_number.cyan(),
                quote.id.dimmed()
            );
        }

        ShellCommand::Quote(QuoteCommands::Status { quote_id, status }) => {
            let status = QuoteStatus::try_from(status.as_str())?;
            workflow::change_quote_status(&mut session.store, &quote_id, status, now)?;
            println!("{} Quote {} is now {}", "✓".green().bold(), quote_id.dimmed(), status.label().cyan());
        }

        ShellCommand::Request(RequestCommands::New {
            client_id,
            title,
            details,
        }) => {
            let request = workflow::create_request(
                &mut session.store,
                NewRequest {
                    client_id,
                    title,
                    service_details: details,
                    notes: None,
                },
                now,
            )?;
            println!("{} Created request {}", "✓".green().bold(), request.id.dimmed());
        }

        ShellCommand::Request(RequestCommands::Status { request_id, status }) => {
            let status = RequestStatus::try_from(status.as_str())?;
            workflow::change_request_status(&mut session.store, &request_id, status, now)?;
            println!(
                "{} Request {} is now {}",
                "✓".green().bold(),
                request_id.dimmed(),
                status.label().cyan()
            );
        }

        ShellCommand::Move { deal_id, stage_id } => {
            match workflow::move_deal(&mut session.store, &session.config, &deal_id, &stage_id, now)? {
                Verdict::Allow => println!("{} Moved {} to {}", "✓".green().bold(), deal_id.dimmed(), stage_id.cyan()),
                Verdict::Deny(reason) => output::print_denied(&reason),
            }
        }

        ShellCommand::Reset => {
            session.reset()?;
            println!("{} Session reset", "✓".green().bold());
        }

        ShellCommand::Quit => {}
    }
    Ok(())
}

async fn log_events(mut rx: BroadcastReceiver) {
    use tokio::sync::broadcast::error::RecvError;
    loop {
        match rx.recv().await {
            Ok(event) => debug!(?event, "Store event"),
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event logger lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Split a line into words. Double quotes group words; there are no escapes.
fn split_args(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_word = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_word {
                    args.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }
    if in_quotes {
        return Err(anyhow!("Unterminated quote"));
    }
    if has_word {
        args.push(current);
    }
    Ok(args)
}
