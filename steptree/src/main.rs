// Forbid unwrap() in production code; tests may use it for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::time::Duration;

use steptree::config::DriverConfig;
use steptree::ops::{Operation, Step};
use steptree::session::{Progress, Session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// One line of driver input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Run(Operation, &'a str),
    Show,
    Reset,
}

fn parse_command(line: &str) -> Result<Command<'_>, String> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Err("empty command".to_string());
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "search" => Command::Run(Operation::Search, ""),
        "insert" => Command::Run(Operation::Insert, ""),
        "remove" | "delete" => Command::Run(Operation::Remove, ""),
        "show" => Command::Show,
        "reset" => Command::Reset,
        other => return Err(format!("unknown command '{other}'")),
    };

    let command = match command {
        Command::Run(operation, _) => {
            let input = parts
                .next()
                .ok_or_else(|| format!("{operation} needs a value"))?;
            Command::Run(operation, input)
        }
        other => other,
    };
    if parts.next().is_some() {
        return Err(format!("too many arguments to {word}"));
    }
    Ok(command)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steptree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match DriverConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: order={}, variant={}, domain={}, step_delay={:?}",
        config.order,
        config.variant,
        config.domain,
        config.step_delay
    );

    let mut session = match Session::create(config.order, config.variant, config.domain) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to create tree: {e}");
            std::process::exit(1);
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read input: {e}");
                std::process::exit(1);
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok(Command::Run(operation, input)) => {
                run_operation(&mut session, operation, input, config.step_delay).await;
            }
            Ok(Command::Show) => println!("{}", session.tree()),
            Ok(Command::Reset) => {
                match session.reset(config.order, config.variant, config.domain) {
                    Ok(()) => tracing::info!("tree reset"),
                    Err(e) => tracing::warn!("reset refused: {e}"),
                }
            }
            Err(e) => tracing::warn!("ignoring '{line}': {e}"),
        }
    }
}

async fn run_operation(session: &mut Session, operation: Operation, input: &str, delay: Duration) {
    if let Err(e) = session.begin_input(operation, input) {
        tracing::warn!("{operation} {input} rejected: {e}");
        return;
    }

    while let Some(progress) = session.step() {
        match progress {
            Progress::Step(step) => {
                log_step(&step);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Progress::Finished(outcome) => {
                tracing::info!(
                    steps = outcome.steps,
                    "{} {} -> {}",
                    outcome.operation,
                    outcome.value,
                    outcome.result
                );
            }
        }
    }
}

fn log_step(step: &Step) {
    let observed = step.snapshot.observed().map_or_else(
        || "-".to_string(),
        |node| {
            let keys: Vec<String> = node.keys().iter().map(ToString::to_string).collect();
            format!("[{}]", keys.join(" "))
        },
    );
    tracing::info!(
        reads = step.snapshot.reads(),
        writes = step.snapshot.writes(),
        "{:?} {observed}",
        step.event
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operations() {
        assert_eq!(
            parse_command("insert 42"),
            Ok(Command::Run(Operation::Insert, "42"))
        );
        assert_eq!(
            parse_command("  SEARCH   pear "),
            Ok(Command::Run(Operation::Search, "pear"))
        );
        assert_eq!(
            parse_command("delete -3"),
            Ok(Command::Run(Operation::Remove, "-3"))
        );
    }

    #[test]
    fn test_parse_bare_commands() {
        assert_eq!(parse_command("show"), Ok(Command::Show));
        assert_eq!(parse_command("reset"), Ok(Command::Reset));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_command("insert"),
            Err("insert needs a value".to_string())
        );
        assert!(parse_command("insert 1 2").is_err());
        assert!(parse_command("show tree").is_err());
        assert_eq!(
            parse_command("grow 3"),
            Err("unknown command 'grow'".to_string())
        );
        assert!(parse_command("").is_err());
    }
}
