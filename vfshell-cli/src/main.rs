mod input;
mod observer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;
use vfshell_appcore::ShellService;
use vfshell_runtime::config_store::ConfigStore;

use crate::input::{HELP, Input};
use crate::observer::TerminalObserver;

#[derive(Parser, Debug)]
#[command(name = "vfshell", about = "Terminal shell for the VoiceForge daemon")]
struct Args {
    /// Shell config file (JSON). Missing file means defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write the effective config to --config and exit.
    #[arg(long, default_value_t = false)]
    write_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let store = ConfigStore::at_path(args.config.unwrap_or_else(ConfigStore::default_path));
    if args.write_config {
        let cfg = store.load()?;
        store.save(&cfg)?;
        println!("{}", store.path().display());
        return Ok(());
    }

    let locale = store.load()?.locale;
    let observer = Arc::new(TerminalObserver::new(locale.messages()));
    let service = ShellService::connect(&store, observer)
        .with_context(|| format!("start shell with {}", store.path().display()))?;

    service.startup().await;
    println!("{HELP}");
    repl(&service, BufReader::new(tokio::io::stdin())).await?;
    service.shutdown().await;
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Also installs the `log` bridge; the library crates log through `log`.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Reads commands until EOF or `quit`. Daemon actions run as their own
/// tasks so a long analysis or export never blocks the prompt.
async fn repl<R>(service: &ShellService, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut actions = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("read stdin")? else { break };
                let input = match input::parse(&line) {
                    Ok(Some(input)) => input,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                match input {
                    Input::Help => println!("{HELP}"),
                    Input::Status => print_status(service).await,
                    Input::Quit => break,
                    action => {
                        actions.spawn(run_action(service.clone(), action));
                    }
                }
            }
            Some(joined) = actions.join_next(), if !actions.is_empty() => {
                if let Err(e) = joined {
                    log::warn!("shell action ended abnormally: {e}");
                }
            }
        }
    }

    actions.shutdown().await;
    Ok(())
}

async fn print_status(service: &ShellService) {
    let snap = service.snapshot().await;
    println!(
        "{} | {:?} | live: {}",
        snap.status_message,
        snap.recording,
        snap.streaming_text.as_deref().unwrap_or("-")
    );
}

async fn run_action(service: ShellService, action: Input) {
    match action {
        Input::Retry => {
            service.retry().await;
        }
        Input::Toggle => {
            if let Err(e) = service.toggle_recording().await {
                // Already shown by the observer.
                log::debug!("toggle rejected: {e}");
            }
        }
        Input::Tab(tab) => {
            service.activate_tab(tab).await;
        }
        Input::Open(id) => {
            service.open_session(id).await;
        }
        Input::Export(id, format) => {
            service.export_session(id, format).await;
        }
        Input::Period(period) => {
            service.select_period(period).await;
        }
        Input::Analyze(request) => {
            if let Some(text) = service.analyze(request).await.text {
                println!("{text}");
            }
        }
        Input::Help | Input::Status | Input::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use vfshell_core::config::ShellConfig;
    use vfshell_core::protocol::{Command, Reply};
    use vfshell_engine::traits::{DaemonBridge, NullObserver};

    /// Answers everything at once except analysis, which never finishes.
    #[derive(Default)]
    struct SlowAnalysis {
        calls: Mutex<Vec<&'static str>>,
    }

    impl SlowAnalysis {
        fn saw(&self, method: &str) -> bool {
            self.calls.lock().unwrap().contains(&method)
        }
    }

    #[async_trait]
    impl DaemonBridge for SlowAnalysis {
        async fn call(&self, command: &Command) -> anyhow::Result<Reply> {
            self.calls.lock().unwrap().push(command.method());
            match command {
                Command::Ping => Ok(Reply::Text("pong".into())),
                Command::IsListening => Ok(Reply::Flag(false)),
                Command::Analyze(_) => std::future::pending::<anyhow::Result<Reply>>().await,
                _ => Ok(Reply::Text(r#"{"ok":true,"data":{}}"#.into())),
            }
        }
    }

    #[tokio::test]
    async fn pending_analysis_does_not_block_other_commands() {
        let bridge = Arc::new(SlowAnalysis::default());
        let service = ShellService::new(
            ShellConfig::default(),
            bridge.clone(),
            None,
            Arc::new(NullObserver),
        );
        service.startup().await;

        let (mut tx, rx) = tokio::io::duplex(256);
        let typing = async {
            tx.write_all(b"analyze 30\ntoggle\n").await.unwrap();
            tokio::time::timeout(Duration::from_secs(5), async {
                while !bridge.saw("ListenStart") {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .expect("toggle should run while the analysis is pending");
            assert!(bridge.saw("Analyze"));
            drop(tx);
        };

        let (result, ()) = tokio::join!(repl(&service, BufReader::new(rx)), typing);
        result.unwrap();
    }
}
