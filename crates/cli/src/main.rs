//! `zxc` binary entry point (spec §1, §4.7, §5): dials the agent, installs
//! logging, then runs the REPL loop that drives `command::parse` →
//! `command::bind` → `verbs::dispatch` while a concurrent task drains
//! unsolicited notifications from the transport.
//!
//! The interactive noun/verb grammar is not a clap grammar (see
//! SPEC_FULL.md §1); clap only covers this binary's own outer flags.

mod command;
mod console_context;
mod format;
mod verbs;

use std::sync::Arc;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

use dbg_wire::{FramedTransport, NullSymbolService};

use command::{bind, parse};
use console_context::ConsoleContext;
use verbs::{complete_steps, dispatch, VerbOutcome};

/// Connects to a running agent and opens an interactive debugging console.
#[derive(Parser, Debug)]
#[command(name = "zxc", about = "A symbol-aware source-level debugger console")]
struct Args {
    /// Agent address to dial, `host:port`.
    #[arg(long, default_value = "127.0.0.1:2345")]
    connect: String,

    /// Increase log verbosity (`-v` debug, `-vv` trace). Overridden by
    /// `RUST_LOG` when set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Run a single command non-interactively and exit instead of starting
    /// the REPL (batch mode).
    #[arg(long)]
    script: Option<String>,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let stream = TcpStream::connect(&args.connect).await?;
    let transport: Arc<dyn dbg_core::transport::AgentTransport> = Arc::new(FramedTransport::spawn(stream));
    let symbols = Arc::new(NullSymbolService::default());
    let mut ctx = ConsoleContext::new(transport, symbols);

    ctx.connect().await?;
    tracing::info!(address = %args.connect, "connected");

    if let Some(line) = args.script {
        run_line(&line, &mut ctx, None).await;
        ctx.disconnect().await;
        return Ok(());
    }

    repl(&mut ctx).await;
    ctx.disconnect().await;
    Ok(())
}

/// Runs `command::parse` → `command::bind` → `verbs::dispatch` for one line
/// and prints whatever it produces; a bare `steps` prompt is resolved via
/// `awaiting` on the *next* call instead of inline (spec §4.7 "steps").
async fn run_line(
    line: &str,
    ctx: &mut ConsoleContext,
    awaiting: Option<verbs::StepsPromptState>,
) -> Option<verbs::StepsPromptState> {
    if let Some(state) = awaiting {
        match complete_steps(state, line, ctx).await {
            Ok(out) => println!("{}", out.as_plain_string()),
            Err(err) => eprintln!("error: {err}"),
        }
        return None;
    }

    let parsed = match parse(line) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("error: {err}");
            return None;
        }
    };
    let bound = bind(parsed, ctx);
    match dispatch(&bound, ctx).await {
        Ok(VerbOutcome::Done(out)) => {
            if !out.is_empty() {
                println!("{}", out.as_plain_string());
            }
            None
        }
        Ok(VerbOutcome::AwaitingStepsChoice(state)) => Some(state),
        Err(err) => {
            eprintln!("error: {err}");
            None
        }
    }
}

/// The interactive console: a `rustyline` line editor racing a background
/// notification drain in a single `tokio::select!` loop (SPEC_FULL.md §1
/// "dispatch loop"). Line reads are blocking, so they run on a dedicated
/// blocking task and arrive over a channel.
async fn repl(ctx: &mut ConsoleContext) {
    let (line_tx, mut line_rx) = tokio::sync::mpsc::channel::<Option<String>>(1);
    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(err) => {
                eprintln!("error: could not start line editor: {err}");
                let _ = line_tx.blocking_send(None);
                return;
            }
        };
        loop {
            let prompt = "zxc> ";
            match editor.readline(prompt) {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    if line_tx.blocking_send(Some(line)).is_err() {
                        return;
                    }
                }
                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                    let _ = line_tx.blocking_send(None);
                    return;
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    let _ = line_tx.blocking_send(None);
                    return;
                }
            }
        }
    });

    let mut awaiting: Option<verbs::StepsPromptState> = None;
    loop {
        let transport = ctx.transport().clone();
        tokio::select! {
            line = line_rx.recv() => {
                match line {
                    Some(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        awaiting = run_line(trimmed, ctx, awaiting.take()).await;
                    }
                    _ => break,
                }
            }
            notification = transport.next_notification() => {
                match notification {
                    Ok(notification) => match ctx.handle_notification(notification).await {
                        Ok(Some(out)) => println!("{}", out.as_plain_string()),
                        Ok(None) => {}
                        Err(err) => eprintln!("error: {err}"),
                    },
                    Err(err) => {
                        tracing::warn!(%err, "transport closed");
                        break;
                    }
                }
            }
        }
    }
}

