//! Ephemera terminal chat
//!
//! Chat with simulated friends. Messages go through sent, delivered and read,
//! and friends sometimes type back.

use std::time::Duration;

use clap::Parser;
use ephemera_app::{ChatRuntime, CliError, Flow, Session, TokioEnv, demo};
use ephemera_core::{ChatSimulator, Environment, SimulatorConfig, UserId};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Ephemera terminal chat
#[derive(Parser, Debug)]
#[command(name = "ephemera")]
#[command(about = "Chat with simulated friends from the terminal")]
struct Args {
    /// Seed for reproducible peer behavior
    #[arg(long)]
    seed: Option<u64>,

    /// Delay before a sent message is delivered (milliseconds)
    #[arg(long, default_value_t = 1500)]
    delivery_ms: u64,

    /// Delay before a delivered message is read (milliseconds)
    #[arg(long, default_value_t = 1000)]
    read_ms: u64,

    /// Probability that a friend replies to a read message
    #[arg(long)]
    reply_probability: Option<f64>,

    /// Disable friends starting conversations on their own
    #[arg(long)]
    no_unsolicited: bool,

    /// Local user id
    #[arg(long, default_value_t = 1)]
    user: u64,
}

impl Args {
    fn config(&self) -> SimulatorConfig {
        let mut config = SimulatorConfig::default().with_status_delays(
            Duration::from_millis(self.delivery_ms),
            Duration::from_millis(self.read_ms),
        );
        if let Some(probability) = self.reply_probability {
            config = config.with_reply_probability(probability);
        }
        if self.no_unsolicited {
            config = config.with_unsolicited_delay(None);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    let local_user = UserId(args.user);
    let env = TokioEnv::from_system_clock(args.seed);
    let started = env.now();
    let sim = ChatSimulator::with_config(env, local_user, args.config());
    let (handle, runtime) = ChatRuntime::spawn(sim);

    let roster = demo::roster(local_user);
    demo::seed(&handle, &roster, started).await?;

    let mut events = handle.events();
    let mut session = Session::new(handle.clone(), roster, tokio::io::stdout());
    session.welcome().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if session.handle_line(&line).await? == Flow::Quit {
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(event) => session.handle_event(event).await?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown().await?;
    if let Err(e) = runtime.await {
        warn!(error = %e, "runtime task failed");
    }
    info!("bye");
    Ok(())
}
