//! Test-send CLI: exercise the configured transport end to end.
//!
//! Resolves the transport and sender from the environment, sends one
//! message through the full engine (pooling, rate limit, retries), and
//! prints the delivery result as JSON. Exits non-zero when the result
//! is not a success.

use anyhow::Context;
use clap::Parser;
use courier_common::{
    config::{self, ExecutionMode, SenderIdentity},
    logging,
};
use courier_delivery::{DeliveryEngine, OutboundMessage};

#[derive(Debug, Parser)]
#[command(name = "courier", about = "Send a test message through the delivery engine")]
struct Args {
    /// Recipient address
    #[arg(long)]
    to: String,

    /// Subject line
    #[arg(long, default_value = "Courier test message")]
    subject: String,

    /// HTML body
    #[arg(long, default_value = "<p>This is a test message from the courier delivery engine.</p>")]
    body: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args = Args::parse();

    let engine = DeliveryEngine::from_resolved(
        config::resolve_transport_config(),
        SenderIdentity::from_env(),
        ExecutionMode::from_env(),
    );

    let result = engine
        .send(&OutboundMessage::to_one(args.to, args.subject, args.body))
        .await;

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("serializing delivery result")?
    );

    if result.success {
        Ok(())
    } else {
        anyhow::bail!("delivery failed")
    }
}
