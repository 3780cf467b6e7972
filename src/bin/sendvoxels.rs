use clap::Parser;
use clap_derive::Parser;
use sendvoxels::sender::send_voxels;
use sendvoxels::sender::sender_config::SenderConfig;
use sendvoxels::voxel::command::Command;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

/// Sends a file of voxel records to a voxel server
#[derive(Parser)]
struct Args {
    /// file with length-prefixed voxel records
    #[clap(short, long)]
    input: PathBuf,

    #[clap(short, long, default_value = "127.0.0.1")]
    server: String,

    #[clap(short, long, default_value_t = SenderConfig::DEFAULT_PORT)]
    port: u16,

    /// 'I' to insert voxels, 'R' to replace them - anything else is treated as 'I'
    #[clap(short, long, default_value = "I")]
    command: String,

    #[clap(short, long, default_value_t = false)]
    verbose: bool,

    #[clap(long, default_value_t = false)]
    very_verbose: bool,
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match (args.verbose, args.very_verbose) {
        (_, true) => Level::TRACE,
        (true, _) => Level::DEBUG,
        (false, false) => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .ok();

    let mut config = SenderConfig::new(args.server);
    config.port = args.port;
    config.command = Command::from_code(&args.command);

    let summary = send_voxels(&args.input, Arc::new(config)).await?;
    info!(
        "sent {} records in {} datagrams ({} bytes, {} send failures, {} truncated records)",
        summary.num_records,
        summary.num_datagrams,
        summary.num_bytes,
        summary.num_send_failures,
        summary.num_truncated_records,
    );
    Ok(())
}
