use std::path::PathBuf;

use cansync::{Result, cmd};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the cansync application
#[derive(Parser)]
#[command(name = "cansync")]
#[command(about = "Canvas-to-derived-store synchronization")]
#[command(version)]
struct Cli {
   #[command(subcommand)]
   command: Cmd,
}

/// Available subcommands for cansync
#[derive(Subcommand)]
enum Cmd {
   #[command(about = "Watch a directory and sync canvas mutations")]
   Watch {
      #[arg(help = "Directory containing canvas files")]
      path: PathBuf,
   },

   #[command(about = "Replay the pending-entry log once")]
   Recover {
      #[arg(help = "Directory containing canvas files")]
      path: PathBuf,
   },

   #[command(name = "sync-edges", about = "Bulk-sync all edges of one canvas")]
   SyncEdges {
      #[arg(help = "Path to the canvas file")]
      canvas: PathBuf,

      #[arg(long, help = "JSON output")]
      json: bool,
   },
}

#[tokio::main]
async fn main() {
   tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
      .with_writer(std::io::stderr)
      .init();

   if let Err(e) = run().await {
      eprintln!("error: {e}");
      std::process::exit(1);
   }
}

async fn run() -> Result<()> {
   let cli = Cli::parse();

   match cli.command {
      Cmd::Watch { path } => cmd::watch::run(&path).await,
      Cmd::Recover { path } => cmd::recover::run(&path).await,
      Cmd::SyncEdges { canvas, json } => cmd::sync_edges::run(&canvas, json).await,
   }
}
