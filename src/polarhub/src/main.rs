#[macro_use]
extern crate log;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use polarhub::PolarHub;
use polarhub_db::DatabaseHandler;

#[derive(Parser)]
pub struct PolarHubCli {
    #[arg(env, long)]
    pub database_url: String,
    #[clap(subcommand)]
    pub subcommand: PolarHubCommand,
}

#[derive(Subcommand)]
pub enum PolarHubCommand {
    ///
    /// Run the HTTP ingest surface and the post-processing loop
    ///
    Serve {
        #[arg(long, env, default_value_t = 3000)]
        port: u16,
        #[arg(long, env, default_value_t = 300_000)]
        hrv_summary_interval_ms: i64,
    },
    ///
    /// Re-run artifact classification for one device from a timestamp
    /// This is used after classifier changes or suspect uploads
    ///
    Reprocess {
        #[arg(long, env)]
        device: String,
        /// Epoch milliseconds to rewind to
        #[arg(long)]
        from: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(error) = dotenv() {
        println!("{}", error);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("sqlx::query", log::LevelFilter::Off)
        .filter_module("sea_orm_migration::migrator", log::LevelFilter::Off)
        .init();

    let cli = PolarHubCli::parse();
    let db_handler = DatabaseHandler::new(cli.database_url).await?;

    match cli.subcommand {
        PolarHubCommand::Serve {
            port,
            hrv_summary_interval_ms,
        } => {
            let hub = Arc::new(PolarHub::with_summary_interval(
                db_handler,
                hrv_summary_interval_ms,
            ));
            hub.serve(port).await
        }
        PolarHubCommand::Reprocess { device, from } => {
            let hub = PolarHub::new(db_handler);
            hub.reprocess(&device, from).await?;
            info!("reprocessed {device} from {from}");
            Ok(())
        }
    }
}
