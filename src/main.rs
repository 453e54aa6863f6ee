use std::sync::Arc;

use chrono::Utc;
use colored::Colorize;
use gigwave_collab::{Collab, DatabaseError, PgDatabase};
use log::{error, info, warn};
use settings::Settings;
use thiserror::Error;
use tokio::runtime::{self, Runtime};

mod logging;
mod settings;

pub struct Gigwave {
    collab: Arc<Collab>,
    port: u16,
    runtime: Runtime,
}

#[derive(Debug, Error)]
pub enum GigwaveError {
    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Server stopped: {0}")]
    Server(std::io::Error),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Gigwave {
    fn new(settings: Settings) -> Result<Self, GigwaveError> {
        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("gigwave-async")
            .build()
            .map_err(|e| GigwaveError::Fatal(e.to_string()))?;

        info!("Connecting to database...");
        let database = runtime.block_on(PgDatabase::new(&settings.database_url))?;

        let collab = Collab::new(Arc::new(database), settings.config);

        Ok(Self {
            collab: Arc::new(collab),
            port: settings.port,
            runtime,
        })
    }

    fn run(&self) -> Result<(), GigwaveError> {
        self.runtime.block_on(async move {
            tokio::spawn(run_sweep(self.collab.clone()));

            gigwave_server::run_server(self.collab.clone(), self.port)
                .await
                .map_err(GigwaveError::Server)
        })
    }
}

/// Moves gigs through their lifecycle on a fixed interval
async fn run_sweep(collab: Arc<Collab>) {
    let mut interval = tokio::time::interval(collab.config().sweep_interval());

    loop {
        interval.tick().await;

        if let Err(e) = collab.lifecycle.sweep(Utc::now()).await {
            warn!("Lifecycle sweep failed: {}", e);
        }
    }
}

impl GigwaveError {
    fn hint(&self) -> String {
        match self {
            GigwaveError::Settings(_) => "Check the GIGWAVE_ environment variables, then try again.".to_string(),
            GigwaveError::Database(_) => "This is a database error. Make sure Postgres is running and GIGWAVE_DATABASE_URL points to it, then try again.".to_string(),
            GigwaveError::Server(_) => "The server could not listen. Make sure GIGWAVE_SERVER_PORT is free.".to_string(),
            GigwaveError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

enum LogColor {
    Red,
    Dimmed,
}

impl From<LogColor> for colored::Color {
    fn from(value: LogColor) -> Self {
        match value {
            LogColor::Red => colored::Color::Red,
            LogColor::Dimmed => colored::Color::BrightBlack,
        }
    }
}

fn report(error: GigwaveError) {
    error!(
        "{} Read the error below to troubleshoot the issue.",
        "Gigwave failed!".bold().color(LogColor::Red)
    );
    error!("{}", error);
    error!(
        "{}",
        format!("Hint: {}", error.hint())
            .color(LogColor::Dimmed)
            .italic()
    );
}

fn main() {
    if let Err(e) = logging::init_logger() {
        eprintln!("Could not initialize logging: {}", e);
    }

    let result = Settings::from_env().and_then(Gigwave::new).and_then(|gigwave| {
        info!("Initialized successfully.");
        gigwave.run()
    });

    if let Err(error) = result {
        report(error);
    }
}
