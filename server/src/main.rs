use anyhow::Result;
use axum::Router;
use clap::Parser;
use phrasify_core::settings::ConfigOverrides;
use phrasify_core::SessionConfig;
use server::{build_app, initialized_session};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Settings file (JSON key/value map)
    #[arg(long, env = "PHRASIFY_SETTINGS")]
    settings: Option<PathBuf>,
    /// Phrase catalog; overrides the settings file
    #[arg(long, env = "PHRASIFY_CATALOG")]
    catalog: Option<PathBuf>,
    /// Catalog text encoding label
    #[arg(long)]
    encoding: Option<String>,
    /// Catalog field delimiter
    #[arg(long)]
    delimiter: Option<char>,
    /// Catalog quote character
    #[arg(long)]
    quote: Option<char>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig> {
        let overrides = ConfigOverrides {
            catalog_path: self.catalog.clone(),
            encoding: self.encoding.clone(),
            delimiter: self.delimiter,
            quote: self.quote,
        };
        Ok(SessionConfig::load_with_overrides(self.settings.as_deref(), overrides)?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let session = initialized_session(args.session_config()?)?;
    let app: Router = build_app(session);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
