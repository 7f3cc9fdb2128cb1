use anyhow::Result;
use clap::Parser;
use product_catalog::app::App;
use product_catalog::models::Config;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "product-catalog")]
#[command(about = "Serve the product catalog REST API")]
struct CliArgs {
    /// Address to bind, overriding HOST.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding PORT.
    #[arg(long)]
    port: Option<u16>,

    /// Use in-memory products and mock image storage.
    #[arg(long)]
    dry_run: bool,
}

impl CliArgs {
    fn apply(self, mut config: Config) -> Config {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config.dry_run |= self.dry_run;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "product_catalog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting product-catalog");

    let args = CliArgs::parse();
    let config = args.apply(Config::from_env()?);

    match App::new(config).await {
        Ok(app) => match app.run().await {
            Ok(_) => {
                info!("Server stopped");
                Ok(())
            }
            Err(e) => {
                error!("Server failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}
