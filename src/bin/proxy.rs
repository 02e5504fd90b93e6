use anyhow::Context;
use aushadh_ai::config::cli::ModelArgs;
use aushadh_ai::server::{self, ProxyState};
use aushadh_ai::utils::{logger, validation::Validate};
use aushadh_ai::{GeminiClient, PrescriptionAnalyzer};
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "aushadh-proxy")]
#[command(about = "Holds the model API key and analyzes prescription photos for web clients")]
struct Args {
    #[command(flatten)]
    model: ModelArgs,

    #[arg(long)]
    host: Option<String>,

    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Largest accepted request body, in megabytes
    #[arg(long)]
    body_limit_mb: Option<usize>,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let base = args.model.base_config().context("Failed to load configuration file")?;
    let mut server_settings = base.server_settings();
    if let Some(host) = args.host {
        server_settings.host = host;
    }
    if let Some(port) = args.port {
        server_settings.port = port;
    }
    if let Some(mb) = args.body_limit_mb {
        server_settings.set_body_limit_mb(mb);
    }
    server_settings.json_logs |= args.json_logs;
    server_settings.validate()?;

    logger::init_server_logger(server_settings.json_logs);
    tracing::info!("🚀 Starting aushadh-proxy");

    let model_settings = args.model.resolve()?;
    tracing::debug!("Model settings: {:?}", model_settings);

    let client = GeminiClient::from_config(&model_settings)
        .context("The proxy needs GEMINI_API_KEY (or --api-key) to reach the model")?;
    let analyzer = PrescriptionAnalyzer::new(client, &model_settings);
    let app = server::router(ProxyState::new(analyzer), server_settings.body_limit_bytes);

    let address = server_settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    server::serve(listener, app).await?;
    Ok(())
}
