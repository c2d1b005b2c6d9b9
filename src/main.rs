use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskbridge::backend::BackendClient;
use taskbridge::config::Config;
use taskbridge::gemini::GeminiClient;
use taskbridge::tools::ToolSet;
use taskbridge::transport::{self, AppState, ServerMode};

#[derive(Parser)]
#[command(name = "taskbridge")]
#[command(about = "Tool server bridging project/task queries and Gemini planning over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP tool server
    Serve {
        /// Port for the HTTP endpoint (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Track per-client sessions instead of serving statelessly
        #[arg(long)]
        sessions: bool,

        /// Which tool groups to expose
        #[arg(long, value_enum, default_value = "all")]
        tools: ToolSet,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "taskbridge=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let (port, sessions, tools) = match cli.command {
        Some(Commands::Serve {
            port,
            sessions,
            tools,
        }) => (port, sessions, tools),
        None => (None, false, ToolSet::All),
    };

    let config = Config::from_env(tools)?;
    let port = port.unwrap_or(config.port);

    let backend = config.backend_base.clone().map(BackendClient::new);
    let gemini = config
        .gemini_api_key
        .clone()
        .map(|key| GeminiClient::new(key, config.gemini_api_base.clone()));

    let mode = if sessions {
        ServerMode::Sessions
    } else {
        ServerMode::Stateless
    };
    tracing::info!(?mode, "starting taskbridge server on port {}", port);

    let state = Arc::new(AppState::new(mode, tools, backend, gemini));
    transport::serve(state, port).await
}
