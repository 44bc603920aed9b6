use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use raffbot_core::platforms::telegram::DEFAULT_API_BASE;

mod commands;
mod server;

#[derive(Parser, Debug, Clone)]
#[command(name = "raffbot")]
#[command(author, version, about = "raffbot - channel-gated giveaway bot with a web mini-app")]
struct Args {
    /// Path of the JSON raffle store
    #[arg(long, global = true, env = "RAFFBOT_STORE", default_value = "raffles.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Run the HTTP API and the raffle closer
    Serve(ServeArgs),

    /// Create a new raffle
    Create(CreateArgs),

    /// List all raffles
    List,

    /// Show one raffle's participants and winners
    Show {
        id: String,
    },

    /// Draw winners for an ended raffle
    Draw {
        id: String,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Address to which the server will bind
    #[arg(long, env = "RAFFBOT_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: String,

    /// Telegram bot token used for membership checks and announcements
    #[arg(long, env = "RAFFBOT_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Bot API base URL
    #[arg(long, env = "RAFFBOT_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Upper bound on a single membership check, in seconds
    #[arg(long, default_value_t = 5)]
    pub verify_timeout_secs: u64,

    /// How often ended raffles are drawn and announced, in seconds (0 disables)
    #[arg(long, default_value_t = 30)]
    pub close_interval_secs: u64,

    /// Only this origin may call the API from a browser (default: any)
    #[arg(long, env = "RAFFBOT_CORS_ORIGIN")]
    pub cors_origin: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CreateArgs {
    /// How long the raffle accepts joins, in minutes
    #[arg(long)]
    pub duration_mins: i64,

    /// Explicit raffle id (default: next free number)
    #[arg(long)]
    pub id: Option<String>,

    /// Channel the participant must be subscribed to; repeatable
    #[arg(long = "channel")]
    pub channels: Vec<String>,

    /// Number of winners to draw
    #[arg(long, default_value_t = 1)]
    pub winners: u32,

    /// Chat to post the results into once the raffle ends
    #[arg(long)]
    pub announce_chat: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("raffbot=info".parse().unwrap_or_default())
        .add_directive("raffbot_core=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!("raffbot starting. store={}", args.store.display());

    let result = match args.command {
        Command::Serve(serve) => server::run_server(args.store, serve).await,
        Command::Create(create) => commands::create(&args.store, create).await,
        Command::List => commands::list(&args.store).await,
        Command::Show { id } => commands::show(&args.store, &id).await,
        Command::Draw { id } => commands::draw(&args.store, &id).await,
    };

    if let Err(e) = result {
        error!("raffbot error: {}", e);
        return Err(e.into());
    }
    Ok(())
}
