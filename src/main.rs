use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use setlister::app::{App, AppInit};
use setlister::backend::SetlistClient;
use setlister::callback::BrowserSurface;
use setlister::component::Controller;
use setlister::{console, storage};

#[derive(Debug, Parser)]
#[command(version, about = "Turn a concert setlist into a streaming playlist")]
struct Cli {
    /// Backend base URL, overriding the settings file.
    #[arg(long, env = "SETLISTER_BACKEND_URL")]
    backend_url: Option<String>,

    /// Create public playlists by default.
    #[arg(long)]
    public: bool,

    /// More log output (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info,setlister=debug",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = storage::load_settings();
    if let Some(url) = cli.backend_url {
        settings.backend_url = url;
    }

    let ui_state_path = storage::ui_state_path();
    let mut ui_state = storage::load_ui_state_from(&ui_state_path);
    if cli.public {
        ui_state.public = Some(true);
    }

    let client = SetlistClient::new(&settings.backend_url)?;
    let surface = BrowserSurface::new(client.login_url()?, settings.auth_timeout());

    let (app, outputs) = Controller::<App>::launch(AppInit {
        backend: Arc::new(client),
        surface: Arc::new(surface),
        settings,
        ui_state,
        ui_state_path: Some(ui_state_path),
    });

    console::run(app, outputs).await
}
