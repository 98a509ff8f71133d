use connect_hub::app::App;
use connect_hub::Config;
use connect_hub_core::store::project_dirs;
use connect_hub_core::{BackendClient, SystemBrowser};
use ratatui::crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn get_config_path() -> PathBuf {
    match project_dirs() {
        Ok(dirs) => dirs.config_dir().join("config.toml"),
        Err(_) => PathBuf::from("config/default.toml"),
    }
}

/// Logs go to a file so they never tear the alternate screen.
fn init_logging() -> color_eyre::Result<()> {
    let log_dir = match project_dirs() {
        Ok(dirs) => dirs.data_dir().to_path_buf(),
        Err(_) => PathBuf::from("."),
    };
    std::fs::create_dir_all(&log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("connect-hub.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    init_logging()?;

    terminal::enable_raw_mode()?;
    let mut terminal = ratatui::init();
    ratatui::crossterm::execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;

    let result = run(&mut terminal);

    let _ = ratatui::crossterm::execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    ratatui::restore();

    if let Err(ref e) = result {
        tracing::error!("connect-hub exited with error: {e}");
    }
    result
}

fn run(
    terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>,
) -> color_eyre::Result<()> {
    let config_path = get_config_path();
    let mut config = Config::load_or_default(&config_path);
    config.apply_env();
    tracing::info!(
        "Starting connect-hub against {} (config {})",
        config.backend.base_url,
        config_path.display()
    );

    let rt = tokio::runtime::Runtime::new()?;
    // Background requests are spawned from the UI thread.
    let _guard = rt.enter();

    let backend = Arc::new(BackendClient::with_timeout(
        config.backend.base_url.clone(),
        config.backend_timeout(),
    ));
    let mut app = App::new(config, backend, Arc::new(SystemBrowser)).with_config_path(config_path);
    if let Err(e) = app.init() {
        tracing::error!("Failed to initialize app: {e}");
    }

    loop {
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(Duration::from_millis(50))? {
            let event = event::read()?;
            match app.handle_event(event) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => tracing::warn!("Event handling failed: {e}"),
            }
        }

        app.process_events();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
