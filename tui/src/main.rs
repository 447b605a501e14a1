//! partchat Entry Point
//!
//! Launches the terminal chat client for the parts assistant.
//!
//! Usage:
//!   partchat [OPTIONS]
//!
//! Options:
//!   --endpoint <URL>           Chat endpoint (default: http://localhost:8000/api/v1/chat)
//!   --user-id <ID>             Static user id sent with each request
//!   --no-greeting              Start with an empty conversation
//!   --overlap-policy <POLICY>  reject | latest-wins
//!
//! Run `partchat --help` for the full list.

use std::io::{self, IsTerminal};
use std::panic;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use partchat_core::{ChatConfig, HttpTransport};
use partchat_tui::{logging, App, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: partchat requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means stdin or stdout is piped, or SSH ran without -t.");
        std::process::exit(1);
    }

    let log_path = cli.log_file.clone().unwrap_or_else(logging::default_log_path);
    logging::init(&log_path)?;

    let config = cli.load_config()?;
    tracing::info!(
        endpoint = %config.endpoint,
        source = %config.source(),
        overlap_policy = %config.overlap_policy,
        "Configuration loaded"
    );
    let transport = config.http_transport().context("Failed to build HTTP client")?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let result = run_app(&mut terminal, transport, &config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "partchat exited with an error");
    }
    // Propagate any errors
    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    transport: HttpTransport,
    config: &ChatConfig,
) -> anyhow::Result<()> {
    let mut app = App::new(
        transport,
        config.user_id.clone(),
        config.controller_options(),
    );
    app.run(terminal).await
}
