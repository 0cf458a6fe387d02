use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rustls::crypto::ring::default_provider;
use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use ynance_data::{DashboardConfig, Secrets, StreamConfig, StreamSupervisor, rest::RestClient};
use ynance_tui::{
    app::{App, Command},
    logging::{init_logging, log_path},
    runtime::{FETCH_CHANNEL_SIZE, Runtime, build_drafter, credential_warnings},
    ui,
};

/// Interval between automatic REST refreshes of the current tab.
const AUTO_REFRESH: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = default_provider().install_default();

    let log_path = log_path();
    if let Err(error) = init_logging(&log_path) {
        eprintln!("failed to open log file {}: {error}", log_path.display());
    }

    let config = DashboardConfig::from_env();
    let secrets = Secrets::load_or_default(&config.secrets_path);
    info!(?config, ?secrets, "starting ynance");

    let mut app = App::new(config.clone());
    let missing = credential_warnings(&secrets);
    for (provider, message) in &missing {
        warn!(%provider, "{message}");
    }
    if !missing.is_empty() {
        app.set_status(format!(
            "{} data sources disabled, add keys to {}",
            missing.len(),
            config.secrets_path.display()
        ));
    }

    let stream_config = StreamConfig::default().with_depth_limit(config.depth_limit);
    let (supervisor, mut stream_rx) = StreamSupervisor::channel(stream_config);
    let (fetch_tx, mut fetch_rx) = mpsc::channel(FETCH_CHANNEL_SIZE);
    let drafter = build_drafter(&app, &secrets);
    let mut runtime = Runtime::new(RestClient::new()?, secrets, drafter, supervisor, fetch_tx);

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let startup = app.refresh();
    runtime.execute(&mut app, startup);

    let tick_rate = config.tick_rate;
    let mut last_tick = Instant::now();
    let mut last_refresh = Instant::now();
    let mut redraw = true;

    let result: Result<(), Box<dyn Error>> = loop {
        while let Ok(update) = stream_rx.try_recv() {
            app.on_stream(update);
        }
        while let Ok(update) = fetch_rx.try_recv() {
            app.on_fetch(update);
        }

        if last_refresh.elapsed() >= AUTO_REFRESH {
            let commands = app.refresh();
            runtime.execute(&mut app, commands);
            last_refresh = Instant::now();
        }

        if redraw || last_tick.elapsed() >= tick_rate {
            app.set_stream_statuses(runtime.supervisor().statuses());
            if let Err(error) = terminal.draw(|f| ui::render(f, &app)) {
                break Err(error.into());
            }
            last_tick = Instant::now();
            redraw = false;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    let commands = app.handle_key(key);
                    if commands.iter().any(|command| matches!(command, Command::Fetch(_))) {
                        last_refresh = Instant::now();
                    }
                    if !runtime.execute(&mut app, commands) {
                        break Ok(());
                    }
                    redraw = true;
                }
                Ok(_) => {}
                Err(error) => break Err(error.into()),
            },
            Ok(false) => {}
            Err(error) => break Err(error.into()),
        }
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    runtime.shutdown().await;
    info!("ynance stopped");
    result
}
