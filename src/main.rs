use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use profview::config::Settings;
use profview::controller::{ControllerOptions, ProfilingViewController, QueryContext, ViewMode};
use profview::data::duration::parse_duration;
use profview::data::TimeRange;
use profview::query::{FileQuery, HttpQuery, ProfileQuery};
use profview::{events, ui, App};

#[derive(Parser, Debug)]
#[command(name = "profview")]
#[command(about = "Terminal viewer for APM profiling data")]
struct Args {
    /// Settings file (defaults to ./profview.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Profiling query endpoint
    #[arg(long, conflicts_with = "file")]
    endpoint: Option<String>,

    /// Bearer token for the query endpoint
    #[arg(long)]
    token: Option<String>,

    /// Read diagrams from a saved response instead of the API
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Application name
    #[arg(short, long)]
    app: Option<String>,

    /// Service name
    #[arg(short, long)]
    service: Option<String>,

    /// Extra query parameter (key=value, repeatable)
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Look-back window (e.g. "15m", "1h", "2d")
    #[arg(short, long)]
    last: Option<String>,

    /// Initial view mode (combine, table, flame, topo)
    #[arg(short, long)]
    mode: Option<ViewMode>,

    /// Fetch once, export the view state to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args)?;

    init_logging(&settings, args.export.is_some())?;

    let lookback = settings.lookback()?;
    let mut params = settings.query_params();
    if let Some(ref app) = args.app {
        params.insert("app_name", app.clone());
    }
    if let Some(ref service) = args.service {
        params.insert("service_name", service.clone());
    }
    for raw in &args.params {
        let (key, value) = parse_param(raw)?;
        params.insert(key, value);
    }

    let client: Arc<dyn ProfileQuery> = match args.file {
        Some(ref path) => Arc::new(FileQuery::new(path)),
        None => {
            let mut builder = HttpQuery::builder()
                .endpoint(settings.endpoint.clone())
                .timeout(settings.timeout());
            if let Some(ref token) = settings.token {
                builder = builder.token(token.clone());
            }
            for (name, value) in &settings.headers {
                builder = builder.header(name.clone(), value.clone());
            }
            Arc::new(builder.build()?)
        }
    };
    info!(source = client.description(), "starting");

    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let context = QueryContext {
        params,
        time_range: TimeRange::last(lookback),
    };
    let options = ControllerOptions {
        debounce: settings.debounce(),
        initial_mode: settings.mode,
    };
    let controller = ProfilingViewController::new(client, context, options);

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return export_once(&rt, controller, export_path);
    }

    let mut app = App::new(controller);
    app.lookback = Some(lookback);
    app.export_dir = settings.export_dir.clone();
    run_tui(&mut app)
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref())?;

    if let Some(ref endpoint) = args.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(ref token) = args.token {
        settings.token = Some(token.clone());
    }
    if let Some(ref last) = args.last {
        settings.last = last.clone();
    }
    if let Some(mode) = args.mode {
        settings.mode = mode;
    }
    if let Some(ref log_file) = args.log_file {
        settings.log_file = Some(log_file.clone());
    }

    // Fail early on a bad window rather than after the terminal is taken over
    parse_duration(&settings.last)?;
    Ok(settings)
}

/// Split `key=value`; the value is taken as JSON when it parses, else as a string.
fn parse_param(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Invalid parameter {:?}, expected KEY=VALUE", raw);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid parameter {:?}, empty key", raw);
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Logs go to a file (the terminal belongs to the UI) or, when exporting, to stderr.
fn init_logging(settings: &Settings, to_stderr: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if let Some(ref path) = settings.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

fn export_once(
    rt: &tokio::runtime::Runtime,
    mut controller: ProfilingViewController,
    export_path: &Path,
) -> Result<()> {
    rt.block_on(controller.settle());
    if let Some(err) = controller.last_failure() {
        eprintln!("Query failed: {}", err);
    }
    profview::app::export_state(&controller, export_path)?;
    println!("Exported profile view to: {}", export_path.display());
    Ok(())
}

fn run_tui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let ui_thread = std::thread::current().id();
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        // Query tasks turn their panics into failed fetches; keep the screen.
        if std::thread::current().id() != ui_thread {
            error!(%panic, "background task panicked");
            return;
        }
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        app.tick();

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                app.table_area = ratatui::layout::Rect::default();
                return;
            }

            ui::draw(frame, app);
        })?;

        // Short timeout keeps debounced fetches and completions flowing
        if let Some(event) = events::poll_event(Duration::from_millis(50))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }
    }

    Ok(())
}
