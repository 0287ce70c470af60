use color_eyre::Result;
use nearby_places::{
    api::WikiPlaceProvider,
    app::{Action, App},
    config::Config,
    events::{Event, EventHandler},
    links, location, logging,
    resolver::{NearbyResolver, RetryPolicy},
    ui,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging();
    install_panic_hook();
    color_eyre::install()?;

    let config = Config::load();
    let locale = config.wiki.effective_locale();
    info!("Using {}.wikipedia.org", locale);

    let resolver = NearbyResolver::new(
        Arc::from(location::from_config(&config.location)?),
        Arc::new(WikiPlaceProvider::new(config.api.timeout())?),
        RetryPolicy::from(&config.retry),
    );

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut app = App::new(locale.clone());
    let mut events = EventHandler::new(config.ui.tick_rate_ms);

    spawn_cycle(&mut app, &resolver, &locale, events.tx.clone());

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        let Some(event) = events.next().await else {
            break;
        };
        match event {
            Event::Tick => app.on_tick(),
            Event::Resolved(outcome) => app.finish_cycle(outcome),
            Event::Input(key) => match app.handle_key(key) {
                Some(Action::Refresh) => {
                    spawn_cycle(&mut app, &resolver, &locale, events.tx.clone())
                }
                Some(Action::OpenUrl(url)) => {
                    if let Err(e) = links::open_in_browser(&url) {
                        error!("Could not open {}: {}", url, e);
                        app.status_message = Some(format!("Could not open {}", url));
                    }
                }
                None => {}
            },
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

/// Runs one resolution cycle in the background unless one is already running.
fn spawn_cycle(
    app: &mut App,
    resolver: &NearbyResolver,
    locale: &str,
    tx: UnboundedSender<Event>,
) {
    if !app.begin_cycle() {
        debug!("Refresh ignored; a cycle is already in flight");
        return;
    }

    let resolver = resolver.clone();
    let locale = locale.to_string();
    tokio::spawn(async move {
        let outcome = resolver.run_cycle(&locale).await;
        let _ = tx.send(Event::Resolved(outcome));
    });
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen, crossterm::cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show)?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Force terminal cleanup!
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show).ok();
        original_hook(panic_info);
    }));
}
