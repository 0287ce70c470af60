use crate::error::ResolveError;
use crate::models::{Coordinates, Place};
use crate::resolver::Resolution;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

/// Where the screen is in the permission → fetch → render flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Locating,
    Resolved,
    PermissionDenied,
    Failed(String),
}

/// Screen-level state. Replaced wholesale by each finished cycle.
#[derive(Debug, Clone)]
pub struct Session {
    pub locale: String,
    pub coordinates: Option<Coordinates>,
    pub places: Vec<Place>,
    pub status: Status,
}

impl Session {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            coordinates: None,
            places: Vec::new(),
            status: Status::Locating,
        }
    }

    pub fn apply(&mut self, outcome: Result<Resolution, ResolveError>) {
        match outcome {
            Ok(res) => {
                info!("Resolved {} places", res.places.len());
                self.coordinates = Some(res.coordinates);
                self.locale = res.locale;
                self.places = res.places;
                self.status = Status::Resolved;
            }
            Err(ResolveError::PermissionDenied) => {
                self.places.clear();
                self.status = Status::PermissionDenied;
            }
            Err(e) => {
                warn!("Resolution failed: {}", e);
                self.places.clear();
                self.status = Status::Failed(e.to_string());
            }
        }
    }
}

/// Side effects the main loop performs on the app's behalf.
#[derive(Debug, PartialEq)]
pub enum Action {
    Refresh,
    OpenUrl(String),
}

pub struct App {
    pub session: Session,
    pub selected_index: usize,
    pub tick_count: usize,
    pub should_quit: bool,
    pub is_resolving: bool,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            session: Session::new(locale),
            selected_index: 0,
            tick_count: 0,
            should_quit: false,
            is_resolving: false,
            status_message: None,
        }
    }

    pub fn on_tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    pub fn selected_place(&self) -> Option<&Place> {
        self.session.places.get(self.selected_index)
    }

    /// Marks a cycle as started. Returns `false` if one is already running.
    pub fn begin_cycle(&mut self) -> bool {
        if self.is_resolving {
            return false;
        }
        self.is_resolving = true;
        self.session.status = Status::Locating;
        self.status_message = None;
        true
    }

    pub fn finish_cycle(&mut self, outcome: Result<Resolution, ResolveError>) {
        self.is_resolving = false;
        self.session.apply(outcome);
        self.selected_index = 0;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Right | KeyCode::Char('l') => {
                let len = self.session.places.len();
                if len > 0 {
                    self.selected_index = (self.selected_index + 1) % len;
                }
                None
            }
            KeyCode::Left | KeyCode::Char('h') => {
                let len = self.session.places.len();
                if len > 0 {
                    self.selected_index = self.selected_index.checked_sub(1).unwrap_or(len - 1);
                }
                None
            }
            KeyCode::Char('m') => self.selected_place().map(|p| Action::OpenUrl(p.map_url())),
            KeyCode::Char('o') | KeyCode::Enter => self
                .selected_place()
                .map(|p| Action::OpenUrl(p.article_url(&self.session.locale))),
            KeyCode::Char('s') => {
                if let Some(url) = self
                    .selected_place()
                    .map(|p| p.article_url(&self.session.locale))
                {
                    self.status_message = Some(format!("Share: {}", url));
                }
                None
            }
            _ => None,
        }
    }
}
