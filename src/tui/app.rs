//! Application state and main event loop for the viewer TUI.
//!
//! Manages terminal setup/teardown, panic hooks, the subscription task and
//! the render loop.

use crate::client::{spawn_subscription, ViewerEvent};
use crate::tui::event::{handle_key_event, Action, Event, EventHandler};
use crate::tui::ui::render;
use crate::viewer::{PipeSettings, Viewer, MIN_PIPE_DIAMETER};
use crossterm::{
    event::EventStream,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Diameter change per `+`/`-` press, in metres.
pub const DIAMETER_STEP: f64 = 0.05;

/// Colours cycled by `p`.
pub const PIPE_COLOR_PRESETS: [&str; 5] = ["#00ff66", "#ff8800", "#00bfff", "#ff3366", "white"];

const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(2);

/// Core application state for the TUI.
pub struct App {
    /// Whether the application should exit.
    pub should_quit: bool,
    /// `host:port` of the trajectory server.
    pub server: String,
    /// Count of ticks processed.
    pub tick_count: u64,
    pub viewer: Viewer,
    /// Temporary message shown in the footer, with expiry time.
    pub status_message: Option<(String, Instant)>,
    auto_connect: bool,
    tick_rate: Duration,
    subscription: Option<JoinHandle<()>>,
    events: mpsc::Receiver<ViewerEvent>,
    color_index: usize,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("should_quit", &self.should_quit)
            .field("server", &self.server)
            .field("tick_count", &self.tick_count)
            .field("status", &self.viewer.status())
            .field("connected", &self.subscription.is_some())
            .finish()
    }
}

impl App {
    pub fn new(server: String, settings: PipeSettings) -> Self {
        let color_index = PIPE_COLOR_PRESETS
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&settings.color))
            .unwrap_or(0);
        // Placeholder receiver until the first connect.
        let (_, events) = mpsc::channel(1);
        Self {
            should_quit: false,
            server,
            tick_count: 0,
            viewer: Viewer::new(settings),
            status_message: None,
            auto_connect: true,
            tick_rate: Duration::from_millis(100),
            subscription: None,
            events,
            color_index,
        }
    }

    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    pub fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Opens a subscription, aborting the current one first.
    ///
    /// Each connection gets its own channel so events still queued from an
    /// aborted task are dropped with it.
    pub fn connect(&mut self) {
        self.disconnect();
        let (tx, rx) = mpsc::channel(64);
        self.events = rx;
        tracing::info!(server = %self.server, "connecting");
        self.subscription = Some(spawn_subscription(self.server.clone(), tx));
    }

    /// Aborts the subscription task, if any.
    pub fn disconnect(&mut self) {
        if let Some(handle) = self.subscription.take() {
            handle.abort();
        }
    }

    /// Applies every queued socket event to the viewer.
    pub fn drain_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.events.try_recv() {
            self.viewer.apply_event(event);
            count += 1;
        }
        count
    }

    /// Shows a footer message for a couple of seconds.
    pub fn flash(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now() + STATUS_MESSAGE_TTL));
    }

    /// Clears the status message if its expiry time has passed.
    pub fn expire_status_message(&mut self) {
        if let Some((_, expiry)) = &self.status_message {
            if Instant::now() >= *expiry {
                self.status_message = None;
            }
        }
    }

    /// Advances camera flights and message expiry.
    pub fn on_tick(&mut self, now: Instant) {
        self.tick_count += 1;
        self.viewer.camera_mut().update(now);
        self.expire_status_message();
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => self.should_quit = true,
            Action::Connect => self.connect(),
            Action::FlyToBit => {
                if self.viewer.bit_position().is_some() {
                    self.viewer.fly_to_bit();
                } else {
                    self.flash("No bit position yet");
                }
            }
            Action::ClearTrajectory => {
                self.viewer.clear_trajectory();
                self.flash("Trajectory cleared");
            }
            Action::IncreaseDiameter => {
                let d = self.viewer.settings().effective_diameter() + DIAMETER_STEP;
                self.set_diameter(d);
            }
            Action::DecreaseDiameter => {
                let d = (self.viewer.settings().effective_diameter() - DIAMETER_STEP)
                    .max(MIN_PIPE_DIAMETER);
                self.set_diameter(d);
            }
            Action::CycleColor => {
                self.color_index = (self.color_index + 1) % PIPE_COLOR_PRESETS.len();
                let color = PIPE_COLOR_PRESETS[self.color_index];
                self.viewer.set_pipe_color(color);
                self.flash(format!("Pipe colour {}", color));
            }
        }
    }

    fn set_diameter(&mut self, diameter: f64) {
        // Round away float drift from repeated steps.
        let diameter = (diameter * 1000.0).round() / 1000.0;
        self.viewer.set_pipe_diameter(diameter);
        self.flash(format!("Pipe diameter {:.2} m", diameter));
    }

    /// Runs the TUI application: sets up terminal, enters event loop, restores on exit.
    pub async fn run(&mut self) -> io::Result<()> {
        // Install panic hook that restores terminal before printing panic info
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = restore_terminal();
            original_hook(panic_info);
        }));

        setup_terminal()?;

        let result = self.event_loop().await;

        self.disconnect();
        restore_terminal()?;
        result
    }

    async fn event_loop(&mut self) -> io::Result<()> {
        let backend = CrosstermBackend::new(stdout());
        let mut terminal = Terminal::new(backend)?;
        let event_handler = EventHandler::new(self.tick_rate);
        let mut reader = EventStream::new();

        if self.auto_connect {
            self.connect();
        }

        loop {
            // Drain socket events before rendering
            self.drain_events();

            terminal.draw(|frame| render(frame, self))?;

            match event_handler.next(&mut reader).await? {
                Event::Key(key) => {
                    self.handle_action(handle_key_event(key));
                    if self.should_quit {
                        return Ok(());
                    }
                }
                Event::Tick => self.on_tick(Instant::now()),
                Event::Resize(_, _) => {}
            }
        }
    }
}

/// Enables raw mode and switches to the alternate screen.
fn setup_terminal() -> io::Result<()> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    Ok(())
}

/// Restores the terminal to its original state.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    Ok(())
}
