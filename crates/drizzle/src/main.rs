use std::path::PathBuf;
use std::time::{Duration, Instant};

use color_eyre::eyre::WrapErr;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use drizzle_config::{Config, ConfigError};
use drizzle_emitter::{
    Overflow, ParticleCanvas, ParticleEmitter, RenderedParticle, Setup, Stylesheet, Surface,
    add_particles,
};
use log::{debug, warn};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

mod logging;
mod terminal_surface;

use terminal_surface::TerminalSurface;

/// Degrees the angle changes per key press.
const ANGLE_STEP: f32 = 5.0;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = load_config()?;
    logging::init(config.app.log_level.as_deref())?;

    let app = App::new(&config)?;
    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();
    result
}

/// Load the config file given as the first argument, or the default one.
fn load_config() -> color_eyre::Result<Config> {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        return Config::load_from(&path)
            .wrap_err_with(|| format!("failed to load config from {}", path.display()));
    }
    match Config::load() {
        Err(ConfigError::NoConfigDir) => Ok(Config::default()),
        other => Ok(other?),
    }
}

/// The main application which holds the emitter and the UI state.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    running: bool,
    /// Rain or snow falling through the terminal.
    emitter: ParticleEmitter<TerminalSurface>,
    /// Redraw period.
    frame_rate: Duration,
    /// Start of the emitter clock.
    started: Instant,
    /// Last rejected action, shown in the status line.
    notice: Option<String>,
}

impl App {
    /// Construct a new instance of [`App`].
    pub fn new(config: &Config) -> color_eyre::Result<Self> {
        let setup = Setup::from_settings(TerminalSurface::default(), &config.emitter);
        let emitter = add_particles(setup).wrap_err("failed to create the particle emitter")?;
        Ok(Self {
            running: false,
            emitter,
            frame_rate: Duration::from_millis(config.app.frame_rate_ms.max(1)),
            started: Instant::now(),
            notice: None,
        })
    }

    /// Run the application's main loop, destroying the emitter on exit.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.running = true;
        while self.running {
            let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
            self.emitter.advance_to(elapsed_ms);
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events()?;
        }

        let spawned = self.emitter.spawned_count();
        let surface = self.emitter.destroy();
        debug!(
            "exiting after {spawned} particles, layer attached: {}",
            surface.has_layer()
        );
        Ok(())
    }

    /// Renders the user interface.
    fn render(&mut self, frame: &mut Frame) {
        let stylesheet = Stylesheet::install();
        let chunks = Layout::vertical([
            Constraint::Fill(1),   // Surface
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help text
        ])
        .split(frame.area());

        let surface = self.emitter.surface();
        let title = match surface.kind_marker() {
            Some(kind) => format!(" drizzle · {kind} "),
            None => " drizzle ".to_string(),
        };
        let block = Block::bordered().title(title).border_style(stylesheet.container());
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);
        self.emitter.surface_mut().set_area(inner);

        let surface = self.emitter.surface();
        if surface.is_displayed() {
            let particles: Vec<RenderedParticle> = self.emitter.particles().collect();
            let canvas = ParticleCanvas::new(&particles, stylesheet, surface.area())
                .cell(surface.cell())
                .clip(surface.overflow() == Overflow::Hidden);
            frame.render_widget(canvas, frame.area());
        }

        frame.render_widget(Paragraph::new(self.status_line()), chunks[1]);

        let help = Line::from(vec![
            "space".bold(),
            " start/stop  ".dark_gray(),
            "f".bold(),
            " clear  ".dark_gray(),
            "p".bold(),
            " pause  ".dark_gray(),
            "t".bold(),
            " type  ".dark_gray(),
            "d".bold(),
            " density  ".dark_gray(),
            "[ ]".bold(),
            " angle  ".dark_gray(),
            "h".bold(),
            " hide  ".dark_gray(),
            "q".bold(),
            " quit".dark_gray(),
        ])
        .centered();
        frame.render_widget(help, chunks[2]);
    }

    /// Current emitter settings and state.
    fn status_line(&self) -> Line<'static> {
        let state = if self.emitter.is_active() {
            "falling"
        } else if self.emitter.is_paused() {
            "paused"
        } else {
            "stopped"
        };
        let mut spans: Vec<Span<'static>> = vec![
            format!(
                " {} · {} · {:+.0}° · {state} · {} particles",
                self.emitter.kind(),
                self.emitter.density(),
                self.emitter.angle(),
                self.emitter.particle_count(),
            )
            .into(),
        ];
        if let Some(notice) = &self.notice {
            spans.push("  ".into());
            spans.push(notice.clone().red());
        }
        Line::from(spans).style(Style::new().dark_gray())
    }

    /// Reads the crossterm events and updates the state of [`App`].
    fn handle_crossterm_events(&mut self) -> color_eyre::Result<()> {
        if event::poll(self.frame_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                _ => {}
            }
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent) {
        self.notice = None;
        let result = match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => {
                self.quit();
                Ok(())
            }
            (_, KeyCode::Char(' ')) => {
                let active = self.emitter.is_active();
                self.emitter.set_active(!active)
            }
            (_, KeyCode::Char('f')) => {
                self.emitter.disable(true);
                Ok(())
            }
            (_, KeyCode::Char('p')) => {
                self.emitter.pause();
                Ok(())
            }
            (_, KeyCode::Char('t')) => {
                self.emitter.set_kind(self.emitter.kind().next());
                Ok(())
            }
            (_, KeyCode::Char('d')) => {
                self.emitter.set_density(self.emitter.density().next());
                Ok(())
            }
            (_, KeyCode::Char('[')) => self.emitter.set_angle(self.emitter.angle() - ANGLE_STEP),
            (_, KeyCode::Char(']')) => self.emitter.set_angle(self.emitter.angle() + ANGLE_STEP),
            (_, KeyCode::Char('h')) => {
                self.emitter.surface_mut().toggle_display();
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(err) = result {
            warn!("{err}");
            self.notice = Some(err.to_string());
        }
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}
