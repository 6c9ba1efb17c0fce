//! Ratatui-based signup form.
//!
//! Password gate first, then the three-field form. The screen is driven by
//! the coordinator's events: the submit button, the result line that
//! replaces the form, and the alert popups all come from them.

use std::io;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::session::Session;
use crate::coordinator::{Coordinator, Delivery, DeliveryReport, RegistrationEvent, SubmissionState};
use crate::domain::Registrant;
use crate::error::AppError;
use crate::gate::PasswordGate;

const FIELD_LABELS: [&str; 3] = ["First name", "Last name", "Email"];

/// Start the TUI.
pub fn run(session: &Session) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(session);
    let result = app.event_loop(&mut terminal);
    // Also reached when the loop bails out on a terminal error.
    app.finish_delivery();
    result
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    gate: PasswordGate,
    password_input: String,
    gate_error: String,
    coordinator: Coordinator,
    events: Receiver<RegistrationEvent>,
    /// Last state announced by the coordinator.
    view: SubmissionState,
    fields: [String; 3],
    selected_field: usize,
    /// Set between the key press and the (blocking) submit so one frame
    /// with the busy label is drawn first.
    pending_submit: bool,
    /// Deliveries of the accepted registration, joined before exit.
    delivery: Option<Delivery>,
    status: String,
    alerts: Vec<String>,
}

impl App {
    fn new(session: &Session) -> Self {
        let coordinator = session.coordinator();
        let events = coordinator.subscribe();
        Self {
            gate: session.gate(),
            password_input: String::new(),
            gate_error: String::new(),
            coordinator,
            events,
            view: SubmissionState::Idle,
            fields: Default::default(),
            selected_field: 0,
            pending_submit: false,
            delivery: None,
            status: "Enter the password to continue.".to_string(),
            alerts: Vec::new(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.drain_events() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if self.pending_submit {
                self.pending_submit = false;
                self.submit();
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
                    if ctrl_c || self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }

        if self.delivery.is_some() {
            self.status = "Saving your registration...".to_string();
            let drawn = terminal.draw(|f| self.draw(f)).map(|_| ());
            self.finish_delivery();
            drawn.map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
        }
        Ok(())
    }

    /// Block until the background deliveries are done so quitting never
    /// cuts off the store append or the confirmation.
    fn finish_delivery(&mut self) -> Option<DeliveryReport> {
        let report = self.delivery.take()?.wait();
        self.drain_events();
        Some(report)
    }

    /// Apply pending coordinator events. Returns whether anything changed.
    fn drain_events(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            changed = true;
            if let Some(alert) = crate::report::event_alert(&event) {
                self.alerts.push(alert);
            }
            match event {
                RegistrationEvent::StateChanged(state) => self.view = state,
                RegistrationEvent::SubmitUnlocked => {
                    self.status = crate::report::RETRY_PROMPT.to_string();
                }
                _ => {}
            }
        }
        changed
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if !self.alerts.is_empty() {
            // Alerts are modal: Enter or Esc dismisses the oldest.
            if matches!(code, KeyCode::Enter | KeyCode::Esc) {
                self.alerts.remove(0);
            }
            return false;
        }

        if code == KeyCode::Esc {
            return true;
        }

        if !self.gate.is_open() {
            self.handle_gate_key(code);
            return false;
        }

        if !self.submit_enabled() {
            return false;
        }

        match code {
            KeyCode::Up | KeyCode::BackTab => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Tab => {
                self.selected_field = (self.selected_field + 1).min(FIELD_LABELS.len() - 1);
            }
            KeyCode::Enter => self.request_submit(),
            KeyCode::Backspace => {
                self.fields[self.selected_field].pop();
            }
            KeyCode::Char(c) => self.fields[self.selected_field].push(c),
            _ => {}
        }
        false
    }

    fn handle_gate_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => match self.gate.attempt(&self.password_input) {
                Ok(()) => {
                    self.gate_error.clear();
                    self.status = "Fill in your details and press Enter to submit.".to_string();
                }
                Err(msg) => {
                    self.gate_error = msg.to_string();
                    self.password_input.clear();
                }
            },
            KeyCode::Backspace => {
                self.password_input.pop();
            }
            KeyCode::Char(c) => self.password_input.push(c),
            _ => {}
        }
    }

    fn submit_enabled(&self) -> bool {
        !self.pending_submit && self.view.accepts_submit()
    }

    fn request_submit(&mut self) {
        match Registrant::from_form(&self.fields[0], &self.fields[1], &self.fields[2]) {
            Ok(_) => {
                self.pending_submit = true;
                self.status = "Processing...".to_string();
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn submit(&mut self) {
        let registrant = match Registrant::from_form(&self.fields[0], &self.fields[1], &self.fields[2]) {
            Ok(registrant) => registrant,
            Err(err) => {
                self.status = err.to_string();
                return;
            }
        };

        match self.coordinator.submit(&registrant) {
            // Deliveries finish in the background; their events arrive on
            // the next loop iterations.
            Ok(submission) => {
                self.delivery = submission.delivery;
                if submission.state.is_terminal() {
                    self.fields = Default::default();
                    self.status = "Press Esc to quit.".to_string();
                }
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        if self.gate.is_open() {
            self.draw_form(frame, chunks[1]);
        } else {
            self.draw_gate(frame, chunks[1]);
        }
        self.draw_footer(frame, chunks[2]);

        if let Some(alert) = self.alerts.first() {
            draw_alert(frame, size, alert);
        }
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::styled("pies", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" | pie party on {}", self.coordinator.event_label())),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_gate(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let masked = "*".repeat(self.password_input.chars().count());
        let mut lines = vec![
            Line::from("Password"),
            Line::from(Span::styled(
                format!("{masked}_"),
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ];
        if !self.gate_error.is_empty() {
            lines.push(Line::from(Span::styled(&self.gate_error, Style::default().fg(Color::Red))));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().title("Locked").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Register").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line> = Vec::new();

        // Terminal states replace the inputs with the result line.
        if !self.view.is_terminal() {
            for (idx, label) in FIELD_LABELS.iter().enumerate() {
                let selected = idx == self.selected_field;
                let marker = if selected { "» " } else { "  " };
                let style = if selected {
                    Style::default().fg(Color::Black).bg(Color::White)
                } else {
                    Style::default()
                };
                lines.push(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(format!("{label:<11}"), Style::default().fg(Color::Gray)),
                    Span::styled(self.fields[idx].clone(), style),
                ]));
            }
            lines.push(Line::from(""));

            let label = if self.pending_submit {
                SubmissionState::Submitting.submit_label()
            } else {
                self.view.submit_label()
            };
            let button_style = if self.submit_enabled() {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(Span::styled(format!("[ {label} ]"), button_style)));
        }

        if let Some(result) = crate::report::result_line(&self.view) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                result,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
        }

        frame.render_widget(Paragraph::new(Text::from(lines)), inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = if self.gate.is_open() {
            "↑/↓/Tab select  Enter submit  Esc quit"
        } else {
            "Enter unlock  Esc quit"
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_alert(frame: &mut ratatui::Frame<'_>, area: Rect, message: &str) {
    let rect = centered(area, 60, 7);
    frame.render_widget(Clear, rect);
    let p = Paragraph::new(Text::from(vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled("Enter to dismiss", Style::default().fg(Color::Gray))),
    ]))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().title("Notice").borders(Borders::ALL));
    frame.render_widget(p, rect);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::coordinator::fakes::{FakeNotifier, FakeStore};
    use crate::domain::PieType;

    fn app_with(store: FakeStore) -> App {
        let session = Session {
            store: Arc::new(store),
            notifier: Arc::new(FakeNotifier::default()),
            event_label: "Sunday October 5th 2025".to_string(),
            gate_password: "pieisgreat".to_string(),
        };
        App::new(&session)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    fn unlock(app: &mut App) {
        type_text(app, "pieisgreat");
        app.handle_key(KeyCode::Enter);
    }

    #[test]
    fn wrong_password_clears_input() {
        let mut app = app_with(FakeStore::default());
        type_text(&mut app, "cake");
        assert!(!app.handle_key(KeyCode::Enter));
        assert!(!app.gate.is_open());
        assert!(app.password_input.is_empty());
        assert_eq!(app.gate_error, crate::gate::WRONG_PASSWORD);

        unlock(&mut app);
        assert!(app.gate.is_open());
        assert!(app.gate_error.is_empty());
    }

    #[test]
    fn incomplete_form_is_not_submitted() {
        let mut app = app_with(FakeStore::default());
        unlock(&mut app);
        type_text(&mut app, "Ada");
        app.handle_key(KeyCode::Enter);
        assert!(!app.pending_submit);
        assert_eq!(app.status, "Please fill in your last name.");
    }

    #[test]
    fn duplicate_hides_the_form() {
        let mut app = app_with(FakeStore::default().with_registered("ada@example.com", Some("sweet")));
        unlock(&mut app);
        type_text(&mut app, "Ada");
        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "Lovelace");
        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "ada@example.com");
        app.handle_key(KeyCode::Enter);
        assert!(app.pending_submit);
        assert!(!app.submit_enabled());

        app.pending_submit = false;
        app.submit();
        assert!(app.drain_events());
        assert_eq!(
            app.view,
            SubmissionState::DuplicateShown {
                prior: "sweet".to_string()
            }
        );
        assert!(!app.submit_enabled());

        // Typing after the terminal state changes nothing.
        type_text(&mut app, "x");
        assert!(app.fields.iter().all(String::is_empty));
    }

    #[test]
    fn new_registration_ends_assigned() {
        let mut app = app_with(FakeStore::default());
        unlock(&mut app);
        app.fields = [
            "Ada".to_string(),
            "Lovelace".to_string(),
            "ada@example.com".to_string(),
        ];
        app.submit();
        app.drain_events();
        assert_eq!(app.view, SubmissionState::AssignedShown { pie: PieType::Sweet });
    }

    #[test]
    fn quitting_waits_for_the_store_append() {
        let store = Arc::new(FakeStore::default().with_persist_delay(Duration::from_millis(200)));
        let session = Session {
            store: store.clone(),
            notifier: Arc::new(FakeNotifier::default()),
            event_label: "Sunday October 5th 2025".to_string(),
            gate_password: "pieisgreat".to_string(),
        };
        let mut app = App::new(&session);
        unlock(&mut app);
        app.fields = [
            "Ada".to_string(),
            "Lovelace".to_string(),
            "ada@example.com".to_string(),
        ];
        app.submit();
        app.drain_events();
        assert_eq!(app.view, SubmissionState::AssignedShown { pie: PieType::Sweet });

        assert!(app.handle_key(KeyCode::Esc));
        let report = app.finish_delivery().expect("delivery was started");
        assert_eq!(report.persisted, Some(Ok(())));
        assert_eq!(report.notified, Some(Ok(())));
        assert_eq!(store.records().len(), 1);
        assert!(app.delivery.is_none());
    }

    #[test]
    fn duplicate_leaves_nothing_to_wait_for() {
        let mut app = app_with(FakeStore::default().with_registered("ada@example.com", Some("sweet")));
        unlock(&mut app);
        app.fields = [
            "Ada".to_string(),
            "Lovelace".to_string(),
            "ada@example.com".to_string(),
        ];
        app.submit();
        assert!(app.finish_delivery().is_none());
    }

    #[test]
    fn alerts_are_modal() {
        let mut app = app_with(FakeStore::default());
        app.alerts.push("one".to_string());
        assert!(!app.handle_key(KeyCode::Esc));
        assert!(app.alerts.is_empty());
        assert!(app.handle_key(KeyCode::Esc));
    }

    #[test]
    fn centered_fits_inside_small_areas() {
        let area = Rect {
            x: 0,
            y: 0,
            width: 40,
            height: 5,
        };
        let rect = centered(area, 60, 7);
        assert_eq!(rect.width, 40);
        assert_eq!(rect.height, 5);
        assert_eq!((rect.x, rect.y), (0, 0));

        let big = Rect {
            x: 0,
            y: 0,
            width: 100,
            height: 30,
        };
        assert_eq!(centered(big, 60, 7), Rect { x: 20, y: 11, width: 60, height: 7 });
    }
}
