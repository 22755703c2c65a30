use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use log::debug;
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::Line,
};
use ratatui_runtime::{App, RenderMode, Runtime};
use stackfall_engine::{Command, Difficulty, GameEvent, GameSession, SessionState};

use crate::ui::widgets::{KeyBinding, KeyBindingDisplay, SessionDisplay};

const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);
/// Soft drop ends after this long without a repeat when the terminal
/// does not report key releases.
const SOFT_DROP_IDLE: Duration = Duration::from_millis(150);
const STATUS_DURATION: Duration = Duration::from_millis(1500);

const MENU_KEYS: &[KeyBinding] = &[
    (&["↑", "↓"], "Select"),
    (&["Enter"], "Start"),
    (&["q"], "Quit"),
];
const PLAYING_KEYS: &[KeyBinding] = &[
    (&["←", "→"], "Move"),
    (&["↓"], "Soft Drop"),
    (&["↑"], "Hard Drop"),
    (&["r", "x"], "Rotate"),
    (&["h", "c"], "Hold"),
    (&["Space"], "Pause"),
    (&["q"], "Quit"),
];
const PAUSED_KEYS: &[KeyBinding] = &[(&["Space", "Esc"], "Resume"), (&["q"], "Quit")];
const GAME_OVER_KEYS: &[KeyBinding] = &[(&["n", "Enter"], "New Game"), (&["q"], "Quit")];
const COUNTDOWN_KEYS: &[KeyBinding] = &[(&["q"], "Quit")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    MenuUp,
    MenuDown,
    StartGame,
    Command(Command),
    Quit,
}

impl Action {
    /// Whether a held key keeps triggering the action.
    fn repeats(self) -> bool {
        matches!(
            self,
            Action::MenuUp
                | Action::MenuDown
                | Action::Command(Command::MoveLeft | Command::MoveRight | Command::SoftDrop(true))
        )
    }
}

fn is_soft_drop_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Down | KeyCode::Char('s' | 'k'))
}

fn key_action(state: SessionState, code: KeyCode) -> Option<Action> {
    if code == KeyCode::Char('q') {
        return Some(Action::Quit);
    }
    let action = match state {
        SessionState::NotStarted => match code {
            KeyCode::Up | KeyCode::Char('w' | 'i') => Action::MenuUp,
            KeyCode::Down | KeyCode::Char('s' | 'k') => Action::MenuDown,
            KeyCode::Enter => Action::StartGame,
            _ => return None,
        },
        SessionState::Countdown => return None,
        SessionState::Playing => Action::Command(match code {
            KeyCode::Left | KeyCode::Char('a' | 'j') => Command::MoveLeft,
            KeyCode::Right | KeyCode::Char('d' | 'l') => Command::MoveRight,
            code if is_soft_drop_key(code) => Command::SoftDrop(true),
            KeyCode::Up | KeyCode::Char('w' | 'i') => Command::HardDrop,
            KeyCode::Char('r' | 'x') => Command::Rotate,
            KeyCode::Char('h' | 'c') => Command::Hold,
            KeyCode::Char(' ') | KeyCode::Esc => Command::TogglePause,
            _ => return None,
        }),
        SessionState::Paused => match code {
            KeyCode::Char(' ') | KeyCode::Esc => Action::Command(Command::TogglePause),
            _ => return None,
        },
        SessionState::GameOver => match code {
            KeyCode::Char('n') | KeyCode::Enter => Action::Command(Command::Restart),
            _ => return None,
        },
    };
    Some(action)
}

fn status_for_event(event: &GameEvent, best_score: u64) -> Option<String> {
    match event {
        GameEvent::LinesCleared { rows, combo } => {
            let name = match rows.len() {
                1 => "SINGLE",
                2 => "DOUBLE",
                3 => "TRIPLE",
                _ => "TETRIS",
            };
            Some(if *combo > 1 {
                format!("{name}! combo x{combo}")
            } else {
                format!("{name}!")
            })
        }
        GameEvent::GameOver { score } if *score > 0 && *score >= best_score => {
            Some(format!("NEW BEST: {score}"))
        }
        _ => None,
    }
}

/// Terminal front end for a single [`GameSession`].
#[derive(Debug)]
pub struct PlayApp {
    session: GameSession,
    menu_selection: Difficulty,
    fps: f64,
    soft_drop_idle: Option<Duration>,
    status: Option<(String, Duration)>,
    is_exiting: bool,
}

impl PlayApp {
    pub fn new(session: GameSession, menu_selection: Difficulty, fps: f64) -> Self {
        Self {
            session,
            menu_selection,
            fps,
            soft_drop_idle: None,
            status: None,
            is_exiting: false,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    fn move_menu_selection(&mut self, step: isize) {
        let all = Difficulty::ALL;
        let current = all
            .iter()
            .position(|d| *d == self.menu_selection)
            .unwrap_or_default();
        let next = current.saturating_add_signed(step).min(all.len() - 1);
        self.menu_selection = all[next];
    }

    fn start_game(&mut self, runtime: &mut Runtime) {
        if let Err(err) = self.session.select_difficulty(self.menu_selection) {
            debug!("cannot select difficulty: {err}");
            return;
        }
        if let Err(err) = self.session.start() {
            debug!("cannot start: {err}");
            return;
        }
        runtime.set_timer_interval(Some(COUNTDOWN_INTERVAL));
    }

    fn apply(&mut self, command: Command) {
        if let Err(err) = self.session.apply(command) {
            debug!("{command:?} rejected: {err}");
        }
    }

    fn release_soft_drop(&mut self) {
        self.soft_drop_idle = None;
        self.apply(Command::SoftDrop(false));
    }

    fn handle_key(&mut self, runtime: &mut Runtime, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            if is_soft_drop_key(key.code) && self.session.is_soft_drop() {
                self.release_soft_drop();
            }
            return;
        }
        let Some(action) = key_action(self.session.state(), key.code) else {
            return;
        };
        if key.kind == KeyEventKind::Repeat && !action.repeats() {
            return;
        }
        match action {
            Action::MenuUp => self.move_menu_selection(-1),
            Action::MenuDown => self.move_menu_selection(1),
            Action::StartGame => self.start_game(runtime),
            Action::Command(command @ Command::SoftDrop(true)) => {
                self.apply(command);
                if !runtime.key_release_enabled() {
                    self.soft_drop_idle = Some(SOFT_DROP_IDLE);
                }
            }
            Action::Command(command @ Command::Restart) => {
                self.apply(command);
                self.menu_selection = self.session.difficulty().unwrap_or(self.menu_selection);
            }
            Action::Command(command) => self.apply(command),
            Action::Quit => self.is_exiting = true,
        }
    }

    fn collect_events(&mut self) {
        let best_score = self.session.best_score();
        for event in self.session.drain_events() {
            if let Some(text) = status_for_event(&event, best_score) {
                self.status = Some((text, STATUS_DURATION));
            }
        }
    }

    fn help_keys(&self) -> &'static [KeyBinding<'static>] {
        match self.session.state() {
            SessionState::NotStarted => MENU_KEYS,
            SessionState::Countdown => COUNTDOWN_KEYS,
            SessionState::Playing => PLAYING_KEYS,
            SessionState::Paused => PAUSED_KEYS,
            SessionState::GameOver => GAME_OVER_KEYS,
        }
    }
}

impl App for PlayApp {
    fn init(&mut self, runtime: &mut Runtime) {
        runtime.set_tick_rate(Some(self.fps));
        runtime.set_render_mode(RenderMode::throttled_from_rate(self.fps));
        runtime.request_focus_change(true);
        runtime.request_key_release(true);
    }

    fn should_exit(&self) -> bool {
        self.is_exiting
    }

    fn handle_event(&mut self, runtime: &mut Runtime, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(runtime, key),
            Event::FocusLost if self.session.state().is_playing() => {
                debug!("focus lost, pausing");
                self.release_soft_drop();
                self.apply(Command::TogglePause);
            }
            _ => {}
        }
        self.collect_events();
    }

    fn draw(&self, frame: &mut Frame) {
        let session_display = SessionDisplay::new(&self.session).menu_selection(self.menu_selection);
        let status = self.status.as_ref().map_or("", |(text, _)| text.as_str());
        let status = Line::styled(status, Style::new().fg(Color::Yellow)).centered();
        let help = KeyBindingDisplay::new(self.help_keys());

        let [main_area, status_area, help_area] = Layout::vertical([
            Constraint::Length(25),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());
        frame.render_widget(session_display, main_area);
        frame.render_widget(status, status_area);
        frame.render_widget(help, help_area);
    }

    fn update(&mut self, _runtime: &mut Runtime, delta: Duration) {
        if let Some(idle) = self.soft_drop_idle {
            match idle.checked_sub(delta) {
                Some(rest) if !rest.is_zero() => self.soft_drop_idle = Some(rest),
                _ => self.release_soft_drop(),
            }
        }
        if let Some((_, remaining)) = &mut self.status {
            *remaining = remaining.saturating_sub(delta);
        }
        if self
            .status
            .as_ref()
            .is_some_and(|(_, remaining)| remaining.is_zero())
        {
            self.status = None;
        }
        self.session.advance_time(delta);
        self.collect_events();
    }

    fn on_timer(&mut self, runtime: &mut Runtime) {
        if let Err(err) = self.session.tick_countdown() {
            debug!("countdown timer stopped: {err}");
        }
        if !self.session.state().is_countdown() {
            runtime.set_timer_interval(None);
        }
        self.collect_events();
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;
    use stackfall_engine::PieceSeed;

    use super::*;

    const SEED: PieceSeed = PieceSeed::from_bytes([7; 16]);

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn release(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new_with_kind(
            code,
            KeyModifiers::NONE,
            KeyEventKind::Release,
        ))
    }

    fn playing_app(runtime: &mut Runtime) -> PlayApp {
        let mut app = PlayApp::new(GameSession::with_seed(SEED), Difficulty::Normal, 60.0);
        app.handle_event(runtime, press(KeyCode::Enter));
        assert!(app.session.state().is_countdown());
        for _ in 0..4 {
            app.on_timer(runtime);
        }
        assert!(app.session.state().is_playing());
        app
    }

    mod keys {
        use super::*;

        #[test]
        fn test_quit_works_in_every_state() {
            for state in [
                SessionState::NotStarted,
                SessionState::Countdown,
                SessionState::Playing,
                SessionState::Paused,
                SessionState::GameOver,
            ] {
                assert_eq!(key_action(state, KeyCode::Char('q')), Some(Action::Quit));
            }
        }

        #[test]
        fn test_alternate_keys_share_actions() {
            let state = SessionState::Playing;
            for code in [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('j')] {
                assert_eq!(
                    key_action(state, code),
                    Some(Action::Command(Command::MoveLeft))
                );
            }
            for code in [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('i')] {
                assert_eq!(
                    key_action(state, code),
                    Some(Action::Command(Command::HardDrop))
                );
            }
            for code in [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('k')] {
                assert_eq!(
                    key_action(state, code),
                    Some(Action::Command(Command::SoftDrop(true)))
                );
            }
        }

        #[test]
        fn test_countdown_ignores_game_keys() {
            assert_eq!(key_action(SessionState::Countdown, KeyCode::Left), None);
            assert_eq!(key_action(SessionState::Countdown, KeyCode::Enter), None);
        }

        #[test]
        fn test_only_movement_repeats() {
            assert!(Action::Command(Command::MoveLeft).repeats());
            assert!(Action::Command(Command::SoftDrop(true)).repeats());
            assert!(!Action::Command(Command::HardDrop).repeats());
            assert!(!Action::Command(Command::Hold).repeats());
        }
    }

    mod app {
        use super::*;

        #[test]
        fn test_menu_selection_clamps_at_ends() {
            let mut runtime = Runtime::new();
            let mut app = PlayApp::new(GameSession::with_seed(SEED), Difficulty::Facil, 60.0);
            app.handle_event(&mut runtime, press(KeyCode::Up));
            assert_eq!(app.menu_selection, Difficulty::Facil);
            for _ in 0..10 {
                app.handle_event(&mut runtime, press(KeyCode::Down));
            }
            assert_eq!(app.menu_selection, Difficulty::Imposible);
        }

        #[test]
        fn test_start_uses_menu_selection() {
            let mut runtime = Runtime::new();
            let app = playing_app(&mut runtime);
            assert_eq!(app.session.difficulty(), Some(Difficulty::Normal));
        }

        #[test]
        fn test_soft_drop_released_after_idle() {
            let mut runtime = Runtime::new();
            let mut app = playing_app(&mut runtime);
            app.handle_event(&mut runtime, press(KeyCode::Down));
            assert!(app.session.is_soft_drop());
            app.update(&mut runtime, Duration::from_millis(100));
            assert!(app.session.is_soft_drop());
            app.update(&mut runtime, Duration::from_millis(60));
            assert!(!app.session.is_soft_drop());
        }

        #[test]
        fn test_soft_drop_released_on_key_release() {
            let mut runtime = Runtime::new();
            let mut app = playing_app(&mut runtime);
            app.handle_event(&mut runtime, press(KeyCode::Char('s')));
            assert!(app.session.is_soft_drop());
            app.handle_event(&mut runtime, release(KeyCode::Char('s')));
            assert!(!app.session.is_soft_drop());
        }

        #[test]
        fn test_focus_lost_pauses() {
            let mut runtime = Runtime::new();
            let mut app = playing_app(&mut runtime);
            app.handle_event(&mut runtime, Event::FocusLost);
            assert!(app.session.state().is_paused());
            // Regaining focus leaves the game paused
            app.handle_event(&mut runtime, Event::FocusGained);
            assert!(app.session.state().is_paused());
        }

        #[test]
        fn test_quit_sets_exit_flag() {
            let mut runtime = Runtime::new();
            let mut app = PlayApp::new(GameSession::with_seed(SEED), Difficulty::Normal, 60.0);
            assert!(!app.should_exit());
            app.handle_event(&mut runtime, press(KeyCode::Char('q')));
            assert!(app.should_exit());
        }
    }

    mod status {
        use stackfall_engine::ClearedRows;

        use super::*;

        #[test]
        fn test_line_clear_status() {
            let rows: ClearedRows = [19, 18].into_iter().collect();
            let event = GameEvent::LinesCleared { rows, combo: 1 };
            assert_eq!(status_for_event(&event, 0).as_deref(), Some("DOUBLE!"));

            let rows: ClearedRows = [19].into_iter().collect();
            let event = GameEvent::LinesCleared { rows, combo: 3 };
            assert_eq!(
                status_for_event(&event, 0).as_deref(),
                Some("SINGLE! combo x3")
            );
        }

        #[test]
        fn test_new_best_only_when_reached() {
            let event = GameEvent::GameOver { score: 120 };
            assert_eq!(
                status_for_event(&event, 120).as_deref(),
                Some("NEW BEST: 120")
            );
            let event = GameEvent::GameOver { score: 80 };
            assert_eq!(status_for_event(&event, 120), None);
        }
    }
}
