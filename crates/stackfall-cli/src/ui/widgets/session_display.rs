use ratatui::{
    layout::{Constraint, Flex, Layout},
    prelude::{Buffer, Rect},
    style::{Color, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Padding, Widget},
};
use stackfall_engine::{CountdownStep, Difficulty, GameSession, SessionState};

use crate::ui::widgets::{
    BoardDisplay, DifficultyMenu, PieceDisplay, PieceStatsDisplay, SessionStatsDisplay, color,
    style,
};

/// The whole game screen: hold and stats on the left, the board in the
/// middle, next piece and piece counts on the right.
#[derive(Debug)]
pub struct SessionDisplay<'a> {
    session: &'a GameSession,
    menu_selection: Difficulty,
    horizontal_padding: u16,
    vertical_padding: u16,
}

impl<'a> SessionDisplay<'a> {
    pub fn new(session: &'a GameSession) -> Self {
        Self {
            session,
            menu_selection: session.difficulty().unwrap_or(Difficulty::Normal),
            horizontal_padding: 1,
            vertical_padding: 0,
        }
    }

    /// Highlighted entry of the difficulty menu shown before the game starts.
    pub fn menu_selection(self, menu_selection: Difficulty) -> Self {
        Self {
            menu_selection,
            ..self
        }
    }

    fn border_color(&self) -> Color {
        match self.session.state() {
            SessionState::NotStarted | SessionState::Countdown => color::WHITE,
            SessionState::Playing if self.session.field().is_in_danger_zone() => color::ORANGE,
            SessionState::Playing => color::WHITE,
            SessionState::Paused => color::YELLOW,
            SessionState::GameOver => color::RED,
        }
    }

    fn popup(&self) -> Option<(String, Style)> {
        match self.session.state() {
            SessionState::NotStarted | SessionState::Playing => None,
            SessionState::Countdown => {
                let text = match self.session.countdown()? {
                    CountdownStep::Number(n) => n.to_string(),
                    CountdownStep::Ready => "READY".to_owned(),
                };
                Some((text, Style::new().fg(color::BLACK).bg(color::GREEN)))
            }
            SessionState::Paused => Some((
                "PAUSED".to_owned(),
                Style::new().fg(color::BLACK).bg(color::YELLOW),
            )),
            SessionState::GameOver => Some((
                format!("GAME OVER!! {}", self.session.stats().score()),
                Style::new().fg(color::WHITE).bg(color::RED),
            )),
        }
    }
}

impl Widget for SessionDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &SessionDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let session = self.session;
        let state = session.state();
        let block_padding = Padding::symmetric(self.horizontal_padding, self.vertical_padding);
        let border_style = self.border_color();
        let panel = |title: &'static str| {
            Block::bordered()
                .title(Line::from(title).centered())
                .padding(block_padding)
                .border_style(border_style)
                .style(style::DEFAULT)
        };

        let game_board = {
            let widget = BoardDisplay::new(session.field())
                .block(Block::bordered().border_style(border_style).style(style::DEFAULT));
            if state.is_playing() || state.is_paused() {
                widget
                    .ghost(session.ghost_piece())
                    .active_piece(*session.active_piece())
            } else {
                widget
            }
        };
        let hold_panel = {
            let widget = PieceDisplay::new()
                .dimmed(!session.hold_available())
                .block(panel("HOLD"));
            match session.held_piece() {
                Some(piece) => widget.piece(piece),
                None => widget,
            }
        };
        let next_panel = {
            let widget = PieceDisplay::new().block(panel("NEXT"));
            if state.is_not_started() {
                widget
            } else {
                widget.piece(session.next_piece())
            }
        };
        let session_stats = SessionStatsDisplay::new(session).block(panel("STATS"));
        let piece_stats = PieceStatsDisplay::new(session.stats()).block(panel("PIECES"));

        let [left_column, center_column, right_column] = Layout::horizontal([
            Constraint::Length(u16::max(hold_panel.width(), session_stats.width())),
            Constraint::Length(game_board.width()),
            Constraint::Length(u16::max(next_panel.width(), piece_stats.width())),
        ])
        .flex(Flex::Center)
        .spacing(1)
        .areas(area);

        let [hold_area, stats_area] = Layout::vertical([
            Constraint::Length(hold_panel.height()),
            Constraint::Length(session_stats.height()),
        ])
        .spacing(1)
        .areas(left_column);
        let hold_area = hold_area.layout::<1>(
            &Layout::horizontal([Constraint::Length(hold_panel.width())]).flex(Flex::End),
        )[0];
        let stats_area = stats_area.layout::<1>(
            &Layout::horizontal([Constraint::Length(session_stats.width())]).flex(Flex::End),
        )[0];

        let [board_area] =
            Layout::vertical([Constraint::Length(game_board.height())]).areas(center_column);

        let [next_area, piece_stats_area] = Layout::vertical([
            Constraint::Length(next_panel.height()),
            Constraint::Length(piece_stats.height()),
        ])
        .spacing(1)
        .areas(right_column);

        let game_board_width = game_board.width();
        hold_panel.render(hold_area, buf);
        session_stats.render(stats_area, buf);
        game_board.render(board_area, buf);
        next_panel.render(next_area, buf);
        piece_stats.render(piece_stats_area, buf);

        if state.is_not_started() {
            let menu = DifficultyMenu::new(self.menu_selection).block(
                Block::bordered()
                    .title(Line::from("DIFFICULTY").centered())
                    .border_style(border_style)
                    .style(style::DEFAULT),
            );
            let area = board_area.centered(
                Constraint::Length(game_board_width),
                Constraint::Length(menu.height()),
            );
            menu.render(area, buf);
        }

        if let Some((text, style)) = self.popup() {
            let block = Block::new().style(style);
            let text = Text::styled(text, style).centered();
            let area =
                board_area.centered(Constraint::Length(game_board_width), Constraint::Length(3));
            let inner = block.inner(area);
            Clear.render(area, buf);
            block.render(area, buf);
            text.render(inner.centered_vertically(Constraint::Length(1)), buf);
        }
    }
}
