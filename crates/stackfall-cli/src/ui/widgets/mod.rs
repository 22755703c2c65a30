use ratatui::{layout::Rect, widgets::Block as BlockWidget};

pub use self::{
    block_display::*, board_display::*, difficulty_menu::*, key_binding_display::*,
    piece_display::*, piece_stats_display::*, session_display::*, session_stats_display::*,
};

mod block_display;
mod board_display;
mod difficulty_menu;
mod key_binding_display;
mod piece_display;
mod piece_stats_display;
mod session_display;
mod session_stats_display;

mod color {
    use ratatui::style::Color;

    pub const CYAN: Color = Color::Rgb(0x00, 0xF0, 0xF0);
    pub const PURPLE: Color = Color::Rgb(0xA0, 0x00, 0xF0);
    pub const RED: Color = Color::Rgb(0xFF, 0x00, 0x00);
    pub const BLUE: Color = Color::Rgb(0x00, 0x00, 0xFF);
    pub const ORANGE: Color = Color::Rgb(0xFF, 0x98, 0x08);
    pub const YELLOW: Color = Color::Rgb(0xFF, 0xF2, 0x05);
    pub const GREEN: Color = Color::Rgb(0x00, 0xFF, 0x00);
    pub const GRAY: Color = Color::Rgb(127, 127, 127);
    pub const DARK_GRAY: Color = Color::Rgb(64, 64, 64);
    pub const BLACK: Color = Color::Rgb(0, 0, 0);
    pub const WHITE: Color = Color::Rgb(255, 255, 255);
}

pub mod style {
    use ratatui::style::{Color, Style};
    use stackfall_engine::PieceKind;

    use crate::ui::widgets::color;

    const fn fg_bg(fg: Color, bg: Color) -> Style {
        Style::new().fg(fg).bg(bg)
    }

    const fn bg_only(color: Color) -> Style {
        Style::new().fg(color).bg(color)
    }

    pub const DEFAULT: Style = fg_bg(color::WHITE, color::BLACK);
    pub const DIMMED: Style = fg_bg(color::GRAY, color::BLACK);
    pub const EMPTY: Style = bg_only(color::BLACK);
    pub const EMPTY_DOT: Style = fg_bg(color::DARK_GRAY, color::BLACK);
    pub const SELECTED: Style = fg_bg(color::BLACK, color::WHITE);

    /// Colour of a piece kind, indexed by its colour id.
    pub const fn piece_color(kind: PieceKind) -> Color {
        match kind {
            PieceKind::O => color::CYAN,
            PieceKind::T => color::PURPLE,
            PieceKind::S => color::RED,
            PieceKind::Z => color::BLUE,
            PieceKind::L => color::ORANGE,
            PieceKind::J => color::YELLOW,
            PieceKind::I => color::GREEN,
        }
    }

    pub const fn piece_block(kind: PieceKind) -> Style {
        bg_only(piece_color(kind))
    }

    /// Outline drawn where the active piece would land.
    pub const fn ghost_block(kind: PieceKind) -> Style {
        fg_bg(piece_color(kind), color::BLACK)
    }
}

fn block_vertical_margin(block: Option<&BlockWidget>) -> u16 {
    let dummy_rect = Rect::new(0, 0, 100, 100);
    let inner_rect = block.map_or(dummy_rect, |block| block.inner(dummy_rect));
    dummy_rect.height - inner_rect.height
}

fn block_horizontal_margin(block: Option<&BlockWidget>) -> u16 {
    let dummy_rect = Rect::new(0, 0, 100, 100);
    let inner_rect = block.map_or(dummy_rect, |block| block.inner(dummy_rect));
    dummy_rect.width - inner_rect.width
}
