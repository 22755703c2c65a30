use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};
use stackfall_engine::{GameStats, PieceKind};

use crate::ui::widgets::style;

/// Locked piece count per kind, one coloured row each.
#[derive(Debug)]
pub struct PieceStatsDisplay<'a> {
    stats: &'a GameStats,
    block: Option<BlockWidget<'a>>,
}

impl<'a> PieceStatsDisplay<'a> {
    pub fn new(stats: &'a GameStats) -> Self {
        Self { stats, block: None }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        10 + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        u16::try_from(PieceKind::LEN).unwrap_or(u16::MAX)
            + super::block_vertical_margin(self.block.as_ref())
    }
}

impl Widget for PieceStatsDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let rows = area.layout::<{ PieceKind::LEN }>(&Layout::vertical(
            [Constraint::Length(1); PieceKind::LEN],
        ));
        for (kind, row) in PieceKind::ALL.into_iter().zip(rows) {
            let [label_area, value_area] =
                row.layout(&Layout::horizontal([Constraint::Length(4), Constraint::Fill(1)]));
            Line::from(vec![
                Span::styled("  ", style::piece_block(kind)),
                Span::styled(format!(" {}", kind.as_char()), style::DEFAULT),
            ])
            .render(label_area, buf);
            Line::styled(self.stats.piece_count(kind).to_string(), style::DEFAULT)
                .right_aligned()
                .render(value_area, buf);
        }
    }
}
