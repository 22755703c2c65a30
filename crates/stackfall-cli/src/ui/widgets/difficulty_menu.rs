use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Block as BlockWidget, BlockExt as _, Clear, Widget},
};
use stackfall_engine::Difficulty;

use crate::ui::widgets::style;

/// Difficulty picker shown over the board before a game starts.
#[derive(Debug)]
pub struct DifficultyMenu<'a> {
    selected: Difficulty,
    block: Option<BlockWidget<'a>>,
}

impl<'a> DifficultyMenu<'a> {
    pub fn new(selected: Difficulty) -> Self {
        Self {
            selected,
            block: None,
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn height(&self) -> u16 {
        // One row per preset plus a blank row and the hint
        u16::try_from(Difficulty::ALL.len() + 2).unwrap_or(u16::MAX)
            + super::block_vertical_margin(self.block.as_ref())
    }
}

fn menu_entry(difficulty: Difficulty) -> String {
    let params = difficulty.params();
    format!(
        "{:<10}{:>4}ms x{:.1}",
        difficulty.name(),
        params.base_interval_ms,
        params.score_multiplier
    )
}

impl Widget for DifficultyMenu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let rows = Layout::vertical((0..Difficulty::ALL.len() + 2).map(|_| Constraint::Length(1)))
            .split(area);
        for (difficulty, row) in Difficulty::ALL.into_iter().zip(rows.iter()) {
            let style = if difficulty == self.selected {
                style::SELECTED
            } else {
                style::DEFAULT
            };
            Line::styled(menu_entry(difficulty), style)
                .centered()
                .render(*row, buf);
        }
        if let Some(hint) = rows.last() {
            Line::styled("ENTER to start", style::DIMMED)
                .centered()
                .render(*hint, buf);
        }
    }
}
