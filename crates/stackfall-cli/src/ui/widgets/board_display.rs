use std::iter;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt, Widget},
};
use stackfall_engine::{Cell, Field, Piece};

use crate::ui::widgets::BlockDisplay;

/// The playfield with the active piece and its landing outline drawn over it.
#[derive(Debug)]
pub struct BoardDisplay<'a> {
    field: &'a Field,
    ghost: Option<Piece>,
    active_piece: Option<Piece>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> BoardDisplay<'a> {
    pub fn new(field: &'a Field) -> Self {
        Self {
            field,
            ghost: None,
            active_piece: None,
            block: None,
        }
    }

    pub fn ghost(self, piece: Piece) -> Self {
        Self {
            ghost: Some(piece),
            ..self
        }
    }

    pub fn active_piece(self, piece: Piece) -> Self {
        Self {
            active_piece: Some(piece),
            ..self
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        10 * BlockDisplay::width() + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        20 * BlockDisplay::height() + super::block_vertical_margin(self.block.as_ref())
    }

    fn block_at(&self, x: i32, y: i32) -> BlockDisplay {
        let covers = |piece: &Option<Piece>| {
            piece
                .as_ref()
                .filter(|piece| piece.occupied_positions().any(|pos| pos == (x, y)))
                .map(Piece::kind)
        };
        if let Some(kind) = covers(&self.active_piece) {
            return BlockDisplay::from_cell(Cell::Occupied(kind), true);
        }
        let cell = self.field.cell(x, y).unwrap_or_default();
        if cell.is_empty()
            && let Some(kind) = covers(&self.ghost)
        {
            return BlockDisplay::ghost(kind);
        }
        BlockDisplay::from_cell(cell, true)
    }
}

impl Widget for BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let col_constraints =
            (0..Field::WIDTH).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints =
            (0..Field::HEIGHT).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);

        let grid_cells = area
            .layout::<{ Field::HEIGHT }>(&vertical)
            .into_iter()
            .map(|row| row.layout::<{ Field::WIDTH }>(&horizontal));

        for (grid_row, y) in iter::zip(grid_cells, 0..) {
            for (grid_cell, x) in iter::zip(grid_row, 0..) {
                self.block_at(x, y).render(grid_cell, buf);
            }
        }
    }
}
