use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};
use stackfall_engine::{Cell, PieceKind};

use crate::ui::widgets::BlockDisplay;

/// A single piece in its spawn orientation, as shown in the hold and next panels.
#[derive(Debug)]
pub struct PieceDisplay<'a> {
    piece: Option<PieceKind>,
    dimmed: bool,
    block: Option<BlockWidget<'a>>,
}

impl<'a> PieceDisplay<'a> {
    pub fn new() -> Self {
        Self {
            piece: None,
            dimmed: false,
            block: None,
        }
    }

    pub fn piece(self, piece: PieceKind) -> Self {
        Self {
            piece: Some(piece),
            ..self
        }
    }

    /// Draws the piece as an outline, e.g. when the hold slot is spent.
    pub fn dimmed(self, dimmed: bool) -> Self {
        Self { dimmed, ..self }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        4 * BlockDisplay::width() + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        2 * BlockDisplay::height() + super::block_vertical_margin(self.block.as_ref())
    }
}

/// Bounding box of the occupied cells of a spawn shape: `(min_x, min_y, width, height)`.
fn occupied_bounds(kind: PieceKind) -> (usize, usize, usize, usize) {
    let shape = kind.spawn_shape();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (usize::MAX, usize::MAX, 0, 0);
    for (y, row) in shape.rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }
    (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
}

impl Widget for PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let Some(piece) = self.piece else {
            for row in area.rows() {
                BlockDisplay::from_cell(Cell::Empty, false).render(row, buf);
            }
            return;
        };

        let shape = piece.spawn_shape();
        let (min_x, min_y, width, height) = occupied_bounds(piece);
        let (width_u16, height_u16) = (
            u16::try_from(width).unwrap_or(u16::MAX),
            u16::try_from(height).unwrap_or(u16::MAX),
        );
        let piece_area = area.centered(
            Constraint::Length(width_u16 * BlockDisplay::width()),
            Constraint::Length(height_u16 * BlockDisplay::height()),
        );

        let col_constraints = (0..width).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints = (0..height).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);
        let grid_rows = piece_area
            .layout_vec(&vertical)
            .into_iter()
            .map(|row| row.layout_vec(&horizontal));

        for (y, grid_row) in grid_rows.enumerate() {
            for (x, grid_cell) in grid_row.into_iter().enumerate() {
                let cell = shape.cell(min_x + x, min_y + y);
                let block = match cell.kind() {
                    Some(kind) if self.dimmed => BlockDisplay::ghost(kind),
                    _ => BlockDisplay::from_cell(cell, false),
                };
                block.render(grid_cell, buf);
            }
        }
    }
}
