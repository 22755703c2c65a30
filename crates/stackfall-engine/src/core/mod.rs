pub use self::{field::*, piece::*};

pub(crate) mod field;
pub(crate) mod piece;

const FIELD_WIDTH: usize = 10;
const FIELD_HEIGHT: usize = 20;
