//! The structural error taxonomy. Arithmetic failures are not part of this
//! enum; they flow through [`crate::cell::CellValue`] as data instead.

use thiserror::Error;

use crate::position::Position;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormulaParseError {
    #[error("could not parse formula: {0}")]
    Syntax(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SheetError {
    #[error("position out of bounds: row {}, col {}", .0.row, .0.col)]
    InvalidPosition(Position),

    #[error("setting this cell would create a circular dependency")]
    CircularDependency,

    #[error(transparent)]
    FormulaParse(#[from] FormulaParseError),
}
