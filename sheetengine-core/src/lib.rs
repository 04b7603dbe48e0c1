//! A lazily-evaluated, memoized spreadsheet grid: positions, the reference
//! graph that tracks formula dependencies, the dependency manager that
//! mediates graph mutation and value caching, and the sheet itself.
//!
//! The formula grammar (arithmetic over numbers and `A1`-style references)
//! lives in [`language`] and is surfaced through [`formula::Formula`];
//! callers reach it only indirectly, through [`cell::Expression::parse`].

pub mod cell;
pub mod error;
pub mod formula;
mod graph;
mod language;
pub mod manager;
pub mod position;
pub mod sheet;

pub use cell::{ArithErrorKind, Cell, CellValue, Expression};
pub use error::{FormulaParseError, SheetError};
pub use position::Position;
pub use sheet::{GridSize, Sheet};

/// Recursion depth at which formula evaluation aborts rather than continue
/// walking references, a defense-in-depth backstop: the reference graph is
/// kept acyclic by construction, so ordinary evaluation never approaches
/// this depth, but a pathological chain of single-parent formulas could
/// still exhaust the stack without it.
pub const MAX_RECURSION: usize = 256;
