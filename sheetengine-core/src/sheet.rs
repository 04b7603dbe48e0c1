//! The grid container: growth, the printable bounding box, and edit
//! orchestration against the [`DependencyManager`].

use std::cell::Cell as Counter;
use std::io::{self, Write};

use crate::cell::{ArithErrorKind, Cell, CellValue, Expression};
use crate::error::SheetError;
use crate::manager::DependencyManager;
use crate::position::Position;

/// The tight bounding box of non-empty grid slots: `{0, 0}` when the sheet is
/// empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridSize {
    pub rows: u32,
    pub cols: u32,
}

#[derive(Debug, Default)]
pub struct Sheet {
    // Row-major dense grid. Physical capacity only ever grows; it is
    // independent of `printable_size`, which can shrink on clear.
    grid: Vec<Vec<Option<Cell>>>,
    printable_size: GridSize,
    manager: DependencyManager,
    /// Current formula-evaluation recursion depth, a defense-in-depth
    /// backstop against pathologically deep (but acyclic) reference chains.
    /// See `crate::MAX_RECURSION`.
    eval_depth: Counter<usize>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn printable_size(&self) -> GridSize {
        self.printable_size
    }

    /// Returns the cell at `pos`, or `None` if it is outside the physically
    /// allocated grid or the slot is empty.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        Ok(self
            .grid
            .get(pos.row as usize)
            .and_then(|row| row.get(pos.col as usize))
            .and_then(|slot| slot.as_ref()))
    }

    /// Sets the text at `pos`, parsing it into the right expression variant,
    /// committing its parent set to the dependency manager (rejecting the
    /// edit if it would close a cycle), growing the grid and printable
    /// bounding box as needed, and materializing any newly-referenced empty
    /// cells. Either every effect below is visible afterward, or (on
    /// `CircularDependency`/`FormulaParse`) none are.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }

        let expr = Expression::parse(text)?;
        let parents = expr.referenced_cells().to_vec();

        let existing = self.get_cell(pos)?.is_some();
        let committed = if existing {
            self.manager.try_update_vertex(pos, parents.clone())
        } else {
            self.manager.try_add_new_vertex(pos, parents.clone())
        };
        if !committed {
            tracing::warn!(?pos, "rejected edit: would create a circular dependency");
            return Err(SheetError::CircularDependency);
        }

        self.grow_to_fit(pos);
        self.grid[pos.row as usize][pos.col as usize] = Some(Cell::new(pos, expr));

        self.printable_size.rows = self.printable_size.rows.max(pos.row + 1);
        self.printable_size.cols = self.printable_size.cols.max(pos.col + 1);

        for parent in parents {
            if self.get_cell(parent)?.is_none() {
                self.set_cell(parent, "")?;
            }
        }

        Ok(())
    }

    /// Clears the cell at `pos`. No-op if `pos` is outside the grid or
    /// already empty. Prunes the cleared cell's incoming edges and
    /// invalidates the cache of its dependents, then shrinks
    /// `printable_size` if `pos` sat on its right or bottom edge.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        if self.get_cell(pos)?.is_none() {
            return Ok(());
        }

        self.grid[pos.row as usize][pos.col as usize] = None;
        self.manager.try_update_vertex(pos, vec![]);

        if pos.row + 1 == self.printable_size.rows {
            self.shrink_rows();
        }
        if pos.col + 1 == self.printable_size.cols {
            self.shrink_cols();
        }

        Ok(())
    }

    pub fn print_values(&self, out: &mut impl Write) -> io::Result<()> {
        self.print_zone(out, |cell, sheet| cell.value(sheet).to_string())
    }

    pub fn print_texts(&self, out: &mut impl Write) -> io::Result<()> {
        self.print_zone(out, |cell, _sheet| cell.text())
    }

    fn print_zone(
        &self,
        out: &mut impl Write,
        render: impl Fn(&Cell, &Sheet) -> String,
    ) -> io::Result<()> {
        for row in 0..self.printable_size.rows {
            for col in 0..self.printable_size.cols {
                if col > 0 {
                    write!(out, "\t")?;
                }
                if let Some(cell) = self
                    .grid
                    .get(row as usize)
                    .and_then(|r| r.get(col as usize))
                    .and_then(|s| s.as_ref())
                {
                    write!(out, "{}", render(cell, self))?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Evaluates `expr` (belonging to the cell at `pos`), consulting and
    /// populating the manager's cache. Called from `Cell::value`, not
    /// exposed publicly: the cell is the unit callers evaluate through.
    pub(crate) fn value_of(&self, pos: Position, expr: &Expression) -> CellValue {
        if self.manager.is_cached(pos) {
            return self.manager.get_cached(pos);
        }

        let depth = self.eval_depth.get() + 1;
        if depth > crate::MAX_RECURSION {
            tracing::error!(
                ?pos,
                depth,
                "aborting evaluation: exceeded max recursion depth"
            );
            return CellValue::ArithError(ArithErrorKind::Ref);
        }

        self.eval_depth.set(depth);
        let value = expr.evaluate(self);
        self.eval_depth.set(depth - 1);

        self.manager.put_cache(pos, value.clone());
        value
    }

    fn grow_to_fit(&mut self, pos: Position) {
        let want_rows = pos.row as usize + 1;
        let want_cols = pos.col as usize + 1;
        let current_cols = self.grid.first().map_or(0, Vec::len).max(want_cols);

        if self.grid.len() < want_rows {
            self.grid.resize_with(want_rows, || vec![None; current_cols]);
        }
        if current_cols > self.grid.first().map_or(0, Vec::len) {
            for row in &mut self.grid {
                row.resize_with(current_cols, || None);
            }
        }
    }

    fn shrink_rows(&mut self) {
        let mut row = self.printable_size.rows;
        while row > 0 {
            row -= 1;
            if self.grid[row as usize].iter().any(Option::is_some) {
                self.printable_size.rows = row + 1;
                return;
            }
        }
        self.printable_size = GridSize::default();
    }

    fn shrink_cols(&mut self) {
        let mut col = self.printable_size.cols;
        while col > 0 {
            col -= 1;
            let col_idx = col as usize;
            if self
                .grid
                .iter()
                .any(|row| row.get(col_idx).is_some_and(Option::is_some))
            {
                self.printable_size.cols = col + 1;
                return;
            }
        }
        self.printable_size.cols = 0;
    }
}
