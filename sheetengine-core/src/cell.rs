use std::fmt;

use crate::error::FormulaParseError;
use crate::formula::Formula;
use crate::position::Position;
use crate::sheet::Sheet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithErrorKind {
    /// Errors propagate through references uniformly as `#REF!`, regardless
    /// of the upstream error's own kind.
    Ref,
    Value,
    Div0,
}

impl fmt::Display for ArithErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = match self {
            ArithErrorKind::Div0 => "#ARITHM!",
            ArithErrorKind::Value => "#VALUE!",
            ArithErrorKind::Ref => "#REF!",
        };
        write!(f, "{rendered}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    ArithError(ArithErrorKind),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::ArithError(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    Empty,
    RawText(String),
    Formula(Formula),
}

impl Expression {
    pub fn parse(text: &str) -> Result<Self, FormulaParseError> {
        if text.is_empty() {
            Ok(Expression::Empty)
        } else if text.as_bytes()[0] != b'=' || text.len() == 1 {
            Ok(Expression::RawText(text.to_string()))
        } else {
            Ok(Expression::Formula(Formula::parse(&text[1..])?))
        }
    }

    pub fn referenced_cells(&self) -> &[Position] {
        match self {
            Expression::Empty | Expression::RawText(_) => &[],
            Expression::Formula(f) => f.referenced_cells(),
        }
    }

    pub fn text(&self) -> String {
        match self {
            Expression::Empty => String::new(),
            Expression::RawText(s) => s.clone(),
            Expression::Formula(f) => format!("={}", f.canonical_expression()),
        }
    }

    pub fn evaluate(&self, sheet: &Sheet) -> CellValue {
        match self {
            Expression::Empty => CellValue::Text(String::new()),
            Expression::RawText(s) => match s.strip_prefix('\'') {
                Some(escaped) => CellValue::Text(escaped.to_string()),
                None => CellValue::Text(s.clone()),
            },
            Expression::Formula(f) => match f.execute(sheet) {
                Ok(n) => CellValue::Number(n),
                Err(kind) => CellValue::ArithError(kind),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pos: Position,
    expr: Expression,
}

impl Cell {
    pub fn new(pos: Position, expr: Expression) -> Self {
        Self { pos, expr }
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn set(&mut self, text: &str) -> Result<(), FormulaParseError> {
        self.expr = Expression::parse(text)?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.expr = Expression::Empty;
    }

    pub fn text(&self) -> String {
        self.expr.text()
    }

    pub fn referenced_cells(&self) -> &[Position] {
        self.expr.referenced_cells()
    }

    // Recursing into a formula's references through `sheet` always
    // terminates: the reference graph backing it is kept acyclic, and
    // `Sheet::value_of` caps the depth regardless.
    pub fn value(&self, sheet: &Sheet) -> CellValue {
        sheet.value_of(self.pos, &self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_classifies_as_empty() {
        let expr = Expression::parse("").unwrap();
        assert!(matches!(expr, Expression::Empty));
    }

    #[test]
    fn single_equals_is_raw_text() {
        let expr = Expression::parse("=").unwrap();
        assert!(matches!(expr, Expression::RawText(ref s) if s == "="));
    }

    #[test]
    fn leading_apostrophe_escapes_formula_marker() {
        let expr = Expression::parse("'=1+2").unwrap();
        assert_eq!(expr.text(), "'=1+2");
        match expr {
            Expression::RawText(s) => assert_eq!(s.strip_prefix('\'').unwrap(), "=1+2"),
            _ => panic!("expected raw text"),
        }
    }

    #[test]
    fn formula_text_round_trips_through_canonical_form() {
        let expr = Expression::parse("=2+3").unwrap();
        assert_eq!(expr.text(), "=2+3");
    }

    #[test]
    fn arith_error_kinds_render_as_spreadsheet_error_strings() {
        assert_eq!(ArithErrorKind::Div0.to_string(), "#ARITHM!");
        assert_eq!(ArithErrorKind::Value.to_string(), "#VALUE!");
        assert_eq!(ArithErrorKind::Ref.to_string(), "#REF!");
    }
}
