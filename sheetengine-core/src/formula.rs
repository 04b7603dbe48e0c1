//! Public facade over the formula grammar: parses a formula body into an AST
//! once, then serves `execute`/`referenced_cells`/`canonical_expression`
//! against the cached parse.

use chumsky::Parser;

use crate::cell::ArithErrorKind;
use crate::error::FormulaParseError;
use crate::language::{self, Ast};
use crate::position::Position;
use crate::sheet::Sheet;

#[derive(Debug, Clone)]
pub struct Formula {
    ast: Ast,
    referenced: Vec<Position>,
}

impl Formula {
    /// Parses `body` (the formula text with the leading `=` already
    /// stripped) and rejects any cell reference that falls outside the
    /// grid's valid bounds.
    pub(crate) fn parse(body: &str) -> Result<Self, FormulaParseError> {
        let ast = language::parser()
            .parse(body)
            .into_result()
            .map_err(|errs| FormulaParseError::Syntax(format!("{errs:?}")))?;

        let mut referenced = vec![];
        language::collect_refs(&ast, &mut referenced);

        if let Some(bad) = referenced.iter().find(|p| !p.is_valid()) {
            return Err(FormulaParseError::Syntax(format!(
                "cell reference {bad} is out of bounds"
            )));
        }

        referenced.sort();
        referenced.dedup();

        Ok(Self { ast, referenced })
    }

    pub(crate) fn referenced_cells(&self) -> &[Position] {
        &self.referenced
    }

    pub(crate) fn canonical_expression(&self) -> String {
        language::canonical_expression(&self.ast)
    }

    pub(crate) fn execute(&self, sheet: &Sheet) -> Result<f64, ArithErrorKind> {
        language::eval(&self.ast, sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_syntax() {
        assert!(Formula::parse("2+").is_err());
        assert!(Formula::parse("").is_err());
    }

    #[test]
    fn deduplicates_and_sorts_references() {
        let f = Formula::parse("B2+A1+B2").unwrap();
        assert_eq!(
            f.referenced_cells(),
            &[Position::new(0, 0), Position::new(1, 1)]
        );
    }
}
