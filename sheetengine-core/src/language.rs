//! The formula grammar: arithmetic over numbers and `A1`-style cell
//! references, parsed with `chumsky`.

use chumsky::{number, prelude::*};

use crate::cell::ArithErrorKind;
use crate::position::Position;
use crate::sheet::Sheet;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Ast {
    Number(f64),
    CellRef(Position),
    Neg(Box<Ast>),
    Add(Box<Ast>, Box<Ast>),
    Sub(Box<Ast>, Box<Ast>),
    Mul(Box<Ast>, Box<Ast>),
    Div(Box<Ast>, Box<Ast>),
}

// Parses the formula body (the text after the leading `=`).
pub(crate) fn parser<'src>() -> impl Parser<'src, &'src str, Ast> {
    recursive(|expr| {
        let num = number::number::<{ number::format::STANDARD }, &str, f64, extra::Default>()
            .map(Ast::Number)
            .padded();

        let letters = any()
            .filter(char::is_ascii_alphabetic)
            .repeated()
            .at_least(1)
            .collect::<String>();

        let digits = any()
            .filter(char::is_ascii_digit)
            .repeated()
            .at_least(1)
            .collect::<String>();

        let cellref = letters
            .then(digits)
            .map(|(letters, digits)| Ast::CellRef(cell_ref_position(&letters, &digits)))
            .padded();

        let atom = choice((num, cellref, expr.delimited_by(just('('), just(')')))).padded();

        let op = |c| just(c).padded();

        let unary = op('-').repeated().foldr(atom, |_op, rhs| Ast::Neg(Box::new(rhs)));

        let product = unary.clone().foldl(
            choice((
                op('*').to(Ast::Mul as fn(_, _) -> _),
                op('/').to(Ast::Div as fn(_, _) -> _),
            ))
            .then(unary)
            .repeated(),
            |lhs, (op, rhs)| op(Box::new(lhs), Box::new(rhs)),
        );

        product.clone().foldl(
            choice((
                op('+').to(Ast::Add as fn(_, _) -> _),
                op('-').to(Ast::Sub as fn(_, _) -> _),
            ))
            .then(product)
            .repeated(),
            |lhs, (op, rhs)| op(Box::new(lhs), Box::new(rhs)),
        )
    })
}

// Base-26 letter column (`A`=0, `Z`=25, `AA`=26, ...) plus a 1-indexed
// decimal row, saturating rather than panicking on absurdly large literals.
fn cell_ref_position(letters: &str, digits: &str) -> Position {
    let mut col: u64 = 0;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as u64 + 1;
        col = col.saturating_mul(26).saturating_add(digit);
    }
    let col = col.saturating_sub(1);

    let row: u64 = digits.parse().unwrap_or(u64::MAX);
    let row = row.saturating_sub(1);

    Position::new(
        row.try_into().unwrap_or(u32::MAX),
        col.try_into().unwrap_or(u32::MAX),
    )
}

pub(crate) fn collect_refs(ast: &Ast, out: &mut Vec<Position>) {
    match ast {
        Ast::Number(_) => {}
        Ast::CellRef(p) => out.push(*p),
        Ast::Neg(inner) => collect_refs(inner, out),
        Ast::Add(l, r) | Ast::Sub(l, r) | Ast::Mul(l, r) | Ast::Div(l, r) => {
            collect_refs(l, out);
            collect_refs(r, out);
        }
    }
}

// Re-prints the parsed tree (whitespace in the source is not preserved).
// Parens are re-added only where needed: `Sub`/`Div`'s right operand gets
// one when it shares their precedence, since those aren't associative.
pub(crate) fn canonical_expression(ast: &Ast) -> String {
    fn precedence(ast: &Ast) -> u8 {
        match ast {
            Ast::Number(_) | Ast::CellRef(_) | Ast::Neg(_) => 3,
            Ast::Mul(..) | Ast::Div(..) => 2,
            Ast::Add(..) | Ast::Sub(..) => 1,
        }
    }

    // Renders `ast` as a child at `parent_prec`, parenthesizing when its own
    // precedence is lower, or (for the right operand of a non-associative
    // parent, `strict`) equal.
    fn render(ast: &Ast, parent_prec: u8, is_right: bool, strict: bool) -> String {
        let prec = precedence(ast);
        let body = match ast {
            Ast::Number(n) => format!("{n}"),
            Ast::CellRef(p) => p.to_label(),
            Ast::Neg(inner) => format!("-{}", render(inner, 3, false, false)),
            Ast::Add(l, r) => format!("{}+{}", render(l, 1, false, false), render(r, 1, true, false)),
            Ast::Sub(l, r) => format!("{}-{}", render(l, 1, false, false), render(r, 1, true, true)),
            Ast::Mul(l, r) => format!("{}*{}", render(l, 2, false, false), render(r, 2, true, false)),
            Ast::Div(l, r) => format!("{}/{}", render(l, 2, false, false), render(r, 2, true, true)),
        };

        let needs_parens = prec < parent_prec || (prec == parent_prec && is_right && strict);
        if needs_parens {
            format!("({body})")
        } else {
            body
        }
    }

    render(ast, 0, false, false)
}

fn resolve_number(sheet: &Sheet, pos: Position) -> Result<f64, ArithErrorKind> {
    use crate::cell::CellValue;

    match sheet.get_cell(pos).map(|c| c.value(sheet)) {
        None => Ok(0.0),
        Some(CellValue::Number(n)) => Ok(n),
        Some(CellValue::Text(s)) if s.is_empty() => Ok(0.0),
        Some(CellValue::Text(_)) => Err(ArithErrorKind::Value),
        Some(CellValue::ArithError(_)) => Err(ArithErrorKind::Ref),
    }
}

pub(crate) fn eval(ast: &Ast, sheet: &Sheet) -> Result<f64, ArithErrorKind> {
    match ast {
        Ast::Number(n) => Ok(*n),
        Ast::CellRef(pos) => resolve_number(sheet, *pos),
        Ast::Neg(inner) => Ok(-eval(inner, sheet)?),
        Ast::Add(l, r) => Ok(eval(l, sheet)? + eval(r, sheet)?),
        Ast::Sub(l, r) => Ok(eval(l, sheet)? - eval(r, sheet)?),
        Ast::Mul(l, r) => Ok(eval(l, sheet)? * eval(r, sheet)?),
        Ast::Div(l, r) => {
            let lhs = eval(l, sheet)?;
            let rhs = eval(r, sheet)?;
            if rhs == 0.0 {
                Err(ArithErrorKind::Div0)
            } else {
                Ok(lhs / rhs)
            }
        }
    }
}
