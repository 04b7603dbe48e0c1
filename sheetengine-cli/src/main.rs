//! A line-oriented REPL driving `sheetengine-core`. Each line is one command:
//!
//! ```text
//! set <CELL> <text...>      e.g. set A1 =2+3
//! clear <CELL>
//! get <CELL>
//! print                      print_values
//! texts                      print_texts
//! size                       printable_size
//! quit
//! ```
//!
//! This is plumbing only, with no behavior of its own beyond parsing a
//! command line and calling straight through to the library.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use sheetengine_core::{Position, Sheet};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("sheetengine starting");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut sheet = Sheet::new();

    for line in stdin.lock().lines() {
        let line = line.context("reading from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match run_command(&mut sheet, line, &mut stdout) {
            Ok(Continue::Keep) => {}
            Ok(Continue::Quit) => break,
            Err(err) => eprintln!("error: {err}"),
        }
    }

    tracing::info!("sheetengine exiting");
    Ok(())
}

enum Continue {
    Keep,
    Quit,
}

fn run_command(sheet: &mut Sheet, line: &str, out: &mut impl Write) -> Result<Continue> {
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();

    match cmd {
        "quit" | "exit" => return Ok(Continue::Quit),

        "set" => {
            let (cell, text) = rest
                .split_once(char::is_whitespace)
                .unwrap_or((rest, ""));
            let pos = parse_cell(cell)?;
            sheet.set_cell(pos, text.trim_start())?;
            tracing::debug!(%cell, "set cell");
        }

        "clear" => {
            let pos = parse_cell(rest.trim())?;
            sheet.clear_cell(pos)?;
            tracing::debug!(cell = rest.trim(), "cleared cell");
        }

        "get" => {
            let pos = parse_cell(rest.trim())?;
            match sheet.get_cell(pos)? {
                Some(cell) => writeln!(out, "{}\t{}", cell.text(), cell.value(sheet))?,
                None => writeln!(out, "(empty)")?,
            }
        }

        "print" => sheet.print_values(out)?,
        "texts" => sheet.print_texts(out)?,

        "size" => {
            let size = sheet.printable_size();
            writeln!(out, "{} {}", size.rows, size.cols)?;
        }

        other => anyhow::bail!("unknown command {other:?}"),
    }

    out.flush()?;
    Ok(Continue::Keep)
}

fn parse_cell(label: &str) -> Result<Position> {
    Position::parse(label).with_context(|| format!("invalid cell address {label:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(sheet: &mut Sheet, line: &str) -> String {
        let mut out = Vec::new();
        run_command(sheet, line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut sheet = Sheet::new();
        run(&mut sheet, "set A1 =2+3");
        assert_eq!(run(&mut sheet, "get A1"), "=2+3\t5\n");
    }

    #[test]
    fn print_reflects_values() {
        let mut sheet = Sheet::new();
        run(&mut sheet, "set A1 1");
        run(&mut sheet, "set A2 =A1+1");
        assert_eq!(run(&mut sheet, "print"), "1\n2\n");
    }

    #[test]
    fn size_reports_printable_bbox() {
        let mut sheet = Sheet::new();
        run(&mut sheet, "set B2 x");
        assert_eq!(run(&mut sheet, "size"), "2 2\n");
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut sheet = Sheet::new();
        let mut out = Vec::new();
        assert!(run_command(&mut sheet, "bogus", &mut out).is_err());
    }

    #[test]
    fn quit_signals_the_loop_to_stop() {
        let mut sheet = Sheet::new();
        let mut out = Vec::new();
        assert!(matches!(
            run_command(&mut sheet, "quit", &mut out).unwrap(),
            Continue::Quit
        ));
    }
}
