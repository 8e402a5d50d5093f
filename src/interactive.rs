use std::io::{BufRead, Write};

use thiserror::Error;

use crate::codec::Width;
use crate::error::HarnessError;
use crate::scenario::{RunSummary, Scenario, ScenarioRunner, SortTarget};

/// Above this many values the user has to confirm.
pub const CONFIRM_ABOVE: usize = 256;

#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    Quit,
    Values(Vec<u16>),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("please enter at least one number")]
    Empty,
    #[error("invalid number {0:?}")]
    NotANumber(String),
    #[error(transparent)]
    Range(#[from] HarnessError),
}

pub fn parse_line(line: &str, width: Width) -> Result<Line, InputError> {
    let line = line.trim();
    if ["quit", "exit", "q"].iter().any(|q| line.eq_ignore_ascii_case(q)) {
        return Ok(Line::Quit);
    }
    if line.is_empty() {
        return Err(InputError::Empty);
    }
    let mut values = Vec::new();
    for tok in line.split_whitespace() {
        let v: i64 = tok.parse().map_err(|_| InputError::NotANumber(tok.to_string()))?;
        values.push(width.check(v)?);
    }
    Ok(Line::Values(values))
}

/// Prompt loop: one ad-hoc scenario per accepted line until `quit` or EOF.
pub fn run_session<T, I, W>(runner: &mut ScenarioRunner<T>, input: I, mut out: W) -> std::io::Result<RunSummary>
where
    T: SortTarget,
    I: BufRead,
    W: Write,
{
    let width = runner.target().width();
    let mut lines = input.lines();
    let mut summary = RunSummary::default();

    writeln!(out, "Range: 0-{} ({}), type 'quit' to exit", width.max(), width)?;
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let values = match parse_line(&line, width) {
            Ok(Line::Quit) => break,
            Ok(Line::Values(v)) => v,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };
        if values.len() > CONFIRM_ABOVE {
            write!(out, "{} values (recommended <= {}). Continue? (y/n): ", values.len(), CONFIRM_ABOVE)?;
            out.flush()?;
            let answer = lines.next().transpose()?.unwrap_or_default();
            if !answer.trim().eq_ignore_ascii_case("y") {
                continue;
            }
        }

        let name = format!("interactive #{}", summary.reports.len() + 1);
        let report = runner.run_one(&Scenario::new(name, values));
        match &report.outcome {
            Ok(()) => writeln!(out, "PASS")?,
            Err(e) => writeln!(out, "FAIL: {e}")?,
        }
        summary.reports.push(report);
    }
    writeln!(out, "Goodbye!")?;
    Ok(summary)
}
