//! Progress reporting for the search loop.

use std::io::{self, Write};

use crate::poly::RationalPolynomial;

/// Receives a notification before and after every fit attempt.
pub trait Progress {
    /// About to fit the given candidate structure.
    fn trying(&mut self, p_idxs: &[usize], q_idxs: &[usize]);

    /// Finished fitting; `error` is the evaluator's score.
    fn tried(&mut self, ratpoly: &RationalPolynomial, error: f64);
}

/// Writes an in-place status line per candidate and a finished line for
/// every candidate that beats the running best (or comes close enough to
/// be interesting).
pub struct ConsolePrinter<W> {
    out: W,
    pad_to: usize,
    print_all_below: f64,
    best: f64,
    line: String,
}

impl ConsolePrinter<io::Stdout> {
    pub fn stdout() -> ConsolePrinter<io::Stdout> {
        ConsolePrinter::with_writer(io::stdout())
    }
}

impl<W: Write> ConsolePrinter<W> {
    pub fn with_writer(out: W) -> ConsolePrinter<W> {
        ConsolePrinter {
            out,
            pad_to: 40,
            print_all_below: 0.012,
            best: f64::INFINITY,
            line: String::new(),
        }
    }
}

impl<W: Write> Progress for ConsolePrinter<W> {
    fn trying(&mut self, p_idxs: &[usize], q_idxs: &[usize]) {
        let line = format!("{p_idxs:?}, {q_idxs:?}");

        let _ = write!(self.out, "{line:<pad$}\r", pad = self.pad_to);
        let _ = self.out.flush();

        self.line = line;
    }

    fn tried(&mut self, _ratpoly: &RationalPolynomial, error: f64) {
        if error <= self.best.max(self.print_all_below) {
            let mut line = format!("{} ..", self.line);

            while line.len() < self.pad_to {
                line.push('.');
            }

            let star = if error <= self.best { " *" } else { "" };
            let _ =
                writeln!(self.out, "{line} {:.4}%{star}", 100.0 * error);
        }

        self.best = self.best.min(error);
        self.line.clear();
    }
}
