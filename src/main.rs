use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use ratfit::grid;
use ratfit::opts::Opts;
use ratfit::search::fit::{approximate, Fit};
use ratfit::search::generator::{Candidate, IdxGenerator};
use ratfit::search::report::{ConsolePrinter, Progress};

fn search(opts: &Opts) -> Result<Fit, Box<dyn Error>> {
    let mut x = grid::linspace(opts.samples, opts.lo, opts.hi);

    if let Some(anchor) = opts.concentrate {
        x = grid::concentrate(x, anchor, opts.skew)?;
    }

    let truth: Vec<f64> = x.iter().map(|&v| opts.target.eval(v)).collect();

    let evaluator =
        opts.evaluator
            .build(opts.tolerance, opts.weight_abs, opts.weight_rel);

    if opts.tolerance.is_none() && opts.limit.is_none() {
        log::warn!(
            "no tolerance and no candidate limit; the search will not stop"
        );
    }

    let stream = IdxGenerator::new(1, opts.blitz).infinite(2);
    let candidates: Box<dyn Iterator<Item = Candidate>> =
        match opts.limit {
            Some(limit) => Box::new(stream.take(limit)),
            None => Box::new(stream),
        };

    let mut printer = ConsolePrinter::stdout();
    let reporter: Option<&mut dyn Progress> =
        (!opts.quiet).then_some(&mut printer);

    Ok(approximate(
        &truth,
        &[&x],
        candidates,
        evaluator.as_ref(),
        reporter,
    )?)
}

fn write_output(fit: &Fit, file: &Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let mut out: Box<dyn Write> = if let Some(path) = file {
        Box::new(File::create(path)?)
    } else {
        Box::new(io::stdout())
    };

    writeln!(out, "f(x) = {}", fit.ratpoly.display(true))?;
    writeln!(out, "error: {:.6}%", 100.0 * fit.error)?;
    writeln!(out)?;
    writeln!(out, "{}", fit.ratpoly.code()?)?;

    Ok(())
}

fn main() -> ExitCode {
    let opts = Opts::parse();

    env_logger::Builder::new()
        .filter_level(opts.log_level)
        .init();

    let fit = match search(&opts) {
        Ok(fit) => fit,
        Err(err) => {
            eprintln!("error: {err}");

            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = write_output(&fit, &opts.output) {
        eprintln!("error: {err}");

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
