mod cli;
mod report;
mod util;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use compiscript_lib::{compile::compile, diagnostic::Code};

fn main() -> ExitCode {
    let args = cli::Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[ERROR] {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &cli::Args) -> anyhow::Result<ExitCode> {
    let source = cli::open_input_source(args)?;
    let opts = cli::extract_compile_opts(args);

    let res = compile(source.source(), &opts);

    if !res.is_ok() {
        eprintln!("[ERROR]");
        report::eprint_aggregate(&res, &source);
        // syntax failures exit 2, semantic failures exit 1
        let syntactic = res.diagnostics().any(|(_, d)| d.code() == &Code::Syntax);
        return Ok(ExitCode::from(if syntactic { 2 } else { 1 }));
    }

    eprintln!("[OK]");
    let output = res.into_value().expect("ok results carry a value");
    cli::open_output(args)?
        .write_all(&output)
        .context("Failed to write to output")?;

    Ok(ExitCode::SUCCESS)
}
