use crate::util::PathOrStd;

use compiscript_lib::compile::{self, CompileOpts, CompileOptsBuilder};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use codespan_reporting::files::SimpleFile;

use std::{fs::File, io::Read};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Three-address code, the backend contract.
    Tac,
    /// ASCII dump of the scope tree.
    SymbolTable,
    /// Source regenerated from the AST.
    Ast,
    AstDbg,
    IrDbg,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The input `.cps` file, use `-` for stdin.
    input_path: PathOrStd,

    /// What to emit on a clean run.
    #[arg(short = 'e', long = "emit", value_name = "FORMAT", value_enum)]
    emit: Option<OutputFormat>,

    /// The output file, use `-` for stdout.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output_path: PathOrStd,
}

pub fn open_input_source(args: &Args) -> anyhow::Result<SimpleFile<String, String>> {
    match &args.input_path {
        PathOrStd::Path(path) => {
            if !path.exists() {
                bail!("Input file `{}` doesn't exist", path.display());
            }
            let mut handle = File::open(path)
                .with_context(|| format!("Failed to open input file `{}`", path.display()))?;
            let mut s = String::new();
            handle
                .read_to_string(&mut s)
                .with_context(|| format!("Failed to read from input file `{}`", path.display()))?;

            Ok(SimpleFile::new(
                path.file_name().unwrap().to_string_lossy().into_owned(),
                s,
            ))
        }
        PathOrStd::StdStream => {
            let mut handle = std::io::stdin().lock();
            let mut s = String::new();
            handle
                .read_to_string(&mut s)
                .context("Failed to read from stdin")?;

            Ok(SimpleFile::new("stdin stream".to_owned(), s))
        }
    }
}

pub fn extract_compile_opts(args: &Args) -> CompileOpts {
    let opts = CompileOptsBuilder::new();

    let opts = if let Some(format) = args.emit {
        let format = match format {
            OutputFormat::Tac => compile::OutputFormat::Tac,
            OutputFormat::SymbolTable => compile::OutputFormat::SymbolTableAscii,
            OutputFormat::Ast => compile::OutputFormat::AstPretty,
            OutputFormat::AstDbg => compile::OutputFormat::AstRustDbg,
            OutputFormat::IrDbg => compile::OutputFormat::IrRustDbg,
        };
        opts.output_format(format)
    } else {
        opts
    };

    opts.build()
}

pub fn open_output(args: &Args) -> anyhow::Result<Box<dyn std::io::Write>> {
    match &args.output_path {
        PathOrStd::Path(path) => std::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path)
            .map(|f| Box::new(f) as Box<dyn std::io::Write>)
            .with_context(|| format!("Failed to open output file `{}`", path.display())),
        PathOrStd::StdStream => Ok(Box::new(std::io::stdout().lock())),
    }
}
