use crate::{
    codegen,
    diagnostic::AggregateResult,
    inspectors, passes,
};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Source regenerated from the AST.
    AstPretty,
    AstRustDbg,
    IrRustDbg,
    /// The scope tree dump.
    SymbolTableAscii,
    /// The TAC stream the backend consumes.
    #[default]
    Tac,
}

pub struct CompileOpts {
    output_format: OutputFormat,
}

#[derive(Default)]
pub struct CompileOptsBuilder {
    output_format: OutputFormat,
}

impl CompileOptsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn build(self) -> CompileOpts {
        CompileOpts {
            output_format: self.output_format,
        }
    }
}

/// Runs the staged pipeline up to the requested artifact. Diagnostics
/// accumulate across parsing and analysis; TAC is only generated when the
/// analysis came back clean.
pub fn compile(source: &str, opts: &CompileOpts) -> AggregateResult<Vec<u8>> {
    let ast = passes::parse::parse(source);

    match opts.output_format {
        OutputFormat::AstPretty => {
            return ast.map(|ast| inspectors::pretty::pretty_print(&ast).into_bytes());
        }
        OutputFormat::AstRustDbg => {
            return ast.map(|ast| format!("{ast:#?}\n").into_bytes());
        }
        _ => {}
    }

    let mut ir = ast.and_then(|ast| passes::lower_ast::build_ir_from_ast(&ast));

    match opts.output_format {
        OutputFormat::IrRustDbg => {
            return ir.map(|ir| format!("{ir:#?}\n").into_bytes());
        }
        OutputFormat::SymbolTableAscii => {
            return ir.map(|root| inspectors::symbol_table::inspect(&root).into_bytes());
        }
        _ => {}
    }

    // the run succeeds iff the diagnostic list is empty
    ir.upgrade_diagnostics(|_| true);
    ir.map(|root| {
        codegen::tac::build_from_root(&root)
            .to_string()
            .into_bytes()
    })
}
