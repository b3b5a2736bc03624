use codespan_reporting::files::{Files, SimpleFile};
use compiscript_lib::diagnostic::AggregateResult;

/// Prints the diagnostics as a bulleted list in `Line L:C - message` form.
pub fn eprint_aggregate<T>(aggregate: &AggregateResult<T>, file: &SimpleFile<String, String>) {
    for (_, diagnostic) in aggregate.diagnostics() {
        let position = file
            .location((), diagnostic.main_span().start())
            .map(|loc| (loc.line_number, loc.column_number))
            .unwrap_or((0, 0));
        eprintln!(
            "  - Line {}:{} - {}",
            position.0,
            position.1,
            diagnostic.message()
        );
        for (span, message) in diagnostic.additional_spans() {
            let Some(message) = message else { continue };
            if let Ok(loc) = file.location((), span.start()) {
                eprintln!(
                    "      (Line {}:{} - {})",
                    loc.line_number, loc.column_number, message
                );
            }
        }
    }
}
