//! ASCII rendering of the scope tree: one scope per indent level, each
//! symbol as `kind name : type [const] [init]`.

use std::fmt::Write;

use crate::ir::{self, ScopeId, SymbolKind};

pub fn inspect(root: &ir::Root) -> String {
    let mut out = String::new();
    scope(root, root.table.global_scope(), 0, &mut out);
    out
}

fn scope(root: &ir::Root, id: ScopeId, indent: usize, out: &mut String) {
    let prefix = "  ".repeat(indent);
    let s = root.table.scope(id);
    let _ = writeln!(out, "{prefix}{} scope", s.kind.name());

    for symbol_id in s.symbols() {
        let symbol = root.table.symbol(symbol_id);
        let line = match &symbol.kind {
            SymbolKind::Variable(var) => {
                let init = if var.initialized { " [init]" } else { "" };
                format!("variable {} : {}{init}", symbol.name, var.ty)
            }
            SymbolKind::Constant(konst) => {
                format!("constant {} : {} [const] [init]", symbol.name, konst.ty)
            }
            SymbolKind::Function(func) => {
                let item = root.function(*func);
                let params = item
                    .params
                    .iter()
                    .map(|(_, ty)| ty.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "function {} : ({params}) -> {}",
                    symbol.name, item.return_type
                )
            }
            SymbolKind::Class(class) => {
                let item = root.class(*class);
                match item.parent {
                    Some(parent) => format!(
                        "class {} : {} ({} bytes)",
                        symbol.name,
                        root.class(parent).name,
                        item.size
                    ),
                    None => format!("class {} ({} bytes)", symbol.name, item.size),
                }
            }
        };
        let _ = writeln!(out, "{prefix}  {line}");
    }

    for &child in s.children() {
        scope(root, child, indent + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{lower_ast, parse};

    #[test]
    fn renders_the_scope_tree() {
        let source = "\
            class P { let edad: integer; } \
            function f(a: integer): integer { let b: integer = a; return b; } \
            const limit: integer = 10;";
        let root = parse::parse(source)
            .and_then(|ast| lower_ast::build_ir_from_ast(&ast))
            .into_value()
            .unwrap();
        let dump = inspect(&root);

        assert!(dump.starts_with("global scope\n"));
        assert!(dump.contains("class P (4 bytes)"));
        assert!(dump.contains("function f : (integer) -> integer"));
        assert!(dump.contains("constant limit : integer [const] [init]"));
        assert!(dump.contains("variable a : integer [init]"));
        // nested scopes indent one level per depth
        assert!(dump.contains("\n  function scope\n"));
    }
}
