pub mod expr;
pub mod stmt;
pub mod table;
pub mod ty;

pub use expr::*;
pub use stmt::*;
pub use table::*;
pub use ty::*;

use crate::diagnostic::Span;

/// The analyzed program: symbol/class/function arenas plus the checked
/// bodies. Produced by `passes::lower_ast`, consumed by `codegen::tac` and
/// the inspectors.
#[derive(Debug, Clone)]
pub struct Root {
    pub table: SymbolTable,
    pub classes: Vec<ClassItem>,
    pub functions: Vec<FunctionItem>,
    /// Global statements in source order; the TAC stage wraps them in a
    /// synthetic `main`.
    pub globals: Vec<StmtNode>,
}

#[derive(Debug, Clone)]
pub struct FunctionItem {
    pub name: String,
    pub span: Span,
    pub params: Vec<(String, Type)>,
    pub return_type: Type,
    pub method_of: Option<ClassId>,
    pub is_constructor: bool,
    /// Parameter bindings in order, filled when the body is lowered.
    pub param_symbols: Vec<SymbolId>,
    /// The receiver binding for methods and constructors.
    pub this_symbol: Option<SymbolId>,
    pub body: Option<BlockNode>,
}

impl FunctionItem {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The name used in TAC `FUNCTION`/`CALL`: constructors run as `newC`.
    pub fn codegen_name(&self, root: &Root) -> String {
        if self.is_constructor {
            let class = self
                .method_of
                .expect("ICE: constructor without a class");
            format!("new{}", root.class(class).name)
        } else {
            self.name.clone()
        }
    }
}

impl Root {
    pub fn class(&self, id: ClassId) -> &ClassItem {
        &self.classes[id.0]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionItem {
        &self.functions[id.0]
    }

    /// Method resolution: own methods first, then up the parent chain.
    pub fn resolve_method(&self, class: ClassId, name: &str) -> Option<FunctionId> {
        let mut current = Some(class);
        while let Some(id) = current {
            let item = self.class(id);
            if let Some(found) = item.own_method(name) {
                return Some(found);
            }
            current = item.parent;
        }
        None
    }

    /// Fields include the inherited ones, so no chain walk is needed.
    pub fn resolve_field(&self, class: ClassId, name: &str) -> Option<&FieldItem> {
        self.class(class).field(name)
    }
}
