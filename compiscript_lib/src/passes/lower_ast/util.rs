use std::collections::HashMap;
use std::rc::Rc;

use crate::ast;
use crate::diagnostic::{AggregateResult, DiagnosticBuilder, Span};
use crate::ir::{
    self, table::DeclareError, BlockNode, ClassId, ClassItem, ClassRef, FunctionId, FunctionItem,
    Stmt, StmtNode, Symbol, SymbolId, SymbolTable, Type,
};

/// All mutable state of the analysis: the arenas that end up in [`ir::Root`]
/// plus the bits of walking context that are not expressible as scopes.
pub(super) struct Analyzer {
    pub table: SymbolTable,
    pub classes: Vec<ClassItem>,
    pub functions: Vec<FunctionItem>,
    pub globals: Vec<StmtNode>,
    /// Bindings that name class fields; a bare reference to one of these in
    /// a method body reads through `this`.
    pub field_symbols: HashMap<SymbolId, (ClassId, usize)>,
    /// `break` is also legal directly inside a switch.
    pub switch_depth: u32,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            field_symbols: HashMap::new(),
            switch_depth: 0,
        }
    }

    pub fn into_root(self) -> ir::Root {
        ir::Root {
            table: self.table,
            classes: self.classes,
            functions: self.functions,
            globals: self.globals,
        }
    }

    pub fn add_class(&mut self, item: ClassItem) -> ClassId {
        let id = ClassId(self.classes.len());
        self.classes.push(item);
        id
    }

    pub fn add_function(&mut self, item: FunctionItem) -> FunctionId {
        let id = FunctionId(self.functions.len());
        self.functions.push(item);
        id
    }

    pub fn class_type(&self, id: ClassId) -> Type {
        Type::Class(ClassRef {
            id,
            name: Rc::from(self.classes[id.0].name.as_str()),
        })
    }

    /// Method resolution walking the parent chain, usable before `Root`
    /// exists.
    pub fn resolve_method(&self, class: ClassId, name: &str) -> Option<FunctionId> {
        let mut current = Some(class);
        while let Some(id) = current {
            let item = &self.classes[id.0];
            if let Some(found) = item.own_method(name) {
                return Some(found);
            }
            current = item.parent;
        }
        None
    }

    /// Constructor resolution: own first, then inherited.
    pub fn resolve_constructor(&self, class: ClassId) -> Option<FunctionId> {
        let mut current = Some(class);
        while let Some(id) = current {
            let item = &self.classes[id.0];
            if let Some(ctor) = item.constructor {
                return Some(ctor);
            }
            current = item.parent;
        }
        None
    }

    /// Turns a written type annotation into a [`Type`], resolving class
    /// names. Failures recover with [`Type::Unknown`].
    pub fn resolve_type(&mut self, node: &ast::TypeNode, allow_void: bool) -> AggregateResult<Type> {
        match &node.data {
            ast::TypeName::Integer => AggregateResult::new_ok(Type::Integer),
            ast::TypeName::String => AggregateResult::new_ok(Type::String),
            ast::TypeName::Boolean => AggregateResult::new_ok(Type::Boolean),
            ast::TypeName::Void => {
                if allow_void {
                    AggregateResult::new_ok(Type::Void)
                } else {
                    AggregateResult::new_rec(
                        Type::Unknown,
                        DiagnosticBuilder::new(node.span).build_void_variable(),
                    )
                }
            }
            ast::TypeName::Array(inner) => self.resolve_type(inner, false).map(Type::array_of),
            ast::TypeName::Named(name) => match self.table.resolve(name) {
                Some(id) => match &self.table.symbol(id).kind {
                    ir::SymbolKind::Class(class) => AggregateResult::new_ok(self.class_type(*class)),
                    _ => AggregateResult::new_rec(
                        Type::Unknown,
                        DiagnosticBuilder::new(node.span).build_not_a_type(name),
                    ),
                },
                None => AggregateResult::new_rec(
                    Type::Unknown,
                    DiagnosticBuilder::new(node.span).build_undeclared_ident(name),
                ),
            },
        }
    }

    /// Declares into the current scope, converting failures into
    /// diagnostics. The value is `None` when the declaration was rejected.
    pub fn declare(&mut self, symbol: Symbol) -> AggregateResult<Option<SymbolId>> {
        let name = symbol.name.clone();
        let span = symbol.span;
        match self.table.declare(symbol) {
            Ok(id) => AggregateResult::new_ok(Some(id)),
            Err(DeclareError::Duplicate(existing)) => {
                let original_span = self.table.symbol(existing).span;
                AggregateResult::new_rec(
                    None,
                    DiagnosticBuilder::new(span).build_duplicate_declaration(&name, original_span),
                )
            }
            Err(DeclareError::ReservedWord) => AggregateResult::new_rec(
                None,
                DiagnosticBuilder::new(span).build_reserved_word(&name),
            ),
        }
    }
}

/// `true` when every path through the block reaches a `return`.
///
/// Loops and switches are treated conservatively (they may run zero times or
/// fall through), except `do-while`, whose body always executes.
pub(super) fn always_returns(block: &BlockNode) -> bool {
    block.stmts.iter().any(stmt_always_returns)
}

fn stmt_always_returns(stmt: &StmtNode) -> bool {
    match &stmt.stmt {
        Stmt::Return(_) => true,
        Stmt::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => always_returns(then_branch) && always_returns(else_branch),
        Stmt::DoWhile { body, .. } => always_returns(body),
        Stmt::Block(block) => always_returns(block),
        Stmt::Try { try_block, .. } => always_returns(try_block),
        _ => false,
    }
}

/// Span of a function prototype for diagnostics that outlive the body walk.
pub(super) fn prototype_span(decl: &ast::FunctionDeclaration) -> Span {
    decl.prototype_span
}
