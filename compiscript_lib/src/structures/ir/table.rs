//! The scope tree and symbol arenas.
//!
//! Scopes, symbols, and classes live in flat vectors owned by the table;
//! relations (parent scope, class parent, symbol's scope) are index fields.
//! Ids are only meaningful for the table they came from.

use super::ty::Type;
use crate::diagnostic::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub(crate) usize);

/// Identifiers that lex as plain identifiers but may never be declared.
pub const RESERVED_WORDS: &[&str] = &["integer", "string", "boolean", "void", "len"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Class,
    Block,
    /// A block scope that is also a valid `break`/`continue` target.
    Loop,
}

impl ScopeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Function => "function",
            ScopeKind::Class => "class",
            ScopeKind::Block => "block",
            ScopeKind::Loop => "loop",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Declaration order is preserved; lookups are linear, scopes are small.
    symbols: Vec<(String, SymbolId)>,
    children: Vec<ScopeId>,
    /// Set on `Function` scopes.
    pub function: Option<FunctionId>,
    /// Set on `Class` scopes.
    pub class: Option<ClassId>,
}

impl Scope {
    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.iter().map(|(_, id)| *id)
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub span: Span,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Variable(VariableSymbol),
    Constant(ConstantSymbol),
    Function(FunctionId),
    Class(ClassId),
}

#[derive(Debug, Clone)]
pub struct VariableSymbol {
    pub ty: Type,
    pub initialized: bool,
}

#[derive(Debug, Clone)]
pub struct ConstantSymbol {
    pub ty: Type,
}

impl Symbol {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            SymbolKind::Variable(_) => "variable",
            SymbolKind::Constant(_) => "constant",
            SymbolKind::Function(_) => "function",
            SymbolKind::Class(_) => "class",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldItem {
    pub name: String,
    pub ty: Type,
    /// Byte offset from the object base; fixed once the class body closes.
    pub offset: u32,
    pub span: Span,
    /// `Some` when the field was laid out from an ancestor.
    pub inherited_from: Option<ClassId>,
}

#[derive(Debug, Clone)]
pub struct ClassItem {
    pub name: String,
    pub span: Span,
    pub parent: Option<ClassId>,
    /// Inherited fields first (in ancestor declaration order), then own
    /// fields in declaration order. Every slot is 4 bytes wide.
    pub fields: Vec<FieldItem>,
    /// Own methods only; resolution walks the parent chain.
    pub methods: Vec<(String, FunctionId)>,
    pub constructor: Option<FunctionId>,
    pub size: u32,
}

impl ClassItem {
    pub fn field(&self, name: &str) -> Option<&FieldItem> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn own_method(&self, name: &str) -> Option<FunctionId> {
        self.methods
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }
}

#[derive(Debug)]
pub enum DeclareError {
    /// The name is already bound in the current scope.
    Duplicate(SymbolId),
    ReservedWord,
}

/// The scope tree. Strict LIFO discipline: after a full traversal the
/// current scope must be back at the global scope.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    current: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                parent: None,
                symbols: Vec::new(),
                children: Vec::new(),
                function: None,
                class: None,
            }],
            symbols: Vec::new(),
            current: ScopeId(0),
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    /// Distance from the current scope to the global scope. Zero once all
    /// scopes are balanced out.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.current;
        while let Some(parent) = self.scopes[scope.0].parent {
            depth += 1;
            scope = parent;
        }
        depth
    }

    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        self.push_scope(kind, None, None)
    }

    pub fn enter_function_scope(&mut self, function: FunctionId) -> ScopeId {
        self.push_scope(ScopeKind::Function, Some(function), None)
    }

    pub fn enter_class_scope(&mut self, class: ClassId) -> ScopeId {
        self.push_scope(ScopeKind::Class, None, Some(class))
    }

    fn push_scope(
        &mut self,
        kind: ScopeKind,
        function: Option<FunctionId>,
        class: Option<ClassId>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            parent: Some(self.current),
            symbols: Vec::new(),
            children: Vec::new(),
            function,
            class,
        });
        self.scopes[self.current.0].children.push(id);
        self.current = id;
        id
    }

    pub fn exit_scope(&mut self) {
        let parent = self.scopes[self.current.0]
            .parent
            .expect("ICE: exit_scope on the global scope");
        self.current = parent;
    }

    /// Inserts into the current scope. Only the current scope is checked for
    /// collisions; shadowing an outer binding is fine.
    pub fn declare(&mut self, symbol: Symbol) -> Result<SymbolId, DeclareError> {
        if RESERVED_WORDS.contains(&symbol.name.as_str()) {
            return Err(DeclareError::ReservedWord);
        }
        if let Some((_, existing)) = self.scopes[self.current.0]
            .symbols
            .iter()
            .find(|(n, _)| *n == symbol.name)
        {
            return Err(DeclareError::Duplicate(*existing));
        }
        let id = SymbolId(self.symbols.len());
        self.scopes[self.current.0]
            .symbols
            .push((symbol.name.clone(), id));
        self.symbols.push(symbol);
        Ok(id)
    }

    /// Walks the current→parent chain and returns the first hit.
    pub fn resolve(&self, name: &str) -> Option<SymbolId> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(hit) = self.resolve_in(id, name) {
                return Some(hit);
            }
            scope = self.scopes[id.0].parent;
        }
        None
    }

    /// Scoped lookup with no parent walk; used for `obj.field` and
    /// `super.method` style resolution.
    pub fn resolve_in(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.0]
            .symbols
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    /// The function whose body encloses the current scope, if any.
    pub fn current_function(&self) -> Option<FunctionId> {
        self.find_enclosing(|s| s.function)
    }

    /// The class whose body encloses the current scope, if any.
    pub fn current_class(&self) -> Option<ClassId> {
        self.find_enclosing(|s| s.class)
    }

    /// The nearest enclosing loop scope, if any.
    pub fn innermost_loop(&self) -> Option<ScopeId> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let s = &self.scopes[id.0];
            if s.kind == ScopeKind::Loop {
                return Some(id);
            }
            // don't look for loops past the enclosing function
            if s.kind == ScopeKind::Function {
                return None;
            }
            scope = s.parent;
        }
        None
    }

    fn find_enclosing<T, F: Fn(&Scope) -> Option<T>>(&self, f: F) -> Option<T> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let s = &self.scopes[id.0];
            if let Some(found) = f(s) {
                return Some(found);
            }
            scope = s.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, ty: Type) -> Symbol {
        Symbol {
            name: name.to_owned(),
            span: (0..0).into(),
            kind: SymbolKind::Variable(VariableSymbol {
                ty,
                initialized: true,
            }),
        }
    }

    #[test]
    fn declare_and_resolve() {
        let mut table = SymbolTable::new();
        let a = table.declare(var("a", Type::Integer)).unwrap();
        assert_eq!(table.resolve("a"), Some(a));
        assert_eq!(table.resolve("b"), None);
    }

    #[test]
    fn duplicate_in_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        let first = table.declare(var("a", Type::Integer)).unwrap();
        match table.declare(var("a", Type::String)) {
            Err(DeclareError::Duplicate(id)) => assert_eq!(id, first),
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn reserved_words_are_rejected() {
        let mut table = SymbolTable::new();
        assert!(matches!(
            table.declare(var("integer", Type::Integer)),
            Err(DeclareError::ReservedWord)
        ));
    }

    #[test]
    fn shadowing_in_inner_scope() {
        let mut table = SymbolTable::new();
        let outer = table.declare(var("a", Type::Integer)).unwrap();
        table.enter_scope(ScopeKind::Block);
        let inner = table.declare(var("a", Type::String)).unwrap();
        assert_eq!(table.resolve("a"), Some(inner));
        table.exit_scope();
        assert_eq!(table.resolve("a"), Some(outer));
        assert_eq!(table.depth(), 0);
    }

    #[test]
    fn resolve_in_does_not_walk_parents() {
        let mut table = SymbolTable::new();
        table.declare(var("a", Type::Integer)).unwrap();
        let inner = table.enter_scope(ScopeKind::Block);
        assert_eq!(table.resolve_in(inner, "a"), None);
        assert!(table.resolve("a").is_some());
    }

    #[test]
    fn innermost_loop_stops_at_function_boundary() {
        let mut table = SymbolTable::new();
        let loop_scope = table.enter_scope(ScopeKind::Loop);
        assert_eq!(table.innermost_loop(), Some(loop_scope));
        table.enter_function_scope(FunctionId(0));
        assert_eq!(table.innermost_loop(), None);
        table.enter_scope(ScopeKind::Loop);
        assert!(table.innermost_loop().is_some());
    }
}
