//! Pass 1: signatures, inheritance, field layout. Also drives pass 2 over
//! class and function bodies.

use crate::ast;
use crate::diagnostic::{AggregateResult, DiagnosticBuilder};
use crate::ir::{
    ClassId, ClassItem, FieldItem, FunctionId, FunctionItem, Symbol, SymbolKind, Type,
    VariableSymbol,
};

use super::stmt;
use super::util::{always_returns, prototype_span, Analyzer};

/// Width of every storage slot: integers, booleans (0/1), and addresses.
pub(super) const SLOT_SIZE: u32 = 4;

pub(super) fn collect_signatures(an: &mut Analyzer, ast: &ast::Ast) -> AggregateResult<()> {
    let mut res = AggregateResult::new_ok(());

    // Class names first, so signatures anywhere can mention any class.
    for item in &ast.items {
        if let ast::Item::Class(decl) = &item.data {
            let id = an.add_class(ClassItem {
                name: decl.ident.data.clone(),
                span: decl.ident.span,
                parent: None,
                fields: Vec::new(),
                methods: Vec::new(),
                constructor: None,
                size: 0,
            });
            an.declare(Symbol {
                name: decl.ident.data.clone(),
                span: decl.ident.span,
                kind: SymbolKind::Class(id),
            })
            .add_to(&mut res, |_, _| {});
        }
    }

    // Global function signatures.
    for item in &ast.items {
        if let ast::Item::Function(decl) = &item.data {
            let func = function_signature(an, decl, None, false);
            let func = func.and_then(|item| {
                let ident = decl.ident.clone();
                let id = an.add_function(item);
                an.declare(Symbol {
                    name: ident.data,
                    span: ident.span,
                    kind: SymbolKind::Function(id),
                })
                .map(|_| ())
            });
            func.add_to(&mut res, |_, _| {});
        }
    }

    // Class bodies: parent links, fields, method signatures.
    for item in &ast.items {
        if let ast::Item::Class(decl) = &item.data {
            collect_class(an, decl).add_to(&mut res, |_, _| {});
        }
    }

    // Layout closure and override checks need every parent link resolved.
    close_layouts(an).add_to(&mut res, |_, _| {});
    check_overrides(an).add_to(&mut res, |_, _| {});

    res
}

fn function_signature(
    an: &mut Analyzer,
    decl: &ast::FunctionDeclaration,
    method_of: Option<ClassId>,
    is_constructor: bool,
) -> AggregateResult<FunctionItem> {
    let mut res = AggregateResult::new_ok(());

    let mut params = Vec::with_capacity(decl.params.len());
    for param in &decl.params {
        let ty = match &param.ty {
            Some(ty) => an.resolve_type(ty, false),
            None => AggregateResult::new_rec(
                Type::Unknown,
                DiagnosticBuilder::new(param.span).build_param_needs_type(&param.ident.data),
            ),
        };
        ty.add_to(&mut res, |_, ty| params.push((param.ident.data.clone(), ty)));
        // keep the arity right even when a type was rejected
        if params.len() < decl.params.len() && res.value().is_none() {
            params.push((param.ident.data.clone(), Type::Unknown));
        }
    }

    let return_type = match (&decl.return_type, is_constructor) {
        (_, true) | (None, _) => AggregateResult::new_ok(Type::Void),
        (Some(ty), false) => an.resolve_type(ty, true),
    };

    res.aggregate(return_type).map(|return_type| FunctionItem {
        name: decl.ident.data.clone(),
        span: decl.ident.span,
        params,
        return_type,
        method_of,
        is_constructor,
        param_symbols: Vec::new(),
        this_symbol: None,
        body: None,
    })
}

fn class_id_of(an: &Analyzer, name: &str) -> Option<ClassId> {
    let global = an.table.global_scope();
    let id = an.table.resolve_in(global, name)?;
    match an.table.symbol(id).kind {
        SymbolKind::Class(class) => Some(class),
        _ => None,
    }
}

fn collect_class(an: &mut Analyzer, decl: &ast::ClassDeclaration) -> AggregateResult<()> {
    let mut res = AggregateResult::new_ok(());
    let Some(class) = class_id_of(an, &decl.ident.data) else {
        // the declaration itself was rejected (reserved word)
        return res;
    };

    if let Some(parent) = &decl.parent {
        let builder = DiagnosticBuilder::new(parent.span);
        if parent.data == decl.ident.data {
            res.add_rec_diagnostic(builder.build_bad_inheritance(format!(
                "class `{}` cannot inherit from itself",
                decl.ident.data
            )));
        } else {
            match an.table.resolve(&parent.data) {
                Some(id) => match an.table.symbol(id).kind {
                    SymbolKind::Class(parent_id) => an.classes[class.0].parent = Some(parent_id),
                    _ => res.add_rec_diagnostic(
                        builder.build_bad_inheritance(format!("`{}` is not a class", parent.data)),
                    ),
                },
                None => res.add_rec_diagnostic(builder.build_bad_inheritance(format!(
                    "parent class `{}` is not declared",
                    parent.data
                ))),
            }
        }
    }

    for member in &decl.members {
        match &member.data {
            ast::ClassMember::Field(field) => {
                if field.ty.is_none() || field.initializer.is_some() {
                    res.add_rec_diagnostic(DiagnosticBuilder::new(member.span).build_field_form());
                }
                let ty = match &field.ty {
                    Some(ty) => an.resolve_type(ty, false),
                    None => AggregateResult::new_ok(Type::Unknown),
                };
                let duplicate = an.classes[class.0]
                    .fields
                    .iter()
                    .find(|f| f.name == field.ident.data)
                    .map(|f| f.span);
                if let Some(original) = duplicate {
                    res.add_rec_diagnostic(
                        DiagnosticBuilder::new(field.ident.span)
                            .build_duplicate_declaration(&field.ident.data, original),
                    );
                    continue;
                }
                let ident = field.ident.clone();
                ty.add_to(&mut res, |_, ty| {
                    an.classes[class.0].fields.push(FieldItem {
                        name: ident.data,
                        ty,
                        offset: 0, // assigned at closure
                        span: ident.span,
                        inherited_from: None,
                    })
                });
            }
            ast::ClassMember::Method(method) => {
                let duplicate = an.classes[class.0]
                    .own_method(&method.ident.data)
                    .map(|id| an.functions[id.0].span);
                if let Some(original) = duplicate {
                    res.add_rec_diagnostic(
                        DiagnosticBuilder::new(method.ident.span)
                            .build_duplicate_declaration(&method.ident.data, original),
                    );
                    continue;
                }
                let signature = function_signature(an, method, Some(class), false);
                let name = method.ident.data.clone();
                signature.add_to(&mut res, |_, item| {
                    let id = an.add_function(item);
                    an.classes[class.0].methods.push((name, id));
                });
            }
            ast::ClassMember::Constructor(ctor) => {
                if let Some(first) = an.classes[class.0].constructor {
                    let first_span = an.functions[first.0].span;
                    res.add_rec_diagnostic(
                        DiagnosticBuilder::new(ctor.ident.span)
                            .build_duplicate_constructor(&decl.ident.data, first_span),
                    );
                    continue;
                }
                let signature = function_signature(an, ctor, Some(class), true);
                signature.add_to(&mut res, |_, item| {
                    let id = an.add_function(item);
                    an.classes[class.0].constructor = Some(id);
                });
            }
        }
    }

    res
}

/// Assigns field offsets: inherited fields first in parent layout order,
/// then own fields in declaration order, 4 bytes per slot. Classes close
/// parents-first; inheritance cycles are cut and diagnosed.
fn close_layouts(an: &mut Analyzer) -> AggregateResult<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Open,
        Closing,
        Closed,
    }

    fn close(
        an: &mut Analyzer,
        states: &mut [State],
        res: &mut AggregateResult<()>,
        class: ClassId,
    ) {
        match states[class.0] {
            State::Closed => return,
            State::Closing => {
                let item = &mut an.classes[class.0];
                let span = item.span;
                let name = item.name.clone();
                item.parent = None; // cut the cycle and keep going
                res.add_rec_diagnostic(
                    DiagnosticBuilder::new(span)
                        .build_bad_inheritance(format!("inheritance cycle through `{name}`")),
                );
                return;
            }
            State::Open => {}
        }
        states[class.0] = State::Closing;

        if let Some(parent) = an.classes[class.0].parent {
            close(an, states, res, parent);
        }

        let inherited: Vec<FieldItem> = match an.classes[class.0].parent {
            Some(parent) => an.classes[parent.0]
                .fields
                .iter()
                .cloned()
                .map(|mut field| {
                    field.inherited_from.get_or_insert(parent);
                    field
                })
                .collect(),
            None => Vec::new(),
        };

        let item = &mut an.classes[class.0];
        let own = std::mem::take(&mut item.fields);
        let mut fields = inherited;
        for mut field in own {
            if let Some(existing) = fields.iter().find(|f| f.name == field.name) {
                let original = existing.span;
                res.add_rec_diagnostic(
                    DiagnosticBuilder::new(field.span)
                        .build_duplicate_declaration(&field.name, original),
                );
                continue;
            }
            field.inherited_from = None;
            fields.push(field);
        }
        for (i, field) in fields.iter_mut().enumerate() {
            field.offset = i as u32 * SLOT_SIZE;
        }
        item.size = fields.len() as u32 * SLOT_SIZE;
        item.fields = fields;

        states[class.0] = State::Closed;
    }

    let mut res = AggregateResult::new_ok(());
    let mut states = vec![State::Open; an.classes.len()];
    for i in 0..an.classes.len() {
        close(an, &mut states, &mut res, ClassId(i));
    }
    res
}

/// A child method that redeclares an inherited name must match its
/// signature exactly to be a valid override.
fn check_overrides(an: &mut Analyzer) -> AggregateResult<()> {
    let mut res = AggregateResult::new_ok(());
    for class in &an.classes {
        let Some(parent) = class.parent else { continue };
        for (name, own) in &class.methods {
            let mut ancestor = Some(parent);
            let inherited = loop {
                let Some(id) = ancestor else { break None };
                if let Some(found) = an.classes[id.0].own_method(name) {
                    break Some(found);
                }
                ancestor = an.classes[id.0].parent;
            };
            let Some(inherited) = inherited else { continue };

            let own_item = &an.functions[own.0];
            let inherited_item = &an.functions[inherited.0];
            let params_match = own_item.params.len() == inherited_item.params.len()
                && own_item
                    .params
                    .iter()
                    .zip(&inherited_item.params)
                    .all(|((_, a), (_, b))| a == b);
            if !params_match || own_item.return_type != inherited_item.return_type {
                res.add_rec_diagnostic(
                    DiagnosticBuilder::new(own_item.span)
                        .build_override_signature_mismatch(name, inherited_item.span),
                );
            }
        }
    }
    res
}

// ==== pass 2: bodies ====

pub(super) fn check_bodies(an: &mut Analyzer, ast: &ast::Ast) -> AggregateResult<()> {
    let mut res = AggregateResult::new_ok(());
    let mut globals = AggregateResult::new_ok(Vec::new());

    for item in &ast.items {
        match &item.data {
            ast::Item::Class(decl) => class_bodies(an, decl).add_to(&mut res, |_, _| {}),
            ast::Item::Function(decl) => {
                let id = an.table.resolve(&decl.ident.data).and_then(|id| {
                    match an.table.symbol(id).kind {
                        SymbolKind::Function(func) => Some(func),
                        _ => None,
                    }
                });
                if let Some(id) = id {
                    function_body(an, decl, id).add_to(&mut res, |_, _| {});
                }
            }
            ast::Item::Statement(statement) => {
                stmt::lower_statement(an, statement).add_to(&mut globals, |g, stmts| {
                    g.extend(stmts);
                });
            }
        }
    }

    let globals = globals.map(|g| an.globals = g);
    res.aggregate(globals)
}

fn class_bodies(an: &mut Analyzer, decl: &ast::ClassDeclaration) -> AggregateResult<()> {
    let mut res = AggregateResult::new_ok(());
    let Some(class) = class_id_of(an, &decl.ident.data) else {
        return res;
    };

    an.table.enter_class_scope(class);

    // Fields (inherited included) and methods are visible without `this.`
    // inside method bodies; bare field reads lower through the receiver.
    for index in 0..an.classes[class.0].fields.len() {
        let field = an.classes[class.0].fields[index].clone();
        if let Ok(id) = an.table.declare(Symbol {
            name: field.name,
            span: field.span,
            kind: SymbolKind::Variable(VariableSymbol {
                ty: field.ty,
                initialized: true,
            }),
        }) {
            an.field_symbols.insert(id, (class, index));
        }
    }
    let mut chain = Some(class);
    while let Some(id) = chain {
        for (name, method) in an.classes[id.0].methods.clone() {
            let span = an.functions[method.0].span;
            // overridden names are already bound; first binding wins
            let _ = an.table.declare(Symbol {
                name,
                span,
                kind: SymbolKind::Function(method),
            });
        }
        chain = an.classes[id.0].parent;
    }

    for member in &decl.members {
        match &member.data {
            ast::ClassMember::Field(_) => {}
            ast::ClassMember::Method(method) => {
                if let Some(id) = an.classes[class.0].own_method(&method.ident.data) {
                    function_body(an, method, id).add_to(&mut res, |_, _| {});
                }
            }
            ast::ClassMember::Constructor(ctor) => {
                if let Some(id) = an.classes[class.0].constructor {
                    // a rejected duplicate constructor has no item to check
                    if an.functions[id.0].span == ctor.ident.span {
                        function_body(an, ctor, id).add_to(&mut res, |_, _| {});
                    }
                }
            }
        }
    }

    an.table.exit_scope();
    res
}

fn function_body(
    an: &mut Analyzer,
    decl: &ast::FunctionDeclaration,
    id: FunctionId,
) -> AggregateResult<()> {
    let mut res = AggregateResult::new_ok(());

    an.table.enter_function_scope(id);
    let outer_switch_depth = std::mem::take(&mut an.switch_depth);

    if let Some(class) = an.functions[id.0].method_of {
        let ty = an.class_type(class);
        if let Ok(this) = an.table.declare(Symbol {
            name: "this".to_owned(),
            span: decl.ident.span,
            kind: SymbolKind::Variable(VariableSymbol {
                ty,
                initialized: true,
            }),
        }) {
            an.functions[id.0].this_symbol = Some(this);
        }
    }

    let params: Vec<_> = an.functions[id.0]
        .params
        .iter()
        .cloned()
        .zip(decl.params.iter().map(|p| p.ident.span))
        .collect();
    for ((name, ty), span) in params {
        an.declare(Symbol {
            name,
            span,
            kind: SymbolKind::Variable(VariableSymbol {
                ty,
                initialized: true,
            }),
        })
        .add_to(&mut res, |_, _| {});
    }
    // re-collect the accepted bindings in order
    let mut param_symbols = Vec::new();
    for param in &decl.params {
        if let Some(sym) = an
            .table
            .resolve_in(an.table.current_scope(), &param.ident.data)
        {
            if !param_symbols.contains(&sym) {
                param_symbols.push(sym);
            }
        }
    }
    an.functions[id.0].param_symbols = param_symbols;

    let body = stmt::lower_block(an, &decl.body);
    let body = body.map(|body| {
        let return_type = an.functions[id.0].return_type.clone();
        if !matches!(return_type, Type::Void | Type::Unknown) && !always_returns(&body) {
            res.add_rec_diagnostic(
                DiagnosticBuilder::new(prototype_span(decl))
                    .build_missing_return(&an.functions[id.0].name, &return_type),
            );
        }
        if an.functions[id.0].body.is_none() {
            an.functions[id.0].body = Some(body);
        }
    });

    an.switch_depth = outer_switch_depth;
    an.table.exit_scope();

    res.aggregate(body)
}
