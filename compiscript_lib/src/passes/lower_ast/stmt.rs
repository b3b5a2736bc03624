//! Pass 2, statements: control-flow checks and lowering to [`ir`] statement
//! trees. `for` is desugared here into its hoisted initializer plus a while
//! with a continuation expression.

use crate::ast;
use crate::diagnostic::{AggregateResult, DiagnosticBuilder, Span};
use crate::ir::{
    BlockNode, Constant, Expr, ExprNode, ScopeKind, Stmt, StmtNode, Symbol, SymbolKind,
    SwitchCaseData, SwitchCaseNode, Type, ValueCat, VariableSymbol,
};

use super::expr::lower_expr;
use super::type_checking::{check_assign, is_boolean, is_switchable, AssignCheck};
use super::util::Analyzer;

/// Lowers the statements of a block. Does NOT create a scope; callers pick
/// the scope kind (block, loop, function body).
pub(super) fn lower_block(an: &mut Analyzer, block: &ast::BlockNode) -> AggregateResult<BlockNode> {
    let mut res = AggregateResult::new_ok(Vec::new());
    for statement in &block.stmts {
        lower_statement(an, statement).add_to(&mut res, |stmts, s| stmts.extend(s));
    }
    res.map(|stmts| BlockNode {
        span: block.span,
        stmts,
    })
}

pub(super) fn lower_statement(
    an: &mut Analyzer,
    statement: &ast::StatementNode,
) -> AggregateResult<Vec<StmtNode>> {
    let span = statement.span;
    let res = match &statement.data {
        ast::Statement::Declaration(decl) => variable_declaration(an, decl, span),
        ast::Statement::Expression(e) => lower_expr(an, e).map(|e| vec![Stmt::Expr(e)]),
        ast::Statement::If(stmt) => if_statement(an, stmt).map(|s| vec![s]),
        ast::Statement::While(stmt) => while_statement(an, stmt).map(|s| vec![s]),
        ast::Statement::DoWhile(stmt) => do_while_statement(an, stmt).map(|s| vec![s]),
        ast::Statement::For(stmt) => return for_statement(an, stmt, span),
        ast::Statement::Foreach(stmt) => foreach_statement(an, stmt).map(|s| vec![s]),
        ast::Statement::Switch(stmt) => switch_statement(an, stmt).map(|s| vec![s]),
        ast::Statement::TryCatch(stmt) => try_catch_statement(an, stmt).map(|s| vec![s]),
        ast::Statement::Break => {
            if an.table.innermost_loop().is_some() || an.switch_depth > 0 {
                AggregateResult::new_ok(vec![Stmt::Break])
            } else {
                AggregateResult::new_rec(
                    Vec::new(),
                    DiagnosticBuilder::new(span).build_break_continue_outside_loop("break"),
                )
            }
        }
        ast::Statement::Continue => {
            if an.table.innermost_loop().is_some() {
                AggregateResult::new_ok(vec![Stmt::Continue])
            } else {
                AggregateResult::new_rec(
                    Vec::new(),
                    DiagnosticBuilder::new(span).build_break_continue_outside_loop("continue"),
                )
            }
        }
        ast::Statement::Return(value) => return return_statement(an, value.as_ref(), span),
        ast::Statement::Print(e) => lower_expr(an, e).and_then(|e| {
            if matches!(e.ty, Type::Void) {
                AggregateResult::new_rec(
                    vec![Stmt::Print(e.clone())],
                    DiagnosticBuilder::new(e.span).build_void_value(),
                )
            } else {
                AggregateResult::new_ok(vec![Stmt::Print(e)])
            }
        }),
        ast::Statement::Block(block) => {
            an.table.enter_scope(ScopeKind::Block);
            let block = lower_block(an, block);
            an.table.exit_scope();
            block.map(|b| vec![Stmt::Block(b)])
        }
    };

    res.map(|stmts| {
        stmts
            .into_iter()
            .map(|stmt| StmtNode { span, stmt })
            .collect()
    })
}

fn variable_declaration(
    an: &mut Analyzer,
    decl: &ast::VariableDeclaration,
    span: Span,
) -> AggregateResult<Vec<Stmt>> {
    // The initializer is checked before the name exists: `let x = x;` is an
    // undeclared reference.
    let init = match &decl.initializer {
        Some(e) => lower_expr(an, e).map(Some),
        None => AggregateResult::new_ok(None),
    };
    let annotated = match &decl.ty {
        Some(ty) => an.resolve_type(ty, false).map(Some),
        None => AggregateResult::new_ok(None),
    };

    init.zip(annotated).and_then(|(init, annotated)| {
        let mut res = AggregateResult::new_ok(());

        if decl.is_const && init.is_none() {
            res.add_rec_diagnostic(
                DiagnosticBuilder::new(span).build_const_needs_initializer(&decl.ident.data),
            );
        }
        if let Some(init) = &init {
            if matches!(init.ty, Type::Void) {
                res.add_rec_diagnostic(DiagnosticBuilder::new(init.span).build_void_value());
            }
        }

        let ty = match (annotated, &init) {
            (Some(ty), Some(init)) => {
                if check_assign(&ty, &init.ty) == AssignCheck::Incompatible {
                    res.add_rec_diagnostic(
                        DiagnosticBuilder::new(span).build_incompatible_assign(init, &ty),
                    );
                }
                ty
            }
            (Some(ty), None) => ty,
            (None, Some(init)) => {
                if matches!(init.ty, Type::Void) {
                    Type::Unknown
                } else {
                    init.ty.clone()
                }
            }
            (None, None) => Type::Unknown,
        };

        let kind = if decl.is_const {
            SymbolKind::Constant(crate::ir::ConstantSymbol { ty })
        } else {
            SymbolKind::Variable(VariableSymbol {
                ty,
                initialized: init.is_some(),
            })
        };
        let declared = an.declare(Symbol {
            name: decl.ident.data.clone(),
            span: decl.ident.span,
            kind,
        });

        res.aggregate(declared).map(|id| match id {
            Some(symbol) => vec![Stmt::Decl { symbol, init }],
            // rejected declaration: keep nothing, diagnostics already out
            None => Vec::new(),
        })
    })
}

fn condition_check(
    an: &mut Analyzer,
    construct: &'static str,
    e: &ast::ExpressionNode,
) -> AggregateResult<ExprNode> {
    lower_expr(an, e).and_then(|cond| {
        if is_boolean(&cond.ty) {
            AggregateResult::new_ok(cond)
        } else {
            let diagnostic =
                DiagnosticBuilder::new(cond.span).build_bad_condition(construct, &cond);
            AggregateResult::new_rec(cond, diagnostic)
        }
    })
}

fn if_statement(an: &mut Analyzer, stmt: &ast::IfStatement) -> AggregateResult<Stmt> {
    let condition = condition_check(an, "`if`", &stmt.condition);

    an.table.enter_scope(ScopeKind::Block);
    let then_branch = lower_block(an, &stmt.if_body);
    an.table.exit_scope();

    let else_branch = match &stmt.else_body {
        Some(block) => {
            an.table.enter_scope(ScopeKind::Block);
            let block = lower_block(an, block);
            an.table.exit_scope();
            block.map(Some)
        }
        None => AggregateResult::new_ok(None),
    };

    condition
        .zip(then_branch)
        .zip(else_branch)
        .map(|((condition, then_branch), else_branch)| Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
}

fn while_statement(an: &mut Analyzer, stmt: &ast::WhileStatement) -> AggregateResult<Stmt> {
    let condition = condition_check(an, "`while`", &stmt.condition);

    an.table.enter_scope(ScopeKind::Loop);
    let body = lower_block(an, &stmt.body);
    an.table.exit_scope();

    condition.zip(body).map(|(condition, body)| Stmt::While {
        condition,
        body,
        continuation: None,
    })
}

fn do_while_statement(an: &mut Analyzer, stmt: &ast::DoWhileStatement) -> AggregateResult<Stmt> {
    an.table.enter_scope(ScopeKind::Loop);
    let body = lower_block(an, &stmt.body);
    an.table.exit_scope();

    let condition = condition_check(an, "`do-while`", &stmt.condition);

    body.zip(condition)
        .map(|(body, condition)| Stmt::DoWhile { body, condition })
}

/// `for` is a while after hoisting the initializer; the step becomes the
/// loop's continuation expression.
fn for_statement(
    an: &mut Analyzer,
    stmt: &ast::ForStatement,
    span: Span,
) -> AggregateResult<Vec<StmtNode>> {
    an.table.enter_scope(ScopeKind::Block);

    let init = match &stmt.init {
        Some(init) => lower_statement(an, init),
        None => AggregateResult::new_ok(Vec::new()),
    };

    let condition = match &stmt.condition {
        Some(cond) => condition_check(an, "`for`", cond),
        // no condition: loop until break
        None => AggregateResult::new_ok(ExprNode {
            span,
            ty: Type::Boolean,
            cat: ValueCat::Rvalue,
            expr: Expr::Constant(Constant::Bool(true)),
        }),
    };

    an.table.enter_scope(ScopeKind::Loop);
    let step = match &stmt.step {
        Some(step) => lower_expr(an, step).map(Some),
        None => AggregateResult::new_ok(None),
    };
    let body = lower_block(an, &stmt.body);
    an.table.exit_scope();

    an.table.exit_scope();

    init.zip(condition).zip(step).zip(body).map(
        |(((mut init, condition), step), body)| {
            init.push(StmtNode {
                span,
                stmt: Stmt::While {
                    condition,
                    body,
                    continuation: step,
                },
            });
            init
        },
    )
}

fn foreach_statement(an: &mut Analyzer, stmt: &ast::ForeachStatement) -> AggregateResult<Stmt> {
    let iterable = lower_expr(an, &stmt.iterable).and_then(|iterable| {
        match iterable.ty.element_type() {
            Some(_) => AggregateResult::new_ok(iterable),
            None if iterable.ty.is_unknown() => AggregateResult::new_ok(iterable),
            None => {
                let diagnostic =
                    DiagnosticBuilder::new(iterable.span).build_foreach_non_array(&iterable);
                AggregateResult::new_rec(iterable, diagnostic)
            }
        }
    });

    iterable.and_then(|iterable| {
        let element_ty = iterable
            .ty
            .element_type()
            .cloned()
            .unwrap_or(Type::Unknown);

        an.table.enter_scope(ScopeKind::Loop);
        let element = an.declare(Symbol {
            name: stmt.ident.data.clone(),
            span: stmt.ident.span,
            kind: SymbolKind::Variable(VariableSymbol {
                ty: element_ty,
                initialized: true,
            }),
        });
        let body = lower_block(an, &stmt.body);
        an.table.exit_scope();

        element.zip(body).and_then(|(element, body)| match element {
            Some(element) => AggregateResult::new_ok(Stmt::Foreach {
                element,
                iterable,
                body,
            }),
            // the binding was rejected (reserved word); drop the loop but
            // keep the body diagnostics
            None => AggregateResult::new_ok(Stmt::Block(body)),
        })
    })
}

fn switch_statement(an: &mut Analyzer, stmt: &ast::SwitchStatement) -> AggregateResult<Stmt> {
    let scrutinee = lower_expr(an, &stmt.scrutinee).and_then(|scrutinee| {
        if is_switchable(&scrutinee.ty) {
            AggregateResult::new_ok(scrutinee)
        } else {
            let diagnostic =
                DiagnosticBuilder::new(scrutinee.span).build_bad_switch_scrutinee(&scrutinee);
            AggregateResult::new_rec(scrutinee, diagnostic)
        }
    });

    scrutinee.and_then(|scrutinee| {
        an.switch_depth += 1;
        let mut cases = AggregateResult::new_ok(Vec::new());
        for case in &stmt.cases {
            match case {
                ast::SwitchCase::Case(case) => {
                    let value = lower_expr(an, &case.value).and_then(|value| {
                        if value.ty == scrutinee.ty
                            || value.ty.is_unknown()
                            || scrutinee.ty.is_unknown()
                        {
                            AggregateResult::new_ok(value)
                        } else {
                            let diagnostic = DiagnosticBuilder::new(value.span)
                                .build_type_mismatch_bin("==", &scrutinee, &value);
                            AggregateResult::new_rec(value, diagnostic)
                        }
                    });

                    an.table.enter_scope(ScopeKind::Block);
                    let body = lower_case_body(an, &case.body);
                    an.table.exit_scope();

                    value
                        .zip(body)
                        .map(|(value, body)| SwitchCaseNode {
                            span: case.label_span,
                            data: SwitchCaseData::Case { value, body },
                        })
                        .add_to(&mut cases, |cases, c| cases.push(c));
                }
                ast::SwitchCase::Default(case) => {
                    an.table.enter_scope(ScopeKind::Block);
                    let body = lower_case_body(an, &case.body);
                    an.table.exit_scope();

                    body.map(|body| SwitchCaseNode {
                        span: case.label_span,
                        data: SwitchCaseData::Default { body },
                    })
                    .add_to(&mut cases, |cases, c| cases.push(c));
                }
            }
        }
        an.switch_depth -= 1;

        cases.map(|cases| Stmt::Switch { scrutinee, cases })
    })
}

fn lower_case_body(
    an: &mut Analyzer,
    body: &[ast::StatementNode],
) -> AggregateResult<Vec<StmtNode>> {
    let mut res = AggregateResult::new_ok(Vec::new());
    for statement in body {
        lower_statement(an, statement).add_to(&mut res, |stmts, s| stmts.extend(s));
    }
    res
}

fn return_statement(
    an: &mut Analyzer,
    value: Option<&ast::ExpressionNode>,
    span: Span,
) -> AggregateResult<Vec<StmtNode>> {
    let Some(function) = an.table.current_function() else {
        let value_diags = match value {
            Some(e) => lower_expr(an, e).map(|_| ()),
            None => AggregateResult::new_ok(()),
        };
        return value_diags.aggregate(AggregateResult::new_rec(
            Vec::new(),
            DiagnosticBuilder::new(span).build_return_outside_function(),
        ));
    };

    let name = an.functions[function.0].name.clone();
    let return_type = an.functions[function.0].return_type.clone();

    let res = match value {
        Some(e) => lower_expr(an, e).and_then(|value| {
            if matches!(return_type, Type::Void) {
                let diagnostic =
                    DiagnosticBuilder::new(span).build_value_return_in_void(&name);
                AggregateResult::new_rec(vec![Stmt::Return(Some(value))], diagnostic)
            } else if check_assign(&return_type, &value.ty) == AssignCheck::Incompatible {
                let diagnostic = DiagnosticBuilder::new(span).build_return_type_mismatch(
                    &name,
                    &return_type,
                    Some(&value),
                );
                AggregateResult::new_rec(vec![Stmt::Return(Some(value))], diagnostic)
            } else {
                AggregateResult::new_ok(vec![Stmt::Return(Some(value))])
            }
        }),
        None => {
            if matches!(return_type, Type::Void | Type::Unknown) {
                AggregateResult::new_ok(vec![Stmt::Return(None)])
            } else {
                AggregateResult::new_rec(
                    vec![Stmt::Return(None)],
                    DiagnosticBuilder::new(span).build_return_type_mismatch(
                        &name,
                        &return_type,
                        None,
                    ),
                )
            }
        }
    };

    res.map(|stmts| {
        stmts
            .into_iter()
            .map(|stmt| StmtNode { span, stmt })
            .collect()
    })
}

fn try_catch_statement(an: &mut Analyzer, stmt: &ast::TryCatchStatement) -> AggregateResult<Stmt> {
    an.table.enter_scope(ScopeKind::Block);
    let try_block = lower_block(an, &stmt.try_block);
    an.table.exit_scope();

    an.table.enter_scope(ScopeKind::Block);
    // the caught value is a string message
    let catch_symbol = an.declare(Symbol {
        name: stmt.catch_ident.data.clone(),
        span: stmt.catch_ident.span,
        kind: SymbolKind::Variable(VariableSymbol {
            ty: Type::String,
            initialized: true,
        }),
    });
    let catch_block = lower_block(an, &stmt.catch_block);
    an.table.exit_scope();

    try_block
        .zip(catch_symbol)
        .zip(catch_block)
        .and_then(|((try_block, catch_symbol), catch_block)| match catch_symbol {
            Some(catch_symbol) => AggregateResult::new_ok(Stmt::Try {
                try_block,
                catch_symbol,
                catch_block,
            }),
            None => AggregateResult::new_ok(Stmt::Block(try_block)),
        })
}
