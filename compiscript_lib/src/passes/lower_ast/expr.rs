//! Pass 2, expressions: assigns every node a type and a value category,
//! resolves identifiers to symbols, and checks the operator table.

use crate::ast;
use crate::diagnostic::{AggregateResult, DiagnosticBuilder, Span};
use crate::ir::{
    BinaryOp, Constant, Expr, ExprNode, FunctionId, LogicalOp, SymbolKind, Type, UnaryOp, ValueCat,
};

use super::type_checking::{check_assign, check_binary, check_unary, is_boolean, AssignCheck};
use super::util::Analyzer;

fn node(span: Span, ty: Type, cat: ValueCat, expr: Expr) -> ExprNode {
    ExprNode {
        span,
        ty,
        cat,
        expr,
    }
}

fn rvalue(span: Span, ty: Type, expr: Expr) -> ExprNode {
    node(span, ty, ValueCat::Rvalue, expr)
}

/// Placeholder produced after a reported error; `unknown` satisfies every
/// later check, and codegen never sees diagnosed programs.
fn error_node(span: Span) -> ExprNode {
    node(
        span,
        Type::Unknown,
        ValueCat::Lvalue,
        Expr::Constant(Constant::Integer(0)),
    )
}

pub(super) fn lower_expr(
    an: &mut Analyzer,
    e: &ast::ExpressionNode,
) -> AggregateResult<ExprNode> {
    let span = e.span;
    match &e.data {
        ast::Expression::Literal(lit) => AggregateResult::new_ok(lower_literal(span, lit)),
        ast::Expression::ArrayLiteral(elements) => lower_array_literal(an, span, elements),
        ast::Expression::Ident(ident) => lower_ident(an, ident, false),
        ast::Expression::This => lower_this(an, span),
        ast::Expression::Assignment(target, value) => lower_assignment(an, span, target, value),
        ast::Expression::Ternary {
            condition,
            then_branch,
            else_branch,
        } => lower_ternary(an, span, condition, then_branch, else_branch),
        ast::Expression::Binary(lhs, op, rhs) => lower_binary(an, span, lhs, op, rhs),
        ast::Expression::Unary(op, inner) => lower_unary(an, span, op, inner),
        ast::Expression::Index(base, index) => lower_index(an, span, base, index),
        ast::Expression::Property(object, ident) => {
            lower_expr(an, object).and_then(|object| lower_property(an, span, object, ident))
        }
        ast::Expression::Call(callee, args) => lower_call(an, span, callee, args),
        ast::Expression::New(class, args) => lower_new(an, span, class, args),
        ast::Expression::SuperCall { method, args } => lower_super_call(an, span, method, args),
    }
}

fn lower_literal(span: Span, lit: &ast::LiteralNode) -> ExprNode {
    let (ty, value) = match &lit.data {
        ast::Literal::Integer(v) => (Type::Integer, Constant::Integer(*v)),
        ast::Literal::Str(v) => (Type::String, Constant::Str(v.clone())),
        ast::Literal::Bool(v) => (Type::Boolean, Constant::Bool(*v)),
        ast::Literal::Null => (Type::Null, Constant::Null),
    };
    rvalue(span, ty, Expr::Constant(value))
}

fn lower_array_literal(
    an: &mut Analyzer,
    span: Span,
    elements: &[ast::ExpressionNode],
) -> AggregateResult<ExprNode> {
    let mut res = AggregateResult::new_ok(Vec::with_capacity(elements.len()));
    for element in elements {
        lower_expr(an, element).add_to(&mut res, |v, e| v.push(e));
    }
    res.and_then(|elements| {
        let mut res = AggregateResult::new_ok(());
        let element_ty = elements
            .first()
            .map(|e| e.ty.clone())
            .unwrap_or(Type::Unknown);
        if let Some(first) = elements.first() {
            for element in &elements[1..] {
                if element.ty != first.ty && !element.ty.is_unknown() && !first.ty.is_unknown() {
                    res.add_rec_diagnostic(
                        DiagnosticBuilder::new(element.span).build_bad_array_literal(first, element),
                    );
                }
            }
        }
        res.map(|()| {
            rvalue(
                span,
                Type::array_of(element_ty),
                Expr::ArrayLiteral(elements),
            )
        })
    })
}

/// Identifier in read position. Bare names that resolve to class fields are
/// reads through `this`.
fn lower_ident(
    an: &mut Analyzer,
    ident: &ast::IdentNode,
    for_write: bool,
) -> AggregateResult<ExprNode> {
    let span = ident.span;
    let Some(id) = an.table.resolve(&ident.data) else {
        return AggregateResult::new_rec(
            error_node(span),
            DiagnosticBuilder::new(span).build_undeclared_ident(&ident.data),
        );
    };

    if let Some(&(class, index)) = an.field_symbols.get(&id) {
        return lower_this_field(an, span, class, index);
    }

    match &an.table.symbol(id).kind {
        SymbolKind::Variable(var) => {
            let ty = var.ty.clone();
            let initialized = var.initialized;
            let declared_at = an.table.symbol(id).span;
            let out = node(span, ty, ValueCat::Lvalue, Expr::Var(id));
            if !for_write && !initialized {
                AggregateResult::new_rec(
                    out,
                    DiagnosticBuilder::new(span).build_uninitialized_read(&ident.data, declared_at),
                )
            } else {
                if for_write {
                    if let SymbolKind::Variable(var) = &mut an.table.symbol_mut(id).kind {
                        var.initialized = true;
                    }
                }
                AggregateResult::new_ok(out)
            }
        }
        SymbolKind::Constant(konst) => {
            let out = node(span, konst.ty.clone(), ValueCat::Lvalue, Expr::Var(id));
            if for_write {
                let declared_at = an.table.symbol(id).span;
                AggregateResult::new_rec(
                    out,
                    DiagnosticBuilder::new(span).build_assign_to_immutable(
                        "constant",
                        &ident.data,
                        declared_at,
                    ),
                )
            } else {
                AggregateResult::new_ok(out)
            }
        }
        SymbolKind::Function(_) => AggregateResult::new_rec(
            error_node(span),
            DiagnosticBuilder::new(span).build_symbol_as_value("function", &ident.data),
        ),
        SymbolKind::Class(_) => AggregateResult::new_rec(
            error_node(span),
            DiagnosticBuilder::new(span).build_symbol_as_value("class", &ident.data),
        ),
    }
}

fn lower_this(an: &mut Analyzer, span: Span) -> AggregateResult<ExprNode> {
    match (an.table.current_class(), an.table.resolve("this")) {
        (Some(class), Some(id)) => {
            let ty = an.class_type(class);
            AggregateResult::new_ok(node(span, ty, ValueCat::Rvalue, Expr::This(id)))
        }
        _ => AggregateResult::new_rec(
            error_node(span),
            DiagnosticBuilder::new(span).build_this_outside_class(),
        ),
    }
}

/// A bare field name inside a method body: `edad` reads `this.edad`.
fn lower_this_field(
    an: &mut Analyzer,
    span: Span,
    class: crate::ir::ClassId,
    index: usize,
) -> AggregateResult<ExprNode> {
    let field = an.classes[class.0].fields[index].clone();
    lower_this(an, span).map(|this| {
        node(
            span,
            field.ty,
            ValueCat::Lvalue,
            Expr::Field {
                object: Box::new(this),
                name: field.name,
                offset: field.offset,
            },
        )
    })
}

fn lower_assignment(
    an: &mut Analyzer,
    span: Span,
    target: &ast::ExpressionNode,
    value: &ast::ExpressionNode,
) -> AggregateResult<ExprNode> {
    let target = lower_assign_target(an, target);
    let value = lower_expr(an, value);
    target.zip(value).and_then(|(mut target, value)| {
        let mut res = AggregateResult::new_ok(());
        if check_assign(&target.ty, &value.ty) == AssignCheck::Incompatible {
            res.add_rec_diagnostic(
                DiagnosticBuilder::new(span).build_incompatible_assign(&value, &target.ty),
            );
        } else if target.ty.is_unknown() && !value.ty.is_unknown() {
            // unannotated, uninitialized declaration: first assignment fixes
            // the type
            if let Expr::Var(id) = target.expr {
                if let SymbolKind::Variable(var) = &mut an.table.symbol_mut(id).kind {
                    if var.ty.is_unknown() {
                        var.ty = value.ty.clone();
                        target.ty = value.ty.clone();
                    }
                }
            }
        }
        res.map(|()| {
            let ty = target.ty.clone();
            rvalue(span, ty, Expr::Assign(Box::new(target), Box::new(value)))
        })
    })
}

fn lower_assign_target(
    an: &mut Analyzer,
    target: &ast::ExpressionNode,
) -> AggregateResult<ExprNode> {
    match &target.data {
        ast::Expression::Ident(ident) => lower_ident(an, ident, true),
        ast::Expression::Property(_, _) | ast::Expression::Index(_, _) => {
            lower_expr(an, target).and_then(|out| {
                if out.cat == ValueCat::Lvalue {
                    AggregateResult::new_ok(out)
                } else {
                    AggregateResult::new_rec(
                        out,
                        DiagnosticBuilder::new(target.span).build_need_lvalue(),
                    )
                }
            })
        }
        _ => lower_expr(an, target).and_then(|out| {
            if out.cat == ValueCat::Lvalue {
                // recovered error nodes land here; they already carry a
                // diagnostic
                AggregateResult::new_ok(out)
            } else {
                AggregateResult::new_rec(
                    out,
                    DiagnosticBuilder::new(target.span).build_need_lvalue(),
                )
            }
        }),
    }
}

fn lower_ternary(
    an: &mut Analyzer,
    span: Span,
    condition: &ast::ExpressionNode,
    then_branch: &ast::ExpressionNode,
    else_branch: &ast::ExpressionNode,
) -> AggregateResult<ExprNode> {
    let condition = lower_expr(an, condition);
    let then_branch = lower_expr(an, then_branch);
    let else_branch = lower_expr(an, else_branch);
    condition
        .zip(then_branch)
        .zip(else_branch)
        .and_then(|((condition, then_branch), else_branch)| {
            let mut res = AggregateResult::new_ok(());
            if !is_boolean(&condition.ty) {
                res.add_rec_diagnostic(
                    DiagnosticBuilder::new(condition.span).build_bad_condition("`?:`", &condition),
                );
            }
            let ty = if then_branch.ty == else_branch.ty
                || then_branch.ty.is_unknown()
                || else_branch.ty.is_unknown()
            {
                then_branch.ty.clone()
            } else {
                res.add_rec_diagnostic(
                    DiagnosticBuilder::new(span)
                        .build_ternary_branch_mismatch(&then_branch, &else_branch),
                );
                Type::Unknown
            };
            res.map(|()| {
                rvalue(
                    span,
                    ty,
                    Expr::Ternary(
                        Box::new(condition),
                        Box::new(then_branch),
                        Box::new(else_branch),
                    ),
                )
            })
        })
}

fn lower_binary(
    an: &mut Analyzer,
    span: Span,
    lhs: &ast::ExpressionNode,
    op: &ast::BinaryOperatorNode,
    rhs: &ast::ExpressionNode,
) -> AggregateResult<ExprNode> {
    let lhs = lower_expr(an, lhs);
    let rhs = lower_expr(an, rhs);

    use ast::BinaryOperator as Ast;
    let logical = match op.data {
        Ast::DoubleAmpersand => Some(LogicalOp::And),
        Ast::DoublePipe => Some(LogicalOp::Or),
        _ => None,
    };

    if let Some(logical_op) = logical {
        return lhs.zip(rhs).and_then(|(lhs, rhs)| {
            let mut res = AggregateResult::new_ok(());
            if !is_boolean(&lhs.ty) || !is_boolean(&rhs.ty) {
                res.add_rec_diagnostic(
                    DiagnosticBuilder::new(span).build_type_mismatch_bin(
                        logical_op.as_str(),
                        &lhs,
                        &rhs,
                    ),
                );
            }
            res.map(|()| {
                rvalue(
                    span,
                    Type::Boolean,
                    Expr::Logical(Box::new(lhs), logical_op, Box::new(rhs)),
                )
            })
        });
    }

    let op = match op.data {
        Ast::Plus => BinaryOp::Add,
        Ast::Minus => BinaryOp::Sub,
        Ast::Star => BinaryOp::Mul,
        Ast::Slash => BinaryOp::Div,
        Ast::Percent => BinaryOp::Rem,
        Ast::DoubleEquals => BinaryOp::Eq,
        Ast::BangEquals => BinaryOp::Ne,
        Ast::AngleLeft => BinaryOp::Lt,
        Ast::AngleLeftEquals => BinaryOp::Le,
        Ast::AngleRight => BinaryOp::Gt,
        Ast::AngleRightEquals => BinaryOp::Ge,
        Ast::DoubleAmpersand | Ast::DoublePipe => unreachable!("handled above"),
    };

    lhs.zip(rhs).and_then(|(lhs, rhs)| {
        match check_binary(op, &lhs.ty, &rhs.ty) {
            Ok(ty) => AggregateResult::new_ok(rvalue(
                span,
                ty,
                Expr::Binary(Box::new(lhs), op, Box::new(rhs)),
            )),
            Err(()) => {
                let ty = match op {
                    BinaryOp::Eq
                    | BinaryOp::Ne
                    | BinaryOp::Lt
                    | BinaryOp::Le
                    | BinaryOp::Gt
                    | BinaryOp::Ge => Type::Boolean,
                    _ => Type::Unknown,
                };
                let diagnostic = DiagnosticBuilder::new(span)
                    .build_type_mismatch_bin(op.as_str(), &lhs, &rhs);
                AggregateResult::new_rec(
                    rvalue(span, ty, Expr::Binary(Box::new(lhs), op, Box::new(rhs))),
                    diagnostic,
                )
            }
        }
    })
}

fn lower_unary(
    an: &mut Analyzer,
    span: Span,
    op: &ast::UnaryOperatorNode,
    inner: &ast::ExpressionNode,
) -> AggregateResult<ExprNode> {
    let ir_op = match op.data {
        ast::UnaryOperator::Minus => UnaryOp::Neg,
        ast::UnaryOperator::Bang => UnaryOp::Not,
    };
    lower_expr(an, inner).and_then(|inner| match check_unary(ir_op, &inner.ty) {
        Ok(ty) => {
            AggregateResult::new_ok(rvalue(span, ty, Expr::Unary(ir_op, Box::new(inner))))
        }
        Err(()) => {
            let diagnostic =
                DiagnosticBuilder::new(span).build_type_mismatch_un(ir_op.as_str(), &inner);
            AggregateResult::new_rec(
                rvalue(span, Type::Unknown, Expr::Unary(ir_op, Box::new(inner))),
                diagnostic,
            )
        }
    })
}

fn lower_index(
    an: &mut Analyzer,
    span: Span,
    base: &ast::ExpressionNode,
    index: &ast::ExpressionNode,
) -> AggregateResult<ExprNode> {
    let base = lower_expr(an, base);
    let index = lower_expr(an, index);
    base.zip(index).and_then(|(base, index)| {
        let mut res = AggregateResult::new_ok(());
        let element_ty = match &base.ty {
            Type::Array(inner) => (**inner).clone(),
            Type::Unknown => Type::Unknown,
            _ => {
                res.add_rec_diagnostic(
                    DiagnosticBuilder::new(base.span).build_index_non_array(&base),
                );
                Type::Unknown
            }
        };
        if !matches!(index.ty, Type::Integer | Type::Unknown) {
            res.add_rec_diagnostic(
                DiagnosticBuilder::new(index.span).build_non_integer_index(&index),
            );
        }
        res.map(|()| {
            node(
                span,
                element_ty,
                ValueCat::Lvalue,
                Expr::Index(Box::new(base), Box::new(index)),
            )
        })
    })
}

/// `obj.name` in non-call position: a field of the static type of `obj` or
/// one of its ancestors.
fn lower_property(
    an: &mut Analyzer,
    span: Span,
    object: ExprNode,
    ident: &ast::IdentNode,
) -> AggregateResult<ExprNode> {
    match object.ty.clone() {
        Type::Class(class) => match an.classes[class.id.0].field(&ident.data) {
            Some(field) => {
                let (ty, offset, name) = (field.ty.clone(), field.offset, field.name.clone());
                AggregateResult::new_ok(node(
                    span,
                    ty,
                    ValueCat::Lvalue,
                    Expr::Field {
                        object: Box::new(object),
                        name,
                        offset,
                    },
                ))
            }
            None => AggregateResult::new_rec(
                error_node(span),
                DiagnosticBuilder::new(ident.span)
                    .build_bad_property_access(&class.name, &ident.data),
            ),
        },
        Type::Unknown => AggregateResult::new_ok(error_node(span)),
        _ => AggregateResult::new_rec(
            error_node(span),
            DiagnosticBuilder::new(span).build_property_on_non_object(&object),
        ),
    }
}

fn lower_args(
    an: &mut Analyzer,
    args: &[ast::ExpressionNode],
) -> AggregateResult<Vec<ExprNode>> {
    let mut res = AggregateResult::new_ok(Vec::with_capacity(args.len()));
    for arg in args {
        lower_expr(an, arg).add_to(&mut res, |v, a| v.push(a));
    }
    res
}

/// Positional arity must match exactly; arguments follow the assignability
/// rule parameter by parameter.
fn check_args(
    an: &Analyzer,
    span: Span,
    callee_name: &str,
    callee: FunctionId,
    args: &[ExprNode],
) -> AggregateResult<()> {
    let mut res = AggregateResult::new_ok(());
    let item = &an.functions[callee.0];
    if item.params.len() != args.len() {
        res.add_rec_diagnostic(DiagnosticBuilder::new(span).build_arity_mismatch(
            callee_name,
            item.params.len(),
            args.len(),
        ));
        return res;
    }
    for (index, ((_, param_ty), arg)) in item.params.iter().zip(args).enumerate() {
        if check_assign(param_ty, &arg.ty) == AssignCheck::Incompatible {
            res.add_rec_diagnostic(DiagnosticBuilder::new(arg.span).build_incompatible_arg(
                callee_name,
                index,
                arg,
                param_ty,
            ));
        }
    }
    res
}

fn lower_call(
    an: &mut Analyzer,
    span: Span,
    callee: &ast::ExpressionNode,
    args: &[ast::ExpressionNode],
) -> AggregateResult<ExprNode> {
    match &callee.data {
        ast::Expression::Ident(ident) => {
            let resolved = an.table.resolve(&ident.data);
            let args = lower_args(an, args);
            match resolved.map(|id| (id, an.table.symbol(id).kind.clone())) {
                Some((_, SymbolKind::Function(func))) => args.and_then(|args| {
                    let checks = check_args(an, span, &ident.data, func, &args);
                    let return_type = an.functions[func.0].return_type.clone();
                    let call = if an.functions[func.0].method_of.is_some() {
                        // bare method call inside a class body: dispatch on
                        // the current receiver
                        lower_this(an, span).map(|this| Expr::MethodCall {
                            receiver: Box::new(this),
                            callee: func,
                            args,
                        })
                    } else {
                        AggregateResult::new_ok(Expr::Call { callee: func, args })
                    };
                    checks.aggregate(call).map(|expr| rvalue(span, return_type, expr))
                }),
                Some(_) => args.aggregate(AggregateResult::new_rec(
                    error_node(span),
                    DiagnosticBuilder::new(callee.span).build_not_callable(&ident.data),
                )),
                None => args.aggregate(AggregateResult::new_rec(
                    error_node(span),
                    DiagnosticBuilder::new(callee.span).build_undeclared_ident(&ident.data),
                )),
            }
        }
        ast::Expression::Property(object, method) => {
            let object = lower_expr(an, object);
            let args = lower_args(an, args);
            object.zip(args).and_then(|(object, args)| match object.ty.clone() {
                Type::Class(class) => match an.resolve_method(class.id, &method.data) {
                    Some(func) => {
                        let checks = check_args(an, span, &method.data, func, &args);
                        let return_type = an.functions[func.0].return_type.clone();
                        checks.map(|()| {
                            rvalue(
                                span,
                                return_type,
                                Expr::MethodCall {
                                    receiver: Box::new(object),
                                    callee: func,
                                    args,
                                },
                            )
                        })
                    }
                    None => AggregateResult::new_rec(
                        error_node(span),
                        DiagnosticBuilder::new(method.span)
                            .build_bad_method_call(&class.name, &method.data),
                    ),
                },
                Type::Unknown => AggregateResult::new_ok(error_node(span)),
                _ => AggregateResult::new_rec(
                    error_node(span),
                    DiagnosticBuilder::new(span).build_property_on_non_object(&object),
                ),
            })
        }
        _ => {
            let args = lower_args(an, args);
            args.aggregate(AggregateResult::new_rec(
                error_node(span),
                DiagnosticBuilder::new(callee.span).build_not_callable("this expression"),
            ))
        }
    }
}

fn lower_new(
    an: &mut Analyzer,
    span: Span,
    class_ident: &ast::IdentNode,
    args: &[ast::ExpressionNode],
) -> AggregateResult<ExprNode> {
    let resolved = an.table.resolve(&class_ident.data);
    let args = lower_args(an, args);
    let class = match resolved.map(|id| an.table.symbol(id).kind.clone()) {
        Some(SymbolKind::Class(class)) => class,
        Some(_) => {
            return args.aggregate(AggregateResult::new_rec(
                error_node(span),
                DiagnosticBuilder::new(class_ident.span).build_not_a_type(&class_ident.data),
            ))
        }
        None => {
            return args.aggregate(AggregateResult::new_rec(
                error_node(span),
                DiagnosticBuilder::new(class_ident.span)
                    .build_undeclared_ident(&class_ident.data),
            ))
        }
    };

    args.and_then(|args| {
        let checks = match an.resolve_constructor(class) {
            Some(ctor) => check_args(an, span, &class_ident.data, ctor, &args),
            None if args.is_empty() => AggregateResult::new_ok(()),
            None => AggregateResult::new_rec(
                (),
                DiagnosticBuilder::new(span).build_arity_mismatch(
                    &class_ident.data,
                    0,
                    args.len(),
                ),
            ),
        };
        let ty = an.class_type(class);
        checks.map(|()| rvalue(span, ty, Expr::New { class, args }))
    })
}

/// `super.m(...)`: resolved in the parent's method table (and upward), with
/// the current receiver.
fn lower_super_call(
    an: &mut Analyzer,
    span: Span,
    method: &ast::IdentNode,
    args: &[ast::ExpressionNode],
) -> AggregateResult<ExprNode> {
    let args = lower_args(an, args);
    let parent = an
        .table
        .current_class()
        .and_then(|class| an.classes[class.0].parent);
    let Some(parent) = parent else {
        return args.aggregate(AggregateResult::new_rec(
            error_node(span),
            DiagnosticBuilder::new(span).build_super_outside_subclass(),
        ));
    };

    args.and_then(|args| match an.resolve_method(parent, &method.data) {
        Some(func) => {
            let checks = check_args(an, span, &method.data, func, &args);
            let return_type = an.functions[func.0].return_type.clone();
            let call = lower_this(an, span).map(|this| Expr::MethodCall {
                receiver: Box::new(this),
                callee: func,
                args,
            });
            checks.aggregate(call).map(|expr| rvalue(span, return_type, expr))
        }
        None => {
            let parent_name = an.classes[parent.0].name.clone();
            AggregateResult::new_rec(
                error_node(span),
                DiagnosticBuilder::new(method.span)
                    .build_bad_method_call(&parent_name, &method.data),
            )
        }
    })
}
