use super::{Code, Diagnostic, Span};
use crate::ir;

pub struct DiagnosticBuilder {
    span: Span,
    additional_spans: Vec<(Span, Option<String>)>,
}

impl DiagnosticBuilder {
    pub fn new(span: impl Into<Span>) -> Self {
        Self {
            span: span.into(),
            additional_spans: Vec::new(),
        }
    }

    pub fn with_additional_span(mut self, span: impl Into<Span>, message: Option<String>) -> Self {
        self.add_additional_span(span, message);
        self
    }

    pub fn add_additional_span(&mut self, span: impl Into<Span>, message: Option<String>) {
        self.additional_spans.push((span.into(), message));
    }

    pub fn with_expr_type(mut self, expr: &ir::ExprNode) -> Self {
        self.add_expr_type(expr);
        self
    }

    pub fn add_expr_type(&mut self, expr: &ir::ExprNode) {
        self.add_additional_span(
            expr.span,
            Some(format!("this expression has type `{}`", expr.ty)),
        );
    }

    fn build_custom(self, code: Code, message: String) -> Diagnostic {
        Diagnostic {
            code,
            message,
            main_span: (self.span, None),
            additional_spans: self.additional_spans,
        }
    }

    pub fn build_syntax_error(self, unexpected: &str, expected: Vec<&str>) -> Diagnostic {
        let message = if expected.is_empty() {
            format!("unexpected token: {unexpected}")
        } else {
            let expected = expected.join(", ");
            format!("unexpected token: {unexpected}, expected one of: {expected}")
        };
        self.build_custom(Code::Syntax, message)
    }

    pub fn build_unterminated(self, what: &str) -> Diagnostic {
        self.build_custom(Code::Syntax, format!("unterminated {what}"))
    }

    pub fn build_duplicate_declaration(mut self, name: &str, original_span: Span) -> Diagnostic {
        self.add_additional_span(original_span, Some("originally declared here".to_owned()));
        self.build_custom(
            Code::DuplicateDeclaration,
            format!("`{name}` is already declared in this scope"),
        )
    }

    pub fn build_reserved_word(self, name: &str) -> Diagnostic {
        self.build_custom(
            Code::DuplicateDeclaration,
            format!("`{name}` is a reserved word and cannot be declared"),
        )
    }

    pub fn build_duplicate_constructor(mut self, class_name: &str, first: Span) -> Diagnostic {
        self.add_additional_span(first, Some("first constructor here".to_owned()));
        self.build_custom(
            Code::DuplicateDeclaration,
            format!("class `{class_name}` has more than one constructor"),
        )
    }

    pub fn build_undeclared_ident(self, name: &str) -> Diagnostic {
        self.build_custom(
            Code::UndeclaredIdentifier,
            format!("identifier `{name}` isn't declared in this scope"),
        )
    }

    pub fn build_uninitialized_read(mut self, name: &str, declared_at: Span) -> Diagnostic {
        self.add_additional_span(declared_at, Some("declared without initializer".to_owned()));
        self.build_custom(
            Code::UninitializedRead,
            format!("variable `{name}` is read before being initialized"),
        )
    }

    pub fn build_type_mismatch_bin(
        mut self,
        operator: &str,
        left: &ir::ExprNode,
        right: &ir::ExprNode,
    ) -> Diagnostic {
        self.add_expr_type(left);
        self.add_expr_type(right);
        self.build_custom(
            Code::TypeMismatch,
            format!(
                "operator `{operator}` cannot be applied to `{}` and `{}`",
                left.ty, right.ty
            ),
        )
    }

    pub fn build_type_mismatch_un(mut self, operator: &str, inner: &ir::ExprNode) -> Diagnostic {
        self.add_expr_type(inner);
        self.build_custom(
            Code::TypeMismatch,
            format!(
                "unary operator `{operator}` cannot be applied to `{}`",
                inner.ty
            ),
        )
    }

    pub fn build_incompatible_assign(mut self, from: &ir::ExprNode, to_ty: &ir::Type) -> Diagnostic {
        self.add_expr_type(from);
        self.build_custom(
            Code::TypeMismatch,
            format!("cannot assign `{}` to `{to_ty}`", from.ty),
        )
    }

    pub fn build_incompatible_arg(
        mut self,
        callee: &str,
        index: usize,
        arg: &ir::ExprNode,
        param_ty: &ir::Type,
    ) -> Diagnostic {
        self.add_expr_type(arg);
        self.build_custom(
            Code::TypeMismatch,
            format!(
                "argument {} of `{callee}` has type `{}`, expected `{param_ty}`",
                index + 1,
                arg.ty
            ),
        )
    }

    pub fn build_need_lvalue(self) -> Diagnostic {
        self.build_custom(
            Code::TypeMismatch,
            "left-hand side of assignment is not assignable".to_owned(),
        )
    }

    pub fn build_void_value(self) -> Diagnostic {
        self.build_custom(
            Code::TypeMismatch,
            "a `void` call cannot be used as a value".to_owned(),
        )
    }

    pub fn build_ternary_branch_mismatch(
        mut self,
        then: &ir::ExprNode,
        otherwise: &ir::ExprNode,
    ) -> Diagnostic {
        self.add_expr_type(then);
        self.add_expr_type(otherwise);
        self.build_custom(
            Code::TypeMismatch,
            format!(
                "`?:` branches have different types: `{}` and `{}`",
                then.ty, otherwise.ty
            ),
        )
    }

    pub fn build_arity_mismatch(self, callee: &str, expected: usize, got: usize) -> Diagnostic {
        self.build_custom(
            Code::ArityMismatch,
            format!("`{callee}` expects {expected} argument(s), got {got}"),
        )
    }

    pub fn build_bad_condition(mut self, construct: &str, cond: &ir::ExprNode) -> Diagnostic {
        self.add_expr_type(cond);
        self.build_custom(
            Code::BadCondition,
            format!("{construct} condition must be `boolean`, got `{}`", cond.ty),
        )
    }

    pub fn build_bad_switch_scrutinee(mut self, expr: &ir::ExprNode) -> Diagnostic {
        self.add_expr_type(expr);
        self.build_custom(
            Code::BadCondition,
            format!("switch quantity must be a primitive type, got `{}`", expr.ty),
        )
    }

    pub fn build_break_continue_outside_loop(self, which: &str) -> Diagnostic {
        self.build_custom(
            Code::BreakContinueOutsideLoop,
            format!("`{which}` outside of a loop"),
        )
    }

    pub fn build_return_outside_function(self) -> Diagnostic {
        self.build_custom(
            Code::ReturnOutsideFunction,
            "`return` outside of a function".to_owned(),
        )
    }

    pub fn build_return_type_mismatch(
        self,
        func_name: &str,
        expected: &ir::Type,
        got: Option<&ir::ExprNode>,
    ) -> Diagnostic {
        let message = match got {
            Some(expr) => format!(
                "`{func_name}` should return `{expected}`, got `{}`",
                expr.ty
            ),
            None => format!("`{func_name}` must return a value of type `{expected}`"),
        };
        self.build_custom(Code::ReturnTypeMismatch, message)
    }

    pub fn build_value_return_in_void(self, func_name: &str) -> Diagnostic {
        self.build_custom(
            Code::ReturnTypeMismatch,
            format!("`{func_name}` is `void` and should not return a value"),
        )
    }

    pub fn build_missing_return(self, func_name: &str, return_type: &ir::Type) -> Diagnostic {
        self.build_custom(
            Code::MissingReturn,
            format!("`{func_name}` does not return `{return_type}` on all paths"),
        )
    }

    pub fn build_bad_property_access(self, class_name: &str, property: &str) -> Diagnostic {
        self.build_custom(
            Code::BadPropertyAccess,
            format!("class `{class_name}` has no property `{property}`"),
        )
    }

    pub fn build_property_on_non_object(mut self, expr: &ir::ExprNode) -> Diagnostic {
        self.add_expr_type(expr);
        self.build_custom(
            Code::BadPropertyAccess,
            format!("property access on non-class type `{}`", expr.ty),
        )
    }

    pub fn build_bad_method_call(self, class_name: &str, method: &str) -> Diagnostic {
        self.build_custom(
            Code::BadMethodCall,
            format!("class `{class_name}` has no method `{method}`"),
        )
    }

    pub fn build_not_callable(self, name: &str) -> Diagnostic {
        self.build_custom(Code::BadMethodCall, format!("`{name}` is not callable"))
    }

    pub fn build_symbol_as_value(self, kind: &str, name: &str) -> Diagnostic {
        self.build_custom(
            Code::TypeMismatch,
            format!("{kind} `{name}` cannot be used as a value"),
        )
    }

    pub fn build_not_a_type(self, name: &str) -> Diagnostic {
        self.build_custom(Code::TypeMismatch, format!("`{name}` does not name a type"))
    }

    pub fn build_void_variable(self) -> Diagnostic {
        self.build_custom(
            Code::TypeMismatch,
            "`void` is only valid as a return type".to_owned(),
        )
    }

    pub fn build_param_needs_type(self, name: &str) -> Diagnostic {
        self.build_custom(
            Code::Syntax,
            format!("parameter `{name}` must have a type annotation"),
        )
    }

    pub fn build_field_form(self) -> Diagnostic {
        self.build_custom(
            Code::Syntax,
            "class fields declare a type and take no initializer".to_owned(),
        )
    }

    pub fn build_bad_inheritance(self, message: String) -> Diagnostic {
        self.build_custom(Code::BadInheritance, message)
    }

    pub fn build_this_outside_class(self) -> Diagnostic {
        self.build_custom(
            Code::ThisOutsideClass,
            "`this` is only available inside a method body".to_owned(),
        )
    }

    pub fn build_super_outside_subclass(self) -> Diagnostic {
        self.build_custom(
            Code::ThisOutsideClass,
            "`super` is only available inside a method of a subclass".to_owned(),
        )
    }

    pub fn build_assign_to_immutable(mut self, what: &str, name: &str, declared_at: Span) -> Diagnostic {
        self.add_additional_span(declared_at, Some("declared here".to_owned()));
        self.build_custom(
            Code::AssignToImmutable,
            format!("cannot assign to {what} `{name}`"),
        )
    }

    pub fn build_const_needs_initializer(self, name: &str) -> Diagnostic {
        self.build_custom(
            Code::AssignToImmutable,
            format!("constant `{name}` must be initialized at declaration"),
        )
    }

    pub fn build_bad_array_literal(mut self, first: &ir::ExprNode, odd: &ir::ExprNode) -> Diagnostic {
        self.add_expr_type(first);
        self.add_expr_type(odd);
        self.build_custom(
            Code::BadArrayLiteral,
            "array literal elements must all have the same type".to_owned(),
        )
    }

    pub fn build_index_non_array(mut self, expr: &ir::ExprNode) -> Diagnostic {
        self.add_expr_type(expr);
        self.build_custom(
            Code::BadIndex,
            format!("cannot index a value of type `{}`", expr.ty),
        )
    }

    pub fn build_non_integer_index(mut self, index: &ir::ExprNode) -> Diagnostic {
        self.add_expr_type(index);
        self.build_custom(
            Code::BadIndex,
            format!("array index must be `integer`, got `{}`", index.ty),
        )
    }

    pub fn build_foreach_non_array(mut self, expr: &ir::ExprNode) -> Diagnostic {
        self.add_expr_type(expr);
        self.build_custom(
            Code::BadIndex,
            format!("`foreach` needs an array to iterate, got `{}`", expr.ty),
        )
    }

    pub fn build_override_signature_mismatch(
        mut self,
        method: &str,
        parent_decl: Span,
    ) -> Diagnostic {
        self.add_additional_span(parent_decl, Some("overridden method here".to_owned()));
        self.build_custom(
            Code::OverrideSignatureMismatch,
            format!("override of `{method}` does not match the inherited signature"),
        )
    }
}
