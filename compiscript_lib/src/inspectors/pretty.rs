//! Regenerates Compiscript source from an AST.
//!
//! Compound operands are parenthesized, so the output reparses to the same
//! tree shape; `pretty(parse(pretty(parse(s))))` is a fixpoint.

use crate::ast;

pub fn pretty_print(ast: &ast::Ast) -> String {
    let mut printer = Printer {
        out: String::new(),
        indent: 0,
    };
    for item in &ast.items {
        match &item.data {
            ast::Item::Class(class) => printer.class(class),
            ast::Item::Function(func) => printer.function(func),
            ast::Item::Statement(stmt) => printer.statement(stmt),
        }
    }
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn class(&mut self, class: &ast::ClassDeclaration) {
        let header = match &class.parent {
            Some(parent) => format!("class {} : {} {{", class.ident.data, parent.data),
            None => format!("class {} {{", class.ident.data),
        };
        self.line(&header);
        self.indent += 1;
        for member in &class.members {
            match &member.data {
                ast::ClassMember::Field(field) => {
                    let ty = field
                        .ty
                        .as_ref()
                        .map(|ty| format!(": {}", type_name(ty)))
                        .unwrap_or_default();
                    let keyword = if field.is_const { "const" } else { "let" };
                    self.line(&format!("{keyword} {}{ty};", field.ident.data));
                }
                ast::ClassMember::Method(method) => self.function(method),
                ast::ClassMember::Constructor(ctor) => {
                    if ctor.ident.data == "init" {
                        let params = params(&ctor.params);
                        self.line(&format!("init({params}) {{"));
                        self.indent += 1;
                        for stmt in &ctor.body.stmts {
                            self.statement(stmt);
                        }
                        self.indent -= 1;
                        self.line("}");
                    } else {
                        self.function(ctor);
                    }
                }
            }
        }
        self.indent -= 1;
        self.line("}");
    }

    fn function(&mut self, func: &ast::FunctionDeclaration) {
        let params = params(&func.params);
        let ret = func
            .return_type
            .as_ref()
            .map(|ty| format!(": {}", type_name(ty)))
            .unwrap_or_default();
        self.line(&format!("function {}({params}){ret} {{", func.ident.data));
        self.indent += 1;
        for stmt in &func.body.stmts {
            self.statement(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn block(&mut self, block: &ast::BlockNode, header: &str) {
        self.line(&format!("{header} {{"));
        self.indent += 1;
        for stmt in &block.stmts {
            self.statement(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn statement(&mut self, stmt: &ast::StatementNode) {
        match &stmt.data {
            ast::Statement::Declaration(decl) => {
                let keyword = if decl.is_const { "const" } else { "let" };
                let ty = decl
                    .ty
                    .as_ref()
                    .map(|ty| format!(": {}", type_name(ty)))
                    .unwrap_or_default();
                let init = decl
                    .initializer
                    .as_ref()
                    .map(|e| format!(" = {}", expr(e)))
                    .unwrap_or_default();
                self.line(&format!("{keyword} {}{ty}{init};", decl.ident.data));
            }
            ast::Statement::Expression(e) => {
                let text = expr(e);
                self.line(&format!("{text};"));
            }
            ast::Statement::If(stmt) => {
                self.block(&stmt.if_body, &format!("if ({})", expr(&stmt.condition)));
                if let Some(else_body) = &stmt.else_body {
                    self.block(else_body, "else");
                }
            }
            ast::Statement::While(stmt) => {
                self.block(&stmt.body, &format!("while ({})", expr(&stmt.condition)));
            }
            ast::Statement::DoWhile(stmt) => {
                self.block(&stmt.body, "do");
                self.line(&format!("while ({});", expr(&stmt.condition)));
            }
            ast::Statement::For(stmt) => {
                // the init statement carries its own semicolon
                let init = match &stmt.init {
                    Some(init) => statement_inline(init),
                    None => ";".to_owned(),
                };
                let condition = stmt.condition.as_ref().map(expr).unwrap_or_default();
                let step = stmt.step.as_ref().map(expr).unwrap_or_default();
                self.block(
                    &stmt.body,
                    &format!("for ({init} {condition}; {step})"),
                );
            }
            ast::Statement::Foreach(stmt) => {
                self.block(
                    &stmt.body,
                    &format!("foreach ({} in {})", stmt.ident.data, expr(&stmt.iterable)),
                );
            }
            ast::Statement::Switch(stmt) => {
                self.line(&format!("switch ({}) {{", expr(&stmt.scrutinee)));
                self.indent += 1;
                for case in &stmt.cases {
                    match case {
                        ast::SwitchCase::Case(case) => {
                            self.line(&format!("case {}:", expr(&case.value)));
                            self.indent += 1;
                            for s in &case.body {
                                self.statement(s);
                            }
                            self.indent -= 1;
                        }
                        ast::SwitchCase::Default(case) => {
                            self.line("default:");
                            self.indent += 1;
                            for s in &case.body {
                                self.statement(s);
                            }
                            self.indent -= 1;
                        }
                    }
                }
                self.indent -= 1;
                self.line("}");
            }
            ast::Statement::TryCatch(stmt) => {
                self.block(&stmt.try_block, "try");
                self.block(
                    &stmt.catch_block,
                    &format!("catch ({})", stmt.catch_ident.data),
                );
            }
            ast::Statement::Break => self.line("break;"),
            ast::Statement::Continue => self.line("continue;"),
            ast::Statement::Return(None) => self.line("return;"),
            ast::Statement::Return(Some(e)) => {
                let text = expr(e);
                self.line(&format!("return {text};"));
            }
            ast::Statement::Print(e) => {
                let text = expr(e);
                self.line(&format!("print({text});"));
            }
            ast::Statement::Block(block) => {
                self.line("{");
                self.indent += 1;
                for s in &block.stmts {
                    self.statement(s);
                }
                self.indent -= 1;
                self.line("}");
            }
        }
    }
}

/// A `for` initializer rendered on one line.
fn statement_inline(stmt: &ast::StatementNode) -> String {
    match &stmt.data {
        ast::Statement::Declaration(decl) => {
            let keyword = if decl.is_const { "const" } else { "let" };
            let ty = decl
                .ty
                .as_ref()
                .map(|ty| format!(": {}", type_name(ty)))
                .unwrap_or_default();
            let init = decl
                .initializer
                .as_ref()
                .map(|e| format!(" = {}", expr(e)))
                .unwrap_or_default();
            format!("{keyword} {}{ty}{init};", decl.ident.data)
        }
        ast::Statement::Expression(e) => format!("{};", expr(e)),
        _ => unreachable!("ICE: for initializer is a declaration or expression"),
    }
}

fn params(params: &[ast::ParamNode]) -> String {
    params
        .iter()
        .map(|p| match &p.ty {
            Some(ty) => format!("{}: {}", p.ident.data, type_name(ty)),
            None => p.ident.data.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn type_name(ty: &ast::TypeNode) -> String {
    match &ty.data {
        ast::TypeName::Integer => "integer".to_owned(),
        ast::TypeName::String => "string".to_owned(),
        ast::TypeName::Boolean => "boolean".to_owned(),
        ast::TypeName::Void => "void".to_owned(),
        ast::TypeName::Named(name) => name.clone(),
        ast::TypeName::Array(inner) => format!("{}[]", type_name(inner)),
    }
}

fn expr(e: &ast::ExpressionNode) -> String {
    match &e.data {
        ast::Expression::Literal(lit) => match &lit.data {
            ast::Literal::Integer(v) => v.to_string(),
            ast::Literal::Str(s) => {
                let mut out = String::from("\"");
                for c in s.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        c => out.push(c),
                    }
                }
                out.push('"');
                out
            }
            ast::Literal::Bool(true) => "true".to_owned(),
            ast::Literal::Bool(false) => "false".to_owned(),
            ast::Literal::Null => "null".to_owned(),
        },
        ast::Expression::ArrayLiteral(elements) => {
            let elements = elements.iter().map(expr).collect::<Vec<_>>().join(", ");
            format!("[{elements}]")
        }
        ast::Expression::Ident(ident) => ident.data.clone(),
        ast::Expression::This => "this".to_owned(),
        ast::Expression::Assignment(target, value) => {
            format!("{} = {}", expr(target), expr(value))
        }
        ast::Expression::Ternary {
            condition,
            then_branch,
            else_branch,
        } => format!(
            "{} ? {} : {}",
            operand(condition),
            expr(then_branch),
            expr(else_branch)
        ),
        ast::Expression::Binary(lhs, op, rhs) => {
            format!("{} {} {}", operand(lhs), operator(op.data), operand(rhs))
        }
        ast::Expression::Unary(op, inner) => {
            let op = match op.data {
                ast::UnaryOperator::Bang => "!",
                ast::UnaryOperator::Minus => "-",
            };
            format!("{op}{}", operand(inner))
        }
        ast::Expression::Index(base, index) => format!("{}[{}]", operand(base), expr(index)),
        ast::Expression::Property(base, ident) => format!("{}.{}", operand(base), ident.data),
        ast::Expression::Call(callee, args) => {
            let args = args.iter().map(expr).collect::<Vec<_>>().join(", ");
            format!("{}({args})", operand(callee))
        }
        ast::Expression::New(class, args) => {
            let args = args.iter().map(expr).collect::<Vec<_>>().join(", ");
            format!("new {}({args})", class.data)
        }
        ast::Expression::SuperCall { method, args } => {
            let args = args.iter().map(expr).collect::<Vec<_>>().join(", ");
            format!("super.{}({args})", method.data)
        }
    }
}

/// Parenthesizes compound subexpressions so precedence survives reparsing.
fn operand(e: &ast::ExpressionNode) -> String {
    match &e.data {
        ast::Expression::Assignment(_, _)
        | ast::Expression::Ternary { .. }
        | ast::Expression::Binary(_, _, _)
        | ast::Expression::Unary(_, _) => format!("({})", expr(e)),
        _ => expr(e),
    }
}

fn operator(op: ast::BinaryOperator) -> &'static str {
    use ast::BinaryOperator::*;
    match op {
        Plus => "+",
        Minus => "-",
        Star => "*",
        Slash => "/",
        Percent => "%",
        DoubleEquals => "==",
        BangEquals => "!=",
        AngleLeft => "<",
        AngleLeftEquals => "<=",
        AngleRight => ">",
        AngleRightEquals => ">=",
        DoubleAmpersand => "&&",
        DoublePipe => "||",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::parse;

    /// `pretty ∘ parse` reaches a fixpoint after one round.
    #[test]
    fn reparse_fixpoint() {
        let source = "\
            class Persona { let nombre: string; let edad: integer; \
              init(n: string, e: integer) { this.nombre = n; this.edad = e; } \
              function saluda(): string { return \"hola \" + nombre; } } \
            class Estudiante : Persona { let grado: integer; } \
            function fib(n: integer): integer { \
              if (n < 2) { return n; } \
              return fib(n - 1) + fib(n - 2); \
            } \
            let i: integer = 0; \
            while (i < 5 && !(i == 3)) { i = i + 1; } \
            for (let k: integer = 0; k < 3; k = k + 1) { print(k); } \
            switch (i) { case 1: print(1); break; default: print(0); } \
            let xs: integer[] = [1, 2, 3]; \
            foreach (x in xs) { print(x ? 1 : 0); }";

        let once = pretty_print(&parse::parse(source).into_value().expect("parse"));
        let twice = pretty_print(&parse::parse(&once).into_value().expect("reparse"));
        assert_eq!(once, twice);
    }

    #[test]
    fn parenthesizes_compound_operands() {
        let once = pretty_print(&parse::parse("let x = 1 + 2 * 3;").into_value().unwrap());
        assert_eq!(once.trim(), "let x = 1 + (2 * 3);");
    }
}
