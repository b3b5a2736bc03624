//! Recursive-descent parser from tokens to the [`ast`] structures.
//!
//! The precedence ladder is, loosest first: assignment, ternary, `||`, `&&`,
//! equality, relational, additive, multiplicative, unary, postfix.
//! Parsing stops at the first syntax error; semantic recovery only starts
//! once a well-formed tree exists.

use crate::ast;
use crate::diagnostic::{AggregateResult, Diagnostic, DiagnosticBuilder, Span};
use crate::passes::lexer::{lex, Token, TokenKind};

pub fn parse(source: &str) -> AggregateResult<ast::Ast> {
    lex(source).and_then(|tokens| {
        let mut parser = Parser { tokens, pos: 0 };
        match parser.program() {
            Ok(ast) => AggregateResult::new_ok(ast),
            Err(d) => AggregateResult::new_err(d),
        }
    })
}

type PResult<T> = Result<T, Diagnostic>;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&[kind.describe()]))
        }
    }

    fn unexpected(&self, expected: &[&'static str]) -> Diagnostic {
        DiagnosticBuilder::new(self.peek().span)
            .build_syntax_error(self.peek_kind().describe(), expected.to_vec())
    }

    fn expect_ident(&mut self) -> PResult<ast::IdentNode> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                let token = self.bump();
                Ok(ast::IdentNode {
                    span: token.span,
                    data: name,
                })
            }
            _ => Err(self.unexpected(&["identifier"])),
        }
    }

    // ==== toplevel ====

    fn program(&mut self) -> PResult<ast::Ast> {
        let mut items = Vec::new();
        while !self.at(&TokenKind::Eof) {
            items.push(self.item()?);
        }
        Ok(ast::Ast { items })
    }

    fn item(&mut self) -> PResult<ast::ItemNode> {
        match self.peek_kind() {
            TokenKind::Class => {
                let start = self.peek().span;
                let class = self.class_declaration()?;
                let end = self.tokens[self.pos - 1].span;
                Ok(ast::ItemNode {
                    span: start.merge(end),
                    data: ast::Item::Class(class),
                })
            }
            TokenKind::Function => {
                let start = self.peek().span;
                let func = self.function_declaration()?;
                Ok(ast::ItemNode {
                    span: start.merge(func.body.span),
                    data: ast::Item::Function(func),
                })
            }
            _ => {
                let stmt = self.statement()?;
                Ok(ast::ItemNode {
                    span: stmt.span,
                    data: ast::Item::Statement(stmt),
                })
            }
        }
    }

    fn class_declaration(&mut self) -> PResult<ast::ClassDeclaration> {
        self.expect(&TokenKind::Class)?;
        let ident = self.expect_ident()?;
        let parent = if self.eat(&TokenKind::Colon).is_some() {
            Some(self.expect_ident()?)
        } else {
            None
        };
        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();
        while self.eat(&TokenKind::RBrace).is_none() {
            members.push(self.class_member()?);
        }
        Ok(ast::ClassDeclaration {
            ident,
            parent,
            members,
        })
    }

    fn class_member(&mut self) -> PResult<ast::ClassMemberNode> {
        let start = self.peek().span;
        match self.peek_kind() {
            TokenKind::Let | TokenKind::Var | TokenKind::Const => {
                let decl = self.variable_declaration()?;
                let end = self.tokens[self.pos - 1].span;
                Ok(ast::ClassMemberNode {
                    span: start.merge(end),
                    data: ast::ClassMember::Field(decl),
                })
            }
            TokenKind::Function => {
                let func = self.function_declaration()?;
                let span = start.merge(func.body.span);
                let data = if func.ident.data == "constructor" {
                    ast::ClassMember::Constructor(func)
                } else {
                    ast::ClassMember::Method(func)
                };
                Ok(ast::ClassMemberNode { span, data })
            }
            // `init(...) { ... }` constructor spelling
            TokenKind::Ident(name) if name == "init" => {
                let ident = self.expect_ident()?;
                let params = self.parameter_list()?;
                let prototype_end = self.tokens[self.pos - 1].span;
                let body = self.block()?;
                let span = start.merge(body.span);
                Ok(ast::ClassMemberNode {
                    span,
                    data: ast::ClassMember::Constructor(ast::FunctionDeclaration {
                        prototype_span: start.merge(prototype_end),
                        ident,
                        params,
                        return_type: None,
                        body,
                    }),
                })
            }
            _ => Err(self.unexpected(&["`let`", "`const`", "`function`", "`init`"])),
        }
    }

    fn function_declaration(&mut self) -> PResult<ast::FunctionDeclaration> {
        let start = self.expect(&TokenKind::Function)?.span;
        let ident = self.expect_ident()?;
        let params = self.parameter_list()?;
        let return_type = if self.eat(&TokenKind::Colon).is_some() {
            Some(self.type_annotation()?)
        } else {
            None
        };
        let prototype_end = self.tokens[self.pos - 1].span;
        let body = self.block()?;
        Ok(ast::FunctionDeclaration {
            prototype_span: start.merge(prototype_end),
            ident,
            params,
            return_type,
            body,
        })
    }

    fn parameter_list(&mut self) -> PResult<Vec<ast::ParamNode>> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.eat(&TokenKind::RParen).is_some() {
            return Ok(params);
        }
        loop {
            let ident = self.expect_ident()?;
            let ty = if self.eat(&TokenKind::Colon).is_some() {
                Some(self.type_annotation()?)
            } else {
                None
            };
            let end = ty.as_ref().map(|t| t.span).unwrap_or(ident.span);
            params.push(ast::ParamNode {
                span: ident.span.merge(end),
                ident,
                ty,
            });
            if self.eat(&TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    fn type_annotation(&mut self) -> PResult<ast::TypeNode> {
        let ident = self.expect_ident()?;
        let data = match ident.data.as_str() {
            "integer" => ast::TypeName::Integer,
            "string" => ast::TypeName::String,
            "boolean" => ast::TypeName::Boolean,
            "void" => ast::TypeName::Void,
            _ => ast::TypeName::Named(ident.data),
        };
        let mut node = ast::TypeNode {
            span: ident.span,
            data,
        };
        while self.at(&TokenKind::LBracket) {
            self.bump();
            let close = self.expect(&TokenKind::RBracket)?;
            node = ast::TypeNode {
                span: node.span.merge(close.span),
                data: ast::TypeName::Array(Box::new(node)),
            };
        }
        Ok(node)
    }

    // ==== statements ====

    fn block(&mut self) -> PResult<ast::BlockNode> {
        let start = self.expect(&TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();
        loop {
            if let Some(close) = self.eat(&TokenKind::RBrace) {
                return Ok(ast::BlockNode {
                    span: start.merge(close.span),
                    stmts,
                });
            }
            if self.at(&TokenKind::Eof) {
                return Err(self.unexpected(&["`}`"]));
            }
            stmts.push(self.statement()?);
        }
    }

    fn statement(&mut self) -> PResult<ast::StatementNode> {
        let start = self.peek().span;
        let data = match self.peek_kind() {
            TokenKind::Let | TokenKind::Var | TokenKind::Const => {
                ast::Statement::Declaration(self.variable_declaration()?)
            }
            TokenKind::If => ast::Statement::If(self.if_statement()?),
            TokenKind::While => ast::Statement::While(self.while_statement()?),
            TokenKind::Do => ast::Statement::DoWhile(self.do_while_statement()?),
            TokenKind::For => ast::Statement::For(self.for_statement()?),
            TokenKind::Foreach => ast::Statement::Foreach(self.foreach_statement()?),
            TokenKind::Switch => ast::Statement::Switch(self.switch_statement()?),
            TokenKind::Try => ast::Statement::TryCatch(self.try_catch_statement()?),
            TokenKind::Break => {
                self.bump();
                self.expect(&TokenKind::Semicolon)?;
                ast::Statement::Break
            }
            TokenKind::Continue => {
                self.bump();
                self.expect(&TokenKind::Semicolon)?;
                ast::Statement::Continue
            }
            TokenKind::Return => {
                self.bump();
                let value = if self.at(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(&TokenKind::Semicolon)?;
                ast::Statement::Return(value)
            }
            TokenKind::Print => {
                self.bump();
                self.expect(&TokenKind::LParen)?;
                let expr = self.expression()?;
                self.expect(&TokenKind::RParen)?;
                self.expect(&TokenKind::Semicolon)?;
                ast::Statement::Print(expr)
            }
            TokenKind::LBrace => ast::Statement::Block(self.block()?),
            _ => {
                let expr = self.expression()?;
                self.expect(&TokenKind::Semicolon)?;
                ast::Statement::Expression(expr)
            }
        };
        let end = self.tokens[self.pos - 1].span;
        Ok(ast::StatementNode {
            span: start.merge(end),
            data,
        })
    }

    fn variable_declaration(&mut self) -> PResult<ast::VariableDeclaration> {
        let is_const = match self.peek_kind() {
            TokenKind::Const => true,
            TokenKind::Let | TokenKind::Var => false,
            _ => unreachable!("caller checked for a declaration keyword"),
        };
        self.bump();
        let ident = self.expect_ident()?;
        let ty = if self.eat(&TokenKind::Colon).is_some() {
            Some(self.type_annotation()?)
        } else {
            None
        };
        let initializer = if self.eat(&TokenKind::Assign).is_some() {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(&TokenKind::Semicolon)?;
        Ok(ast::VariableDeclaration {
            ident,
            ty,
            initializer,
            is_const,
        })
    }

    fn if_statement(&mut self) -> PResult<ast::IfStatement> {
        self.expect(&TokenKind::If)?;
        self.expect(&TokenKind::LParen)?;
        let condition = self.expression()?;
        self.expect(&TokenKind::RParen)?;
        let if_body = self.block()?;
        let else_body = if self.eat(&TokenKind::Else).is_some() {
            if self.at(&TokenKind::If) {
                // `else if` becomes an else block with a single if statement
                let nested = self.statement()?;
                Some(ast::BlockNode {
                    span: nested.span,
                    stmts: vec![nested],
                })
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(ast::IfStatement {
            condition,
            if_body,
            else_body,
        })
    }

    fn while_statement(&mut self) -> PResult<ast::WhileStatement> {
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let condition = self.expression()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.block()?;
        Ok(ast::WhileStatement { condition, body })
    }

    fn do_while_statement(&mut self) -> PResult<ast::DoWhileStatement> {
        self.expect(&TokenKind::Do)?;
        let body = self.block()?;
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let condition = self.expression()?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(ast::DoWhileStatement { body, condition })
    }

    fn for_statement(&mut self) -> PResult<ast::ForStatement> {
        self.expect(&TokenKind::For)?;
        self.expect(&TokenKind::LParen)?;
        let init = if self.eat(&TokenKind::Semicolon).is_some() {
            None
        } else {
            let start = self.peek().span;
            let data = match self.peek_kind() {
                TokenKind::Let | TokenKind::Var | TokenKind::Const => {
                    ast::Statement::Declaration(self.variable_declaration()?)
                }
                _ => {
                    let expr = self.expression()?;
                    self.expect(&TokenKind::Semicolon)?;
                    ast::Statement::Expression(expr)
                }
            };
            let end = self.tokens[self.pos - 1].span;
            Some(Box::new(ast::StatementNode {
                span: start.merge(end),
                data,
            }))
        };
        let condition = if self.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let step = if self.at(&TokenKind::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.block()?;
        Ok(ast::ForStatement {
            init,
            condition,
            step,
            body,
        })
    }

    fn foreach_statement(&mut self) -> PResult<ast::ForeachStatement> {
        self.expect(&TokenKind::Foreach)?;
        self.expect(&TokenKind::LParen)?;
        let ident = self.expect_ident()?;
        self.expect(&TokenKind::In)?;
        let iterable = self.expression()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.block()?;
        Ok(ast::ForeachStatement {
            ident,
            iterable,
            body,
        })
    }

    fn switch_statement(&mut self) -> PResult<ast::SwitchStatement> {
        self.expect(&TokenKind::Switch)?;
        self.expect(&TokenKind::LParen)?;
        let scrutinee = self.expression()?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::LBrace)?;
        let mut cases = Vec::new();
        let mut seen_default = false;
        loop {
            if self.eat(&TokenKind::RBrace).is_some() {
                return Ok(ast::SwitchStatement { scrutinee, cases });
            }
            if let Some(token) = self.eat(&TokenKind::Case) {
                let value = self.expression()?;
                self.expect(&TokenKind::Colon)?;
                let body = self.case_body()?;
                cases.push(ast::SwitchCase::Case(ast::SwitchCaseNode {
                    label_span: token.span,
                    value,
                    body,
                }));
            } else if let Some(token) = self.eat(&TokenKind::Default) {
                if seen_default {
                    return Err(DiagnosticBuilder::new(token.span)
                        .build_syntax_error("`default`", vec!["`case`", "`}`"]));
                }
                seen_default = true;
                self.expect(&TokenKind::Colon)?;
                let body = self.case_body()?;
                cases.push(ast::SwitchCase::Default(ast::SwitchDefaultNode {
                    label_span: token.span,
                    body,
                }));
            } else {
                return Err(self.unexpected(&["`case`", "`default`", "`}`"]));
            }
        }
    }

    fn case_body(&mut self) -> PResult<Vec<ast::StatementNode>> {
        let mut stmts = Vec::new();
        while !matches!(
            self.peek_kind(),
            TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
        ) {
            stmts.push(self.statement()?);
        }
        Ok(stmts)
    }

    fn try_catch_statement(&mut self) -> PResult<ast::TryCatchStatement> {
        self.expect(&TokenKind::Try)?;
        let try_block = self.block()?;
        self.expect(&TokenKind::Catch)?;
        self.expect(&TokenKind::LParen)?;
        let catch_ident = self.expect_ident()?;
        self.expect(&TokenKind::RParen)?;
        let catch_block = self.block()?;
        Ok(ast::TryCatchStatement {
            try_block,
            catch_ident,
            catch_block,
        })
    }

    // ==== expressions ====

    fn expression(&mut self) -> PResult<ast::ExpressionNode> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<ast::ExpressionNode> {
        let target = self.ternary()?;
        if self.eat(&TokenKind::Assign).is_some() {
            // right-associative
            let value = self.assignment()?;
            return Ok(ast::ExpressionNode {
                span: target.span.merge(value.span),
                data: ast::Expression::Assignment(Box::new(target), Box::new(value)),
            });
        }
        Ok(target)
    }

    fn ternary(&mut self) -> PResult<ast::ExpressionNode> {
        let condition = self.logical_or()?;
        if self.eat(&TokenKind::Question).is_some() {
            let then_branch = self.expression()?;
            self.expect(&TokenKind::Colon)?;
            let else_branch = self.expression()?;
            return Ok(ast::ExpressionNode {
                span: condition.span.merge(else_branch.span),
                data: ast::Expression::Ternary {
                    condition: Box::new(condition),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                },
            });
        }
        Ok(condition)
    }

    fn binary_level<F>(
        &mut self,
        ops: &[(TokenKind, ast::BinaryOperator)],
        mut next: F,
    ) -> PResult<ast::ExpressionNode>
    where
        F: FnMut(&mut Self) -> PResult<ast::ExpressionNode>,
    {
        let mut left = next(self)?;
        'outer: loop {
            for (token, op) in ops {
                if self.at(token) {
                    let op_token = self.bump();
                    let right = next(self)?;
                    left = ast::ExpressionNode {
                        span: left.span.merge(right.span),
                        data: ast::Expression::Binary(
                            Box::new(left),
                            ast::BinaryOperatorNode {
                                span: op_token.span,
                                data: *op,
                            },
                            Box::new(right),
                        ),
                    };
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn logical_or(&mut self) -> PResult<ast::ExpressionNode> {
        self.binary_level(
            &[(TokenKind::OrOr, ast::BinaryOperator::DoublePipe)],
            Self::logical_and,
        )
    }

    fn logical_and(&mut self) -> PResult<ast::ExpressionNode> {
        self.binary_level(
            &[(TokenKind::AndAnd, ast::BinaryOperator::DoubleAmpersand)],
            Self::equality,
        )
    }

    fn equality(&mut self) -> PResult<ast::ExpressionNode> {
        self.binary_level(
            &[
                (TokenKind::EqEq, ast::BinaryOperator::DoubleEquals),
                (TokenKind::BangEq, ast::BinaryOperator::BangEquals),
            ],
            Self::relational,
        )
    }

    fn relational(&mut self) -> PResult<ast::ExpressionNode> {
        self.binary_level(
            &[
                (TokenKind::Le, ast::BinaryOperator::AngleLeftEquals),
                (TokenKind::Ge, ast::BinaryOperator::AngleRightEquals),
                (TokenKind::Lt, ast::BinaryOperator::AngleLeft),
                (TokenKind::Gt, ast::BinaryOperator::AngleRight),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> PResult<ast::ExpressionNode> {
        self.binary_level(
            &[
                (TokenKind::Plus, ast::BinaryOperator::Plus),
                (TokenKind::Minus, ast::BinaryOperator::Minus),
            ],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> PResult<ast::ExpressionNode> {
        self.binary_level(
            &[
                (TokenKind::Star, ast::BinaryOperator::Star),
                (TokenKind::Slash, ast::BinaryOperator::Slash),
                (TokenKind::Percent, ast::BinaryOperator::Percent),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> PResult<ast::ExpressionNode> {
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(ast::UnaryOperator::Minus),
            TokenKind::Bang => Some(ast::UnaryOperator::Bang),
            _ => None,
        };
        if let Some(op) = op {
            let op_token = self.bump();
            let inner = self.unary()?;
            return Ok(ast::ExpressionNode {
                span: op_token.span.merge(inner.span),
                data: ast::Expression::Unary(
                    ast::UnaryOperatorNode {
                        span: op_token.span,
                        data: op,
                    },
                    Box::new(inner),
                ),
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> PResult<ast::ExpressionNode> {
        let mut expr = self.primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.bump();
                    let ident = self.expect_ident()?;
                    expr = ast::ExpressionNode {
                        span: expr.span.merge(ident.span),
                        data: ast::Expression::Property(Box::new(expr), ident),
                    };
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.expression()?;
                    let close = self.expect(&TokenKind::RBracket)?;
                    expr = ast::ExpressionNode {
                        span: expr.span.merge(close.span),
                        data: ast::Expression::Index(Box::new(expr), Box::new(index)),
                    };
                }
                TokenKind::LParen => {
                    let (args, close) = self.argument_list()?;
                    expr = ast::ExpressionNode {
                        span: expr.span.merge(close),
                        data: ast::Expression::Call(Box::new(expr), args),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn argument_list(&mut self) -> PResult<(Vec<ast::ExpressionNode>, Span)> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if let Some(close) = self.eat(&TokenKind::RParen) {
            return Ok((args, close.span));
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(&TokenKind::RParen)?;
        Ok((args, close.span))
    }

    fn primary(&mut self) -> PResult<ast::ExpressionNode> {
        let token = self.peek().clone();
        let expr = match token.kind {
            TokenKind::Integer(value) => {
                self.bump();
                literal(token.span, ast::Literal::Integer(value))
            }
            TokenKind::Str(ref value) => {
                let value = value.clone();
                self.bump();
                literal(token.span, ast::Literal::Str(value))
            }
            TokenKind::True => {
                self.bump();
                literal(token.span, ast::Literal::Bool(true))
            }
            TokenKind::False => {
                self.bump();
                literal(token.span, ast::Literal::Bool(false))
            }
            TokenKind::Null => {
                self.bump();
                literal(token.span, ast::Literal::Null)
            }
            TokenKind::This => {
                self.bump();
                ast::ExpressionNode {
                    span: token.span,
                    data: ast::Expression::This,
                }
            }
            TokenKind::Ident(ref name) => {
                let name = name.clone();
                self.bump();
                ast::ExpressionNode {
                    span: token.span,
                    data: ast::Expression::Ident(ast::IdentNode {
                        span: token.span,
                        data: name,
                    }),
                }
            }
            TokenKind::New => {
                self.bump();
                let class = self.expect_ident()?;
                let (args, close) = self.argument_list()?;
                ast::ExpressionNode {
                    span: token.span.merge(close),
                    data: ast::Expression::New(class, args),
                }
            }
            TokenKind::Super => {
                self.bump();
                self.expect(&TokenKind::Dot)?;
                let method = self.expect_ident()?;
                let (args, close) = self.argument_list()?;
                ast::ExpressionNode {
                    span: token.span.merge(close),
                    data: ast::Expression::SuperCall { method, args },
                }
            }
            TokenKind::LBracket => {
                self.bump();
                let mut elements = Vec::new();
                if let Some(close) = self.eat(&TokenKind::RBracket) {
                    ast::ExpressionNode {
                        span: token.span.merge(close.span),
                        data: ast::Expression::ArrayLiteral(elements),
                    }
                } else {
                    loop {
                        elements.push(self.expression()?);
                        if self.eat(&TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                    let close = self.expect(&TokenKind::RBracket)?;
                    ast::ExpressionNode {
                        span: token.span.merge(close.span),
                        data: ast::Expression::ArrayLiteral(elements),
                    }
                }
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen)?;
                inner
            }
            _ => return Err(self.unexpected(&["expression"])),
        };
        Ok(expr)
    }
}

fn literal(span: Span, data: ast::Literal) -> ast::ExpressionNode {
    ast::ExpressionNode {
        span,
        data: ast::Expression::Literal(ast::LiteralNode { span, data }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    fn parse_ok(source: &str) -> Ast {
        let res = parse(source);
        match res.value() {
            Some(_) => res.into_value().unwrap(),
            None => panic!(
                "parse failed: {:?}",
                res.diagnostics().map(|d| d.1.message().clone()).collect::<Vec<_>>()
            ),
        }
    }

    fn first_expr(ast: &Ast) -> &Expression {
        match &ast.items[0].data {
            Item::Statement(StatementNode {
                data: Statement::Expression(e),
                ..
            }) => &e.data,
            other => panic!("not an expression statement: {other:?}"),
        }
    }

    #[test]
    fn precedence_mul_binds_tighter_than_add() {
        let ast = parse_ok("1 + 2 * 3;");
        match first_expr(&ast) {
            Expression::Binary(_, op, right) => {
                assert_eq!(op.data, BinaryOperator::Plus);
                assert!(matches!(right.data, Expression::Binary(_, ref o, _)
                    if o.data == BinaryOperator::Star));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let ast = parse_ok("a = b = 1;");
        match first_expr(&ast) {
            Expression::Assignment(_, value) => {
                assert!(matches!(value.data, Expression::Assignment(_, _)));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn postfix_chains() {
        let ast = parse_ok("o.m(1, 2)[0].f;");
        assert!(matches!(first_expr(&ast), Expression::Property(_, _)));
    }

    #[test]
    fn class_with_both_constructor_spellings() {
        let ast = parse_ok("class A { init(n: integer) { } }");
        let Item::Class(class) = &ast.items[0].data else {
            panic!("expected class");
        };
        assert!(matches!(
            class.members[0].data,
            ClassMember::Constructor(_)
        ));

        let ast = parse_ok("class B { function constructor() { } }");
        let Item::Class(class) = &ast.items[0].data else {
            panic!("expected class");
        };
        assert!(matches!(
            class.members[0].data,
            ClassMember::Constructor(_)
        ));
    }

    #[test]
    fn nested_array_types() {
        let ast = parse_ok("let m: integer[][] = [[1]];");
        let Item::Statement(StatementNode {
            data: Statement::Declaration(decl),
            ..
        }) = &ast.items[0].data
        else {
            panic!("expected declaration");
        };
        let ty = decl.ty.as_ref().unwrap();
        assert!(matches!(&ty.data, TypeName::Array(inner)
            if matches!(inner.data, TypeName::Array(_))));
    }

    #[test]
    fn missing_semicolon_is_a_syntax_error() {
        assert!(parse("let x = 1").is_err());
    }

    #[test]
    fn double_default_is_rejected() {
        assert!(parse("switch (true) { default: default: }").is_err());
    }
}
