use super::{BlockNode, ExpressionNode, IdentNode, TypeNode};
use crate::diagnostic::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub ident: IdentNode,
    pub ty: Option<TypeNode>,
    pub initializer: Option<ExpressionNode>,
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub prototype_span: Span,
    pub ident: IdentNode,
    pub params: Vec<ParamNode>,
    /// `None` means `void`.
    pub return_type: Option<TypeNode>,
    pub body: BlockNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamNode {
    pub span: Span,
    pub ident: IdentNode,
    /// Parameters must be annotated; `None` only survives parsing so the
    /// analyzer can report it with a position.
    pub ty: Option<TypeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    pub ident: IdentNode,
    pub parent: Option<IdentNode>,
    pub members: Vec<ClassMemberNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMemberNode {
    pub span: Span,
    pub data: ClassMember,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Field(VariableDeclaration),
    Method(FunctionDeclaration),
    /// Either `function constructor(...)` or `init(...)`; the ident keeps
    /// the spelling that was used.
    Constructor(FunctionDeclaration),
}
