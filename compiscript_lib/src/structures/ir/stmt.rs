use super::expr::ExprNode;
use super::table::SymbolId;
use crate::diagnostic::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub span: Span,
    pub stmts: Vec<StmtNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StmtNode {
    pub span: Span,
    pub stmt: Stmt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(ExprNode),
    /// Variable or constant declaration; the symbol carries mutability and
    /// type, the initializer (if any) is already checked for assignability.
    Decl {
        symbol: SymbolId,
        init: Option<ExprNode>,
    },
    If {
        condition: ExprNode,
        then_branch: BlockNode,
        else_branch: Option<BlockNode>,
    },
    /// `while`, and `for` after hoisting its initializer: the appended step
    /// lives in `continuation`.
    While {
        condition: ExprNode,
        body: BlockNode,
        continuation: Option<ExprNode>,
    },
    DoWhile {
        body: BlockNode,
        condition: ExprNode,
    },
    Foreach {
        element: SymbolId,
        iterable: ExprNode,
        body: BlockNode,
    },
    Switch {
        scrutinee: ExprNode,
        cases: Vec<SwitchCaseNode>,
    },
    Break,
    Continue,
    Return(Option<ExprNode>),
    Print(ExprNode),
    /// Syntactic try/catch; there is no throw, so the catch block is dead
    /// code kept for the checker only.
    Try {
        try_block: BlockNode,
        catch_symbol: SymbolId,
        catch_block: BlockNode,
    },
    Block(BlockNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCaseNode {
    pub span: Span,
    pub data: SwitchCaseData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchCaseData {
    Case {
        value: ExprNode,
        body: Vec<StmtNode>,
    },
    Default {
        body: Vec<StmtNode>,
    },
}
