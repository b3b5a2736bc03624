//! The Three-Address Code instruction set and its textual format.
//!
//! The `Display` impls define the contract the MIPS backend reads: one
//! instruction per line, function blocks bracketed by `FUNCTION f:` /
//! `END FUNCTION f`, labels unindented, everything else indented with a
//! tab. `codegen::tac::parser` accepts exactly this format back.

use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub body: Vec<Instr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// `x := y`
    Copy { dst: Place, src: Value },
    /// `x := y op z`
    Binary {
        dst: Place,
        lhs: Value,
        op: BinOp,
        rhs: Value,
    },
    /// `x := op y`
    Unary { dst: Place, op: UnOp, src: Value },
    /// `L:`
    Label(Label),
    /// `GOTO L`
    Goto(Label),
    /// `IF cond > 0 GOTO L` — truth is "integer greater than zero"
    IfGoto { cond: Value, target: Label },
    /// `PARAM v` — leftmost first, receiver before the arguments
    Param(Value),
    /// `CALL f,n` — result, if any, appears in `R`
    Call { callee: String, argc: usize },
    /// `RETURN v?`
    Return(Option<Value>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(pub String);

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Str(String),
    /// The return-value pseudo-register.
    R,
    Place(Place),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    /// `tN`, freshly numbered per function
    Temp(u32),
    /// `G[k]`, byte offset of a global slot
    Global(u32),
    /// `fp[k]`: locals at `k >= 0`, parameters at `fp[-i]` with `this`
    /// first for methods
    Frame(i32),
    /// `base[off]`: object field (byte offset) or array element (index)
    Index(Box<Place>, Box<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Rem,
            "==" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            "&&" => BinOp::And,
            "||" => BinOp::Or,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Temp(n) => write!(f, "t{n}"),
            Place::Global(k) => write!(f, "G[{k}]"),
            Place::Frame(k) => write!(f, "fp[{k}]"),
            Place::Index(base, index) => write!(f, "{base}[{index}]"),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Str(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Value::R => write!(f, "R"),
            Value::Place(place) => write!(f, "{place}"),
        }
    }
}

impl Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Copy { dst, src } => write!(f, "{dst} := {src}"),
            Instr::Binary { dst, lhs, op, rhs } => {
                write!(f, "{dst} := {lhs} {} {rhs}", op.as_str())
            }
            Instr::Unary { dst, op, src } => write!(f, "{dst} := {} {src}", op.as_str()),
            Instr::Label(label) => write!(f, "{label}:"),
            Instr::Goto(label) => write!(f, "GOTO {label}"),
            Instr::IfGoto { cond, target } => write!(f, "IF {cond} > 0 GOTO {target}"),
            Instr::Param(value) => write!(f, "PARAM {value}"),
            Instr::Call { callee, argc } => write!(f, "CALL {callee},{argc}"),
            Instr::Return(None) => write!(f, "RETURN"),
            Instr::Return(Some(value)) => write!(f, "RETURN {value}"),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FUNCTION {}:", self.name)?;
        for instr in &self.body {
            match instr {
                Instr::Label(_) => writeln!(f, "{instr}")?,
                _ => writeln!(f, "\t{instr}")?,
            }
        }
        write!(f, "END FUNCTION {}", self.name)
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for function in &self.functions {
            writeln!(f, "{function}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_forms() {
        let cases = [
            (
                Instr::Copy {
                    dst: Place::Global(4),
                    src: Value::Int(3),
                },
                "G[4] := 3",
            ),
            (
                Instr::Binary {
                    dst: Place::Temp(0),
                    lhs: Value::Place(Place::Frame(-2)),
                    op: BinOp::Lt,
                    rhs: Value::Int(5),
                },
                "t0 := fp[-2] < 5",
            ),
            (
                Instr::Unary {
                    dst: Place::Temp(1),
                    op: UnOp::Not,
                    src: Value::Place(Place::Temp(0)),
                },
                "t1 := ! t0",
            ),
            (
                Instr::IfGoto {
                    cond: Value::Place(Place::Temp(0)),
                    target: Label("LABEL_TRUE_0".into()),
                },
                "IF t0 > 0 GOTO LABEL_TRUE_0",
            ),
            (
                Instr::Copy {
                    dst: Place::Index(Box::new(Place::Frame(-1)), Box::new(Value::Int(4))),
                    src: Value::Place(Place::Temp(2)),
                },
                "fp[-1][4] := t2",
            ),
            (
                Instr::Call {
                    callee: "add".into(),
                    argc: 3,
                },
                "CALL add,3",
            ),
            (Instr::Return(None), "RETURN"),
        ];
        for (instr, expected) in cases {
            assert_eq!(instr.to_string(), expected);
        }
    }

    #[test]
    fn string_values_are_escaped() {
        let v = Value::Str("a\"b\\c".into());
        assert_eq!(v.to_string(), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn function_blocks_indent_bodies_not_labels() {
        let function = Function {
            name: "main".into(),
            body: vec![
                Instr::Label(Label("STARTWHILE_0".into())),
                Instr::Goto(Label("ENDWHILE_0".into())),
                Instr::Label(Label("ENDWHILE_0".into())),
            ],
        };
        assert_eq!(
            function.to_string(),
            "FUNCTION main:\nSTARTWHILE_0:\n\tGOTO ENDWHILE_0\nENDWHILE_0:\nEND FUNCTION main"
        );
    }
}
