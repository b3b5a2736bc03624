//! Parses the textual TAC format back into [`tac::Program`].
//!
//! Accepts exactly the forms the generator emits; whitespace between tokens
//! is arbitrary, indentation is conventional. This is the contract check for
//! the backend boundary: `parse(program.to_string()) == program`.

use thiserror::Error;

use crate::tac::{BinOp, Function, Instr, Label, Place, Program, UnOp, Value};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TacParseError {
    #[error("line {line}: unexpected `{found}`")]
    Unexpected { line: usize, found: String },
    #[error("line {line}: malformed instruction")]
    Malformed { line: usize },
    #[error("line {line}: instruction outside of a function block")]
    OutsideFunction { line: usize },
    #[error("line {line}: `END FUNCTION {found}` closes `FUNCTION {expected}`")]
    FunctionNameMismatch {
        line: usize,
        expected: String,
        found: String,
    },
    #[error("unterminated function `{0}`")]
    UnterminatedFunction(String),
}

pub fn parse(text: &str) -> Result<Program, TacParseError> {
    let mut program = Program::default();
    let mut current: Option<(String, Vec<Instr>)> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(name) = trimmed
            .strip_prefix("FUNCTION ")
            .and_then(|rest| rest.strip_suffix(':'))
        {
            if current.is_some() {
                return Err(TacParseError::Unexpected {
                    line,
                    found: trimmed.to_owned(),
                });
            }
            current = Some((name.trim().to_owned(), Vec::new()));
            continue;
        }

        if let Some(name) = trimmed.strip_prefix("END FUNCTION ") {
            let name = name.trim();
            match current.take() {
                Some((open, body)) if open == name => {
                    program.functions.push(Function { name: open, body });
                }
                Some((open, _)) => {
                    return Err(TacParseError::FunctionNameMismatch {
                        line,
                        expected: open,
                        found: name.to_owned(),
                    })
                }
                None => return Err(TacParseError::OutsideFunction { line }),
            }
            continue;
        }

        let Some((_, body)) = current.as_mut() else {
            return Err(TacParseError::OutsideFunction { line });
        };
        body.push(parse_instr(trimmed, line)?);
    }

    if let Some((open, _)) = current {
        return Err(TacParseError::UnterminatedFunction(open));
    }
    Ok(program)
}

fn parse_instr(line_text: &str, line: usize) -> Result<Instr, TacParseError> {
    let tokens = split_tokens(line_text);
    let malformed = || TacParseError::Malformed { line };

    match tokens.first().map(String::as_str) {
        Some("GOTO") => match tokens.as_slice() {
            [_, label] => Ok(Instr::Goto(Label(label.clone()))),
            _ => Err(malformed()),
        },
        Some("IF") => match tokens.as_slice() {
            // IF cond > 0 GOTO L
            [_, cond, gt, zero, goto, label] if gt == ">" && zero == "0" && goto == "GOTO" => {
                Ok(Instr::IfGoto {
                    cond: parse_value(cond, line)?,
                    target: Label(label.clone()),
                })
            }
            _ => Err(malformed()),
        },
        Some("PARAM") => match tokens.as_slice() {
            [_, value] => Ok(Instr::Param(parse_value(value, line)?)),
            _ => Err(malformed()),
        },
        Some("CALL") => match tokens.as_slice() {
            [_, call] => {
                let (callee, argc) = call.split_once(',').ok_or_else(malformed)?;
                Ok(Instr::Call {
                    callee: callee.to_owned(),
                    argc: argc.parse().map_err(|_| malformed())?,
                })
            }
            _ => Err(malformed()),
        },
        Some("RETURN") => match tokens.as_slice() {
            [_] => Ok(Instr::Return(None)),
            [_, value] => Ok(Instr::Return(Some(parse_value(value, line)?))),
            _ => Err(malformed()),
        },
        Some(first) => {
            if tokens.len() == 1 {
                let label = first.strip_suffix(':').ok_or_else(malformed)?;
                return Ok(Instr::Label(Label(label.to_owned())));
            }
            if tokens[1] != ":=" {
                return Err(TacParseError::Unexpected {
                    line,
                    found: tokens[1].clone(),
                });
            }
            let dst = parse_place(first, line)?;
            match &tokens[2..] {
                [src] => Ok(Instr::Copy {
                    dst,
                    src: parse_value(src, line)?,
                }),
                [op, src] => {
                    let op = match op.as_str() {
                        "-" => UnOp::Neg,
                        "!" => UnOp::Not,
                        _ => return Err(malformed()),
                    };
                    Ok(Instr::Unary {
                        dst,
                        op,
                        src: parse_value(src, line)?,
                    })
                }
                [lhs, op, rhs] => Ok(Instr::Binary {
                    dst,
                    lhs: parse_value(lhs, line)?,
                    op: BinOp::from_str(op).ok_or_else(malformed)?,
                    rhs: parse_value(rhs, line)?,
                }),
                _ => Err(malformed()),
            }
        }
        None => Err(malformed()),
    }
}

/// Whitespace-separated tokens, with string literals kept whole.
fn split_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in line.chars() {
        if in_string {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            current.push(c);
        } else if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_value(token: &str, line: usize) -> Result<Value, TacParseError> {
    if token == "R" {
        return Ok(Value::R);
    }
    if let Some(inner) = token.strip_prefix('"') {
        let inner = inner.strip_suffix('"').ok_or(TacParseError::Malformed { line })?;
        let mut out = String::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    _ => return Err(TacParseError::Malformed { line }),
                }
            } else {
                out.push(c);
            }
        }
        return Ok(Value::Str(out));
    }
    if let Ok(v) = token.parse::<i64>() {
        return Ok(Value::Int(v));
    }
    parse_place(token, line).map(Value::Place)
}

fn parse_place(token: &str, line: usize) -> Result<Place, TacParseError> {
    let unexpected = || TacParseError::Unexpected {
        line,
        found: token.to_owned(),
    };

    let (mut place, mut rest) = if let Some(rest) = token.strip_prefix("fp[") {
        let (inner, rest) = split_bracket(rest).ok_or_else(unexpected)?;
        (
            Place::Frame(inner.parse().map_err(|_| unexpected())?),
            rest,
        )
    } else if let Some(rest) = token.strip_prefix("G[") {
        let (inner, rest) = split_bracket(rest).ok_or_else(unexpected)?;
        (
            Place::Global(inner.parse().map_err(|_| unexpected())?),
            rest,
        )
    } else if let Some(rest) = token.strip_prefix('t') {
        let digits_end = rest.find('[').unwrap_or(rest.len());
        let (digits, rest) = rest.split_at(digits_end);
        (
            Place::Temp(digits.parse().map_err(|_| unexpected())?),
            rest,
        )
    } else {
        return Err(unexpected());
    };

    while !rest.is_empty() {
        let after_open = rest.strip_prefix('[').ok_or_else(unexpected)?;
        let (inner, after) = split_bracket(after_open).ok_or_else(unexpected)?;
        place = Place::Index(Box::new(place), Box::new(parse_value(inner, line)?));
        rest = after;
    }
    Ok(place)
}

/// Splits `"...]..."` at the bracket matching an already-consumed `[`.
fn split_bracket(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return Some((&s[..i], &s[i + 1..])),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_form() {
        let text = "\
FUNCTION add:
\tt0 := fp[-1] + fp[-2]
\tRETURN t0
END FUNCTION add
FUNCTION main:
\tG[0] := 0
STARTWHILE_0:
\tt0 := G[0] < 5
\tIF t0 > 0 GOTO LABEL_TRUE_0
\tGOTO ENDWHILE_0
LABEL_TRUE_0:
\tt1 := G[0] + 1
\tG[0] := t1
\tGOTO STARTWHILE_0
ENDWHILE_0:
\tPARAM G[0]
\tPARAM 1
\tCALL add,2
\tt2 := R
\tt3 := - t2
\tt4 := fp[-1][4]
\tt5 := t4[t2]
\tG[4] := \"hola mundo\"
\tRETURN
END FUNCTION main
";
        let program = parse(text).unwrap();
        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.functions[0].name, "add");
        assert_eq!(program.functions[1].body.len(), 19);
        assert!(matches!(
            program.functions[1].body[17],
            Instr::Copy {
                src: Value::Str(_),
                ..
            }
        ));
    }

    #[test]
    fn round_trips_through_display() {
        let program = Program {
            functions: vec![Function {
                name: "main".into(),
                body: vec![
                    Instr::Copy {
                        dst: Place::Global(0),
                        src: Value::Str("a \"quoted\" word".into()),
                    },
                    Instr::Binary {
                        dst: Place::Temp(0),
                        lhs: Value::Place(Place::Global(0)),
                        op: BinOp::Ne,
                        rhs: Value::Int(0),
                    },
                    Instr::IfGoto {
                        cond: Value::Place(Place::Temp(0)),
                        target: Label("IF_TRUE_0".into()),
                    },
                    Instr::Label(Label("IF_TRUE_0".into())),
                    Instr::Copy {
                        dst: Place::Index(
                            Box::new(Place::Frame(-1)),
                            Box::new(Value::Place(Place::Temp(0))),
                        ),
                        src: Value::R,
                    },
                    Instr::Return(None),
                ],
            }],
        };
        assert_eq!(parse(&program.to_string()).unwrap(), program);
    }

    #[test]
    fn rejects_text_outside_functions() {
        assert!(matches!(
            parse("t0 := 1\n"),
            Err(TacParseError::OutsideFunction { line: 1 })
        ));
    }

    #[test]
    fn rejects_mismatched_function_names() {
        let text = "FUNCTION a:\nEND FUNCTION b\n";
        assert!(matches!(
            parse(text),
            Err(TacParseError::FunctionNameMismatch { .. })
        ));
    }

    #[test]
    fn rejects_unterminated_function() {
        assert_eq!(
            parse("FUNCTION main:\n"),
            Err(TacParseError::UnterminatedFunction("main".into()))
        );
    }
}
