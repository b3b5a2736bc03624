//! The closed typing rules of the expression table and the assignability
//! relation. `Type::Unknown` (the recovery sentinel) satisfies every rule so
//! that one reported error does not fan out.

use crate::ir::{BinaryOp, Type, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignCheck {
    Ok,
    Incompatible,
}

/// `to = from` is permitted iff the types are identical, or `to` is a
/// reference type and `from` is `null`. `void` is never assignable.
pub fn check_assign(to: &Type, from: &Type) -> AssignCheck {
    if to.is_unknown() || from.is_unknown() {
        return AssignCheck::Ok;
    }
    if matches!(to, Type::Void) || matches!(from, Type::Void) {
        return AssignCheck::Incompatible;
    }
    if to == from {
        return AssignCheck::Ok;
    }
    if to.is_reference() && matches!(from, Type::Null) {
        return AssignCheck::Ok;
    }
    AssignCheck::Incompatible
}

/// Result type of a binary operation, or `Err(())` when the operand rule is
/// violated.
pub fn check_binary(op: BinaryOp, lhs: &Type, rhs: &Type) -> Result<Type, ()> {
    use BinaryOp::*;
    use Type::*;

    if lhs.is_unknown() || rhs.is_unknown() {
        // best effort: comparisons still yield booleans
        return Ok(match op {
            Eq | Ne | Lt | Le | Gt | Ge => Boolean,
            Add => Unknown,
            Sub | Mul | Div | Rem => Integer,
        });
    }

    match op {
        Add => match (lhs, rhs) {
            (Integer, Integer) => Ok(Integer),
            // `string + integer` (either way) is coerced concatenation
            (String, String) | (String, Integer) | (Integer, String) => Ok(String),
            _ => Err(()),
        },
        Sub | Mul | Div | Rem => match (lhs, rhs) {
            (Integer, Integer) => Ok(Integer),
            _ => Err(()),
        },
        Lt | Le | Gt | Ge => match (lhs, rhs) {
            (Integer, Integer) | (String, String) => Ok(Boolean),
            _ => Err(()),
        },
        Eq | Ne => {
            if lhs == rhs
                || (lhs.is_reference() && matches!(rhs, Null))
                || (rhs.is_reference() && matches!(lhs, Null))
            {
                Ok(Boolean)
            } else {
                Err(())
            }
        }
    }
}

pub fn check_unary(op: UnaryOp, inner: &Type) -> Result<Type, ()> {
    if inner.is_unknown() {
        return Ok(match op {
            UnaryOp::Neg => Type::Integer,
            UnaryOp::Not => Type::Boolean,
        });
    }
    match (op, inner) {
        (UnaryOp::Neg, Type::Integer) => Ok(Type::Integer),
        (UnaryOp::Not, Type::Boolean) => Ok(Type::Boolean),
        _ => Err(()),
    }
}

/// Condition checks accept `boolean` and the recovery sentinel.
pub fn is_boolean(ty: &Type) -> bool {
    matches!(ty, Type::Boolean | Type::Unknown)
}

/// Switch quantities must be equality-comparable primitives.
pub fn is_switchable(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Integer | Type::String | Type::Boolean | Type::Unknown
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ClassRef;
    use crate::ir::table::ClassId;

    fn class(id: usize, name: &str) -> Type {
        Type::Class(ClassRef {
            id: ClassId(id),
            name: name.into(),
        })
    }

    #[test]
    fn plus_allows_coerced_concat() {
        use BinaryOp::Add;
        assert_eq!(check_binary(Add, &Type::Integer, &Type::Integer), Ok(Type::Integer));
        assert_eq!(check_binary(Add, &Type::String, &Type::String), Ok(Type::String));
        assert_eq!(check_binary(Add, &Type::String, &Type::Integer), Ok(Type::String));
        assert_eq!(check_binary(Add, &Type::Integer, &Type::String), Ok(Type::String));
        assert!(check_binary(Add, &Type::Boolean, &Type::Integer).is_err());
        assert!(check_binary(Add, &Type::String, &Type::Boolean).is_err());
    }

    #[test]
    fn relational_takes_integers_or_strings() {
        use BinaryOp::Lt;
        assert_eq!(check_binary(Lt, &Type::Integer, &Type::Integer), Ok(Type::Boolean));
        assert_eq!(check_binary(Lt, &Type::String, &Type::String), Ok(Type::Boolean));
        assert!(check_binary(Lt, &Type::Integer, &Type::String).is_err());
        assert!(check_binary(Lt, &Type::Boolean, &Type::Boolean).is_err());
    }

    #[test]
    fn equality_allows_null_against_references() {
        use BinaryOp::Eq;
        let c = class(0, "C");
        assert_eq!(check_binary(Eq, &c, &Type::Null), Ok(Type::Boolean));
        assert_eq!(
            check_binary(Eq, &Type::Null, &Type::array_of(Type::Integer)),
            Ok(Type::Boolean)
        );
        assert!(check_binary(Eq, &Type::Integer, &Type::Null).is_err());
        assert!(check_binary(Eq, &c, &class(1, "D")).is_err());
    }

    #[test]
    fn null_assigns_to_reference_types_only() {
        assert_eq!(check_assign(&class(0, "C"), &Type::Null), AssignCheck::Ok);
        assert_eq!(
            check_assign(&Type::array_of(Type::String), &Type::Null),
            AssignCheck::Ok
        );
        assert_eq!(
            check_assign(&Type::Integer, &Type::Null),
            AssignCheck::Incompatible
        );
    }

    #[test]
    fn void_is_never_a_value() {
        assert_eq!(
            check_assign(&Type::Integer, &Type::Void),
            AssignCheck::Incompatible
        );
        assert_eq!(
            check_assign(&Type::Void, &Type::Void),
            AssignCheck::Incompatible
        );
    }

    #[test]
    fn unknown_satisfies_everything() {
        assert_eq!(check_assign(&Type::Unknown, &Type::String), AssignCheck::Ok);
        assert_eq!(check_assign(&Type::Integer, &Type::Unknown), AssignCheck::Ok);
        assert!(check_binary(BinaryOp::Lt, &Type::Unknown, &Type::String).is_ok());
    }
}
