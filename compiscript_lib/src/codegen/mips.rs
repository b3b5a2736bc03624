//! Boundary to the external TAC→MIPS lowering.
//!
//! The backend targets SPIM/MARS and consumes the textual TAC contract (see
//! [`crate::tac`] and `codegen::tac::parser`). It is a separate tool; this
//! crate only fixes the interface it implements.

use crate::tac::Program;

/// Implemented by the external MIPS32 backend.
///
/// The implementation is expected to honor the TAC calling convention:
/// `PARAM`s pushed leftmost-first (receiver first for methods), results in
/// `R`, truth encoded as "integer greater than zero", and the intrinsics
/// `print`, `len`, `newarray`, and the per-class `newC` allocators.
pub trait MipsBackend {
    fn lower(&mut self, program: &Program) -> String;
}
