mod structures;

pub mod codegen;
pub mod compile;
pub mod diagnostic;
pub mod inspectors;
pub mod passes;

pub use structures::*;
