//! PDF content stream interpretation.
//!
//! This module contains:
//! - `interpreter`: the element loop, operator dispatch and resource lookup
//! - `operands`: the bounded operand buffer
//! - `operators`: the operator table
//! - `ops`: operator implementations by category
//! - `states`: the complete graphics state saved by `q`

pub mod interpreter;
pub mod operands;
pub mod operators;
pub mod ops;
pub mod states;

// Re-export main types for convenience
pub use interpreter::{ContentInterpreter, InterpreterSetup};
pub use operands::{Operand, OperandBuffer};
pub use operators::Operator;
pub use states::AllStates;
