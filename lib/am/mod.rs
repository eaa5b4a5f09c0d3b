//! The abstract machine.
//!
//! Programs are compiled to `Code`, a sequence of `Instruction`. Every
//! `Instruction` wraps an `Operation` and the control point of the source
//! statement it was compiled from.
//!
//! The operations are:
//!
//! * Values: `Push`, `True`, `False`, `Fetch`.
//! * Unary: `Neg` (logical not), `Noop`.
//! * Binary: `Add`, `Sub`, `Mult`, `Div`, `Eq`, `Le`, `And`. The first
//! operand popped is the left operand of the source expression.
//! * Effects: `Store`.
//! * Structured: `Branch`, `Loop`, `Try`. These carry nested `Code`, shared
//! behind an `RC`.
//!
//! A configuration's remaining work is held in a `Continuation`, a stack of
//! cursors into the shared code.

mod code;
mod continuation;
mod instruction;

pub use self::code::*;
pub use self::continuation::*;
pub use self::instruction::*;
