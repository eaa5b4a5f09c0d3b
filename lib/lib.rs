//! Whilesign: Sign and Exception Abstract Interpretation for While programs.
//!
//! Whilesign analyses programs written in a small imperative language,
//! While, extended with integer division and `try`/`catch`. Programs are
//! compiled to an abstract machine, and the abstract machine is run over an
//! abstract domain of signs and truth values. Every abstractly-possible
//! execution is explored, and the results are joined per program point.
//!
//! # Layout
//!
//! * `domain` - The abstract values, their operators, and the join used to
//! summarise them.
//! * `am` - The abstract machine instructions, `Code`, and the
//! `Continuation` a configuration still has to run.
//! * `vm` - Configurations, the transition relation, the breadth-first
//! search over configurations, and the `Analysis` of its results.
//! * `syntax` - The While front end: AST, parser, and compiler to `am::Code`.
//! * `report` - Renders an `Analysis` onto the program it describes.
//!
//! # Example
//!
//! ```
//! use whilesign::{syntax, vm};
//!
//! let program = syntax::parse("x := 1 / 0").unwrap();
//! let compiled = syntax::compile(&program);
//! let analysis = vm::analyse(compiled.code().clone(), vm::Options::default()).unwrap();
//!
//! assert!(analysis.possibly_exceptional_termination());
//! assert!(!analysis.possibly_normal_termination());
//! ```

#[macro_use]
extern crate log;

pub mod am;
pub mod domain;
pub mod report;
pub mod syntax;
#[cfg(test)]
mod tests;
pub mod vm;

#[cfg(not(feature = "thread_safe"))]
use std::rc::Rc;
#[cfg(feature = "thread_safe")]
use std::sync::Arc;

/// Shared, immutable handle used for code templates.
#[cfg(not(feature = "thread_safe"))]
pub type RC<T> = Rc<T>;
#[cfg(feature = "thread_safe")]
pub type RC<T> = Arc<T>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Custom: {0}")]
    Custom(String),
    #[error("Attempted to step a configuration with an empty continuation")]
    EmptyContinuation,
    #[error("Exploration exceeded the limit of {0} configurations")]
    ExplorationLimit(usize),
    #[error("Reached a try dispatch point outside of any try block: {0}")]
    InvalidDispatch(String),
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Operand stack underflow executing {0}")]
    OperandUnderflow(String),
    #[error("Expected {expected} operand executing {instruction}")]
    OperandSort {
        expected: &'static str,
        instruction: String,
    },
    #[error("Parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
}
