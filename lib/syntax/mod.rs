//! The While language: abstract syntax, parser, and compiler to `am::Code`.

mod ast;
mod compiler;
mod parser;

pub use self::ast::*;
pub use self::compiler::{compile, Compiled};
pub use self::parser::parse;
