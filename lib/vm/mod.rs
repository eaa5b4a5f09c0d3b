//! Abstract interpretation of `am::Code`.
//!
//! * `Configuration` is one state of the abstract machine, and
//! `Configuration::step` is its transition relation.
//! * `Vm` explores every reachable configuration, breadth first.
//! * `Analysis` summarises the explored configurations per control point.

mod analysis;
mod configuration;
mod machine;
mod options;

pub use self::analysis::*;
pub use self::configuration::*;
pub use self::machine::*;
pub use self::options::*;
