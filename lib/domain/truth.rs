//! The abstraction of booleans.

use super::Value;
use std::fmt;

/// An abstract truth value.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AbstractBool {
    True,
    False,
    Any,
    Uninitialized,
    Error,
}

use self::AbstractBool::*;

impl AbstractBool {
    /// Every abstract truth value.
    pub fn all() -> [AbstractBool; 5] {
        [True, False, Any, Uninitialized, Error]
    }

    /// Abstract a concrete boolean.
    pub fn constant(value: bool) -> AbstractBool {
        if value {
            True
        } else {
            False
        }
    }

    /// Returns true if a guard with this value may take its `then` arm.
    pub fn possibly_true(&self) -> bool {
        matches!(*self, True | Any)
    }

    /// Returns true if a guard with this value may take its `else` arm.
    pub fn possibly_false(&self) -> bool {
        matches!(*self, False | Any)
    }

    // An uninitialized operand may be either truth value.
    fn operand(self) -> AbstractBool {
        match self {
            Uninitialized => Any,
            b => b,
        }
    }

    /// `self & rhs`
    pub fn and(self, rhs: AbstractBool) -> Vec<AbstractBool> {
        let result = match (self.operand(), rhs.operand()) {
            (Error, _) | (_, Error) => Error,
            (False, _) | (_, False) => False,
            (True, True) => True,
            _ => Any,
        };
        vec![result]
    }

    /// `!self`
    pub fn not(self) -> Vec<AbstractBool> {
        let result = match self.operand() {
            True => False,
            False => True,
            b => b,
        };
        vec![result]
    }
}

impl Value for AbstractBool {
    fn uninitialized() -> AbstractBool {
        Uninitialized
    }

    fn error() -> AbstractBool {
        Error
    }

    fn lub(self, other: AbstractBool) -> AbstractBool {
        match (self, other) {
            (Error, b) | (b, Error) => b,
            (Uninitialized, b) | (b, Uninitialized) => b,
            (lhs, rhs) if lhs == rhs => lhs,
            _ => Any,
        }
    }
}

impl fmt::Display for AbstractBool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            True => "TRUE",
            False => "FALSE",
            Any => "ANY",
            Uninitialized => "UNINITIALIZED",
            Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

#[test]
fn logic() {
    assert_eq!(True.and(True), vec![True]);
    assert_eq!(True.and(Any), vec![Any]);
    assert_eq!(Any.and(False), vec![False]);
    assert_eq!(False.and(Error), vec![Error]);
    assert_eq!(True.not(), vec![False]);
    assert_eq!(Any.not(), vec![Any]);
    assert_eq!(Error.not(), vec![Error]);
}

#[test]
fn guard_arms() {
    assert!(True.possibly_true() && !True.possibly_false());
    assert!(!False.possibly_true() && False.possibly_false());
    assert!(Any.possibly_true() && Any.possibly_false());
    assert!(!Error.possibly_true() && !Error.possibly_false());
    assert_eq!(True.lub(False), Any);
}
