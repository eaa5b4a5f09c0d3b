//! The sign abstraction of integers.

use super::{AbstractBool, Value};
use std::fmt;

/// An abstract integer.
///
/// ```text
///              Any
///          /    |    \
///   Negative  Zero  Positive        Error
///          \    |    /
///          Uninitialized
/// ```
///
/// `Error` is the outcome of a failed computation. It is not a value, and is
/// never folded into one by the operators.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AbstractInt {
    Negative,
    Zero,
    Positive,
    Any,
    Uninitialized,
    Error,
}

use self::AbstractInt::*;

impl AbstractInt {
    /// Every abstract integer.
    pub fn all() -> [AbstractInt; 6] {
        [Negative, Zero, Positive, Any, Uninitialized, Error]
    }

    /// Abstract a concrete integer to its sign.
    pub fn constant(value: i64) -> AbstractInt {
        match value {
            v if v < 0 => Negative,
            0 => Zero,
            _ => Positive,
        }
    }

    // An uninitialized operand may hold any integer.
    fn operand(self) -> AbstractInt {
        match self {
            Uninitialized => Any,
            a => a,
        }
    }

    fn negate(self) -> AbstractInt {
        match self {
            Negative => Positive,
            Positive => Negative,
            a => a,
        }
    }

    fn rank(self) -> Option<i8> {
        match self {
            Negative => Some(-1),
            Zero => Some(0),
            Positive => Some(1),
            Any | Uninitialized | Error => None,
        }
    }

    fn arith<F>(self, rhs: AbstractInt, op: F) -> Vec<AbstractInt>
    where
        F: Fn(AbstractInt, AbstractInt) -> AbstractInt,
    {
        let (lhs, rhs) = (self.operand(), rhs.operand());
        if lhs == Error || rhs == Error {
            vec![Error]
        } else {
            vec![op(lhs, rhs)]
        }
    }

    fn compare<F>(self, rhs: AbstractInt, op: F) -> Vec<AbstractBool>
    where
        F: Fn(i8, i8) -> AbstractBool,
    {
        let (lhs, rhs) = (self.operand(), rhs.operand());
        if lhs == Error || rhs == Error {
            return vec![AbstractBool::Error];
        }
        match (lhs.rank(), rhs.rank()) {
            (Some(l), Some(r)) => vec![op(l, r)],
            _ => vec![AbstractBool::Any],
        }
    }

    /// `self + rhs`
    pub fn add(self, rhs: AbstractInt) -> Vec<AbstractInt> {
        self.arith(rhs, |lhs, rhs| match (lhs, rhs) {
            (Zero, a) | (a, Zero) => a,
            (Positive, Positive) => Positive,
            (Negative, Negative) => Negative,
            _ => Any,
        })
    }

    /// `self - rhs`
    pub fn sub(self, rhs: AbstractInt) -> Vec<AbstractInt> {
        self.add(rhs.operand().negate())
    }

    /// `self * rhs`
    pub fn mul(self, rhs: AbstractInt) -> Vec<AbstractInt> {
        self.arith(rhs, |lhs, rhs| match (lhs, rhs) {
            (Zero, _) | (_, Zero) => Zero,
            (Any, _) | (_, Any) => Any,
            (lhs, rhs) if lhs == rhs => Positive,
            _ => Negative,
        })
    }

    /// `self / rhs`
    ///
    /// Division by zero raises. When the divisor may be zero, both the value
    /// and the error are returned.
    pub fn div(self, rhs: AbstractInt) -> Vec<AbstractInt> {
        let (lhs, rhs) = (self.operand(), rhs.operand());
        if lhs == Error || rhs == Error {
            return vec![Error];
        }
        match rhs {
            Zero => vec![Error],
            Negative | Positive => vec![Any],
            _ => vec![Any, Error],
        }
    }

    /// `self = rhs`
    pub fn cmpeq(self, rhs: AbstractInt) -> Vec<AbstractBool> {
        self.compare(rhs, |lhs, rhs| {
            if lhs != rhs {
                AbstractBool::False
            } else if lhs == 0 {
                AbstractBool::True
            } else {
                AbstractBool::Any
            }
        })
    }

    /// `self <= rhs`
    pub fn cmple(self, rhs: AbstractInt) -> Vec<AbstractBool> {
        self.compare(rhs, |lhs, rhs| {
            if lhs < rhs || (lhs == 0 && rhs == 0) {
                AbstractBool::True
            } else if lhs > rhs {
                AbstractBool::False
            } else {
                AbstractBool::Any
            }
        })
    }
}

impl Value for AbstractInt {
    fn uninitialized() -> AbstractInt {
        Uninitialized
    }

    fn error() -> AbstractInt {
        Error
    }

    fn lub(self, other: AbstractInt) -> AbstractInt {
        match (self, other) {
            (Error, a) | (a, Error) => a,
            (Uninitialized, a) | (a, Uninitialized) => a,
            (lhs, rhs) if lhs == rhs => lhs,
            _ => Any,
        }
    }
}

impl fmt::Display for AbstractInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            Negative => "NEGATIVE",
            Zero => "ZERO",
            Positive => "POSITIVE",
            Any => "ANY",
            Uninitialized => "UNINITIALIZED",
            Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

#[test]
fn constant() {
    assert_eq!(AbstractInt::constant(-7), Negative);
    assert_eq!(AbstractInt::constant(0), Zero);
    assert_eq!(AbstractInt::constant(42), Positive);
}

#[test]
fn arithmetic() {
    assert_eq!(Positive.add(Positive), vec![Positive]);
    assert_eq!(Positive.add(Negative), vec![Any]);
    assert_eq!(Zero.add(Negative), vec![Negative]);
    assert_eq!(Positive.sub(Negative), vec![Positive]);
    assert_eq!(Negative.sub(Positive), vec![Negative]);
    assert_eq!(Positive.sub(Positive), vec![Any]);
    assert_eq!(Zero.sub(Positive), vec![Negative]);
    assert_eq!(Negative.mul(Negative), vec![Positive]);
    assert_eq!(Negative.mul(Positive), vec![Negative]);
    assert_eq!(Any.mul(Zero), vec![Zero]);
    assert_eq!(Any.mul(Positive), vec![Any]);
    assert_eq!(Uninitialized.add(Positive), vec![Any]);

    for a in AbstractInt::all().iter() {
        for b in AbstractInt::all().iter() {
            if *a != Error && *b != Error {
                assert!(!a.add(*b).contains(&Error));
                assert!(!a.sub(*b).contains(&Error));
                assert!(!a.mul(*b).contains(&Error));
            }
        }
    }
}

#[test]
fn errors_propagate() {
    assert_eq!(Error.add(Positive), vec![Error]);
    assert_eq!(Zero.mul(Error), vec![Error]);
    assert_eq!(Error.div(Positive), vec![Error]);
    assert_eq!(Positive.cmple(Error), vec![AbstractBool::Error]);
}

#[test]
fn division() {
    assert_eq!(Positive.div(Zero), vec![Error]);
    assert_eq!(Any.div(Zero), vec![Error]);
    assert_eq!(Negative.div(Positive), vec![Any]);
    assert_eq!(Zero.div(Negative), vec![Any]);

    let outcomes = Any.div(Any);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.contains(&Any));
    assert!(outcomes.contains(&Error));
}

#[test]
fn comparisons() {
    assert_eq!(Zero.cmpeq(Zero), vec![AbstractBool::True]);
    assert_eq!(Zero.cmpeq(Positive), vec![AbstractBool::False]);
    assert_eq!(Positive.cmpeq(Positive), vec![AbstractBool::Any]);
    assert_eq!(Negative.cmple(Zero), vec![AbstractBool::True]);
    assert_eq!(Zero.cmple(Zero), vec![AbstractBool::True]);
    assert_eq!(Positive.cmple(Zero), vec![AbstractBool::False]);
    assert_eq!(Negative.cmple(Negative), vec![AbstractBool::Any]);
    assert_eq!(Uninitialized.cmple(Zero), vec![AbstractBool::Any]);
}

#[test]
fn lub() {
    assert_eq!(Positive.lub(Negative), Any);
    assert_eq!(Positive.lub(Positive), Positive);
    assert_eq!(Uninitialized.lub(Zero), Zero);
    assert_eq!(Zero.lub(Any), Any);
}
