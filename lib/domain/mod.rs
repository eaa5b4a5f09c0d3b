//! The abstract domain of signs and truth values.
//!
//! * `sign` implements `AbstractInt`, the abstraction of integers.
//! * `truth` implements `AbstractBool`, the abstraction of booleans.
//!
//! Operators over abstract values return every outcome they may produce,
//! rather than a single joined value. The engine forks one configuration per
//! outcome, so an `Error` outcome never hides inside a value marker.
//!
//! Joining only happens once exploration is over, when configurations are
//! summarised per control point. A `Summary` keeps the join of the value
//! markers apart from whether an error outcome was observed.

use std::fmt;
use std::hash::Hash;

mod sign;
mod truth;

pub use self::sign::AbstractInt;
pub use self::truth::AbstractBool;

/// An abstract value marker
pub trait Value: Copy + fmt::Debug + fmt::Display + Eq + Hash + Ord {
    /// The bottom marker, held by variables which were never assigned.
    fn uninitialized() -> Self;

    /// The marker for a raised error.
    fn error() -> Self;

    /// Returns true if this marker is the error marker.
    fn is_error(&self) -> bool {
        *self == Self::error()
    }

    /// Least upper bound of two value markers.
    ///
    /// Error markers are not values, and are neutral under this join. Use
    /// `Summary` to join markers which may include errors.
    fn lub(self, other: Self) -> Self;
}

/// The join of a set of markers of one abstract domain.
///
/// The value markers are joined in the value lattice, and error markers are
/// recorded separately, so a summary can tell "always raises" from "may
/// raise" from "never raises".
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Summary<V: Value> {
    value: V,
    raises: bool,
}

impl<V: Value> Summary<V> {
    /// Create a summary of a single marker.
    pub fn new(marker: V) -> Summary<V> {
        if marker.is_error() {
            Summary {
                value: V::uninitialized(),
                raises: true,
            }
        } else {
            Summary {
                value: marker,
                raises: false,
            }
        }
    }

    /// The summary of no markers at all.
    pub fn empty() -> Summary<V> {
        Summary {
            value: V::uninitialized(),
            raises: false,
        }
    }

    /// The join of the value markers in this summary.
    pub fn value(&self) -> V {
        self.value
    }

    /// Returns true if an error marker was joined into this summary.
    pub fn raises(&self) -> bool {
        self.raises
    }

    /// Every joined marker was an error.
    pub fn definitely_raises(&self) -> bool {
        self.raises && self.value == V::uninitialized()
    }

    /// Both error and value markers were joined.
    pub fn possibly_raises(&self) -> bool {
        self.raises && self.value != V::uninitialized()
    }

    /// Every joined marker was the uninitialized marker.
    pub fn uninitialized(&self) -> bool {
        !self.raises && self.value == V::uninitialized()
    }

    /// Least upper bound of two summaries.
    pub fn join(&self, other: &Summary<V>) -> Summary<V> {
        Summary {
            value: self.value.lub(other.value),
            raises: self.raises || other.raises,
        }
    }

    /// Join a single marker into this summary.
    pub fn join_marker(&self, marker: V) -> Summary<V> {
        self.join(&Summary::new(marker))
    }
}

impl<V: Value> fmt::Display for Summary<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.definitely_raises() {
            write!(f, "{}", V::error())
        } else if self.raises {
            write!(f, "{}|{}", self.value, V::error())
        } else {
            write!(f, "{}", self.value)
        }
    }
}

#[cfg(test)]
fn summaries<V: Value>(markers: &[V]) -> Vec<Summary<V>> {
    // Every reachable summary is a join of markers, so close the singletons
    // under join.
    let mut summaries: Vec<Summary<V>> = markers.iter().map(|m| Summary::new(*m)).collect();
    loop {
        let mut added = false;
        for i in 0..summaries.len() {
            for j in 0..summaries.len() {
                let joined = summaries[i].join(&summaries[j]);
                if !summaries.contains(&joined) {
                    summaries.push(joined);
                    added = true;
                }
            }
        }
        if !added {
            return summaries;
        }
    }
}

#[cfg(test)]
fn check_join_laws<V: Value>(markers: &[V]) {
    let summaries = summaries(markers);
    for a in &summaries {
        assert_eq!(a.join(a), *a, "idempotent for {}", a);
        assert_eq!(a.join(&Summary::empty()), *a);
        for b in &summaries {
            assert_eq!(a.join(b), b.join(a), "commutative for {}, {}", a, b);
            for c in &summaries {
                assert_eq!(
                    a.join(b).join(c),
                    a.join(&b.join(c)),
                    "associative for {}, {}, {}",
                    a,
                    b,
                    c
                );
            }
        }
    }
}

#[test]
fn join_laws_int() {
    check_join_laws(&AbstractInt::all());
}

#[test]
fn join_laws_bool() {
    check_join_laws(&AbstractBool::all());
}

#[test]
fn summary_flags() {
    let s = Summary::new(AbstractInt::Error);
    assert!(s.definitely_raises());
    assert!(!s.possibly_raises());
    assert_eq!(s.to_string(), "ERROR");

    let s = s.join_marker(AbstractInt::Any);
    assert!(s.possibly_raises());
    assert!(!s.definitely_raises());
    assert_eq!(s.value(), AbstractInt::Any);
    assert_eq!(s.to_string(), "ANY|ERROR");

    let s = Summary::new(AbstractInt::Uninitialized);
    assert!(s.uninitialized());
    assert_eq!(
        Summary::new(AbstractInt::Uninitialized)
            .join_marker(AbstractInt::Positive)
            .value(),
        AbstractInt::Positive
    );
}
