use std::fmt;

/// An arithmetic expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AExp {
    Num(i64),
    Var(String),
    Add(Box<AExp>, Box<AExp>),
    Sub(Box<AExp>, Box<AExp>),
    Mul(Box<AExp>, Box<AExp>),
    Div(Box<AExp>, Box<AExp>),
}

/// A boolean expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BExp {
    True,
    False,
    Eq(Box<AExp>, Box<AExp>),
    Le(Box<AExp>, Box<AExp>),
    Not(Box<BExp>),
    And(Box<BExp>, Box<BExp>),
}

/// A statement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Stm {
    Assign { variable: String, value: AExp },
    Skip,
    Compound(Box<Stm>, Box<Stm>),
    If { guard: BExp, then: Box<Stm>, else_: Box<Stm> },
    While { guard: BExp, body: Box<Stm> },
    TryCatch { body: Box<Stm>, handler: Box<Stm> },
}

impl AExp {
    pub fn num(value: i64) -> AExp {
        AExp::Num(value)
    }

    pub fn var<S: Into<String>>(name: S) -> AExp {
        AExp::Var(name.into())
    }

    pub fn add(lhs: AExp, rhs: AExp) -> AExp {
        AExp::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn sub(lhs: AExp, rhs: AExp) -> AExp {
        AExp::Sub(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: AExp, rhs: AExp) -> AExp {
        AExp::Mul(Box::new(lhs), Box::new(rhs))
    }

    pub fn div(lhs: AExp, rhs: AExp) -> AExp {
        AExp::Div(Box::new(lhs), Box::new(rhs))
    }
}

impl BExp {
    pub fn eq(lhs: AExp, rhs: AExp) -> BExp {
        BExp::Eq(Box::new(lhs), Box::new(rhs))
    }

    pub fn le(lhs: AExp, rhs: AExp) -> BExp {
        BExp::Le(Box::new(lhs), Box::new(rhs))
    }

    pub fn not(b: BExp) -> BExp {
        BExp::Not(Box::new(b))
    }

    pub fn and(lhs: BExp, rhs: BExp) -> BExp {
        BExp::And(Box::new(lhs), Box::new(rhs))
    }
}

impl Stm {
    pub fn assign<S: Into<String>>(variable: S, value: AExp) -> Stm {
        Stm::Assign {
            variable: variable.into(),
            value,
        }
    }

    pub fn compound(first: Stm, second: Stm) -> Stm {
        Stm::Compound(Box::new(first), Box::new(second))
    }

    pub fn if_(guard: BExp, then: Stm, else_: Stm) -> Stm {
        Stm::If {
            guard,
            then: Box::new(then),
            else_: Box::new(else_),
        }
    }

    pub fn while_(guard: BExp, body: Stm) -> Stm {
        Stm::While {
            guard,
            body: Box::new(body),
        }
    }

    pub fn try_catch(body: Stm, handler: Stm) -> Stm {
        Stm::TryCatch {
            body: Box::new(body),
            handler: Box::new(handler),
        }
    }

    /// Returns true if this statement takes a control point of its own.
    pub fn has_control_point(&self) -> bool {
        matches!(
            *self,
            Stm::Assign { .. } | Stm::If { .. } | Stm::While { .. } | Stm::TryCatch { .. }
        )
    }
}

impl fmt::Display for AExp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AExp::Num(n) => write!(f, "{}", n),
            AExp::Var(ref name) => write!(f, "{}", name),
            AExp::Add(ref lhs, ref rhs) => write!(f, "({} + {})", lhs, rhs),
            AExp::Sub(ref lhs, ref rhs) => write!(f, "({} - {})", lhs, rhs),
            AExp::Mul(ref lhs, ref rhs) => write!(f, "({} * {})", lhs, rhs),
            AExp::Div(ref lhs, ref rhs) => write!(f, "({} / {})", lhs, rhs),
        }
    }
}

impl fmt::Display for BExp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BExp::True => write!(f, "true"),
            BExp::False => write!(f, "false"),
            BExp::Eq(ref lhs, ref rhs) => write!(f, "{} = {}", lhs, rhs),
            BExp::Le(ref lhs, ref rhs) => write!(f, "{} <= {}", lhs, rhs),
            BExp::Not(ref b) => write!(f, "!({})", b),
            BExp::And(ref lhs, ref rhs) => write!(f, "{} & {}", lhs, rhs),
        }
    }
}
