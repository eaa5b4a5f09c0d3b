use crate::am::Code;
use crate::RC;
use std::fmt;

/// An abstract machine operation.
///
/// Structured operations carry their nested code as shared, immutable
/// templates. Executing them splices the templates in front of the
/// continuation, and never modifies them.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// Push the abstraction of an integer literal.
    Push { value: i64 },
    /// Push `TRUE`.
    True,
    /// Push `FALSE`.
    False,
    /// Push the value of a variable.
    Fetch { variable: String },
    /// Logical negation of the boolean on top of the stack.
    Neg,
    Noop,
    Add,
    Sub,
    Mult,
    Div,
    Eq,
    Le,
    And,
    /// Pop an integer and store it into a variable.
    Store { variable: String },
    /// Pop a guard and continue with `then` or `else_`.
    Branch { then: RC<Code>, else_: RC<Code> },
    /// Evaluate `guard`, and run `body` for as long as it holds.
    Loop { guard: RC<Code>, body: RC<Code> },
    /// Run `body`, handling errors it raises with `handler`.
    ///
    /// A `Try` without a body is a dispatch point: it is reached when the
    /// body of its try block has finished, and decides whether `handler`
    /// runs.
    Try {
        body: Option<RC<Code>>,
        handler: RC<Code>,
    },
}

impl Operation {
    /// The name of the opcode of this operation.
    pub fn opcode(&self) -> &'static str {
        match *self {
            Operation::Push { .. } => "PUSH",
            Operation::True => "TRUE",
            Operation::False => "FALSE",
            Operation::Fetch { .. } => "FETCH",
            Operation::Neg => "NEG",
            Operation::Noop => "NOOP",
            Operation::Add => "ADD",
            Operation::Sub => "SUB",
            Operation::Mult => "MULT",
            Operation::Div => "DIV",
            Operation::Eq => "EQ",
            Operation::Le => "LE",
            Operation::And => "AND",
            Operation::Store { .. } => "STORE",
            Operation::Branch { .. } => "BRANCH",
            Operation::Loop { .. } => "LOOP",
            Operation::Try { .. } => "TRY",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Operation::Push { value } => write!(f, "PUSH-{}", value),
            Operation::Fetch { ref variable } => write!(f, "FETCH-{}", variable),
            Operation::Store { ref variable } => write!(f, "STORE-{}", variable),
            Operation::Branch {
                ref then,
                ref else_,
            } => write!(f, "BRANCH([{}], [{}])", then, else_),
            Operation::Loop { ref guard, ref body } => write!(f, "LOOP([{}], [{}])", guard, body),
            Operation::Try {
                body: Some(ref body),
                ref handler,
            } => write!(f, "TRY([{}], [{}])", body, handler),
            Operation::Try {
                body: None,
                ref handler,
            } => write!(f, "CATCH([{}])", handler),
            _ => write!(f, "{}", self.opcode()),
        }
    }
}

/// An `Operation` tagged with the control point of the source construct it
/// was compiled from.
///
/// Control points are used for reporting only, and play no part in the
/// semantics of the operation.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Instruction {
    operation: Operation,
    control_point: usize,
}

impl Instruction {
    pub fn new(control_point: usize, operation: Operation) -> Instruction {
        Instruction {
            operation,
            control_point,
        }
    }

    pub fn push(control_point: usize, value: i64) -> Instruction {
        Instruction::new(control_point, Operation::Push { value })
    }

    pub fn true_(control_point: usize) -> Instruction {
        Instruction::new(control_point, Operation::True)
    }

    pub fn false_(control_point: usize) -> Instruction {
        Instruction::new(control_point, Operation::False)
    }

    pub fn fetch<S: Into<String>>(control_point: usize, variable: S) -> Instruction {
        Instruction::new(
            control_point,
            Operation::Fetch {
                variable: variable.into(),
            },
        )
    }

    pub fn store<S: Into<String>>(control_point: usize, variable: S) -> Instruction {
        Instruction::new(
            control_point,
            Operation::Store {
                variable: variable.into(),
            },
        )
    }

    pub fn noop(control_point: usize) -> Instruction {
        Instruction::new(control_point, Operation::Noop)
    }

    pub fn branch(control_point: usize, then: RC<Code>, else_: RC<Code>) -> Instruction {
        Instruction::new(control_point, Operation::Branch { then, else_ })
    }

    pub fn loop_(control_point: usize, guard: RC<Code>, body: RC<Code>) -> Instruction {
        Instruction::new(control_point, Operation::Loop { guard, body })
    }

    pub fn try_(control_point: usize, body: RC<Code>, handler: RC<Code>) -> Instruction {
        Instruction::new(
            control_point,
            Operation::Try {
                body: Some(body),
                handler,
            },
        )
    }

    /// The dispatch point which ends a try block with the given handler.
    pub fn dispatch(control_point: usize, handler: RC<Code>) -> Instruction {
        Instruction::new(
            control_point,
            Operation::Try {
                body: None,
                handler,
            },
        )
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn control_point(&self) -> usize {
        self.control_point
    }

    pub fn is_store(&self) -> bool {
        matches!(self.operation, Operation::Store { .. })
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.operation, Operation::Branch { .. })
    }

    /// The highest control point of this instruction, or of any instruction
    /// nested within it.
    pub fn max_control_point(&self) -> usize {
        let nested = match self.operation {
            Operation::Branch {
                ref then,
                ref else_,
            } => then.max_control_point().max(else_.max_control_point()),
            Operation::Loop { ref guard, ref body } => {
                guard.max_control_point().max(body.max_control_point())
            }
            Operation::Try {
                ref body,
                ref handler,
            } => body
                .as_ref()
                .and_then(|body| body.max_control_point())
                .max(handler.max_control_point()),
            _ => None,
        }
        .unwrap_or(0);
        self.control_point.max(nested)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.operation, self.control_point)
    }
}
