//! A configuration of the abstract machine, and its transition relation.

use crate::am::{Code, Continuation, Instruction, Operation};
use crate::domain::{AbstractBool, AbstractInt, Value};
use crate::{Error, RC};
use std::collections::BTreeMap;
use std::fmt;
use std::iter;

/// A value on the operand stack.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operand {
    Int(AbstractInt),
    Bool(AbstractBool),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Operand::Int(a) => write!(f, "{}", a),
            Operand::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One state of the abstract machine.
///
/// `try_depth` counts the try blocks the continuation is inside of, and
/// `exception_depth` records the value of `try_depth` when the current
/// exception was raised. A dispatch point clears the exception only when the
/// two match, which selects the innermost enclosing handler.
///
/// Configurations are compared and hashed structurally, over every field.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Configuration {
    store: BTreeMap<String, AbstractInt>,
    stack: Vec<Operand>,
    continuation: Continuation,
    exceptional: bool,
    try_depth: usize,
    // Invariant: 0 when not exceptional.
    exception_depth: usize,
}

impl Configuration {
    /// The initial configuration for running `code`.
    pub fn new(code: RC<Code>) -> Configuration {
        Configuration {
            store: BTreeMap::new(),
            stack: Vec::new(),
            continuation: Continuation::new(code),
            exceptional: false,
            try_depth: 0,
            exception_depth: 0,
        }
    }

    /// The values of all variables assigned, or declared, so far.
    pub fn store(&self) -> &BTreeMap<String, AbstractInt> {
        &self.store
    }

    /// The value of a variable. Variables never assigned are uninitialized.
    pub fn variable(&self, name: &str) -> AbstractInt {
        self.store
            .get(name)
            .cloned()
            .unwrap_or(AbstractInt::Uninitialized)
    }

    pub fn set_variable<S: Into<String>>(&mut self, name: S, value: AbstractInt) {
        self.store.insert(name.into(), value);
    }

    /// Make `name` known to the store without giving it a new value.
    fn declare_variable(&mut self, name: &str) {
        if !self.store.contains_key(name) {
            self.store
                .insert(name.to_string(), AbstractInt::Uninitialized);
        }
    }

    /// The operand stack, bottom first.
    pub fn stack(&self) -> &[Operand] {
        &self.stack
    }

    /// The operand on top of the stack.
    pub fn top(&self) -> Option<&Operand> {
        self.stack.last()
    }

    pub fn continuation(&self) -> &Continuation {
        &self.continuation
    }

    /// The next instruction this configuration will execute.
    pub fn head(&self) -> Option<&Instruction> {
        self.continuation.head()
    }

    /// The control point of the next instruction, if there is one.
    pub fn control_point(&self) -> Option<usize> {
        self.head().map(|instruction| instruction.control_point())
    }

    /// Returns true if there is nothing left to execute.
    pub fn is_terminal(&self) -> bool {
        self.continuation.is_empty()
    }

    pub fn is_exceptional(&self) -> bool {
        self.exceptional
    }

    pub fn try_depth(&self) -> usize {
        self.try_depth
    }

    pub fn exception_depth(&self) -> usize {
        self.exception_depth
    }

    fn raise(&mut self) {
        if !self.exceptional {
            self.exceptional = true;
            self.exception_depth = self.try_depth;
        }
    }

    fn pop(&mut self, instruction: &Instruction) -> Result<Operand, Error> {
        self.stack
            .pop()
            .ok_or_else(|| Error::OperandUnderflow(instruction.to_string()))
    }

    fn pop_int(&mut self, instruction: &Instruction) -> Result<AbstractInt, Error> {
        match self.pop(instruction)? {
            Operand::Int(a) => Ok(a),
            Operand::Bool(_) => Err(Error::OperandSort {
                expected: "integer",
                instruction: instruction.to_string(),
            }),
        }
    }

    fn pop_bool(&mut self, instruction: &Instruction) -> Result<AbstractBool, Error> {
        match self.pop(instruction)? {
            Operand::Bool(b) => Ok(b),
            Operand::Int(_) => Err(Error::OperandSort {
                expected: "boolean",
                instruction: instruction.to_string(),
            }),
        }
    }

    /// One successor per outcome, each with that outcome pushed.
    fn fork<I>(self, outcomes: I) -> Vec<Configuration>
    where
        I: IntoIterator<Item = Operand>,
    {
        outcomes
            .into_iter()
            .map(|operand| {
                let mut successor = self.clone();
                successor.stack.push(operand);
                successor
            })
            .collect()
    }

    /// Execute the head instruction, returning every possible successor.
    ///
    /// This configuration is left untouched. An error is returned only when
    /// the code is malformed: there is no head instruction, or an operand is
    /// missing or of the wrong sort.
    pub fn step(&self) -> Result<Vec<Configuration>, Error> {
        let instruction = self.head().ok_or(Error::EmptyContinuation)?.clone();

        let mut next = self.clone();
        next.continuation.advance();

        let successors = match *instruction.operation() {
            Operation::Push { value } => {
                next.fork(iter::once(Operand::Int(AbstractInt::constant(value))))
            }
            Operation::True => next.fork(iter::once(Operand::Bool(AbstractBool::constant(true)))),
            Operation::False => {
                next.fork(iter::once(Operand::Bool(AbstractBool::constant(false))))
            }
            Operation::Fetch { ref variable } => {
                let value = next.variable(variable);
                next.fork(iter::once(Operand::Int(value)))
            }
            Operation::Neg => {
                let b = next.pop_bool(&instruction)?;
                next.fork(b.not().into_iter().map(Operand::Bool))
            }
            Operation::Noop => vec![next],
            Operation::Add
            | Operation::Sub
            | Operation::Mult
            | Operation::Div => {
                let lhs = next.pop_int(&instruction)?;
                let rhs = next.pop_int(&instruction)?;
                let outcomes = match *instruction.operation() {
                    Operation::Add => lhs.add(rhs),
                    Operation::Sub => lhs.sub(rhs),
                    Operation::Mult => lhs.mul(rhs),
                    _ => lhs.div(rhs),
                };
                next.fork(outcomes.into_iter().map(Operand::Int))
            }
            Operation::Eq | Operation::Le => {
                let lhs = next.pop_int(&instruction)?;
                let rhs = next.pop_int(&instruction)?;
                let outcomes = match *instruction.operation() {
                    Operation::Eq => lhs.cmpeq(rhs),
                    _ => lhs.cmple(rhs),
                };
                next.fork(outcomes.into_iter().map(Operand::Bool))
            }
            Operation::And => {
                let lhs = next.pop_bool(&instruction)?;
                let rhs = next.pop_bool(&instruction)?;
                next.fork(lhs.and(rhs).into_iter().map(Operand::Bool))
            }
            Operation::Store { ref variable } => {
                let value = next.pop_int(&instruction)?;
                if value.is_error() {
                    // The variable keeps its previous value.
                    next.declare_variable(variable);
                    next.raise();
                } else if next.exceptional {
                    next.declare_variable(variable);
                } else {
                    next.set_variable(variable.clone(), value);
                }
                vec![next]
            }
            Operation::Branch {
                ref then,
                ref else_,
            } => {
                let guard = next.pop_bool(&instruction)?;
                let mut successors = Vec::new();
                if guard.is_error() {
                    let mut successor = next.clone();
                    successor.raise();
                    successors.push(successor);
                }
                if guard.possibly_true() {
                    let mut successor = next.clone();
                    successor.continuation.splice(then.clone());
                    successors.push(successor);
                }
                if guard.possibly_false() {
                    let mut successor = next.clone();
                    successor.continuation.splice(else_.clone());
                    successors.push(successor);
                }
                if successors.is_empty() {
                    warn!("Guard of {} has no value, discarding path", instruction);
                }
                successors
            }
            Operation::Loop { ref guard, ref body } => {
                let control_point = instruction.control_point();
                let then: Code = body
                    .iter()
                    .cloned()
                    .chain(iter::once(instruction.clone()))
                    .collect();
                let else_ = Code::from(vec![Instruction::noop(control_point)]);
                let branch = Instruction::branch(control_point, RC::new(then), RC::new(else_));
                next.continuation.splice(RC::new(Code::from(vec![branch])));
                next.continuation.splice(guard.clone());
                vec![next]
            }
            Operation::Try {
                body: Some(ref body),
                ref handler,
            } => {
                let control_point = handler
                    .instruction(0)
                    .map(|instruction| instruction.control_point())
                    .unwrap_or_else(|| instruction.control_point());
                let dispatch = Instruction::dispatch(control_point, handler.clone());
                next.try_depth += 1;
                next.continuation.splice(RC::new(Code::from(vec![dispatch])));
                next.continuation.splice(body.clone());
                vec![next]
            }
            Operation::Try {
                body: None,
                ref handler,
            } => {
                if next.try_depth == 0 {
                    return Err(Error::InvalidDispatch(instruction.to_string()));
                }
                if next.exceptional && next.exception_depth == next.try_depth {
                    trace!("Exception caught at try depth {}", next.try_depth);
                    next.exceptional = false;
                    next.exception_depth = 0;
                    next.continuation.splice(handler.clone());
                }
                next.try_depth -= 1;
                vec![next]
            }
        };

        Ok(successors)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let store = self
            .store
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<String>>()
            .join(", ");
        let stack = self
            .stack
            .iter()
            .rev()
            .map(|operand| operand.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        write!(
            f,
            "store: {{{}}} stack: [{}] exceptional: {} depth: {}/{} code: {}",
            store,
            stack,
            self.exceptional,
            self.try_depth,
            self.exception_depth,
            self.continuation
        )
    }
}

#[cfg(test)]
fn configuration(instructions: Vec<Instruction>) -> Configuration {
    Configuration::new(RC::new(Code::from(instructions)))
}

#[cfg(test)]
fn run_to_end(configuration: Configuration) -> Vec<Configuration> {
    // Every path of loop-free code, depth first.
    let mut terminal = Vec::new();
    let mut pending = vec![configuration];
    while let Some(configuration) = pending.pop() {
        if configuration.is_terminal() {
            terminal.push(configuration);
        } else {
            pending.extend(configuration.step().unwrap());
        }
    }
    terminal
}

#[test]
fn division_by_zero_raises() {
    // x := 1 / 0
    let start = configuration(vec![
        Instruction::push(1, 0),
        Instruction::push(1, 1),
        Instruction::new(1, Operation::Div),
        Instruction::store(1, "x"),
    ]);

    let terminal = run_to_end(start);

    assert_eq!(terminal.len(), 1);
    assert!(terminal[0].is_exceptional());
    assert_eq!(terminal[0].exception_depth(), 0);
    assert_eq!(terminal[0].variable("x"), AbstractInt::Uninitialized);
    assert!(terminal[0].store().contains_key("x"));
}

#[test]
fn failed_store_keeps_previous_value() {
    let mut start = configuration(vec![
        Instruction::push(1, 0),
        Instruction::fetch(1, "y"),
        Instruction::new(1, Operation::Div),
        Instruction::store(1, "x"),
    ]);
    start.set_variable("x", AbstractInt::Negative);
    start.set_variable("y", AbstractInt::Any);

    let terminal = run_to_end(start);

    assert_eq!(terminal.len(), 1);
    assert!(terminal[0].is_exceptional());
    assert_eq!(terminal[0].variable("x"), AbstractInt::Negative);
}

#[test]
fn possible_division_by_zero_forks() {
    // x := 1 / y, with y unknown
    let mut start = configuration(vec![
        Instruction::fetch(1, "y"),
        Instruction::push(1, 1),
        Instruction::new(1, Operation::Div),
        Instruction::store(1, "x"),
    ]);
    start.set_variable("y", AbstractInt::Any);

    let terminal = run_to_end(start);

    assert_eq!(terminal.len(), 2);
    assert!(terminal
        .iter()
        .any(|c| c.is_exceptional() && c.variable("x") == AbstractInt::Uninitialized));
    assert!(terminal
        .iter()
        .any(|c| !c.is_exceptional() && c.variable("x") == AbstractInt::Any));
}

#[test]
fn exceptional_paths_skip_stores() {
    let mut start = configuration(vec![Instruction::push(2, 5), Instruction::store(2, "z")]);
    start.raise();

    let terminal = run_to_end(start);

    assert_eq!(terminal.len(), 1);
    assert!(terminal[0].is_exceptional());
    assert_eq!(terminal[0].variable("z"), AbstractInt::Uninitialized);
    assert!(terminal[0].store().contains_key("z"));
}

#[test]
fn binary_operand_order() {
    // 2 - 0, compiled right operand first
    let start = configuration(vec![
        Instruction::push(1, 0),
        Instruction::push(1, 2),
        Instruction::new(1, Operation::Sub),
        Instruction::store(1, "x"),
    ]);
    let terminal = run_to_end(start);
    assert_eq!(terminal[0].variable("x"), AbstractInt::Positive);

    // -1 <= 0
    let start = configuration(vec![
        Instruction::push(1, 0),
        Instruction::push(1, -1),
        Instruction::new(1, Operation::Le),
    ]);
    let terminal = run_to_end(start);
    assert_eq!(terminal[0].top(), Some(&Operand::Bool(AbstractBool::True)));
}

#[test]
fn branch_forks_on_any() {
    let then = RC::new(Code::from(vec![Instruction::push(2, 1), Instruction::store(2, "y")]));
    let else_ = RC::new(Code::from(vec![
        Instruction::push(3, -1),
        Instruction::store(3, "y"),
    ]));
    let start = configuration(vec![
        Instruction::push(1, 0),
        Instruction::fetch(1, "x"),
        Instruction::new(1, Operation::Le),
        Instruction::branch(1, then, else_),
    ]);

    let successors = {
        let mut c = start;
        for _ in 0..3 {
            c = c.step().unwrap().pop().unwrap();
        }
        c.step().unwrap()
    };

    assert_eq!(successors.len(), 2);
    let terminal: Vec<Configuration> = successors.into_iter().flat_map(run_to_end).collect();
    let mut values: Vec<AbstractInt> = terminal.iter().map(|c| c.variable("y")).collect();
    values.sort();
    assert_eq!(values, vec![AbstractInt::Negative, AbstractInt::Positive]);
}

#[test]
fn loop_unrolls_once() {
    let guard = RC::new(Code::from(vec![Instruction::true_(1)]));
    let body = RC::new(Code::from(vec![Instruction::noop(1)]));
    let start = configuration(vec![Instruction::loop_(1, guard, body)]);

    let successors = start.step().unwrap();
    assert_eq!(successors.len(), 1);

    let unrolled = &successors[0];
    assert_eq!(unrolled.continuation().len(), 2);
    assert_eq!(unrolled.head(), Some(&Instruction::true_(1)));

    // TRUE, BRANCH, NOOP, and the loop is back where it started
    let mut c = unrolled.clone();
    for _ in 0..3 {
        let mut successors = c.step().unwrap();
        assert_eq!(successors.len(), 1);
        c = successors.pop().unwrap();
    }
    assert_eq!(c, start);
}

#[test]
fn nested_try_is_caught_by_innermost_handler() {
    // try { try { x := 1 / 0 } catch { y := 1 } } catch { z := 1 }
    let inner_body = RC::new(Code::from(vec![
        Instruction::push(3, 0),
        Instruction::push(3, 1),
        Instruction::new(3, Operation::Div),
        Instruction::store(3, "x"),
    ]));
    let inner_handler = RC::new(Code::from(vec![
        Instruction::push(4, 1),
        Instruction::store(4, "y"),
    ]));
    let outer_handler = RC::new(Code::from(vec![
        Instruction::push(5, 1),
        Instruction::store(5, "z"),
    ]));
    let outer_body = RC::new(Code::from(vec![Instruction::try_(2, inner_body, inner_handler)]));
    let start = configuration(vec![Instruction::try_(1, outer_body, outer_handler)]);

    let terminal = run_to_end(start);

    assert_eq!(terminal.len(), 1);
    assert!(!terminal[0].is_exceptional());
    assert_eq!(terminal[0].try_depth(), 0);
    assert_eq!(terminal[0].variable("y"), AbstractInt::Positive);
    assert!(!terminal[0].store().contains_key("z"));
}

#[test]
fn exception_outside_inner_try_skips_inner_handler() {
    // try { x := 1 / 0; try { skip } catch { y := 1 } } catch { z := 1 }
    let inner = Instruction::try_(
        3,
        RC::new(Code::from(vec![Instruction::noop(3)])),
        RC::new(Code::from(vec![Instruction::push(4, 1), Instruction::store(4, "y")])),
    );
    let outer_body = RC::new(Code::from(vec![
        Instruction::push(2, 0),
        Instruction::push(2, 1),
        Instruction::new(2, Operation::Div),
        Instruction::store(2, "x"),
        inner,
    ]));
    let outer_handler = RC::new(Code::from(vec![
        Instruction::push(5, 1),
        Instruction::store(5, "z"),
    ]));
    let start = configuration(vec![Instruction::try_(1, outer_body, outer_handler)]);

    let terminal = run_to_end(start);

    assert_eq!(terminal.len(), 1);
    assert!(!terminal[0].is_exceptional());
    assert!(!terminal[0].store().contains_key("y"));
    assert_eq!(terminal[0].variable("z"), AbstractInt::Positive);
}

#[test]
fn step_is_pure() {
    let start = configuration(vec![
        Instruction::fetch(1, "y"),
        Instruction::push(1, 1),
        Instruction::new(1, Operation::Div),
    ]);
    let mut c = start.clone();
    c = c.step().unwrap().pop().unwrap();
    c = c.step().unwrap().pop().unwrap();

    let before = c.clone();
    let first = c.step().unwrap();
    let second = c.step().unwrap();

    assert_eq!(c, before);
    assert_eq!(first, second);
}

#[test]
fn malformed_code_is_an_error() {
    let start = configuration(vec![Instruction::new(1, Operation::Add)]);
    assert!(matches!(start.step(), Err(Error::OperandUnderflow(_))));

    let start = configuration(vec![
        Instruction::true_(1),
        Instruction::store(1, "x"),
    ]);
    let c = start.step().unwrap().pop().unwrap();
    assert!(matches!(c.step(), Err(Error::OperandSort { .. })));

    let start = configuration(vec![Instruction::dispatch(
        1,
        RC::new(Code::from(vec![Instruction::noop(1)])),
    )]);
    assert!(matches!(start.step(), Err(Error::InvalidDispatch(_))));

    let start = configuration(vec![]);
    assert!(matches!(start.step(), Err(Error::EmptyContinuation)));
}
