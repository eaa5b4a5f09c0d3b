//! Summaries of explored configurations, per control point.

use crate::domain::{AbstractBool, AbstractInt, Summary, Value};
use crate::vm::{Configuration, Operand};
use std::collections::BTreeMap;

/// The results of exploring a program.
///
/// Every visited configuration is attributed to the control point of its
/// next instruction, or to `last_control_point` if it is terminal. Each
/// control point then holds:
///
/// * The join of the stores of its configurations.
/// * For an assignment, the join of the values about to be stored.
/// * For a conditional or loop, the join of its guard.
///
/// Variables are reported at every control point. A variable missing from a
/// control point, but known at `last_control_point`, is reported as
/// uninitialized.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Analysis {
    last_control_point: usize,
    variables: Vec<BTreeMap<String, AbstractInt>>,
    right_hand_sides: Vec<Option<Summary<AbstractInt>>>,
    guards: Vec<Option<Summary<AbstractBool>>>,
    program_variables: BTreeMap<String, AbstractInt>,
    possibly_normal_termination: bool,
    possibly_exceptional_termination: bool,
}

fn join_store(into: &mut BTreeMap<String, AbstractInt>, store: &BTreeMap<String, AbstractInt>) {
    for (name, value) in store {
        let joined = match into.get(name) {
            Some(v) => v.lub(*value),
            None => *value,
        };
        into.insert(name.clone(), joined);
    }
}

impl Analysis {
    /// Summarise `configurations`, reporting terminal configurations at
    /// `last_control_point`.
    pub fn new<'c, I>(configurations: I, last_control_point: usize) -> Analysis
    where
        I: IntoIterator<Item = &'c Configuration>,
    {
        let points = last_control_point + 1;
        let mut analysis = Analysis {
            last_control_point,
            variables: vec![BTreeMap::new(); points],
            right_hand_sides: vec![None; points],
            guards: vec![None; points],
            program_variables: BTreeMap::new(),
            possibly_normal_termination: false,
            possibly_exceptional_termination: false,
        };

        for configuration in configurations {
            let head = configuration.head();
            let control_point = head
                .map(|instruction| instruction.control_point())
                .unwrap_or(last_control_point);
            if control_point > last_control_point {
                warn!(
                    "Configuration at control point {} lies beyond the last control point {}",
                    control_point, last_control_point
                );
                continue;
            }

            if configuration.is_terminal() {
                if configuration.is_exceptional() {
                    analysis.possibly_exceptional_termination = true;
                } else {
                    analysis.possibly_normal_termination = true;
                }
            }

            join_store(&mut analysis.variables[control_point], configuration.store());
            join_store(&mut analysis.program_variables, configuration.store());

            match (head, configuration.top()) {
                (Some(instruction), Some(&Operand::Int(value))) if instruction.is_store() => {
                    let rhs = &mut analysis.right_hand_sides[control_point];
                    *rhs = Some(match *rhs {
                        Some(summary) => summary.join_marker(value),
                        None => Summary::new(value),
                    });
                }
                (Some(instruction), Some(&Operand::Bool(guard))) if instruction.is_branch() => {
                    let summary = &mut analysis.guards[control_point];
                    *summary = Some(match *summary {
                        Some(summary) => summary.join_marker(guard),
                        None => Summary::new(guard),
                    });
                }
                _ => {}
            }
        }

        let (earlier, last) = analysis.variables.split_at_mut(last_control_point);
        for name in last[0].keys() {
            for variables in earlier.iter_mut() {
                variables
                    .entry(name.clone())
                    .or_insert(AbstractInt::Uninitialized);
            }
        }

        analysis
    }

    /// The control point after the last statement of the program.
    pub fn last_control_point(&self) -> usize {
        self.last_control_point
    }

    /// The join of all variables at a control point.
    pub fn variables(&self, control_point: usize) -> Option<&BTreeMap<String, AbstractInt>> {
        self.variables.get(control_point)
    }

    /// The join of one variable at a control point.
    pub fn variable(&self, control_point: usize, name: &str) -> Option<AbstractInt> {
        self.variables(control_point)
            .and_then(|variables| variables.get(name))
            .cloned()
    }

    /// The join of the right-hand sides evaluated by the assignment at this
    /// control point. `None` if the assignment was never reached.
    pub fn right_hand_side(&self, control_point: usize) -> Option<Summary<AbstractInt>> {
        self.right_hand_sides.get(control_point).cloned().flatten()
    }

    /// The join of the guards evaluated by the conditional or loop at this
    /// control point. `None` if the guard was never evaluated.
    pub fn guard(&self, control_point: usize) -> Option<Summary<AbstractBool>> {
        self.guards.get(control_point).cloned().flatten()
    }

    /// The join of all variables over every configuration, regardless of
    /// control point.
    pub fn program_variables(&self) -> &BTreeMap<String, AbstractInt> {
        &self.program_variables
    }

    /// Some execution may end without an exception.
    pub fn possibly_normal_termination(&self) -> bool {
        self.possibly_normal_termination
    }

    /// Some execution may end with an uncaught exception.
    pub fn possibly_exceptional_termination(&self) -> bool {
        self.possibly_exceptional_termination
    }

    /// No execution ends.
    pub fn never_terminates(&self) -> bool {
        !self.possibly_normal_termination && !self.possibly_exceptional_termination
    }
}

#[cfg(test)]
use crate::am::{Code, Instruction, Operation};
#[cfg(test)]
use crate::RC;

#[cfg(test)]
fn explore(instructions: Vec<Instruction>) -> Analysis {
    crate::vm::analyse(RC::new(Code::from(instructions)), crate::vm::Options::default())
        .unwrap()
}

#[test]
fn right_hand_side_joins() {
    // x := 1 / y; z := y
    let analysis = explore(vec![
        Instruction::fetch(1, "y"),
        Instruction::push(1, 1),
        Instruction::new(1, Operation::Div),
        Instruction::store(1, "x"),
        Instruction::fetch(2, "y"),
        Instruction::store(2, "z"),
    ]);

    assert_eq!(analysis.last_control_point(), 3);

    let rhs = analysis.right_hand_side(1).unwrap();
    assert!(rhs.possibly_raises());
    assert_eq!(rhs.value(), AbstractInt::Any);

    let rhs = analysis.right_hand_side(2).unwrap();
    assert!(rhs.uninitialized());

    assert!(analysis.possibly_normal_termination());
    assert!(analysis.possibly_exceptional_termination());
}

#[test]
fn backfill_uninitialized() {
    // x := 1; z := 2
    let analysis = explore(vec![
        Instruction::push(1, 1),
        Instruction::store(1, "x"),
        Instruction::push(2, 2),
        Instruction::store(2, "z"),
    ]);

    let first = analysis.variables(1).unwrap();
    assert_eq!(first.get("x"), Some(&AbstractInt::Uninitialized));
    assert_eq!(first.get("z"), Some(&AbstractInt::Uninitialized));
    assert_eq!(analysis.variable(2, "x"), Some(AbstractInt::Positive));
    assert_eq!(analysis.variable(2, "z"), Some(AbstractInt::Uninitialized));
    assert_eq!(analysis.variable(3, "z"), Some(AbstractInt::Positive));
    assert_eq!(analysis.variables(0).unwrap().len(), 2);
}

#[test]
fn unreached_code_reports_nothing() {
    // if true then x := 1 else x := 2
    let analysis = explore(vec![
        Instruction::true_(1),
        Instruction::branch(
            1,
            RC::new(Code::from(vec![Instruction::push(2, 1), Instruction::store(2, "x")])),
            RC::new(Code::from(vec![Instruction::push(3, 2), Instruction::store(3, "x")])),
        ),
    ]);

    // One past the highest compiled control point, whether reached or not.
    assert_eq!(analysis.last_control_point(), 4);
    assert_eq!(analysis.guard(1), Some(Summary::new(AbstractBool::True)));
    assert!(analysis.right_hand_side(2).is_some());
    assert_eq!(analysis.right_hand_side(3), None);
    assert_eq!(analysis.variable(4, "x"), Some(AbstractInt::Positive));
}
