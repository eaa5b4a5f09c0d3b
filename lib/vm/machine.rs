//! Breadth-first exploration of the configurations of a program.

use crate::am::Code;
use crate::vm::{Analysis, Configuration, Options};
use crate::{Error, RC};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// The abstract machine.
///
/// A `Vm` explores every configuration reachable from the start of a
/// program, breadth first. Configurations are memoized, and a configuration
/// seen before is never explored again. The abstract domains are finite, and
/// unrolling a loop or entering a try block re-creates the same instructions
/// every time, so the set of reachable configurations is finite and
/// exploration always ends.
#[derive(Clone, Debug)]
pub struct Vm {
    options: Options,
    queue: VecDeque<Configuration>,
    visited: FxHashSet<Configuration>,
    max_control_point: usize,
    steps: usize,
}

impl Vm {
    /// Create a new `Vm` which will explore `code`.
    pub fn new(code: RC<Code>, options: Options) -> Vm {
        // Statements the search never reaches still own their control
        // point, so the point after the program lies beyond all of them.
        let max_control_point = code.max_control_point().unwrap_or(0);

        let initial = Configuration::new(code);
        let mut queue = VecDeque::new();
        let mut visited = FxHashSet::default();
        if !initial.is_terminal() {
            queue.push_back(initial.clone());
        }
        visited.insert(initial);

        Vm {
            options,
            queue,
            visited,
            max_control_point,
            steps: 0,
        }
    }

    /// Expand the next configuration of the search.
    ///
    /// Returns `false` once there is nothing left to explore.
    pub fn execute_step(&mut self) -> Result<bool, Error> {
        let configuration = match self.queue.pop_front() {
            Some(configuration) => configuration,
            None => return Ok(false),
        };

        trace!("{}", configuration);
        if let Some(head) = configuration.head() {
            trace!("> {}", head);
        }

        let successors = configuration.step()?;
        self.steps += 1;

        for successor in successors {
            if let Some(control_point) = successor.control_point() {
                self.max_control_point = self.max_control_point.max(control_point);
            }
            if self.visited.contains(&successor) {
                continue;
            }
            if !successor.is_terminal() {
                self.queue.push_back(successor.clone());
            }
            self.visited.insert(successor);
        }

        if let Some(max_configurations) = self.options.max_configurations() {
            if self.visited.len() > max_configurations {
                return Err(Error::ExplorationLimit(max_configurations));
            }
        }

        Ok(!self.queue.is_empty())
    }

    /// Explore until there is nothing left to explore.
    pub fn execute(&mut self) -> Result<(), Error> {
        while self.execute_step()? {}
        debug!(
            "Exploration finished after {} steps, {} configurations visited",
            self.steps,
            self.visited.len()
        );
        Ok(())
    }

    /// Returns true once there is nothing left to explore.
    pub fn is_done(&self) -> bool {
        self.queue.is_empty()
    }

    /// The configurations waiting to be explored, next first.
    pub fn frontier(&self) -> &VecDeque<Configuration> {
        &self.queue
    }

    /// Every configuration seen so far.
    pub fn visited(&self) -> &FxHashSet<Configuration> {
        &self.visited
    }

    /// The number of configurations expanded so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// The control point after the last statement of the program, where
    /// terminal configurations are reported.
    pub fn last_control_point(&self) -> usize {
        self.max_control_point + 1
    }

    /// Summarise the configurations visited so far.
    pub fn analysis(&self) -> Analysis {
        Analysis::new(self.visited.iter(), self.last_control_point())
    }
}

/// Explore `code` to completion and summarise the result.
pub fn analyse(code: RC<Code>, options: Options) -> Result<Analysis, Error> {
    let mut vm = Vm::new(code, options);
    vm.execute()?;
    Ok(vm.analysis())
}

#[cfg(test)]
use crate::am::{Instruction, Operation};

#[test]
fn infinite_loop_terminates_search() {
    // while true do skip
    let code = RC::new(Code::from(vec![Instruction::loop_(
        1,
        RC::new(Code::from(vec![Instruction::true_(1)])),
        RC::new(Code::from(vec![Instruction::noop(1)])),
    )]));

    let mut vm = Vm::new(code, Options::default());
    vm.execute().unwrap();

    assert!(vm.is_done());
    assert!(vm.visited().iter().all(|c| !c.is_terminal()));
    assert_eq!(vm.last_control_point(), 2);
}

#[test]
fn empty_program() {
    let mut vm = Vm::new(RC::new(Code::new()), Options::default());
    assert!(vm.is_done());
    assert!(!vm.execute_step().unwrap());
    assert_eq!(vm.visited().len(), 1);
    assert_eq!(vm.last_control_point(), 1);
}

#[test]
fn exploration_limit() {
    // x := y / y, forking twice
    let code = RC::new(Code::from(vec![
        Instruction::fetch(1, "y"),
        Instruction::fetch(1, "y"),
        Instruction::new(1, Operation::Div),
        Instruction::store(1, "x"),
    ]));

    let options = crate::vm::OptionsBuilder::new().max_configurations(2).build();
    let mut vm = Vm::new(code, options);
    assert!(matches!(vm.execute(), Err(Error::ExplorationLimit(2))));
}

#[test]
fn stepping_matches_execute() {
    let code = RC::new(Code::from(vec![
        Instruction::fetch(1, "y"),
        Instruction::push(1, 1),
        Instruction::new(1, Operation::Div),
        Instruction::store(1, "x"),
    ]));

    let mut stepped = Vm::new(code.clone(), Options::default());
    let mut steps = 0;
    while stepped.execute_step().unwrap() {
        steps += 1;
    }

    let mut executed = Vm::new(code, Options::default());
    executed.execute().unwrap();

    assert_eq!(steps + 1, stepped.steps());
    assert_eq!(stepped.visited(), executed.visited());
}
