#[cfg(test)]
use crate::domain::{AbstractBool, AbstractInt};
#[cfg(test)]
use crate::syntax;
#[cfg(test)]
use crate::vm::{self, Analysis, Vm};

#[cfg(test)]
fn explore(source: &str) -> Vm {
    let program = syntax::parse(source).unwrap();
    let compiled = syntax::compile(&program);
    let mut vm = Vm::new(compiled.code().clone(), vm::Options::default());
    vm.execute().unwrap();
    vm
}

#[cfg(test)]
fn analyse(source: &str) -> Analysis {
    explore(source).analysis()
}

#[test]
fn division_by_zero_always_raises() {
    let vm = explore("x := 1/0");

    let terminal: Vec<_> = vm.visited().iter().filter(|c| c.is_terminal()).collect();
    assert!(!terminal.is_empty());
    assert!(terminal.iter().all(|c| c.is_exceptional()));

    let analysis = vm.analysis();
    assert!(analysis.possibly_exceptional_termination());
    assert!(!analysis.possibly_normal_termination());
    assert!(analysis.right_hand_side(1).unwrap().definitely_raises());
    assert_eq!(
        analysis.variable(analysis.last_control_point(), "x"),
        Some(AbstractInt::Uninitialized)
    );
}

#[test]
fn sequential_assignments() {
    let analysis = analyse("y := 1; y := -1");

    assert_eq!(analysis.last_control_point(), 3);
    assert_eq!(analysis.variable(2, "y"), Some(AbstractInt::Positive));
    assert_eq!(analysis.variable(3, "y"), Some(AbstractInt::Negative));
    assert_eq!(
        analysis.program_variables().get("y"),
        Some(&AbstractInt::Any)
    );
    assert!(analysis.possibly_normal_termination());
    assert!(!analysis.possibly_exceptional_termination());
}

#[test]
fn infinite_loop_never_terminates() {
    let vm = explore("while true do skip");

    assert!(vm.visited().iter().all(|c| !c.is_terminal()));

    let analysis = vm.analysis();
    assert!(analysis.never_terminates());
    assert_eq!(analysis.guard(1).unwrap().value(), AbstractBool::True);
}

#[test]
fn uninitialized_guard_takes_both_arms() {
    let analysis = analyse("if x<=0 then y:=1 else y:=2");

    let guard = analysis.guard(1).unwrap();
    assert_eq!(guard.value(), AbstractBool::Any);
    assert!(!guard.raises());
    assert!(analysis.right_hand_side(2).is_some());
    assert!(analysis.right_hand_side(3).is_some());
    assert_eq!(
        analysis.variable(analysis.last_control_point(), "y"),
        Some(AbstractInt::Positive)
    );
}

#[test]
fn nested_try_innermost_dispatch() {
    let vm = explore("try { try { x := 1/0 } catch { skip } } catch { skip }");
    let terminal: Vec<_> = vm.visited().iter().filter(|c| c.is_terminal()).collect();
    assert!(!terminal.is_empty());
    assert!(terminal
        .iter()
        .all(|c| !c.is_exceptional() && c.try_depth() == 0));

    // try=1, inner try=2, x=3, y=4, z=5
    let analysis = analyse("try { try { x := 1/0 } catch { y := 1 } } catch { z := 1 }");
    assert!(analysis.right_hand_side(4).is_some());
    assert_eq!(analysis.right_hand_side(5), None);
    assert!(analysis.possibly_normal_termination());
    assert!(!analysis.possibly_exceptional_termination());
}

#[test]
fn exception_in_handler_escapes() {
    let analysis = analyse("try x := 1/0 catch y := 1/0");

    assert!(analysis.right_hand_side(3).unwrap().definitely_raises());
    assert!(!analysis.possibly_normal_termination());
    assert!(analysis.possibly_exceptional_termination());
    assert_eq!(
        analysis.variable(analysis.last_control_point(), "y"),
        Some(AbstractInt::Uninitialized)
    );
}

#[test]
fn counting_loop_terminates() {
    let analysis = analyse("x := 10; while 0 <= x do x := x - 1");

    assert_eq!(analysis.guard(2).unwrap().value(), AbstractBool::Any);
    assert!(analysis.possibly_normal_termination());
    assert_eq!(analysis.variable(1, "x"), Some(AbstractInt::Uninitialized));
    assert_eq!(analysis.variable(2, "x"), Some(AbstractInt::Any));
    assert_eq!(
        analysis.variable(analysis.last_control_point(), "x"),
        Some(AbstractInt::Any)
    );
}

#[test]
fn possible_exception_is_caught() {
    let analysis = analyse("try y := 1 / x catch y := 0");

    let rhs = analysis.right_hand_side(2).unwrap();
    assert!(rhs.possibly_raises());
    assert_eq!(rhs.value(), AbstractInt::Any);
    assert!(analysis.possibly_normal_termination());
    assert!(!analysis.possibly_exceptional_termination());

    let y = analysis.variable(analysis.last_control_point(), "y");
    assert_eq!(y, Some(AbstractInt::Any));
}

#[test]
fn exploration_limit() {
    let program = syntax::parse("x := a / b; y := x / c").unwrap();
    let compiled = syntax::compile(&program);
    let options = vm::OptionsBuilder::new().max_configurations(4).build();
    let result = vm::analyse(compiled.code().clone(), options);
    assert!(matches!(result, Err(crate::Error::ExplorationLimit(4))));
}

#[test]
fn raising_guard_skips_both_arms() {
    let analysis = analyse("if 1/0 <= 0 then x := 1 else x := 2");

    let guard = analysis.guard(1).unwrap();
    assert!(guard.definitely_raises());
    assert_eq!(guard.to_string(), "ERROR");
    assert_eq!(analysis.right_hand_side(2), None);
    assert_eq!(analysis.right_hand_side(3), None);
    assert!(!analysis.possibly_normal_termination());
    assert!(analysis.possibly_exceptional_termination());
}

#[test]
fn possibly_raising_guard_is_caught() {
    // try=1, if=2, then=3, else=4, handler=5
    let analysis = analyse("try (if x/x <= 0 then y := 1 else y := 2) catch y := 0");

    let guard = analysis.guard(2).unwrap();
    assert!(guard.possibly_raises());
    assert_eq!(guard.value(), AbstractBool::Any);
    assert_eq!(guard.to_string(), "ANY|ERROR");
    assert!(analysis.right_hand_side(3).is_some());
    assert!(analysis.right_hand_side(4).is_some());
    assert_eq!(
        analysis.right_hand_side(5).map(|rhs| rhs.value()),
        Some(AbstractInt::Zero)
    );
    assert!(analysis.possibly_normal_termination());
    assert!(!analysis.possibly_exceptional_termination());
}

#[test]
fn last_control_point_follows_compiled_code() {
    // The else arm is never reached, but its control point 3 still precedes
    // the point after the program.
    let analysis = analyse("if true then x := 1 else x := 2");

    assert_eq!(analysis.last_control_point(), 4);
    assert_eq!(analysis.right_hand_side(3), None);
    assert_eq!(analysis.variable(3, "x"), Some(AbstractInt::Uninitialized));
    assert_eq!(analysis.variable(4, "x"), Some(AbstractInt::Positive));
}
