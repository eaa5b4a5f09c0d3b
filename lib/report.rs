//! Render an `Analysis` onto the program it was computed for.
//!
//! Every assignment, conditional, loop and try block is preceded by the
//! variables at its control point. Assignments are annotated with the join
//! of their right-hand side, and conditionals and loops with the join of
//! their guard. The report ends with the variables after the program, and
//! how the program may terminate.

use crate::domain::{AbstractBool, AbstractInt, Summary};
use crate::syntax::{Compiled, Stm};
use crate::vm::Analysis;
use crate::Error;
use std::fmt::{self, Write};
use std::slice;

const INDENT: &str = "    ";

/// An `Analysis` paired with the program it describes.
pub struct Report<'r> {
    program: &'r Stm,
    control_points: &'r [usize],
    analysis: &'r Analysis,
}

fn count_control_points(stm: &Stm) -> usize {
    let nested = match *stm {
        Stm::Assign { .. } | Stm::Skip => 0,
        Stm::Compound(ref first, ref second) => {
            count_control_points(first) + count_control_points(second)
        }
        Stm::If {
            ref then,
            ref else_,
            ..
        } => count_control_points(then) + count_control_points(else_),
        Stm::While { ref body, .. } => count_control_points(body),
        Stm::TryCatch {
            ref body,
            ref handler,
        } => count_control_points(body) + count_control_points(handler),
    };
    nested + usize::from(stm.has_control_point())
}

/// The annotation for the right-hand side of an assignment.
pub fn right_hand_side_flag(rhs: Option<Summary<AbstractInt>>) -> Option<&'static str> {
    match rhs {
        None => None,
        Some(rhs) if rhs.definitely_raises() => Some("Exception raiser!"),
        Some(rhs) if rhs.possibly_raises() => Some("Possible exception raiser!"),
        Some(rhs) if rhs.uninitialized() => Some("Use of uninitialised variable!"),
        Some(_) => None,
    }
}

/// The annotation for the guard of a conditional, or of a loop.
///
/// A conditional with a constant guard never runs one of its branches, and
/// a loop whose guard is always false never runs its body.
pub fn guard_flag(guard: Option<Summary<AbstractBool>>, is_loop: bool) -> Option<&'static str> {
    let guard = guard?;
    if guard.definitely_raises() {
        Some("Exception raiser!")
    } else if guard.possibly_raises() {
        Some("Possible exception raiser!")
    } else if guard.uninitialized() {
        Some("Use of uninitialised variable!")
    } else {
        match guard.value() {
            AbstractBool::False => Some("Unreachable code!"),
            AbstractBool::True if !is_loop => Some("Unreachable code!"),
            _ => None,
        }
    }
}

/// How a program may terminate.
pub fn termination(analysis: &Analysis) -> &'static str {
    match (
        analysis.possibly_normal_termination(),
        analysis.possibly_exceptional_termination(),
    ) {
        (true, true) => "possibly exceptional termination",
        (true, false) => "normal termination",
        (false, true) => "exceptional termination",
        (false, false) => "no termination",
    }
}

impl<'r> Report<'r> {
    /// Create a report for `program`, which was compiled into `compiled`
    /// and analysed into `analysis`.
    pub fn new(
        program: &'r Stm,
        compiled: &'r Compiled,
        analysis: &'r Analysis,
    ) -> Result<Report<'r>, Error> {
        let expected = count_control_points(program);
        if compiled.control_points().len() != expected {
            return Err(Error::Custom(format!(
                "Program has {} control points, but was compiled with {}",
                expected,
                compiled.control_points().len()
            )));
        }
        Ok(Report {
            program,
            control_points: compiled.control_points(),
            analysis,
        })
    }

    fn variables(&self, out: &mut String, depth: usize, control_point: usize) -> fmt::Result {
        let variables = self
            .analysis
            .variables(control_point)
            .map(|variables| {
                variables
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<String>>()
                    .join(", ")
            })
            .unwrap_or_default();
        write!(out, "\n{}{{{}}}", INDENT.repeat(depth), variables)
    }

    fn stm(
        &self,
        out: &mut String,
        stm: &Stm,
        depth: usize,
        points: &mut slice::Iter<'_, usize>,
    ) -> fmt::Result {
        let indent = INDENT.repeat(depth);
        let control_point = if stm.has_control_point() {
            points.next().cloned().ok_or(fmt::Error)?
        } else {
            0
        };

        match *stm {
            Stm::Assign {
                ref variable,
                ref value,
            } => {
                self.variables(out, depth, control_point)?;
                let rhs = self.analysis.right_hand_side(control_point);
                match rhs {
                    Some(rhs) => write!(out, " Right-hand side: {}", rhs)?,
                    None => write!(out, " Right-hand side: never evaluated")?,
                }
                if let Some(flag) = right_hand_side_flag(rhs) {
                    write!(out, " ({})", flag)?;
                }
                write!(out, "\n{}{} := {}", indent, variable, value)
            }
            Stm::Skip => write!(out, "\n{}skip", indent),
            Stm::Compound(ref first, ref second) => {
                self.stm(out, first, depth, points)?;
                write!(out, ";")?;
                self.stm(out, second, depth, points)
            }
            Stm::If {
                ref guard,
                ref then,
                ref else_,
            } => {
                self.guard(out, depth, control_point, false)?;
                write!(out, "\n{}if {} then", indent, guard)?;
                self.stm(out, then, depth + 1, points)?;
                write!(out, "\n{}else", indent)?;
                self.stm(out, else_, depth + 1, points)
            }
            Stm::While {
                ref guard,
                ref body,
            } => {
                self.guard(out, depth, control_point, true)?;
                write!(out, "\n{}while {} do", indent, guard)?;
                self.stm(out, body, depth + 1, points)
            }
            Stm::TryCatch {
                ref body,
                ref handler,
            } => {
                self.variables(out, depth, control_point)?;
                write!(out, "\n{}try", indent)?;
                self.stm(out, body, depth + 1, points)?;
                write!(out, "\n{}catch", indent)?;
                self.stm(out, handler, depth + 1, points)
            }
        }
    }

    fn guard(
        &self,
        out: &mut String,
        depth: usize,
        control_point: usize,
        is_loop: bool,
    ) -> fmt::Result {
        self.variables(out, depth, control_point)?;
        let guard = self.analysis.guard(control_point);
        match guard {
            Some(guard) => write!(out, " Boolean guard: {}", guard)?,
            None => write!(out, " Boolean guard: never evaluated")?,
        }
        if let Some(flag) = guard_flag(guard, is_loop) {
            write!(out, " ({})", flag)?;
        }
        Ok(())
    }

    fn render(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        let mut points = self.control_points.iter();
        self.stm(&mut out, self.program, 0, &mut points)?;
        self.variables(&mut out, 0, self.analysis.last_control_point())?;
        write!(out, " ({})", termination(self.analysis))?;
        Ok(out)
    }
}

impl<'r> fmt::Display for Report<'r> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let out = self.render()?;
        f.write_str(out.trim_start_matches('\n'))
    }
}

#[cfg(test)]
fn report(source: &str) -> String {
    let program = crate::syntax::parse(source).unwrap();
    let compiled = crate::syntax::compile(&program);
    let analysis =
        crate::vm::analyse(compiled.code().clone(), crate::vm::Options::default()).unwrap();
    Report::new(&program, &compiled, &analysis)
        .unwrap()
        .to_string()
}

#[test]
fn report_assignments() {
    let text = report("x := 1 / 0; y := z");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "{x=UNINITIALIZED, y=UNINITIALIZED} Right-hand side: ERROR (Exception raiser!)",
            "x := (1 / 0);",
            "{x=UNINITIALIZED, y=UNINITIALIZED} Right-hand side: UNINITIALIZED (Use of uninitialised variable!)",
            "y := z",
            "{x=UNINITIALIZED, y=UNINITIALIZED} (exceptional termination)",
        ]
    );
}

#[test]
fn report_guards() {
    let text = report("if true then x := 1 else x := -1; while x <= 0 do x := x - 1");
    assert!(text.contains("Boolean guard: TRUE (Unreachable code!)\nif true then"));
    assert!(text.contains("    {x=UNINITIALIZED} Right-hand side: POSITIVE\n    x := 1"));
    assert!(text.contains("Right-hand side: never evaluated\n    x := -1"));
    assert!(text.contains("Boolean guard: FALSE (Unreachable code!)\nwhile x <= 0 do"));
    assert!(text.ends_with("{x=POSITIVE} (normal termination)"));
}

#[test]
fn report_try() {
    let text = report("try x := y catch skip; while true do skip");
    assert!(text.starts_with("{}\ntry\n"));
    assert!(text.contains("Right-hand side: UNINITIALIZED (Use of uninitialised variable!)"));
    assert!(text.contains("\ncatch\n    skip;"));
    assert!(text.ends_with("(no termination)"));
}

#[test]
fn mismatched_program() {
    let program = crate::syntax::parse("x := 1").unwrap();
    let other = crate::syntax::parse("x := 1; y := 2").unwrap();
    let compiled = crate::syntax::compile(&other);
    let analysis =
        crate::vm::analyse(compiled.code().clone(), crate::vm::Options::default()).unwrap();
    assert!(Report::new(&program, &compiled, &analysis).is_err());
}

#[test]
fn guard_flags() {
    let raises = Summary::new(AbstractBool::Error);
    assert_eq!(guard_flag(Some(raises), false), Some("Exception raiser!"));
    assert_eq!(guard_flag(Some(raises), true), Some("Exception raiser!"));

    let may_raise = Summary::new(AbstractBool::Any).join_marker(AbstractBool::Error);
    assert_eq!(guard_flag(Some(may_raise), false), Some("Possible exception raiser!"));

    let always = Summary::new(AbstractBool::True);
    assert_eq!(guard_flag(Some(always), false), Some("Unreachable code!"));
    assert_eq!(guard_flag(Some(always), true), None);
    let never = Summary::new(AbstractBool::False);
    assert_eq!(guard_flag(Some(never), true), Some("Unreachable code!"));
    assert_eq!(guard_flag(Some(Summary::new(AbstractBool::Any)), false), None);
    assert_eq!(guard_flag(None, false), None);
}

#[test]
fn report_raising_guard() {
    let text = report("if 1/0 <= 0 then x := 1 else x := 2");
    assert!(text.starts_with("{} Boolean guard: ERROR (Exception raiser!)\nif "));
    assert!(text.contains("Right-hand side: never evaluated\n    x := 1"));
    assert!(text.contains("Right-hand side: never evaluated\n    x := 2"));
    assert!(text.ends_with("(exceptional termination)"));
}
