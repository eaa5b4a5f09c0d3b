//! Translate While statements into `am::Code`.

use crate::am::{Code, Instruction, Operation};
use crate::syntax::{AExp, BExp, Stm};
use crate::RC;

/// The result of compiling a program.
#[derive(Clone, Debug)]
pub struct Compiled {
    code: RC<Code>,
    control_points: Vec<usize>,
}

impl Compiled {
    /// The compiled program.
    pub fn code(&self) -> &RC<Code> {
        &self.code
    }

    /// The control point of every assignment, conditional, loop and try
    /// block, in the order they appear in the source.
    pub fn control_points(&self) -> &[usize] {
        &self.control_points
    }
}

#[derive(Default)]
struct Compiler {
    control_point: usize,
    control_points: Vec<usize>,
}

impl Compiler {
    fn next_control_point(&mut self) -> usize {
        self.control_point += 1;
        self.control_points.push(self.control_point);
        self.control_point
    }

    fn binary(&mut self, code: &mut Code, lhs: &AExp, rhs: &AExp, operation: Operation) {
        self.aexp(code, rhs);
        self.aexp(code, lhs);
        code.push(Instruction::new(self.control_point, operation));
    }

    fn aexp(&mut self, code: &mut Code, aexp: &AExp) {
        match *aexp {
            AExp::Num(value) => code.push(Instruction::push(self.control_point, value)),
            AExp::Var(ref name) => code.push(Instruction::fetch(self.control_point, name.clone())),
            AExp::Add(ref lhs, ref rhs) => self.binary(code, lhs, rhs, Operation::Add),
            AExp::Sub(ref lhs, ref rhs) => self.binary(code, lhs, rhs, Operation::Sub),
            AExp::Mul(ref lhs, ref rhs) => self.binary(code, lhs, rhs, Operation::Mult),
            AExp::Div(ref lhs, ref rhs) => self.binary(code, lhs, rhs, Operation::Div),
        }
    }

    fn bexp(&mut self, code: &mut Code, bexp: &BExp) {
        match *bexp {
            BExp::True => code.push(Instruction::true_(self.control_point)),
            BExp::False => code.push(Instruction::false_(self.control_point)),
            BExp::Eq(ref lhs, ref rhs) => self.binary(code, lhs, rhs, Operation::Eq),
            BExp::Le(ref lhs, ref rhs) => self.binary(code, lhs, rhs, Operation::Le),
            BExp::Not(ref b) => {
                self.bexp(code, b);
                code.push(Instruction::new(self.control_point, Operation::Neg));
            }
            BExp::And(ref lhs, ref rhs) => {
                self.bexp(code, rhs);
                self.bexp(code, lhs);
                code.push(Instruction::new(self.control_point, Operation::And));
            }
        }
    }

    fn block(&mut self, stm: &Stm) -> RC<Code> {
        let mut code = Code::new();
        self.stm(&mut code, stm);
        RC::new(code)
    }

    fn stm(&mut self, code: &mut Code, stm: &Stm) {
        match *stm {
            Stm::Assign {
                ref variable,
                ref value,
            } => {
                let control_point = self.next_control_point();
                self.aexp(code, value);
                code.push(Instruction::store(control_point, variable.clone()));
            }
            Stm::Skip => code.push(Instruction::noop(self.control_point)),
            Stm::Compound(ref first, ref second) => {
                self.stm(code, first);
                self.stm(code, second);
            }
            Stm::If {
                ref guard,
                ref then,
                ref else_,
            } => {
                let control_point = self.next_control_point();
                self.bexp(code, guard);
                let then = self.block(then);
                let else_ = self.block(else_);
                code.push(Instruction::branch(control_point, then, else_));
            }
            Stm::While {
                ref guard,
                ref body,
            } => {
                let control_point = self.next_control_point();
                let mut guard_code = Code::new();
                self.bexp(&mut guard_code, guard);
                let body = self.block(body);
                code.push(Instruction::loop_(control_point, RC::new(guard_code), body));
            }
            Stm::TryCatch {
                ref body,
                ref handler,
            } => {
                let control_point = self.next_control_point();
                let body = self.block(body);
                let handler = self.block(handler);
                code.push(Instruction::try_(control_point, body, handler));
            }
        }
    }
}

/// Compile a program, numbering its control points from 1.
pub fn compile(program: &Stm) -> Compiled {
    let mut compiler = Compiler::default();
    let code = compiler.block(program);
    debug!(
        "Compiled {} instructions over {} control points",
        code.len(),
        compiler.control_points.len()
    );
    Compiled {
        code,
        control_points: compiler.control_points,
    }
}

#[test]
fn control_points_are_preorder() {
    let program = crate::syntax::parse(
        "x := 1; if x <= 2 then y := 3 else (while true do z := 4); try skip catch w := 5",
    )
    .unwrap();
    let compiled = compile(&program);

    assert_eq!(compiled.control_points(), &[1, 2, 3, 4, 5, 6, 7]);

    let code = compiled.code();
    // PUSH, STORE, then PUSH, FETCH, LE, BRANCH for the conditional, then TRY
    assert_eq!(code.len(), 7);
    assert_eq!(code.instruction(1), Some(&Instruction::store(1, "x")));
    assert_eq!(code.instruction(4).map(|i| i.control_point()), Some(2));
    let branch = code.instruction(5).unwrap();
    assert!(branch.is_branch());
    assert_eq!(branch.control_point(), 2);
    assert_eq!(code.instruction(6).map(|i| i.control_point()), Some(6));
    assert_eq!(code.instruction(7), None);
    assert_eq!(code.max_control_point(), Some(7));

    match *code.instruction(6).unwrap().operation() {
        Operation::Try {
            body: Some(ref body),
            ref handler,
        } => {
            // skip keeps the control point of the enclosing try
            assert_eq!(body.instruction(0), Some(&Instruction::noop(6)));
            assert_eq!(handler.instruction(1), Some(&Instruction::store(7, "w")));
        }
        ref operation => panic!("expected TRY, found {}", operation),
    }
}

#[test]
fn right_operand_first() {
    let compiled = compile(&crate::syntax::parse("x := a - b / -c").unwrap());
    let listing = compiled.code().to_string();
    assert_eq!(
        listing,
        "FETCH-c@1, PUSH-0@1, SUB@1, FETCH-b@1, DIV@1, FETCH-a@1, SUB@1, STORE-x@1"
    );

    let compiled = compile(&crate::syntax::parse("if !(0 <= n) & true then skip else skip").unwrap());
    let first: Vec<String> = compiled
        .code()
        .iter()
        .map(|instruction| instruction.operation().opcode().to_string())
        .collect();
    assert_eq!(first, vec!["TRUE", "FETCH", "PUSH", "LE", "NEG", "AND", "BRANCH"]);
}
