use crate::am::Instruction;
use std::fmt;
use std::iter::FromIterator;
use std::slice;

/// An ordered sequence of `Instruction`.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Code {
    instructions: Vec<Instruction>,
}

impl Code {
    /// Create a new, empty `Code`.
    pub fn new() -> Code {
        Code {
            instructions: Vec::new(),
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Append an instruction to the end of this code.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// The highest control point of any instruction in this code, including
    /// nested code. `None` if this code holds no instructions.
    pub fn max_control_point(&self) -> Option<usize> {
        self.instructions
            .iter()
            .map(|instruction| instruction.max_control_point())
            .max()
    }
}

impl From<Vec<Instruction>> for Code {
    fn from(instructions: Vec<Instruction>) -> Code {
        Code { instructions }
    }
}

impl FromIterator<Instruction> for Code {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Code {
        Code {
            instructions: iter.into_iter().collect(),
        }
    }
}

impl<'c> IntoIterator for &'c Code {
    type Item = &'c Instruction;
    type IntoIter = slice::Iter<'c, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let instructions = self
            .instructions
            .iter()
            .map(|instruction| instruction.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "{}", instructions)
    }
}

#[test]
fn max_control_point() {
    use crate::RC;

    let body = Code::from(vec![Instruction::push(2, 1), Instruction::store(2, "x")]);
    let code = Code::from(vec![
        Instruction::true_(1),
        Instruction::loop_(1, RC::new(Code::from(vec![Instruction::true_(1)])), RC::new(body)),
    ]);

    assert_eq!(code.max_control_point(), Some(2));
    assert_eq!(Code::new().max_control_point(), None);
}
