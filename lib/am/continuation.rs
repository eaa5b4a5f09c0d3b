use crate::am::{Code, Instruction};
use crate::RC;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone, Debug)]
struct Frame {
    code: RC<Code>,
    position: usize,
}

impl Frame {
    fn remaining(&self) -> &[Instruction] {
        &self.code.instructions()[self.position..]
    }
}

/// The instructions a configuration has yet to execute.
///
/// A `Continuation` is a stack of cursors into shared `Code` templates. The
/// head of the continuation is the instruction under the cursor of the top
/// frame. Splicing code in front of the continuation pushes a new frame, so
/// templates are never copied or modified.
///
/// Two continuations are equal when they hold the same remaining
/// instructions, regardless of how those instructions are laid out in
/// frames.
#[derive(Clone, Debug, Default)]
pub struct Continuation {
    // Invariant: no frame is exhausted.
    frames: Vec<Frame>,
}

impl Continuation {
    /// A continuation which runs all of `code`.
    pub fn new(code: RC<Code>) -> Continuation {
        let mut continuation = Continuation::default();
        continuation.splice(code);
        continuation
    }

    /// Returns true if there is nothing left to execute.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The number of remaining instructions.
    pub fn len(&self) -> usize {
        self.frames.iter().map(|frame| frame.remaining().len()).sum()
    }

    /// The next instruction to execute.
    pub fn head(&self) -> Option<&Instruction> {
        self.frames
            .last()
            .and_then(|frame| frame.code.instruction(frame.position))
    }

    /// Drop the head instruction.
    pub fn advance(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.position += 1;
            if frame.position >= frame.code.len() {
                self.frames.pop();
            }
        }
    }

    /// Place `code` in front of the remaining instructions.
    pub fn splice(&mut self, code: RC<Code>) {
        if !code.is_empty() {
            self.frames.push(Frame { code, position: 0 });
        }
    }

    /// Iterate over the remaining instructions, head first.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.remaining().iter())
    }
}

impl PartialEq for Continuation {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for Continuation {}

impl Hash for Continuation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for instruction in self.iter() {
            instruction.hash(state);
        }
    }
}

impl fmt::Display for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let instructions = self
            .iter()
            .map(|instruction| instruction.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "[{}]", instructions)
    }
}

#[cfg(test)]
fn code(instructions: Vec<Instruction>) -> RC<Code> {
    RC::new(Code::from(instructions))
}

#[test]
fn splice_and_advance() {
    let mut continuation = Continuation::new(code(vec![
        Instruction::push(1, 1),
        Instruction::store(1, "x"),
    ]));
    continuation.splice(code(vec![Instruction::noop(0)]));

    assert_eq!(continuation.len(), 3);
    assert_eq!(continuation.head(), Some(&Instruction::noop(0)));

    continuation.advance();
    assert_eq!(continuation.head(), Some(&Instruction::push(1, 1)));
    continuation.advance();
    continuation.advance();
    assert!(continuation.is_empty());
    assert_eq!(continuation.head(), None);

    continuation.splice(code(vec![]));
    assert!(continuation.is_empty());
}

#[test]
fn equality_ignores_frames() {
    use rustc_hash::FxHasher;

    let whole = Continuation::new(code(vec![
        Instruction::noop(0),
        Instruction::push(1, 1),
        Instruction::store(1, "x"),
    ]));

    let mut split = Continuation::new(code(vec![
        Instruction::push(1, 1),
        Instruction::store(1, "x"),
    ]));
    split.splice(code(vec![Instruction::noop(0)]));

    assert_eq!(whole, split);

    let hash = |continuation: &Continuation| {
        let mut hasher = FxHasher::default();
        continuation.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash(&whole), hash(&split));

    split.advance();
    assert_ne!(whole, split);
}
