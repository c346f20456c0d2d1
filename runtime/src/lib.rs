use std::fmt::{Debug, Display};

mod captures;
pub mod charset;
pub mod class;
mod error;
mod pikevm;
pub mod slots;

pub use captures::{Captures, SaveGroupSlot};
pub use charset::{Charset, Utf16, Utf32, Utf8};
pub use class::{BuiltinClass, CharacterSetVerifiable, ClassExpr};
pub use error::ExecError;
pub use pikevm::{Executor, Mode};

/// A hint describing the first code point any match must begin with.
///
/// Set only when the first consuming instruction reachable from the
/// anchored start is preceded by nothing but `Save` instructions, so that
/// every match necessarily begins by consuming a code point accepted by the
/// hint. A search uses it to skip start offsets that cannot begin a match.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FastForward {
    #[default]
    None,
    Char(char),
    Class(usize),
}

impl Display for FastForward {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FastForward::None => write!(f, "None"),
            FastForward::Char(c) => write!(f, "Char: {:?}", c),
            FastForward::Class(idx) => write!(f, "Class: {{{:04}}}", idx),
        }
    }
}

/// A compiled, immutable program.
///
/// A program is a linear sequence of instructions plus the table of class
/// expressions referenced by `ConsumeClass` instructions. Searches begin at
/// instruction 0, which is expected to hold the non-greedy scan prefix, while
/// anchored matches begin at the anchored start.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Program {
    classes: Vec<ClassExpr>,
    program: Vec<Instruction>,
    slot_count: usize,
    anchored_start: InstIndex,
    fast_forward: FastForward,
}

impl Program {
    #[must_use]
    pub fn new(classes: Vec<ClassExpr>, program: Vec<Opcode>) -> Self {
        Self::default().with_classes(classes).with_opcodes(program)
    }

    pub fn with_opcodes(self, program: Vec<Opcode>) -> Self {
        let program = program
            .into_iter()
            .enumerate()
            .map(|(id, opcode)| Instruction::new(id, opcode))
            .collect();

        self.with_instructions(program)
    }

    pub fn with_instructions(self, program: Vec<Instruction>) -> Self {
        let slot_count = slot_count_of(&program);

        Self {
            program,
            slot_count,
            ..self
        }
    }

    pub fn with_classes(self, classes: Vec<ClassExpr>) -> Self {
        Self { classes, ..self }
    }

    pub fn with_anchored_start(self, anchored_start: InstIndex) -> Self {
        Self {
            anchored_start,
            ..self
        }
    }

    pub fn with_fast_forward(self, fast_forward: FastForward) -> Self {
        Self {
            fast_forward,
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.program.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the opcode at `pc`, if defined.
    pub fn opcode(&self, pc: usize) -> Option<&Opcode> {
        self.program.get(pc).map(|inst| &inst.opcode)
    }

    /// Returns the class expression at `idx` of the class table, if defined.
    pub fn class(&self, idx: usize) -> Option<&ClassExpr> {
        self.classes.get(idx)
    }

    pub fn classes(&self) -> &[ClassExpr] {
        &self.classes
    }

    /// The number of capture slots a run of this program writes, two per
    /// group including group 0.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// The number of groups, including group 0.
    pub fn group_count(&self) -> usize {
        self.slot_count / 2
    }

    pub fn anchored_start(&self) -> InstIndex {
        self.anchored_start
    }

    pub fn fast_forward(&self) -> FastForward {
        self.fast_forward
    }

    /// The index of the first instruction reached from the anchored start
    /// that is not a `Save`.
    pub fn first_consuming_pc(&self) -> usize {
        let mut pc = self.anchored_start.as_usize();
        while let Some(Opcode::Save(_)) = self.opcode(pc) {
            pc += 1;
        }

        pc
    }
}

fn slot_count_of(program: &[Instruction]) -> usize {
    let highest = program
        .iter()
        .filter_map(|inst| match inst.opcode {
            Opcode::Save(InstSave { slot }) => Some(slot),
            _ => None,
        })
        .max();

    match highest {
        Some(slot) => (slot / 2 + 1) * 2,
        // group 0 is always accounted for.
        None => 2,
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for inst in self.program.iter() {
            writeln!(f, "{}", inst)?
        }

        Ok(())
    }
}

impl std::ops::Index<InstIndex> for Program {
    type Output = Opcode;

    fn index(&self, index: InstIndex) -> &Self::Output {
        let idx = index.as_usize();
        &self.program[idx].opcode
    }
}

impl AsRef<[Instruction]> for Program {
    fn as_ref(&self) -> &[Instruction] {
        &self.program
    }
}

#[repr(transparent)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstIndex(u32);

impl InstIndex {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for InstIndex {
    fn from(ptr: u32) -> Self {
        Self(ptr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    id: usize,
    opcode: Opcode,
}

impl Instruction {
    #[must_use]
    pub fn new(id: usize, opcode: Opcode) -> Self {
        Self { id, opcode }
    }

    pub fn opcode(&self) -> &Opcode {
        &self.opcode
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}: {}", self.id, self.opcode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opcode {
    Any,
    Consume(InstConsume),
    ConsumeClass(InstConsumeClass),
    Split(InstSplit),
    Jmp(InstJmp),
    Save(InstSave),
    AssertBegin,
    AssertEnd,
    Match,
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Opcode::Match => write!(f, "Match"),
            Opcode::Consume(i) => Display::fmt(&i, f),
            Opcode::ConsumeClass(i) => Display::fmt(&i, f),
            Opcode::Split(i) => Display::fmt(&i, f),
            Opcode::Any => write!(f, "Any"),
            Opcode::Jmp(i) => Display::fmt(&i, f),
            Opcode::Save(i) => Display::fmt(&i, f),
            Opcode::AssertBegin => write!(f, "AssertBegin"),
            Opcode::AssertEnd => write!(f, "AssertEnd"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstConsume {
    pub value: char,
}

impl InstConsume {
    #[must_use]
    pub fn new(value: char) -> Self {
        Self { value }
    }
}

impl Display for InstConsume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Consume: {:?}", self.value)
    }
}

/// ConsumeClass consumes a single code point that is a member of the class
/// expression at `idx` of the program's class table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstConsumeClass {
    pub idx: usize,
}

impl InstConsumeClass {
    pub fn new(idx: usize) -> Self {
        Self::member_of(idx)
    }

    pub fn member_of(idx: usize) -> Self {
        Self { idx }
    }
}

impl Display for InstConsumeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConsumeClass: {{{:04}}}", self.idx)
    }
}

/// Forks a thread. The `x` branch has priority over the `y` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstSplit {
    pub x_branch: InstIndex,
    pub y_branch: InstIndex,
}

impl InstSplit {
    #[must_use]
    pub fn new(x: InstIndex, y: InstIndex) -> Self {
        Self {
            x_branch: x,
            y_branch: y,
        }
    }
}

impl Display for InstSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Split: ({:04}), ({:04})",
            self.x_branch.as_u32(),
            self.y_branch.as_u32()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstJmp {
    pub next: InstIndex,
}

impl InstJmp {
    pub fn new(next: InstIndex) -> Self {
        Self { next }
    }
}

impl Display for InstJmp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JumpAbs: ({:04})", self.next.as_u32())
    }
}

/// Records the current code-unit offset into a capture slot. Even slots open
/// a group and odd slots close it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstSave {
    pub slot: usize,
}

impl InstSave {
    #[must_use]
    pub fn new(slot: usize) -> Self {
        Self { slot }
    }
}

impl Display for InstSave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Save[{:04}]", self.slot)
    }
}

/// Runs `program` anchored at both ends of `input`.
pub fn run_match<C: Charset>(
    program: &Program,
    input: &[C::Unit],
) -> Result<Option<Captures>, ExecError> {
    Executor::new(program).run_match::<C>(input)
}

/// Finds the leftmost, highest priority match of `program` within `input`.
pub fn run_search<C: Charset>(
    program: &Program,
    input: &[C::Unit],
) -> Result<Option<Captures>, ExecError> {
    Executor::new(program).run_search::<C>(input)
}
