//! Provides methods and types to facilitate the lowering of a parsed pattern
//! into a runtime [`Program`].
//!
//! # Example
//!
//! ```
//! use unire_compiler::{ast::*, compiler::*};
//! use unire_runtime::*;
//!
//! // approximate to `ab`
//! let expr = Expression::new(Node::Cat(vec![Node::Char('a'), Node::Char('b')]), 0);
//!
//! assert_eq!(
//!     Ok(Program::default()
//!         .with_opcodes(vec![
//!             Opcode::Split(InstSplit::new(InstIndex::from(3), InstIndex::from(1))),
//!             Opcode::Any,
//!             Opcode::Jmp(InstJmp::new(InstIndex::from(0))),
//!             Opcode::Save(InstSave::new(0)),
//!             Opcode::Consume(InstConsume::new('a')),
//!             Opcode::Consume(InstConsume::new('b')),
//!             Opcode::Save(InstSave::new(1)),
//!             Opcode::Match,
//!         ])
//!         .with_anchored_start(InstIndex::from(3))
//!         .with_fast_forward(FastForward::Char('a'))),
//!     compile_ast(expr, &CompileOptions::default())
//! )
//! ```
use thiserror::Error;
use unire_runtime::*;

use crate::ast::{self, Node};
use crate::parser::DEFAULT_NEST_LIMIT;

/// The index at which anchored matching begins, following the scan prefix.
const ANCHORED_START: u32 = 3;

/// Relative offsets are encoded as `i32`, so no program may grow past half
/// of its range.
const PROGRAM_LEN_CEILING: usize = (i32::MAX / 2) as usize;

/// Bounds on the programs the compiler is willing to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    max_repetition: u32,
    max_program_len: usize,
    nest_limit: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_repetition: 1_000,
            max_program_len: 65_536,
            nest_limit: DEFAULT_NEST_LIMIT,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the largest bound accepted in a `{m,n}` repetition.
    pub fn with_max_repetition(self, max_repetition: u32) -> Self {
        Self {
            max_repetition,
            ..self
        }
    }

    /// Sets the largest number of instructions a compiled program may hold.
    pub fn with_max_program_len(self, max_program_len: usize) -> Self {
        Self {
            max_program_len: max_program_len.min(PROGRAM_LEN_CEILING),
            ..self
        }
    }

    /// Sets how deeply groups, classes and class complements may nest before
    /// a pattern is rejected by the parser.
    pub fn with_nest_limit(self, nest_limit: u32) -> Self {
        Self { nest_limit, ..self }
    }

    pub fn max_repetition(&self) -> u32 {
        self.max_repetition
    }

    pub fn max_program_len(&self) -> usize {
        self.max_program_len
    }

    pub fn nest_limit(&self) -> u32 {
        self.nest_limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("repetition bound exceeds the limit of {limit}")]
    RepetitionTooLarge { limit: u32 },
    #[error("program exceeds the limit of {limit} instructions")]
    ProgramTooLarge { limit: usize },
}

/// A internal representation of the `unire_runtime::Opcode` type, with
/// relative addressing.
///
/// ## Note
/// This type is meant to exist only internally and should be
/// refined to the `unire_runtime::Opcode` type.
#[derive(Debug, Clone, PartialEq)]
enum RelativeOpcode {
    Any,
    Consume(char),
    ConsumeClass(ClassExpr),
    Split(i32, i32),
    Jmp(i32),
    Save(usize),
    AssertBegin,
    AssertEnd,
    Match,
}

impl RelativeOpcode {
    fn into_opcode_with_index(self, classes: &mut Vec<ClassExpr>, idx: i32) -> Option<Opcode> {
        match self {
            RelativeOpcode::Any => Some(Opcode::Any),
            RelativeOpcode::Consume(c) => Some(Opcode::Consume(InstConsume::new(c))),
            RelativeOpcode::Split(rel_x, rel_y) => {
                let x: u32 = idx.checked_add(rel_x)?.try_into().ok()?;
                let y: u32 = idx.checked_add(rel_y)?.try_into().ok()?;

                Some(Opcode::Split(InstSplit::new(
                    InstIndex::from(x),
                    InstIndex::from(y),
                )))
            }
            RelativeOpcode::Jmp(rel_jmp_to) => {
                let jmp_to: u32 = idx.checked_add(rel_jmp_to)?.try_into().ok()?;

                Some(Opcode::Jmp(InstJmp::new(InstIndex::from(jmp_to))))
            }
            RelativeOpcode::Save(slot) => Some(Opcode::Save(InstSave::new(slot))),
            RelativeOpcode::AssertBegin => Some(Opcode::AssertBegin),
            RelativeOpcode::AssertEnd => Some(Opcode::AssertEnd),
            RelativeOpcode::Match => Some(Opcode::Match),
            RelativeOpcode::ConsumeClass(class) => {
                // identical classes share a single table entry.
                let found = classes.iter().position(|entry| entry == &class);
                let class_idx = match found {
                    Some(class_idx) => class_idx,
                    None => {
                        let class_idx = classes.len();
                        classes.push(class);
                        class_idx
                    }
                };

                Some(Opcode::ConsumeClass(InstConsumeClass::new(class_idx)))
            }
        }
    }
}

type RelativeOpcodes = Vec<RelativeOpcode>;

/// Accepts a parsed pattern and attempts to lower it into a runnable program
/// for use with the unire-runtime crate.
///
/// The emitted program opens with a lazy scan prefix so that a search may
/// start a match at any position, and wraps the pattern in the save points
/// of group 0.
pub fn compile_ast(
    expr: ast::Expression,
    options: &CompileOptions,
) -> Result<Program, CompileError> {
    let lowering = Lowering::new(options);

    // match anything, lazily, ahead of the anchored start.
    let prefix = [
        RelativeOpcode::Split(3, 1),
        RelativeOpcode::Any,
        RelativeOpcode::Jmp(-2),
        RelativeOpcode::Save(0),
    ];
    let suffix = [RelativeOpcode::Save(1), RelativeOpcode::Match];

    let rel_ops: RelativeOpcodes = prefix
        .into_iter()
        .chain(lowering.node(expr.root)?)
        .chain(suffix)
        .collect();
    lowering.check_len(rel_ops.len())?;

    let (classes, opcodes) = rel_ops
        .into_iter()
        .enumerate()
        .try_fold(
            (vec![], vec![]),
            |(mut classes, mut opcodes), (idx, rel_op)| {
                let idx = i32::try_from(idx).ok()?;
                opcodes.push(rel_op.into_opcode_with_index(&mut classes, idx)?);

                Some((classes, opcodes))
            },
        )
        .ok_or_else(|| lowering.too_large())?;

    let program =
        Program::new(classes, opcodes).with_anchored_start(InstIndex::from(ANCHORED_START));

    // a consuming instruction that every match must begin with lets a search
    // skip ahead to its next occurrence.
    let fast_forward = match program.opcode(program.first_consuming_pc()) {
        Some(Opcode::Consume(InstConsume { value })) => FastForward::Char(*value),
        Some(Opcode::ConsumeClass(InstConsumeClass { idx })) => FastForward::Class(*idx),
        _ => FastForward::None,
    };

    Ok(program.with_fast_forward(fast_forward))
}

/// Recursively lowers nodes, enforcing the bounds of a set of options.
struct Lowering<'o> {
    options: &'o CompileOptions,
}

impl<'o> Lowering<'o> {
    fn new(options: &'o CompileOptions) -> Self {
        Self { options }
    }

    fn too_large(&self) -> CompileError {
        CompileError::ProgramTooLarge {
            limit: self.options.max_program_len(),
        }
    }

    fn check_len(&self, len: usize) -> Result<(), CompileError> {
        if len > self.options.max_program_len() {
            Err(self.too_large())
        } else {
            Ok(())
        }
    }

    fn offset(&self, len: usize) -> Result<i32, CompileError> {
        i32::try_from(len).map_err(|_| self.too_large())
    }

    fn node(&self, node: Node) -> Result<RelativeOpcodes, CompileError> {
        let rel_ops = match node {
            Node::Char(c) => vec![RelativeOpcode::Consume(c)],
            Node::AnyChar => vec![RelativeOpcode::Any],
            Node::Class(class) => vec![RelativeOpcode::ConsumeClass(class)],
            Node::AnchorBegin => vec![RelativeOpcode::AssertBegin],
            Node::AnchorEnd => vec![RelativeOpcode::AssertEnd],
            Node::Cat(nodes) => {
                let mut rel_ops = vec![];
                for node in nodes {
                    rel_ops.extend(self.node(node)?);
                    self.check_len(rel_ops.len())?;
                }

                rel_ops
            }
            Node::Alt(nodes) => {
                let alternatives = nodes
                    .into_iter()
                    .map(|node| self.node(node))
                    .collect::<Result<Vec<_>, _>>()?;

                self.alternation(alternatives)?
            }
            Node::Star { node, greedy } => {
                let body = self.node(*node)?;
                self.zero_or_more(body, greedy)?
            }
            Node::Plus { node, greedy } => {
                let body = self.node(*node)?;
                self.check_len(body.len().saturating_mul(2).saturating_add(2))?;

                body.clone()
                    .into_iter()
                    .chain(self.zero_or_more(body, greedy)?)
                    .collect()
            }
            Node::Opt { node, greedy } => {
                let body = self.node(*node)?;
                self.zero_or_one(body, greedy)?
            }
            Node::Repeat {
                node,
                min,
                max,
                greedy,
            } => {
                let limit = self.options.max_repetition();
                if min > limit || max.map_or(false, |max| max > limit) {
                    return Err(CompileError::RepetitionTooLarge { limit });
                }

                let body = self.node(*node)?;
                self.repeat(body, min, max, greedy)?
            }
            Node::Save { group, node } => {
                let body = self.node(*node)?;

                [RelativeOpcode::Save(group * 2)]
                    .into_iter()
                    .chain(body)
                    .chain([RelativeOpcode::Save(group * 2 + 1)])
                    .collect()
            }
        };

        self.check_len(rel_ops.len())?;
        Ok(rel_ops)
    }

    /// `L0: Split(L1, LE); L1: body; Jmp(L0); LE:`, with the split arms
    /// swapped when lazy.
    fn zero_or_more(
        &self,
        body: RelativeOpcodes,
        greedy: bool,
    ) -> Result<RelativeOpcodes, CompileError> {
        self.check_len(body.len() + 2)?;
        let body_len = self.offset(body.len())?;
        let split = if greedy {
            RelativeOpcode::Split(1, body_len + 2)
        } else {
            RelativeOpcode::Split(body_len + 2, 1)
        };

        Ok([split]
            .into_iter()
            .chain(body)
            .chain([RelativeOpcode::Jmp(-body_len - 1)])
            .collect())
    }

    /// `Split(L1, LE); L1: body; LE:`, with the split arms swapped when lazy.
    fn zero_or_one(
        &self,
        body: RelativeOpcodes,
        greedy: bool,
    ) -> Result<RelativeOpcodes, CompileError> {
        self.check_len(body.len() + 1)?;
        let body_len = self.offset(body.len())?;
        let split = if greedy {
            RelativeOpcode::Split(1, body_len + 1)
        } else {
            RelativeOpcode::Split(body_len + 1, 1)
        };

        Ok([split].into_iter().chain(body).collect())
    }

    /// Unrolls the `min` mandatory copies of the body, followed by either a
    /// star or `max - min` optional copies.
    fn repeat(
        &self,
        body: RelativeOpcodes,
        min: u32,
        max: Option<u32>,
        greedy: bool,
    ) -> Result<RelativeOpcodes, CompileError> {
        let body_len = body.len();
        let mandatory = body_len.checked_mul(min as usize);
        let optional = match max {
            None => body_len.checked_add(2),
            Some(max) => body_len
                .checked_add(1)
                .and_then(|len| len.checked_mul(max.saturating_sub(min) as usize)),
        };
        let total = mandatory
            .zip(optional)
            .and_then(|(mandatory, optional)| mandatory.checked_add(optional))
            .ok_or_else(|| self.too_large())?;
        self.check_len(total)?;

        let mut rel_ops = Vec::with_capacity(total);
        for _ in 0..min {
            rel_ops.extend(body.iter().cloned());
        }

        match max {
            None => rel_ops.extend(self.zero_or_more(body, greedy)?),
            Some(max) => {
                for _ in min..max {
                    rel_ops.extend(self.zero_or_one(body.clone(), greedy)?);
                }
            }
        }

        Ok(rel_ops)
    }

    /// Generates alternations from a block of relative operations. Every
    /// alternative but the last is prefixed with a split to the next
    /// alternative and suffixed with a jump to the end of the block.
    fn alternation(
        &self,
        rel_ops: Vec<RelativeOpcodes>,
    ) -> Result<RelativeOpcodes, CompileError> {
        let subexpr_cnt = rel_ops.len();

        let length_of_rel_ops: Vec<usize> = rel_ops
            .iter()
            .enumerate()
            .map(|(idx, subexpr)| {
                // last alternation doesn't require a split prefix and jump suffix
                if idx + 1 == subexpr_cnt {
                    subexpr.len()
                } else {
                    subexpr.len() + 2
                }
            })
            .collect();

        let total_length_of_compiled_expr = length_of_rel_ops
            .iter()
            .try_fold(0usize, |total, len| total.checked_add(*len))
            .ok_or_else(|| self.too_large())?;
        self.check_len(total_length_of_compiled_expr)?;

        let mut compiled = Vec::with_capacity(total_length_of_compiled_expr);
        // add 1 to set end at first instruction of next expr
        let mut offset_to_end = total_length_of_compiled_expr + 1;

        for (idx, (ops, subexpr_len)) in rel_ops.into_iter().zip(length_of_rel_ops).enumerate() {
            offset_to_end -= subexpr_len;

            if idx + 1 == subexpr_cnt {
                compiled.extend(ops);
            } else {
                compiled.push(RelativeOpcode::Split(1, self.offset(subexpr_len)?));
                compiled.extend(ops);
                compiled.push(RelativeOpcode::Jmp(self.offset(offset_to_end)?));
            }
        }

        Ok(compiled)
    }
}
