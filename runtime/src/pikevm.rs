//! A Pike VM executor.
//!
//! Threads advance over the input in lockstep, one code point per step. At
//! every step each instruction index admits at most one thread, which bounds
//! the work of a run to O(program length × input length). Priority among
//! threads is their order in the thread list; `Split` places its `x` branch
//! ahead of its `y` branch and a thread reaching `Match` cuts every thread
//! of lower priority.
//!
//! The per-run scratch state (thread lists, the last step at which each
//! instruction admitted a thread, and capture slot arrays) is owned by the
//! run rather than the program, so a single [`Program`] may be executed from
//! any number of threads at once.

use log::trace;

use crate::captures::Captures;
use crate::charset::Charset;
use crate::class::CharacterSetVerifiable;
use crate::error::ExecError;
use crate::slots::{SlotArena, SlotHandle};
use crate::{
    FastForward, InstConsume, InstConsumeClass, InstJmp, InstSave, InstSplit, Opcode, Program,
};

/// Selects how a program is anchored against its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The match must begin at offset 0 and end at the end of input.
    Match,
    /// The leftmost match anywhere in the input.
    Search,
}

/// Executes a compiled [`Program`] against inputs of any [`Charset`].
#[derive(Debug, Clone, Copy)]
pub struct Executor<'p> {
    program: &'p Program,
    work_limit: Option<usize>,
}

impl<'p> Executor<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            work_limit: None,
        }
    }

    /// Bounds the number of instruction visits a single run may perform.
    /// A run exceeding the bound fails with [`ExecError::WorkLimitExceeded`].
    pub fn with_work_limit(self, limit: usize) -> Self {
        Self {
            work_limit: Some(limit),
            ..self
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn run_match<C: Charset>(
        &self,
        input: &[C::Unit],
    ) -> Result<Option<Captures>, ExecError> {
        self.run::<C>(Mode::Match, input)
    }

    pub fn run_search<C: Charset>(
        &self,
        input: &[C::Unit],
    ) -> Result<Option<Captures>, ExecError> {
        self.run::<C>(Mode::Search, input)
    }

    pub fn run<C: Charset>(
        &self,
        mode: Mode,
        input: &[C::Unit],
    ) -> Result<Option<Captures>, ExecError> {
        Run::<C>::new(self.program, input, self.work_limit).execute(mode)
    }
}

#[derive(Debug)]
struct Thread {
    pc: usize,
    slots: SlotHandle,
}

/// The state of a single execution.
struct Run<'p, 'i, C: Charset> {
    program: &'p Program,
    input: &'i [C::Unit],
    work_limit: Option<usize>,
    work: usize,
    arena: SlotArena,
    last_step: Vec<usize>,
    stack: Vec<(usize, SlotHandle)>,
}

impl<'p, 'i, C: Charset> Run<'p, 'i, C> {
    fn new(program: &'p Program, input: &'i [C::Unit], work_limit: Option<usize>) -> Self {
        Self {
            program,
            input,
            work_limit,
            work: 0,
            arena: SlotArena::new(program.slot_count()),
            last_step: vec![usize::MAX; program.len()],
            stack: vec![],
        }
    }

    fn execute(mut self, mode: Mode) -> Result<Option<Captures>, ExecError> {
        use core::mem::swap;

        let program = self.program;
        let start_pc = match mode {
            Mode::Match => program.anchored_start().as_usize(),
            Mode::Search => 0,
        };
        let fast_forward_pc = match (mode, program.fast_forward()) {
            (Mode::Search, FastForward::Char(_) | FastForward::Class(_)) => {
                Some(program.first_consuming_pc())
            }
            _ => None,
        };

        let mut clist: Vec<Thread> = vec![];
        let mut nlist: Vec<Thread> = vec![];
        let mut best: Option<Captures> = None;
        let mut step = 0;
        let mut pos = 0;

        let slots = self.arena.alloc();
        self.add_thread(&mut clist, start_pc, slots, pos, step)?;

        while !clist.is_empty() {
            self.check_work_limit()?;

            if let (Some(ff_pc), None) = (fast_forward_pc, &best) {
                if self.is_idle_scan(&clist, ff_pc) {
                    match self.fast_forward_target(pos)? {
                        Some(target) if target == pos => (),
                        Some(target) => {
                            trace!("fast-forwarding search from offset {} to {}", pos, target);
                            for thread in clist.drain(..) {
                                self.arena.release(thread.slots);
                            }

                            pos = target;
                            step += 1;
                            let slots = self.arena.alloc();
                            self.add_thread(&mut clist, 0, slots, pos, step)?;
                        }
                        // no remaining offset can begin a match.
                        None => break,
                    }
                }
            }

            let next = C::next_code_point(self.input, pos);
            let next_pos = next.map_or(pos, |(_, width)| pos + width);
            let mut threads = clist.drain(..);

            while let Some(Thread { pc, slots }) = threads.next() {
                self.work += 1;

                let opcode = match program.opcode(pc) {
                    Some(opcode) => opcode,
                    None => return Err(ExecError::CorruptProgram { pc }),
                };

                let consumed = match (opcode, next) {
                    (Opcode::Match, _) => {
                        // anchored matches only accept at the end of input.
                        if mode == Mode::Match && next.is_some() {
                            self.arena.release(slots);
                            continue;
                        }

                        let captured = self.arena.get(&slots).to_vec();
                        self.arena.release(slots);
                        best = Some(
                            Captures::from_slots(captured)
                                .ok_or(ExecError::CorruptProgram { pc })?,
                        );

                        // cut all lower priority threads.
                        for thread in threads.by_ref() {
                            self.arena.release(thread.slots);
                        }
                        break;
                    }
                    (_, None) => false,
                    (Opcode::Any, Some(_)) => true,
                    (Opcode::Consume(InstConsume { value }), Some((c, _))) => *value == c,
                    (Opcode::ConsumeClass(InstConsumeClass { idx }), Some((c, _))) => {
                        match program.class(*idx) {
                            Some(class) => class.in_set(c),
                            None => return Err(ExecError::CorruptProgram { pc }),
                        }
                    }
                    // the closure only schedules consuming and match opcodes.
                    (_, Some(_)) => return Err(ExecError::CorruptProgram { pc }),
                };

                if consumed {
                    self.add_thread(&mut nlist, pc + 1, slots, next_pos, step + 1)?;
                } else {
                    self.arena.release(slots);
                }
            }

            drop(threads);
            swap(&mut clist, &mut nlist);
            step += 1;
            pos = next_pos;

            if next.is_none() {
                break;
            }
        }

        self.check_work_limit()?;
        Ok(best)
    }

    /// Follows every non-consuming instruction reachable from `pc`, appending
    /// the resulting consuming and `Match` threads to `list` in priority
    /// order.
    fn add_thread(
        &mut self,
        list: &mut Vec<Thread>,
        pc: usize,
        slots: SlotHandle,
        pos: usize,
        step: usize,
    ) -> Result<(), ExecError> {
        let program = self.program;
        self.stack.push((pc, slots));

        while let Some((pc, slots)) = self.stack.pop() {
            let opcode = match program.opcode(pc) {
                Some(opcode) => opcode,
                None => return Err(ExecError::CorruptProgram { pc }),
            };

            // Don't visit states we've already added.
            if self.last_step[pc] == step {
                self.arena.release(slots);
                continue;
            }
            self.last_step[pc] = step;
            self.work += 1;

            match opcode {
                Opcode::Jmp(InstJmp { next }) => self.stack.push((next.as_usize(), slots)),
                Opcode::Split(InstSplit { x_branch, y_branch }) => {
                    let shared = self.arena.share(&slots);
                    self.stack.push((y_branch.as_usize(), shared));
                    self.stack.push((x_branch.as_usize(), slots));
                }
                Opcode::Save(InstSave { slot }) if *slot < self.arena.width() => {
                    let slots = self.arena.write(slots, *slot, pos);
                    self.stack.push((pc + 1, slots));
                }
                Opcode::Save(_) => return Err(ExecError::CorruptProgram { pc }),
                Opcode::AssertBegin if pos == 0 => self.stack.push((pc + 1, slots)),
                Opcode::AssertEnd if pos == self.input.len() => self.stack.push((pc + 1, slots)),
                Opcode::AssertBegin | Opcode::AssertEnd => self.arena.release(slots),
                Opcode::Any | Opcode::Consume(_) | Opcode::ConsumeClass(_) | Opcode::Match => {
                    list.push(Thread { pc, slots })
                }
            }
        }

        Ok(())
    }

    fn check_work_limit(&self) -> Result<(), ExecError> {
        match self.work_limit {
            Some(limit) if self.work > limit => {
                trace!(
                    "work limit of {} exceeded after {} instruction visits",
                    limit,
                    self.work
                );
                Err(ExecError::WorkLimitExceeded { limit })
            }
            _ => Ok(()),
        }
    }

    /// Returns true when the only live threads are the fresh start thread
    /// parked on the first consuming instruction and the scan prefix.
    fn is_idle_scan(&self, clist: &[Thread], ff_pc: usize) -> bool {
        let anchored_start = self.program.anchored_start().as_usize();

        matches!(
            clist,
            [fresh, scan] if fresh.pc == ff_pc && scan.pc < anchored_start
        )
    }

    /// Returns the first offset at or after `pos` whose code point satisfies
    /// the program's fast-forward hint.
    fn fast_forward_target(&self, pos: usize) -> Result<Option<usize>, ExecError> {
        let accepts = |c: char| -> Result<bool, ExecError> {
            match self.program.fast_forward() {
                FastForward::None => Ok(true),
                FastForward::Char(expected) => Ok(c == expected),
                FastForward::Class(idx) => self
                    .program
                    .class(idx)
                    .map(|class| class.in_set(c))
                    .ok_or(ExecError::CorruptProgram {
                        pc: self.program.first_consuming_pc(),
                    }),
            }
        };

        let mut offset = pos;
        while let Some((c, width)) = C::next_code_point(self.input, offset) {
            if accepts(c)? {
                return Ok(Some(offset));
            }
            offset += width;
        }

        Ok(None)
    }
}
