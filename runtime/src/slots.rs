//! Per-run storage for capture slots.
//!
//! Every thread owns a handle to a fixed-width array of code-unit offsets.
//! Handles are reference counted so that forking a thread at a `Split` only
//! bumps a count, and a `Save` into a shared array copies it first. Arrays
//! are carved out of a single backing vector and recycled through a free list
//! when their count drops to zero, so a run allocates at most as many arrays
//! as it has simultaneously live threads.

/// Marks a slot that has not been written.
pub const ABSENT: usize = usize::MAX;

/// An opaque reference to one slot array within a [`SlotArena`].
#[derive(Debug, PartialEq, Eq)]
pub struct SlotHandle(usize);

/// A refcounted pool of equally sized slot arrays.
#[derive(Debug)]
pub struct SlotArena {
    width: usize,
    slots: Vec<usize>,
    refs: Vec<usize>,
    free: Vec<usize>,
}

impl SlotArena {
    /// Instantiates an empty arena of arrays that are `width` slots wide.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            slots: vec![],
            refs: vec![],
            free: vec![],
        }
    }

    /// The number of slots in every array.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The number of arrays currently referenced by at least one handle.
    #[cfg(test)]
    fn live(&self) -> usize {
        self.refs.len() - self.free.len()
    }

    /// Returns a handle to a fresh array with every slot absent.
    pub fn alloc(&mut self) -> SlotHandle {
        match self.free.pop() {
            Some(idx) => {
                self.refs[idx] = 1;
                self.array_mut(idx).fill(ABSENT);
                SlotHandle(idx)
            }
            None => {
                let idx = self.refs.len();
                self.refs.push(1);
                self.slots.resize(self.slots.len() + self.width, ABSENT);
                SlotHandle(idx)
            }
        }
    }

    /// Returns a second handle to the same array.
    pub fn share(&mut self, handle: &SlotHandle) -> SlotHandle {
        self.refs[handle.0] += 1;
        SlotHandle(handle.0)
    }

    /// Drops a handle, recycling its array once no handles remain.
    pub fn release(&mut self, handle: SlotHandle) {
        let refs = &mut self.refs[handle.0];
        *refs -= 1;

        if *refs == 0 {
            self.free.push(handle.0);
        }
    }

    /// Writes `value` into `slot`, copying the array first if the handle
    /// shares it with another.
    ///
    /// Returns the handle that now refers to the written array.
    pub fn write(&mut self, handle: SlotHandle, slot: usize, value: usize) -> SlotHandle {
        let handle = if self.refs[handle.0] > 1 {
            let copy = self.alloc();
            let src = self.offset(handle.0);
            let dst = self.offset(copy.0);
            self.slots.copy_within(src..src + self.width, dst);
            self.release(handle);
            copy
        } else {
            handle
        };

        let idx = handle.0;
        self.array_mut(idx)[slot] = value;
        handle
    }

    /// Returns the contents of the array behind `handle`.
    pub fn get(&self, handle: &SlotHandle) -> &[usize] {
        let start = self.offset(handle.0);
        &self.slots[start..start + self.width]
    }

    #[inline]
    fn offset(&self, idx: usize) -> usize {
        idx * self.width
    }

    fn array_mut(&mut self, idx: usize) -> &mut [usize] {
        let start = self.offset(idx);
        &mut self.slots[start..start + self.width]
    }
}
