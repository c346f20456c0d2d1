//! Code-unit encodings the executor can run over.
//!
//! The executor never looks at code units directly. It asks a [`Charset`] for
//! the code point starting at a given code-unit offset along with its width,
//! so every offset it records (capture slots, match spans) is expressed in
//! the code units of the input.
//!
//! Malformed sequences never fail. They decode as U+FFFD spanning the
//! offending units, which always advances the cursor by at least one unit.

use std::fmt::Debug;
use std::marker::PhantomData;

/// Represents an encoding of code points into code units.
pub trait Charset {
    /// The storage element of an encoded input.
    type Unit: Copy + Debug;

    /// Decodes the code point that begins at offset `at`, returning it
    /// alongside its width in code units. Returns `None` at or beyond the end
    /// of the input.
    fn next_code_point(units: &[Self::Unit], at: usize) -> Option<(char, usize)>;

    /// Decodes the code point that ends at offset `at`, returning it
    /// alongside its width in code units. Returns `None` at the start of the
    /// input or beyond its end.
    fn prev_code_point(units: &[Self::Unit], at: usize) -> Option<(char, usize)>;

    /// Returns an iterator over the code points of `units` paired with the
    /// offset at which each begins.
    fn code_points(units: &[Self::Unit]) -> CodePoints<'_, Self>
    where
        Self: Sized,
    {
        CodePoints::new(units)
    }
}

/// An iterator over `(offset, code point)` pairs of an encoded input.
#[derive(Debug)]
pub struct CodePoints<'a, C: Charset> {
    units: &'a [C::Unit],
    offset: usize,
    charset: PhantomData<C>,
}

impl<'a, C: Charset> CodePoints<'a, C> {
    fn new(units: &'a [C::Unit]) -> Self {
        Self {
            units,
            offset: 0,
            charset: PhantomData,
        }
    }

    /// The code-unit offset of the next code point to be yielded.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a, C: Charset> Iterator for CodePoints<'a, C> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.offset;
        let (c, width) = C::next_code_point(self.units, start)?;
        self.offset += width;

        Some((start, c))
    }
}

/// UTF-8 encoded input, one byte per code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf8;

impl Charset for Utf8 {
    type Unit = u8;

    fn next_code_point(units: &[u8], at: usize) -> Option<(char, usize)> {
        let remainder = units.get(at..).filter(|r| !r.is_empty())?;
        let (c, width) = bstr::decode_utf8(remainder);

        Some((c.unwrap_or(char::REPLACEMENT_CHARACTER), width.max(1)))
    }

    fn prev_code_point(units: &[u8], at: usize) -> Option<(char, usize)> {
        let prefix = units.get(..at).filter(|p| !p.is_empty())?;
        let (c, width) = bstr::decode_last_utf8(prefix);

        Some((c.unwrap_or(char::REPLACEMENT_CHARACTER), width.max(1)))
    }
}

/// UTF-16 encoded input, one 16-bit unit per code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf16;

impl Utf16 {
    const fn is_high_surrogate(unit: u16) -> bool {
        matches!(unit, 0xD800..=0xDBFF)
    }

    const fn is_low_surrogate(unit: u16) -> bool {
        matches!(unit, 0xDC00..=0xDFFF)
    }
}

impl Charset for Utf16 {
    type Unit = u16;

    fn next_code_point(units: &[u16], at: usize) -> Option<(char, usize)> {
        let remainder = units.get(at..)?;

        // an unpaired surrogate yields an error consuming only itself.
        match char::decode_utf16(remainder.iter().copied()).next()? {
            Ok(c) => Some((c, c.len_utf16())),
            Err(_) => Some((char::REPLACEMENT_CHARACTER, 1)),
        }
    }

    fn prev_code_point(units: &[u16], at: usize) -> Option<(char, usize)> {
        if at == 0 || at > units.len() {
            return None;
        }

        let last = units[at - 1];
        let pair = at
            .checked_sub(2)
            .map(|lead| units[lead])
            .filter(|&lead| Utf16::is_low_surrogate(last) && Utf16::is_high_surrogate(lead));

        match pair {
            Some(lead) => {
                let c = char::decode_utf16([lead, last])
                    .next()
                    .and_then(Result::ok)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);

                Some((c, 2))
            }
            None => {
                let c = char::from_u32(u32::from(last)).unwrap_or(char::REPLACEMENT_CHARACTER);
                Some((c, 1))
            }
        }
    }
}

/// UTF-32 encoded input, one code point per code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf32;

impl Charset for Utf32 {
    type Unit = u32;

    fn next_code_point(units: &[u32], at: usize) -> Option<(char, usize)> {
        let unit = *units.get(at)?;
        Some((char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER), 1))
    }

    fn prev_code_point(units: &[u32], at: usize) -> Option<(char, usize)> {
        let unit = *units.get(at.checked_sub(1)?)?;
        Some((char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER), 1))
    }
}
