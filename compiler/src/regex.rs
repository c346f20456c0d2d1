use unire_runtime::{Captures, Charset, ExecError, Executor, Program, Utf8};

use crate::{compile_with, CompileOptions, Error};

/// A compiled pattern paired with its source.
///
/// A `Regex` is immutable once built and may be shared freely between
/// threads; every match or search allocates its own working state.
#[derive(Debug, Clone, PartialEq)]
pub struct Regex {
    pattern: String,
    program: Program,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Self::with_options(pattern, &CompileOptions::default())
    }

    pub fn with_options(pattern: &str, options: &CompileOptions) -> Result<Self, Error> {
        let program = compile_with(pattern, options)?;

        Ok(Self {
            pattern: pattern.to_string(),
            program,
        })
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The number of save-point groups in the pattern. Unlike
    /// [`Program::group_count`] this leaves out group 0, the whole match.
    pub fn save_group_count(&self) -> usize {
        self.program.group_count().saturating_sub(1)
    }

    /// An executor over this pattern's program, for configuring a work limit.
    pub fn executor(&self) -> Executor<'_> {
        Executor::new(&self.program)
    }

    /// Returns true if the whole input matches the pattern.
    pub fn is_match(&self, input: &str) -> Result<bool, ExecError> {
        self.match_str(input).map(|captures| captures.is_some())
    }

    /// Matches the pattern against the whole input.
    pub fn match_str(&self, input: &str) -> Result<Option<Captures>, ExecError> {
        self.match_units::<Utf8>(input.as_bytes())
    }

    /// Finds the leftmost match of the pattern within the input.
    pub fn search_str(&self, input: &str) -> Result<Option<Captures>, ExecError> {
        self.search_units::<Utf8>(input.as_bytes())
    }

    pub fn match_units<C: Charset>(
        &self,
        input: &[C::Unit],
    ) -> Result<Option<Captures>, ExecError> {
        self.executor().run_match::<C>(input)
    }

    pub fn search_units<C: Charset>(
        &self,
        input: &[C::Unit],
    ) -> Result<Option<Captures>, ExecError> {
        self.executor().run_search::<C>(input)
    }
}

impl std::fmt::Display for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl std::str::FromStr for Regex {
    type Err = Error;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        Self::new(pattern)
    }
}
