//! Provides for the parsing and compilation of a pattern into its
//! corresponding runtime program.
//!
//! # Example
//!
//! ```rust
//! // Parsing and compilation of a pattern into a runnable program is
//! // accomplished by a single function exposed in the `unire_compiler` crate.
//! use unire_compiler::compile;
//!
//! // Evaluating a given input against a program is accomplished via the
//! // executor exposed in the `unire_runtime` crate.
//! use unire_runtime::{Executor, Utf8};
//!
//! // A pattern with a single save-point group around the `l`s.
//! let pattern = "&l+&";
//!
//! let program = compile(pattern).expect("failed to parse or compile");
//! let input = "hello\nworld";
//!
//! let captures = Executor::new(&program)
//!     .run_search::<Utf8>(input.as_bytes())
//!     .expect("program is well-formed")
//!     .expect("input contains a match");
//!
//! // Spans are non-inclusive code-unit ranges. Group 0 is the whole match.
//! assert_eq!((2, 4), captures.whole_span());
//! assert_eq!(Some("ll"), captures.group_str(1, input));
//! ```

use log::debug;
use thiserror::Error;

pub mod ast;
pub mod compiler;
pub mod parser;
mod regex;

pub use compiler::{compile_ast, CompileError, CompileOptions};
pub use parser::{parse, parse_with, ParseError, ParseErrorKind};
pub use regex::Regex;

pub use unire_runtime::{Captures, ExecError, Program};

/// Any failure to turn a pattern into a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Parses and compiles a pattern with the default [`CompileOptions`].
pub fn compile(pattern: &str) -> Result<Program, Error> {
    compile_with(pattern, &CompileOptions::default())
}

/// Parses and compiles a pattern within the bounds of `options`.
pub fn compile_with(pattern: &str, options: &CompileOptions) -> Result<Program, Error> {
    let expr = parse_with(pattern, options.nest_limit())?;
    let groups = expr.groups;
    let program = compile_ast(expr, options)?;

    debug!(
        "compiled pattern {:?} into {} instructions with {} groups",
        pattern,
        program.len(),
        groups
    );

    Ok(program)
}
