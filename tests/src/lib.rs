//! End-to-end coverage of the compiler and runtime crates working together.

#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;
