//! Hard-typed errors.
//!
//! Most of the error taxonomy in this kernel is deliberately *not*
//! `Result`-shaped: configuration mistakes fall back to documented
//! defaults, invalid heap operations are silent no-ops, and termination is
//! a normal outcome. `ConfigError` exists only for the one case a caller
//! may legitimately want to reject outright: a scenario description that is
//! structurally invalid, as opposed to one with an out-of-range field. A
//! non-positive quantum is not in this enum: `SimConfig::new` always
//! substitutes the default and warns, so there is no path that could ever
//! construct a "bad quantum" error.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("process count {0} exceeds the configured maximum of {1}")]
    TooManyProcesses(usize, usize),
}
