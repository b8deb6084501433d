pub use common::{CallKind, Message, Output, Revision, RunState, StatusCode};
pub use host::Host;
pub use interpreter::{execute, step_n, StepStatusCode, StepResult};
pub use opcode::OpCode;
pub use state::{ExecutionState, Stack};

/// Maximum allowed EVM bytecode size.
pub const MAX_CODE_SIZE: usize = 0x6000;

mod analysis;
pub mod cache;
mod common;
pub mod config;
pub mod host;
#[doc(hidden)]
pub mod instructions;
mod interpreter;
mod memory;
pub mod opcode;
mod state;
pub mod tracing;

#[cfg(feature = "util")]
pub mod util;
