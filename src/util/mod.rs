//! Test-only fixture tooling: a fluent bytecode builder and an `EvmTester`/
//! `MockedHost` harness built on top of it. Gated behind the `util` feature
//! so it never ships in a non-test build.

mod bytecode;
mod mocked_host;
mod tester;

pub use bytecode::{Bytecode, CallInstruction};
pub use mocked_host::{MockedAccount, MockedHost, Recorded, StorageEntry};
pub use tester::EvmTester;
