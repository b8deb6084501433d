//! Observer hooks into the dispatch loop.
//!
//! Not present in the retrieved teacher sources (`lib.rs` declares `pub mod
//! tracing` but the module itself was missing); reconstructed here from how
//! it is consumed elsewhere in this crate (`util::tester::exec` drives a
//! tracer through one execution) and from spec.md §4.7/§9 ("Polymorphism
//! over observers" — implementers should monomorphize so the null observer
//! compiles away, not reach for a `dyn Tracer` virtual-dispatch table).

use crate::{common::Revision, opcode::OpCode, state::ExecutionState};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// The four hook points the dispatch loop calls around one run and around
/// each instruction within it.
pub trait Tracer {
    fn notify_execution_start(&mut self, _revision: Revision, _depth: i32) {}
    fn notify_instruction_start(&mut self, _pc: usize, _op: OpCode, _state: &ExecutionState) {}
    fn notify_instruction_end(&mut self, _pc: usize, _op: OpCode, _state: &ExecutionState) {}
    fn notify_execution_end(&mut self, _depth: i32) {}
}

/// No-op tracer. Every method is an empty, `#[inline]` default, so with
/// static dispatch (the dispatch loop is generic over `T: Tracer`) the
/// compiler removes every call site entirely.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTracer;

impl Tracer for NullTracer {}

/// Prints `(opcode, gas_remaining, top_of_stack_or_empty)` before each
/// instruction, to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutTracer;

impl Tracer for StdoutTracer {
    fn notify_instruction_start(&mut self, pc: usize, op: OpCode, state: &ExecutionState) {
        let top = if state.stack().is_empty() {
            "<empty>".to_string()
        } else {
            format!("{:#x}", state.stack().get(0))
        };
        println!(
            "pc={pc:04} op={op:<16} gas={:<12} top={top}",
            state.gas_left()
        );
    }
}

/// Logging tracer: records the same `(opcode, gas, top)` triple into an
/// in-memory buffer rather than printing it, so tests can assert on it.
#[derive(Clone, Debug, Default)]
pub struct Logger {
    pub lines: Vec<String>,
}

impl Tracer for Logger {
    fn notify_instruction_start(&mut self, pc: usize, op: OpCode, state: &ExecutionState) {
        let top = if state.stack().is_empty() {
            "<empty>".to_string()
        } else {
            format!("{:#x}", state.stack().get(0))
        };
        self.lines
            .push(format!("{pc:04} {op} {} {top}", state.gas_left()));
    }
}

/// Which opcodes a `Profiler` instruments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileScope {
    /// Every dispatched opcode.
    Full,
    /// Only opcodes that cross the VM boundary: host-call opcodes
    /// (`CALL`, `CALLCODE`, `DELEGATECALL`, `STATICCALL`, `CREATE`,
    /// `CREATE2`, `SLOAD`, `SSTORE`, `BALANCE`, `EXTCODESIZE`,
    /// `EXTCODECOPY`, `EXTCODEHASH`, `SELFDESTRUCT`, `LOG0..LOG4`).
    External,
}

fn crosses_vm_boundary(op: OpCode) -> bool {
    matches!(
        op,
        OpCode::CALL
            | OpCode::CALLCODE
            | OpCode::DELEGATECALL
            | OpCode::STATICCALL
            | OpCode::CREATE
            | OpCode::CREATE2
            | OpCode::SLOAD
            | OpCode::SSTORE
            | OpCode::BALANCE
            | OpCode::EXTCODESIZE
            | OpCode::EXTCODECOPY
            | OpCode::EXTCODEHASH
            | OpCode::SELFDESTRUCT
            | OpCode::LOG0
            | OpCode::LOG1
            | OpCode::LOG2
            | OpCode::LOG3
            | OpCode::LOG4
    )
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OpStats {
    pub invocations: u64,
    pub elapsed: Duration,
}

/// Per-opcode invocation/timing counters, plus a separate "interpreter time
/// at call-depth 0" bucket (the time spent in this run's own dispatch loop,
/// as opposed to any sub-call the host performed on its behalf).
#[derive(Default)]
pub struct Profiler {
    scope: Option<ProfileScope>,
    stats: HashMap<u8, OpStats>,
    depth0_time: Duration,
    current_instruction_start: Option<Instant>,
    run_start: Option<Instant>,
    run_depth: i32,
}

impl Profiler {
    pub fn new(scope: ProfileScope) -> Self {
        Self {
            scope: Some(scope),
            ..Default::default()
        }
    }

    pub fn stats(&self) -> impl Iterator<Item = (OpCode, &OpStats)> {
        self.stats.iter().map(|(&b, s)| (OpCode(b), s))
    }

    pub fn depth0_time(&self) -> Duration {
        self.depth0_time
    }

    pub fn reset(&mut self) {
        self.stats.clear();
        self.depth0_time = Duration::ZERO;
    }

    /// Merge another profiler's counters into this one.
    pub fn merge(&mut self, other: &Profiler) {
        for (op, s) in other.stats.iter() {
            let entry = self.stats.entry(*op).or_default();
            entry.invocations += s.invocations;
            entry.elapsed += s.elapsed;
        }
        self.depth0_time += other.depth0_time;
    }

    fn instrument(&self, op: OpCode) -> bool {
        match self.scope {
            Some(ProfileScope::Full) => true,
            Some(ProfileScope::External) => crosses_vm_boundary(op),
            None => false,
        }
    }
}

impl Tracer for Profiler {
    fn notify_execution_start(&mut self, _revision: Revision, depth: i32) {
        self.run_depth = depth;
        if depth == 0 {
            self.run_start = Some(Instant::now());
        }
    }

    fn notify_instruction_start(&mut self, _pc: usize, op: OpCode, _state: &ExecutionState) {
        if self.instrument(op) {
            self.current_instruction_start = Some(Instant::now());
        }
    }

    fn notify_instruction_end(&mut self, _pc: usize, op: OpCode, _state: &ExecutionState) {
        if let Some(start) = self.current_instruction_start.take() {
            if self.instrument(op) {
                let entry = self.stats.entry(op.to_u8()).or_default();
                entry.invocations += 1;
                entry.elapsed += start.elapsed();
            }
        }
    }

    fn notify_execution_end(&mut self, depth: i32) {
        if depth == 0 {
            if let Some(start) = self.run_start.take() {
                self.depth0_time += start.elapsed();
            }
        }
    }
}
