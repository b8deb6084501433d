use crate::{
    common::{Message, Revision, RunState},
    memory::Memory,
};
use arrayvec::ArrayVec;
use bytes::Bytes;
use ethereum_types::{H256, U256};
use getset::{Getters, MutGetters};
use std::collections::HashMap;

const SIZE: usize = 1024;

/// EVM stack: a fixed-capacity, 1024-entry LIFO of 256-bit words.
///
/// Over/underflow are checked by the dispatch loop before a handler runs
/// (see `interpreter::check_requirements`), so `push`/`pop` here trust their
/// caller and stay O(1) with no bounds-check overhead of their own.
#[derive(Clone, Debug, Default)]
pub struct Stack(pub ArrayVec<U256, SIZE>);

impl Stack {
    pub const fn limit() -> usize {
        SIZE
    }

    fn get_pos(&self, pos: usize) -> usize {
        self.len() - 1 - pos
    }

    pub fn get(&self, pos: usize) -> &U256 {
        &self.0[self.get_pos(pos)]
    }

    pub fn get_mut(&mut self, pos: usize) -> &mut U256 {
        let pos = self.get_pos(pos);
        &mut self.0[pos]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, v: U256) {
        unsafe { self.0.push_unchecked(v) }
    }

    pub fn pop(&mut self) -> U256 {
        self.0.pop().expect("underflow")
    }

    pub fn swap_top(&mut self, pos: usize) {
        let top = self.0.len() - 1;
        let pos = self.get_pos(pos);
        self.0.swap(top, pos);
    }
}

/// Mutable state of one interpreter run (`ExecutionContext` in the design).
#[derive(Clone, Debug, Getters, MutGetters)]
pub struct ExecutionState {
    #[getset(get = "pub", get_mut = "pub")]
    pub(crate) gas_left: i64,
    #[getset(get = "pub", get_mut = "pub")]
    pub(crate) gas_refund: i64,
    #[getset(get = "pub", get_mut = "pub")]
    pub(crate) stack: Stack,
    #[getset(get = "pub", get_mut = "pub")]
    pub(crate) memory: Memory,
    pub(crate) message: Message,
    pub(crate) evm_revision: Revision,
    #[getset(get = "pub", get_mut = "pub")]
    pub(crate) return_data: Bytes,
    pub(crate) output_data: Bytes,
    /// Per-run transient storage (EIP-1153), scoped to the current
    /// transaction on real hosts; kept local here since this crate does not
    /// model a transaction boundary wider than one top-level `Execute`.
    pub(crate) transient_storage: HashMap<(ethereum_types::Address, H256), U256>,
    /// Current program counter; mirrored into the loop's hot-path local
    /// during dispatch and written back on suspension (stepping) or exit.
    pub(crate) pc: usize,
    /// Terminal state reached so far. `Running` while the dispatch loop is
    /// still going (including between steps of a stepped execution);
    /// anything else means the loop has exited and won't be resumed.
    pub(crate) run_state: RunState,
}

impl ExecutionState {
    pub fn new(message: Message, evm_revision: Revision) -> Self {
        Self {
            gas_left: message.gas,
            gas_refund: 0,
            stack: Default::default(),
            memory: Memory::new(),
            message,
            evm_revision,
            return_data: Default::default(),
            output_data: Bytes::new(),
            transient_storage: HashMap::new(),
            pc: 0,
            run_state: RunState::Running,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn evm_revision(&self) -> Revision {
        self.evm_revision
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack() {
        let mut stack = Stack::default();

        let items = [0xde, 0xad, 0xbe, 0xef];

        for (i, item) in items.iter().copied().enumerate() {
            stack.push(item.into());
            assert_eq!(stack.len(), i + 1);
        }

        assert_eq!(*stack.get(2), 0xad.into());

        assert_eq!(stack.pop(), 0xef.into());

        assert_eq!(*stack.get(2), 0xde.into());
    }
}
