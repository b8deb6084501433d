//! An in-memory `Host` implementation for tests: plain maps instead of a
//! real world-state backend, plus a `recorded` ledger so `inspect_host`
//! closures can assert on exactly which calls and account accesses an
//! execution made.

use crate::{
    common::{CallKind, Message, StatusCode},
    host::{AccessStatus, CallOutput, Host, StorageStatus, TxContext},
};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// A single storage slot, with its EIP-2929 warmth tracked alongside the
/// value so `access_storage` can report whether this is the slot's first
/// touch in the current "transaction" (the lifetime of one `MockedHost`).
#[derive(Clone, Debug, Default)]
pub struct StorageEntry {
    pub value: H256,
    pub access_status: AccessStatus,
}

/// Account state as the host sees it: balance, code, and storage. Accounts
/// are created on first touch via `HashMap::entry(..).or_default()`, mirroring
/// "account does not exist" being indistinguishable from "account is empty"
/// at this level.
#[derive(Clone, Debug, Default)]
pub struct MockedAccount {
    pub nonce: u64,
    pub code: Bytes,
    pub code_hash: H256,
    pub balance: U256,
    pub storage: HashMap<H256, StorageEntry>,
}

/// Everything a test wants to assert on after execution: which accounts
/// were touched (in order, including duplicates) and which sub-calls were
/// issued (in order).
#[derive(Clone, Debug, Default)]
pub struct Recorded {
    pub calls: Vec<Message>,
    pub account_accesses: Vec<Address>,
}

/// `Host` test double. Every `#[test]` constructs one via
/// `EvmTester::new()`, stages state and the next `call()` result through
/// `apply_host_fn` closures, runs the code, then inspects `accounts`/
/// `recorded`/`call_result` through `inspect_host`.
#[derive(Debug)]
pub struct MockedHost {
    pub accounts: HashMap<Address, MockedAccount>,
    pub tx_context: TxContext,
    /// The value `call()` hands back for the *next* sub-call. Tests stage
    /// this via `apply_host_fn` before the code under test runs.
    pub call_result: CallOutput,
    pub recorded: Mutex<Recorded>,
    warm_accounts: Mutex<HashSet<Address>>,
    destructed: Mutex<HashSet<Address>>,
}

impl Clone for MockedHost {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            tx_context: self.tx_context.clone(),
            call_result: self.call_result.clone(),
            recorded: Mutex::new(self.recorded.lock().clone()),
            warm_accounts: Mutex::new(self.warm_accounts.lock().clone()),
            destructed: Mutex::new(self.destructed.lock().clone()),
        }
    }
}

impl Default for MockedHost {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            tx_context: TxContext {
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
            },
            call_result: CallOutput {
                status_code: StatusCode::Success,
                gas_left: 0,
                gas_refund: 0,
                output_data: Bytes::new(),
                create_address: Some(Address::zero()),
            },
            recorded: Mutex::new(Recorded::default()),
            warm_accounts: Mutex::new(HashSet::new()),
            destructed: Mutex::new(HashSet::new()),
        }
    }
}

impl MockedHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_access(&self, address: Address) {
        self.recorded.lock().account_accesses.push(address);
    }
}

impl Host for MockedHost {
    fn account_exists(&self, address: Address) -> bool {
        self.record_access(address);
        self.accounts.contains_key(&address)
    }

    fn get_storage(&self, address: Address, key: H256) -> U256 {
        self.record_access(address);
        self.accounts
            .get(&address)
            .and_then(|a| a.storage.get(&key))
            .map(|entry| U256::from_big_endian(&entry.value.0))
            .unwrap_or_default()
    }

    fn set_storage(&mut self, address: Address, key: H256, value: U256) -> StorageStatus {
        self.recorded.lock().account_accesses.push(address);

        let account = self.accounts.entry(address).or_default();
        let mut buf = H256::zero();
        value.to_big_endian(&mut buf.0);

        let prev = account
            .storage
            .get(&key)
            .map(|entry| entry.value)
            .unwrap_or_default();

        let status = if prev == buf {
            StorageStatus::Assigned
        } else if prev.is_zero() {
            StorageStatus::Added
        } else if buf.is_zero() {
            StorageStatus::Deleted
        } else {
            StorageStatus::Modified
        };

        account.storage.entry(key).or_default().value = buf;

        status
    }

    fn get_balance(&self, address: Address) -> U256 {
        self.record_access(address);
        self.accounts.get(&address).map(|a| a.balance).unwrap_or_default()
    }

    fn get_code_size(&self, address: Address) -> U256 {
        self.record_access(address);
        self.accounts
            .get(&address)
            .map(|a| U256::from(a.code.len()))
            .unwrap_or_default()
    }

    fn get_code_hash(&self, address: Address) -> H256 {
        self.record_access(address);
        self.accounts.get(&address).map(|a| a.code_hash).unwrap_or_default()
    }

    fn copy_code(&self, address: Address, src_offset: usize, buffer: &mut [u8]) -> usize {
        self.record_access(address);
        let code = self
            .accounts
            .get(&address)
            .map(|a| a.code.clone())
            .unwrap_or_default();
        if src_offset >= code.len() {
            return 0;
        }
        let n = buffer.len().min(code.len() - src_offset);
        buffer[..n].copy_from_slice(&code[src_offset..src_offset + n]);
        n
    }

    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> bool {
        self.record_access(address);
        self.record_access(beneficiary);
        let balance = self.accounts.get(&address).map(|a| a.balance).unwrap_or_default();
        self.accounts.entry(beneficiary).or_default().balance += balance;
        self.accounts.entry(address).or_default().balance = U256::zero();
        self.destructed.lock().insert(address)
    }

    fn call(&mut self, msg: &Message) -> CallOutput {
        self.record_access(msg.destination);
        self.recorded.lock().calls.push(msg.clone());

        if matches!(msg.kind, CallKind::Create | CallKind::Create2 { .. })
            && self.call_result.status_code == StatusCode::Success
        {
            if let Some(address) = self.call_result.create_address {
                let account = self.accounts.entry(address).or_default();
                account.code = self.call_result.output_data.clone();
            }
        }

        self.call_result.clone()
    }

    fn get_tx_context(&self) -> TxContext {
        self.tx_context.clone()
    }

    fn get_block_hash(&self, _block_number: u64) -> H256 {
        H256::zero()
    }

    fn emit_log(&mut self, _address: Address, _data: &[u8], _topics: &[H256]) {}

    fn access_account(&mut self, address: Address) -> AccessStatus {
        self.record_access(address);
        if self.warm_accounts.lock().insert(address) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    fn access_storage(&mut self, address: Address, key: H256) -> AccessStatus {
        self.record_access(address);
        let account = self.accounts.entry(address).or_default();
        let entry = account.storage.entry(key).or_default();
        let prev = entry.access_status;
        entry.access_status = AccessStatus::Warm;
        prev
    }
}
