use crate::{
    common::{address_to_u256, u256_to_address, Revision, StatusCode},
    host::{AccessStatus, Host, StorageStatus, TxContext},
    instructions::properties::{
        ADDITIONAL_COLD_ACCOUNT_ACCESS_COST, COLD_ACCOUNT_ACCESS_COST, COLD_SLOAD_COST,
        WARM_STORAGE_READ_COST,
    },
    state::ExecutionState,
};
use arrayvec::ArrayVec;
use ethereum_types::{H256, U256};

pub(crate) fn address(state: &mut ExecutionState) {
    state.stack.push(address_to_u256(state.message.destination));
}

pub(crate) fn caller(state: &mut ExecutionState) {
    state.stack.push(address_to_u256(state.message.sender));
}

pub(crate) fn callvalue(state: &mut ExecutionState) {
    state.stack.push(state.message.value);
}

pub(crate) fn balance<H: Host>(host: &mut H, state: &mut ExecutionState) -> Result<(), StatusCode> {
    let address = u256_to_address(state.stack.pop());

    if state.evm_revision >= Revision::Berlin && host.access_account(address) == AccessStatus::Cold
    {
        state.gas_left -= i64::from(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST);
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }

    state.stack.push(host.get_balance(address));

    Ok(())
}

pub(crate) fn extcodesize<H: Host>(
    host: &mut H,
    state: &mut ExecutionState,
) -> Result<(), StatusCode> {
    let address = u256_to_address(state.stack.pop());

    if state.evm_revision >= Revision::Berlin && host.access_account(address) == AccessStatus::Cold
    {
        state.gas_left -= i64::from(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST);
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }

    state.stack.push(host.get_code_size(address));

    Ok(())
}

pub(crate) fn origin_accessor(tx_context: &TxContext) -> U256 {
    address_to_u256(tx_context.tx_origin)
}

pub(crate) fn coinbase_accessor(tx_context: &TxContext) -> U256 {
    address_to_u256(tx_context.block_coinbase)
}

pub(crate) fn gasprice_accessor(tx_context: &TxContext) -> U256 {
    tx_context.tx_gas_price
}

pub(crate) fn timestamp_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_timestamp.into()
}

pub(crate) fn number_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_number.into()
}

pub(crate) fn gaslimit_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_gas_limit.into()
}

pub(crate) fn prevrandao_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_prev_randao
}

pub(crate) fn chainid_accessor(tx_context: &TxContext) -> U256 {
    tx_context.chain_id
}

pub(crate) fn basefee_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_base_fee
}

pub(crate) fn blobbasefee_accessor(tx_context: &TxContext) -> U256 {
    tx_context.block_blob_base_fee
}

pub(crate) fn selfbalance<H: Host>(host: &mut H, state: &mut ExecutionState) {
    let balance = host.get_balance(state.message.destination);
    state.stack.push(balance);
}

pub(crate) fn blockhash<H: Host>(host: &mut H, state: &mut ExecutionState) {
    let number = state.stack.pop();

    let upper_bound = host.get_tx_context().block_number;
    let lower_bound = upper_bound.saturating_sub(256);

    let mut header = H256::zero();
    if number <= u64::MAX.into() {
        let n = number.as_u64();
        if (lower_bound..upper_bound).contains(&n) {
            header = host.get_block_hash(n);
        }
    }

    state.stack.push(U256::from_big_endian(&header.0));
}

pub(crate) fn log<H: Host>(
    host: &mut H,
    state: &mut ExecutionState,
    num_topics: usize,
) -> Result<(), StatusCode> {
    if state.message.is_static {
        return Err(StatusCode::StaticModeViolation);
    }

    let offset = state.stack.pop();
    let size = state.stack.pop();

    let region = super::memory::mem_region(state, offset, size)?;

    if let Some((_, region_size)) = region {
        let cost = region_size as i64 * 8;
        state.gas_left -= cost;
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }

    let mut topics = ArrayVec::<H256, 4>::new();
    for _ in 0..num_topics {
        topics.push(H256(state.stack.pop().into()));
    }

    let data = if let Some((offset, region_size)) = region {
        state.memory[offset as usize..(offset + region_size) as usize].to_vec()
    } else {
        Vec::new()
    };

    host.emit_log(state.message.destination, &data, &topics);

    Ok(())
}

pub(crate) fn sload<H: Host>(host: &mut H, state: &mut ExecutionState) -> Result<(), StatusCode> {
    let key = H256(state.stack.pop().into());

    if state.evm_revision >= Revision::Berlin
        && host.access_storage(state.message.destination, key) == AccessStatus::Cold
    {
        // The warm storage access cost is already applied (from the cost table).
        // Here we need to apply additional cold storage access cost.
        const ADDITIONAL_COLD_SLOAD_COST: u16 = COLD_SLOAD_COST - WARM_STORAGE_READ_COST;
        state.gas_left -= i64::from(ADDITIONAL_COLD_SLOAD_COST);
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }

    let value = host.get_storage(state.message.destination, key);

    state.stack.push(value);

    Ok(())
}

/// `SSTORE` gas cost and refund delta, per EIP-2200/EIP-2929/EIP-3529.
///
/// `was_cold` is the slot's access status immediately before this write
/// (i.e. before `access_storage` marks it warm for the rest of the
/// transaction); it feeds the `DeletedRestored`/`ModifiedRestored` refund
/// adjustments, which differ depending on whether the cold-access surcharge
/// was already paid for this slot earlier in the same transaction.
fn sstore_gas_and_refund(
    revision: Revision,
    status: StorageStatus,
    was_cold: bool,
) -> (u16, i64) {
    let warm_or_historical_sload_cost = if revision >= Revision::Berlin {
        WARM_STORAGE_READ_COST
    } else if revision == Revision::Istanbul {
        800
    } else {
        200
    };

    let clear_refund: i64 = if revision >= Revision::London { 4800 } else { 15000 };

    let gas_cost = match status {
        StorageStatus::Assigned => warm_or_historical_sload_cost,
        StorageStatus::Added => 20000,
        StorageStatus::Modified | StorageStatus::Deleted => {
            if revision >= Revision::Berlin {
                5000 - COLD_SLOAD_COST
            } else {
                5000
            }
        }
        StorageStatus::DeletedAdded
        | StorageStatus::ModifiedDeleted
        | StorageStatus::DeletedRestored
        | StorageStatus::AddedDeleted
        | StorageStatus::ModifiedRestored => warm_or_historical_sload_cost,
    };

    let restore_adjustment: i64 = if revision >= Revision::Berlin {
        if was_cold {
            4900
        } else {
            2800
        }
    } else {
        4200
    };

    let refund = match status {
        StorageStatus::Assigned | StorageStatus::Added | StorageStatus::Modified => 0,
        StorageStatus::Deleted => clear_refund,
        StorageStatus::DeletedAdded => -clear_refund,
        StorageStatus::ModifiedDeleted => clear_refund,
        StorageStatus::DeletedRestored => restore_adjustment - clear_refund,
        StorageStatus::AddedDeleted => {
            if revision >= Revision::Berlin {
                19900
            } else {
                19200
            }
        }
        StorageStatus::ModifiedRestored => restore_adjustment,
    };

    (gas_cost, refund)
}

pub(crate) fn sstore<H: Host>(host: &mut H, state: &mut ExecutionState) -> Result<(), StatusCode> {
    if state.message.is_static {
        return Err(StatusCode::StaticModeViolation);
    }

    if state.evm_revision >= Revision::Istanbul && state.gas_left <= 2300 {
        return Err(StatusCode::OutOfGas);
    }

    let key = H256(state.stack.pop().into());
    let value = state.stack.pop();

    let mut cost = 0u16;
    let mut was_cold = false;
    if state.evm_revision >= Revision::Berlin
        && host.access_storage(state.message.destination, key) == AccessStatus::Cold
    {
        cost = COLD_SLOAD_COST;
        was_cold = true;
    }

    let status = host.set_storage(state.message.destination, key, value);

    let (sstore_cost, refund) = sstore_gas_and_refund(state.evm_revision, status, was_cold);
    cost += sstore_cost;

    state.gas_left -= i64::from(cost);
    if state.gas_left < 0 {
        return Err(StatusCode::OutOfGas);
    }
    state.gas_refund += refund;

    Ok(())
}

pub(crate) fn tload(state: &mut ExecutionState) {
    let key = H256(state.stack.pop().into());
    let value = state
        .transient_storage
        .get(&(state.message.destination, key))
        .copied()
        .unwrap_or_default();
    state.stack.push(value);
}

pub(crate) fn tstore(state: &mut ExecutionState) -> Result<(), StatusCode> {
    if state.message.is_static {
        return Err(StatusCode::StaticModeViolation);
    }

    let key = H256(state.stack.pop().into());
    let value = state.stack.pop();
    state
        .transient_storage
        .insert((state.message.destination, key), value);

    Ok(())
}

/// Executes `SELFDESTRUCT`, applying the refund for a first-time
/// destruction on pre-London revisions (EIP-3529 removed this refund in
/// London, so the caller only adds it when `revision < Revision::London`).
pub(crate) fn selfdestruct<H: Host>(
    host: &mut H,
    state: &mut ExecutionState,
) -> Result<(), StatusCode> {
    if state.message.is_static {
        return Err(StatusCode::StaticModeViolation);
    }

    let beneficiary = u256_to_address(state.stack.pop());

    if state.evm_revision >= Revision::Berlin
        && host.access_account(beneficiary) == AccessStatus::Cold
    {
        state.gas_left -= i64::from(COLD_ACCOUNT_ACCESS_COST);
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }

    if state.evm_revision >= Revision::Tangerine
        && (state.evm_revision == Revision::Tangerine
            || !host.get_balance(state.message.destination).is_zero())
        && !host.account_exists(beneficiary)
    {
        // After TANGERINE_WHISTLE apply additional cost of
        // sending value to a non-existing account.
        state.gas_left -= 25000;
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }

    let first_time = host.selfdestruct(state.message.destination, beneficiary);
    if first_time && state.evm_revision < Revision::London {
        state.gas_refund += 24000;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::common::u256_to_address;
    use ethereum_types::Address;
    use hex_literal::hex;

    #[test]
    fn u256_to_address_conversion() {
        assert_eq!(
            u256_to_address(0x42.into()),
            Address::from(hex!("0000000000000000000000000000000000000042"))
        );
    }
}
