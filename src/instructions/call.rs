use crate::{
    common::{address_to_u256, u256_to_address, CallKind, Message, Revision, StatusCode},
    host::{AccessStatus, Host},
    instructions::properties::ADDITIONAL_COLD_ACCOUNT_ACCESS_COST,
    memory::num_words,
    state::ExecutionState,
};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::cmp::min;

pub(crate) fn call<H: Host>(
    host: &mut H,
    state: &mut ExecutionState,
    kind: CallKind,
    is_static_call: bool,
) -> Result<(), StatusCode> {
    let gas = state.stack.pop();
    let dst = u256_to_address(state.stack.pop());
    let value = if is_static_call || matches!(kind, CallKind::DelegateCall) {
        U256::zero()
    } else {
        state.stack.pop()
    };
    let has_value = !value.is_zero();
    let input_offset = state.stack.pop();
    let input_size = state.stack.pop();
    let output_offset = state.stack.pop();
    let output_size = state.stack.pop();

    state.stack.push(U256::zero()); // Assume failure.

    if state.evm_revision >= Revision::Berlin && host.access_account(dst) == AccessStatus::Cold {
        state.gas_left -= i64::from(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST);
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }

    let input_region = super::memory::mem_region(state, input_offset, input_size)?;
    let output_region = super::memory::mem_region(state, output_offset, output_size)?;

    let mut msg = Message {
        kind,
        is_static: is_static_call || state.message.is_static,
        depth: state.message.depth + 1,
        destination: dst,
        sender: if matches!(kind, CallKind::DelegateCall) {
            state.message.sender
        } else {
            state.message.destination
        },
        gas: i64::MAX,
        value: if matches!(kind, CallKind::DelegateCall) {
            state.message.value
        } else {
            value
        },
        input_data: input_region
            .map(|(offset, size)| {
                state.memory[offset as usize..(offset + size) as usize]
                    .to_vec()
                    .into()
            })
            .unwrap_or_default(),
    };

    let mut cost = if has_value { 9000 } else { 0 };

    if matches!(kind, CallKind::Call) {
        if has_value && state.message.is_static {
            return Err(StatusCode::StaticModeViolation);
        }

        if (has_value || state.evm_revision < Revision::Spurious) && !host.account_exists(dst) {
            cost += 25000;
        }
    }
    state.gas_left -= cost;
    if state.gas_left < 0 {
        return Err(StatusCode::OutOfGas);
    }

    if gas < msg.gas.into() {
        msg.gas = gas.as_usize() as i64;
    }

    if state.evm_revision >= Revision::Tangerine {
        // TODO: Always true for STATICCALL.
        msg.gas = min(msg.gas, state.gas_left - state.gas_left / 64);
    } else if msg.gas > state.gas_left {
        return Err(StatusCode::OutOfGas);
    }

    if has_value {
        msg.gas += 2300; // Add stipend.
        state.gas_left += 2300;
    }

    state.return_data.clear();

    if state.message.depth < 1024
        && !(has_value && host.get_balance(state.message.destination) < value)
    {
        let msg_gas = msg.gas;
        let result = host.call(&msg);
        state.return_data = result.output_data.clone();
        *state.stack.get_mut(0) = if matches!(result.status_code, StatusCode::Success) {
            U256::one()
        } else {
            U256::zero()
        };

        if let Some((offset, size)) = output_region {
            let copy_size = min(size as usize, result.output_data.len());
            if copy_size > 0 {
                state.memory[offset as usize..offset as usize + copy_size]
                    .copy_from_slice(&result.output_data[..copy_size]);
            }
        }

        let gas_used = msg_gas - result.gas_left;
        state.gas_left -= gas_used;
        state.gas_refund += result.gas_refund;
    }

    Ok(())
}

pub(crate) fn create<H: Host>(
    host: &mut H,
    state: &mut ExecutionState,
    create2: bool,
) -> Result<(), StatusCode> {
    if state.message.is_static {
        return Err(StatusCode::StaticModeViolation);
    }

    let endowment = state.stack.pop();
    let init_code_offset = state.stack.pop();
    let init_code_size = state.stack.pop();

    if state.evm_revision >= Revision::Shanghai
        && init_code_size > U256::from(2 * crate::MAX_CODE_SIZE)
    {
        return Err(StatusCode::ArgumentOutOfRange);
    }

    let region = super::memory::mem_region(state, init_code_offset, init_code_size)?;

    if state.evm_revision >= Revision::Shanghai {
        if let Some((_, size)) = region {
            let init_code_word_cost = 2 * num_words(size as usize);
            state.gas_left -= init_code_word_cost as i64;
            if state.gas_left < 0 {
                return Err(StatusCode::OutOfGas);
            }
        }
    }

    let call_kind = if create2 {
        let salt = state.stack.pop();

        if let Some((_, size)) = region {
            let salt_cost = num_words(size as usize) * 6;
            state.gas_left -= salt_cost as i64;
            if state.gas_left < 0 {
                return Err(StatusCode::OutOfGas);
            }
        }

        CallKind::Create2 {
            salt: H256(salt.into()),
        }
    } else {
        CallKind::Create
    };

    state.stack.push(U256::zero());
    state.return_data.clear();

    if state.message.depth < 1024
        && !(!endowment.is_zero()
            && host.get_balance(state.message.destination) < endowment)
    {
        let msg = Message {
            gas: if state.evm_revision >= Revision::Tangerine {
                state.gas_left - state.gas_left / 64
            } else {
                state.gas_left
            },

            is_static: false,
            destination: Address::zero(),

            kind: call_kind,
            input_data: if !init_code_size.is_zero() {
                state.memory[init_code_offset.as_usize()
                    ..init_code_offset.as_usize() + init_code_size.as_usize()]
                    .to_vec()
                    .into()
            } else {
                Bytes::new()
            },
            sender: state.message.destination,
            depth: state.message.depth + 1,
            value: endowment,
        };
        let msg_gas = msg.gas;
        let result = host.call(&msg);
        state.gas_left -= msg_gas - result.gas_left;
        state.gas_refund += result.gas_refund;

        state.return_data = result.output_data;
        if result.status_code == StatusCode::Success {
            *state.stack.get_mut(0) =
                address_to_u256(result.create_address.expect("expected create address"));
        }
    }

    Ok(())
}
