use crate::{
    common::*,
    host::{AccessStatus, Host},
    instructions::properties::ADDITIONAL_COLD_ACCOUNT_ACCESS_COST,
    memory::num_words,
    state::*,
};
use ethereum_types::U256;
use std::cmp::min;

/// Largest offset/size this crate will ever attempt to grow memory to. Bytes
/// beyond this bound can never be paid for at any realistic gas limit, so
/// treating anything past it as an immediate out-of-gas keeps every
/// `U256`-to-`u64` cast below infallible.
pub(crate) const MAX_BUFFER_SIZE: u64 = u32::MAX as u64;

/// Verify `[offset, offset+size)` fits in a sane buffer size, grow memory to
/// cover it (charging the quadratic expansion cost), and return the region
/// as `(offset, size)` in bytes, or `None` if `size == 0`.
pub(crate) fn mem_region(
    state: &mut ExecutionState,
    offset: U256,
    size: U256,
) -> Result<Option<(u64, u64)>, StatusCode> {
    if size.is_zero() {
        return Ok(None);
    }

    if offset > U256::from(MAX_BUFFER_SIZE) || size > U256::from(MAX_BUFFER_SIZE) {
        return Err(StatusCode::OutOfGas);
    }

    let offset = offset.as_u64();
    let size = size.as_u64();

    if let Some(cost) = state.memory.growth_cost(offset, size) {
        state.gas_left -= cost as i64;
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }
    state.memory.grow(offset, size);

    Ok(Some((offset, size)))
}

pub(crate) fn mload(state: &mut ExecutionState) -> Result<(), StatusCode> {
    let index = state.stack.pop();

    let (offset, size) = mem_region(state, index, U256::from(32))?.unwrap();

    let value = U256::from_big_endian(&state.memory[offset as usize..(offset + size) as usize]);

    state.stack.push(value);

    Ok(())
}

pub(crate) fn mstore(state: &mut ExecutionState) -> Result<(), StatusCode> {
    let index = state.stack.pop();
    let value = state.stack.pop();

    let (offset, _) = mem_region(state, index, U256::from(32))?.unwrap();

    let mut b = [0; 32];
    value.to_big_endian(&mut b);
    state.memory[offset as usize..offset as usize + 32].copy_from_slice(&b);

    Ok(())
}

pub(crate) fn mstore8(state: &mut ExecutionState) -> Result<(), StatusCode> {
    let index = state.stack.pop();
    let value = state.stack.pop();

    let (offset, _) = mem_region(state, index, U256::from(1))?.unwrap();

    let value = (value.low_u32() & 0xff) as u8;

    state.memory[offset as usize] = value;

    Ok(())
}

pub(crate) fn msize(state: &mut ExecutionState) {
    state.stack.push(state.memory.len().into());
}

pub(crate) fn calldatacopy(state: &mut ExecutionState) -> Result<(), StatusCode> {
    let mem_index = state.stack.pop();
    let input_index = state.stack.pop();
    let size = state.stack.pop();

    let region = mem_region(state, mem_index, size)?;

    if let Some((offset, region_size)) = region {
        let copy_cost = num_words(region_size as usize) * 3;
        state.gas_left -= copy_cost as i64;
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }

        let input_len = U256::from(state.message.input_data.len());

        let src = min(input_len, input_index).as_usize();
        let copy_size = min(size, input_len - src).as_usize();

        if copy_size > 0 {
            state.memory[offset as usize..offset as usize + copy_size]
                .copy_from_slice(&state.message.input_data[src..src + copy_size]);
        }

        if region_size as usize - copy_size > 0 {
            state.memory[offset as usize + copy_size..offset as usize + region_size as usize]
                .fill(0);
        }
    }

    Ok(())
}

pub(crate) fn keccak256(state: &mut ExecutionState) -> Result<(), StatusCode> {
    let index = state.stack.pop();
    let size = state.stack.pop();

    let region = mem_region(state, index, size)?;

    let hash = if let Some((offset, region_size)) = region {
        let w = num_words(region_size as usize);
        let cost = w * 6;
        state.gas_left -= cost as i64;
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }

        crate::cache::KECCAK_CACHE.hash(&state.memory[offset as usize..(offset + region_size) as usize])
    } else {
        crate::cache::KECCAK_CACHE.hash(&[])
    };

    state.stack.push(U256::from_big_endian(hash.as_bytes()));

    Ok(())
}

pub(crate) fn codesize(stack: &mut Stack, code: &[u8]) {
    stack.push(code.len().into())
}

pub(crate) fn codecopy(state: &mut ExecutionState, code: &[u8]) -> Result<(), StatusCode> {
    let mem_index = state.stack.pop();
    let input_index = state.stack.pop();
    let size = state.stack.pop();

    let region = mem_region(state, mem_index, size)?;

    if let Some((offset, region_size)) = region {
        let src = min(U256::from(code.len()), input_index).as_usize();
        let copy_size = min(region_size as usize, code.len() - src);

        let copy_cost = num_words(region_size as usize) * 3;
        state.gas_left -= copy_cost as i64;
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }

        if copy_size > 0 {
            state.memory[offset as usize..offset as usize + copy_size]
                .copy_from_slice(&code[src..src + copy_size]);
        }

        if region_size as usize - copy_size > 0 {
            state.memory[offset as usize + copy_size..offset as usize + region_size as usize]
                .fill(0);
        }
    }

    Ok(())
}

pub(crate) fn extcodecopy<H: Host>(
    host: &mut H,
    state: &mut ExecutionState,
) -> Result<(), StatusCode> {
    let addr = u256_to_address(state.stack.pop());
    let mem_index = state.stack.pop();
    let input_index = state.stack.pop();
    let size = state.stack.pop();

    let region = mem_region(state, mem_index, size)?;

    if let Some((_, region_size)) = region {
        let copy_cost = num_words(region_size as usize) * 3;
        state.gas_left -= copy_cost as i64;
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }

    if state.evm_revision >= Revision::Berlin && host.access_account(addr) == AccessStatus::Cold {
        state.gas_left -= i64::from(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST);
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }

    if let Some((offset, region_size)) = region {
        let src = min(U256::from(MAX_BUFFER_SIZE), input_index).as_usize();

        let buf = &mut state.memory[offset as usize..(offset + region_size) as usize];
        let copied = host.copy_code(addr, src, buf);
        for b in &mut buf[copied..] {
            *b = 0;
        }
    }

    Ok(())
}

pub(crate) fn returndatasize(state: &mut ExecutionState) {
    state.stack.push(state.return_data.len().into());
}

pub(crate) fn returndatacopy(state: &mut ExecutionState) -> Result<(), StatusCode> {
    let mem_index = state.stack.pop();
    let input_index = state.stack.pop();
    let size = state.stack.pop();

    let region = mem_region(state, mem_index, size)?;

    if input_index > U256::from(state.return_data.len()) {
        return Err(StatusCode::InvalidMemoryAccess);
    }
    let src = input_index.as_usize();

    if src + region.map(|r| r.1 as usize).unwrap_or(0) > state.return_data.len() {
        return Err(StatusCode::InvalidMemoryAccess);
    }

    if let Some((offset, region_size)) = region {
        let copy_cost = num_words(region_size as usize) * 3;
        state.gas_left -= copy_cost as i64;
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }

        state.memory[offset as usize..(offset + region_size) as usize]
            .copy_from_slice(&state.return_data[src..src + region_size as usize]);
    }

    Ok(())
}

pub(crate) fn extcodehash<H: Host>(
    host: &mut H,
    state: &mut ExecutionState,
) -> Result<(), StatusCode> {
    let addr = u256_to_address(state.stack.pop());

    if state.evm_revision >= Revision::Berlin && host.access_account(addr) == AccessStatus::Cold {
        state.gas_left -= i64::from(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST);
        if state.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
    }

    state
        .stack
        .push(U256::from_big_endian(host.get_code_hash(addr).as_bytes()));

    Ok(())
}

/// `MCOPY` (Cancun, EIP-5656): copy `size` bytes from `src_offset` to
/// `dst_offset` within memory, growing to cover whichever region reaches
/// further and charging for both the expansion and the copy itself.
pub(crate) fn mcopy(state: &mut ExecutionState) -> Result<(), StatusCode> {
    let dst_offset = state.stack.pop();
    let src_offset = state.stack.pop();
    let size = state.stack.pop();

    if size.is_zero() {
        return Ok(());
    }

    let far_offset = std::cmp::max(dst_offset, src_offset);
    let (_, region_size) = mem_region(state, far_offset, size)?.unwrap();
    mem_region(state, std::cmp::min(dst_offset, src_offset), size)?;

    let copy_cost = num_words(region_size as usize) * 3;
    state.gas_left -= copy_cost as i64;
    if state.gas_left < 0 {
        return Err(StatusCode::OutOfGas);
    }

    state
        .memory
        .copy_within(dst_offset.as_u64(), src_offset.as_u64(), size.as_u64());

    Ok(())
}
