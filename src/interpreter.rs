//! Synchronous dispatch loop.
//!
//! This crate's `Host` trait is synchronous (see `host.rs`), so the loop
//! below calls straight into `host.method(...)` and returns when it is
//! done — no generator, no nightly features. Stepping (`step_n`) is
//! implemented by running the very same loop with a step-budget counter
//! that exits the `loop` (not the call stack) once it reaches zero, leaving
//! `ExecutionState` sitting at whatever `pc` it stopped on so the caller can
//! serialize it and resume later with a freshly reconstructed
//! `ExecutionState`.

use crate::{
    analysis::ContractInfo,
    cache::ANALYSIS_CACHE,
    common::{CallKind, Message, Output, Revision, RunState, StatusCode},
    host::Host,
    instructions::{
        arithmetic, bitwise, boolean,
        call as call_instructions,
        control::{calldataload, calldatasize, op_jump, ret},
        external,
        instruction_table::{get_baseline_instruction_table, InstructionTable},
        memory as mem_instructions,
        stack_manip::{dup, pop, push, push0, swap},
    },
    memory::Memory,
    opcode::OpCode,
    state::{ExecutionState, Stack},
    tracing::Tracer,
};
use bytes::Bytes;
use ethereum_types::{H256, U256};
use std::collections::HashMap;

/// Checks the gas cost and stack-height requirements for `op` before it
/// runs, charging gas directly against `state.gas_left`.
fn check_requirements(
    instruction_table: &InstructionTable,
    state: &mut ExecutionState,
    op: OpCode,
) -> Result<(), StatusCode> {
    let metrics = instruction_table[op.to_usize()].ok_or(StatusCode::UndefinedInstruction)?;

    state.gas_left -= metrics.gas_cost as i64;
    if state.gas_left < 0 {
        return Err(StatusCode::OutOfGas);
    }

    let stack_size = state.stack.len();
    if stack_size == Stack::limit() {
        if metrics.can_overflow_stack {
            return Err(StatusCode::StackOverflow);
        }
    } else if stack_size < metrics.stack_height_required.into() {
        return Err(StatusCode::StackUnderflow);
    }

    Ok(())
}

/// Maps a `StatusCode` raised by an instruction handler to the richer
/// internal `RunState` the dispatch loop settles into.
fn handler_err_to_run_state(e: StatusCode) -> RunState {
    match e {
        StatusCode::OutOfGas => RunState::ErrorGas,
        StatusCode::StackUnderflow => RunState::ErrorStackUnderflow,
        StatusCode::StackOverflow => RunState::ErrorStackOverflow,
        StatusCode::BadJumpDestination => RunState::ErrorJump,
        StatusCode::InvalidMemoryAccess => RunState::ErrorReturnDataCopyOOB,
        StatusCode::StaticModeViolation => RunState::ErrorStaticCall,
        StatusCode::ArgumentOutOfRange => RunState::ErrorInitCodeSizeExceeded,
        StatusCode::InvalidInstruction => RunState::Invalid,
        _ => RunState::ErrorOpcode,
    }
}

/// What the dispatch loop does with `state.pc` after one instruction.
enum Flow {
    Continue,
    Jump(usize),
    Halt(RunState),
}

/// Runs one instruction, leaving `state` updated in place. Returns how the
/// loop should move `pc`, or the terminal `RunState` if this was the last
/// instruction of the run.
fn execute_one<H: Host>(
    host: &mut H,
    state: &mut ExecutionState,
    info: &ContractInfo,
    op: OpCode,
) -> Result<Flow, StatusCode> {
    match op {
        OpCode::STOP => return Ok(Flow::Halt(RunState::Done)),

        OpCode::ADD => arithmetic::add(&mut state.stack),
        OpCode::MUL => arithmetic::mul(&mut state.stack),
        OpCode::SUB => arithmetic::sub(&mut state.stack),
        OpCode::DIV => arithmetic::div(&mut state.stack),
        OpCode::SDIV => arithmetic::sdiv(&mut state.stack),
        OpCode::MOD => arithmetic::modulo(&mut state.stack),
        OpCode::SMOD => arithmetic::smod(&mut state.stack),
        OpCode::ADDMOD => arithmetic::addmod(&mut state.stack),
        OpCode::MULMOD => arithmetic::mulmod(&mut state.stack),
        OpCode::EXP => arithmetic::exp(state)?,
        OpCode::SIGNEXTEND => arithmetic::signextend(&mut state.stack),

        OpCode::LT => boolean::lt(&mut state.stack),
        OpCode::GT => boolean::gt(&mut state.stack),
        OpCode::SLT => boolean::slt(&mut state.stack),
        OpCode::SGT => boolean::sgt(&mut state.stack),
        OpCode::EQ => boolean::eq(&mut state.stack),
        OpCode::ISZERO => boolean::iszero(&mut state.stack),
        OpCode::AND => boolean::and(&mut state.stack),
        OpCode::OR => boolean::or(&mut state.stack),
        OpCode::XOR => boolean::xor(&mut state.stack),
        OpCode::NOT => boolean::not(&mut state.stack),
        OpCode::BYTE => bitwise::byte(&mut state.stack),
        OpCode::SHL => bitwise::shl(&mut state.stack),
        OpCode::SHR => bitwise::shr(&mut state.stack),
        OpCode::SAR => bitwise::sar(&mut state.stack),

        OpCode::SHA3 => mem_instructions::keccak256(state)?,

        OpCode::ADDRESS => external::address(state),
        OpCode::BALANCE => external::balance(host, state)?,
        OpCode::CALLER => external::caller(state),
        OpCode::CALLVALUE => external::callvalue(state),
        OpCode::CALLDATALOAD => calldataload(state),
        OpCode::CALLDATASIZE => calldatasize(state),
        OpCode::CALLDATACOPY => mem_instructions::calldatacopy(state)?,
        OpCode::CODESIZE => mem_instructions::codesize(&mut state.stack, info.code()),
        OpCode::CODECOPY => mem_instructions::codecopy(state, info.code())?,
        OpCode::EXTCODESIZE => external::extcodesize(host, state)?,
        OpCode::EXTCODECOPY => mem_instructions::extcodecopy(host, state)?,
        OpCode::RETURNDATASIZE => mem_instructions::returndatasize(state),
        OpCode::RETURNDATACOPY => mem_instructions::returndatacopy(state)?,
        OpCode::EXTCODEHASH => mem_instructions::extcodehash(host, state)?,
        OpCode::BLOCKHASH => external::blockhash(host, state),

        OpCode::ORIGIN
        | OpCode::COINBASE
        | OpCode::GASPRICE
        | OpCode::TIMESTAMP
        | OpCode::NUMBER
        | OpCode::PREVRANDAO
        | OpCode::GASLIMIT
        | OpCode::CHAINID
        | OpCode::BASEFEE
        | OpCode::BLOBBASEFEE => {
            let tx_context = host.get_tx_context();
            let accessor = match op {
                OpCode::ORIGIN => external::origin_accessor,
                OpCode::COINBASE => external::coinbase_accessor,
                OpCode::GASPRICE => external::gasprice_accessor,
                OpCode::TIMESTAMP => external::timestamp_accessor,
                OpCode::NUMBER => external::number_accessor,
                OpCode::PREVRANDAO => external::prevrandao_accessor,
                OpCode::GASLIMIT => external::gaslimit_accessor,
                OpCode::CHAINID => external::chainid_accessor,
                OpCode::BASEFEE => external::basefee_accessor,
                OpCode::BLOBBASEFEE => external::blobbasefee_accessor,
                _ => unreachable!(),
            };
            state.stack.push(accessor(&tx_context));
        }
        OpCode::SELFBALANCE => external::selfbalance(host, state),
        OpCode::POP => pop(&mut state.stack),
        OpCode::MLOAD => mem_instructions::mload(state)?,
        OpCode::MSTORE => mem_instructions::mstore(state)?,
        OpCode::MSTORE8 => mem_instructions::mstore8(state)?,
        OpCode::JUMP => {
            let dst = op_jump(state, info)?;
            return Ok(Flow::Jump(dst));
        }
        OpCode::JUMPI => {
            if !state.stack.get(1).is_zero() {
                let dst = op_jump(state, info)?;
                state.stack.pop();
                return Ok(Flow::Jump(dst));
            } else {
                state.stack.pop();
                state.stack.pop();
            }
        }
        OpCode::PC => state.stack.push(state.pc.into()),
        OpCode::MSIZE => mem_instructions::msize(state),
        OpCode::SLOAD => external::sload(host, state)?,
        OpCode::SSTORE => external::sstore(host, state)?,
        OpCode::GAS => state.stack.push(state.gas_left.into()),
        OpCode::JUMPDEST => {}
        OpCode::TLOAD => external::tload(state),
        OpCode::TSTORE => external::tstore(state)?,
        OpCode::MCOPY => mem_instructions::mcopy(state)?,
        OpCode::PUSH0 => push0(&mut state.stack),

        OpCode::PUSH1
        | OpCode::PUSH2
        | OpCode::PUSH3
        | OpCode::PUSH4
        | OpCode::PUSH5
        | OpCode::PUSH6
        | OpCode::PUSH7
        | OpCode::PUSH8
        | OpCode::PUSH9
        | OpCode::PUSH10
        | OpCode::PUSH11
        | OpCode::PUSH12
        | OpCode::PUSH13
        | OpCode::PUSH14
        | OpCode::PUSH15
        | OpCode::PUSH16
        | OpCode::PUSH17
        | OpCode::PUSH18
        | OpCode::PUSH19
        | OpCode::PUSH20
        | OpCode::PUSH21
        | OpCode::PUSH22
        | OpCode::PUSH23
        | OpCode::PUSH24
        | OpCode::PUSH25
        | OpCode::PUSH26
        | OpCode::PUSH27
        | OpCode::PUSH28
        | OpCode::PUSH29
        | OpCode::PUSH30
        | OpCode::PUSH31
        | OpCode::PUSH32 => {
            let push_len = op.to_usize() - OpCode::PUSH1.to_usize() + 1;
            push(
                &mut state.stack,
                &info.padded_code[state.pc + 1..],
                push_len,
            );
            return Ok(Flow::Jump(state.pc + 1 + push_len));
        }

        OpCode::DUP1
        | OpCode::DUP2
        | OpCode::DUP3
        | OpCode::DUP4
        | OpCode::DUP5
        | OpCode::DUP6
        | OpCode::DUP7
        | OpCode::DUP8
        | OpCode::DUP9
        | OpCode::DUP10
        | OpCode::DUP11
        | OpCode::DUP12
        | OpCode::DUP13
        | OpCode::DUP14
        | OpCode::DUP15
        | OpCode::DUP16 => {
            dup(&mut state.stack, op.to_usize() - OpCode::DUP1.to_usize() + 1);
        }

        OpCode::SWAP1
        | OpCode::SWAP2
        | OpCode::SWAP3
        | OpCode::SWAP4
        | OpCode::SWAP5
        | OpCode::SWAP6
        | OpCode::SWAP7
        | OpCode::SWAP8
        | OpCode::SWAP9
        | OpCode::SWAP10
        | OpCode::SWAP11
        | OpCode::SWAP12
        | OpCode::SWAP13
        | OpCode::SWAP14
        | OpCode::SWAP15
        | OpCode::SWAP16 => swap(&mut state.stack, op.to_usize() - OpCode::SWAP1.to_usize() + 1),

        OpCode::LOG0 | OpCode::LOG1 | OpCode::LOG2 | OpCode::LOG3 | OpCode::LOG4 => {
            external::log(host, state, op.to_usize() - OpCode::LOG0.to_usize())?;
        }
        OpCode::CREATE | OpCode::CREATE2 => {
            call_instructions::create(host, state, op == OpCode::CREATE2)?;
        }
        OpCode::CALL | OpCode::CALLCODE | OpCode::DELEGATECALL | OpCode::STATICCALL => {
            let kind = match op {
                OpCode::CALL | OpCode::STATICCALL => CallKind::Call,
                OpCode::CALLCODE => CallKind::CallCode,
                OpCode::DELEGATECALL => CallKind::DelegateCall,
                _ => unreachable!(),
            };
            call_instructions::call(host, state, kind, op == OpCode::STATICCALL)?;
        }
        OpCode::RETURN | OpCode::REVERT => {
            ret(state)?;
            return Ok(Flow::Halt(if op == OpCode::REVERT {
                RunState::Revert
            } else {
                RunState::Return
            }));
        }
        OpCode::INVALID => return Err(StatusCode::InvalidInstruction),
        OpCode::SELFDESTRUCT => {
            external::selfdestruct(host, state)?;
            return Ok(Flow::Halt(RunState::Done));
        }
        _ => return Err(StatusCode::UndefinedInstruction),
    }

    Ok(Flow::Continue)
}

/// Runs the dispatch loop until a terminal state is reached or, if `steps`
/// is `Some`, until the budget is exhausted (leaving `state.run_state` at
/// `RunState::Running`).
fn run<H: Host, T: Tracer>(
    host: &mut H,
    tracer: &mut T,
    info: &ContractInfo,
    state: &mut ExecutionState,
    mut steps: Option<i32>,
) {
    let instruction_table = get_baseline_instruction_table(state.evm_revision);

    loop {
        if let Some(n) = steps {
            if n <= 0 {
                return;
            }
        }

        let op = OpCode(info.padded_code[state.pc]);
        let pc_before = state.pc;

        tracer.notify_instruction_start(pc_before, op, state);

        let outcome =
            check_requirements(instruction_table, state, op).and_then(|()| execute_one(host, state, info, op));

        match outcome {
            Ok(Flow::Continue) => state.pc += 1,
            Ok(Flow::Jump(dst)) => state.pc = dst,
            Ok(Flow::Halt(run_state)) => {
                state.run_state = run_state;
                tracer.notify_instruction_end(pc_before, op, state);
                return;
            }
            Err(e) => {
                state.run_state = handler_err_to_run_state(e);
                tracer.notify_instruction_end(pc_before, op, state);
                return;
            }
        }

        tracer.notify_instruction_end(pc_before, op, state);

        if let Some(n) = steps.as_mut() {
            *n -= 1;
        }
    }
}

/// Pre-check applied to the incoming message itself, before any code runs:
/// a message that already carries `depth > 1024` is rejected outright. Real
/// callers never reach this (`instructions::call::call`/`create` already
/// refuse to dispatch a sub-call/creation past depth 1024, so the next
/// frame's `depth` never exceeds the limit), but it gives `RunState::ErrorCall`
/// / `RunState::ErrorCreate` a reachable meaning for a host that hands this
/// entry point a message it built itself, matching the "Shared pre-checks:
/// depth > 1024" wording for sub-calls and contract creation.
fn depth_exceeded(message: &Message) -> Option<RunState> {
    if message.depth > 1024 {
        Some(match message.kind {
            CallKind::Create | CallKind::Create2 { .. } => RunState::ErrorCreate,
            _ => RunState::ErrorCall,
        })
    } else {
        None
    }
}

fn finalize(state: &ExecutionState) -> Output {
    let keep_gas = matches!(
        state.run_state,
        RunState::Running | RunState::Done | RunState::Return | RunState::Revert
    );

    Output {
        status_code: StatusCode::from(state.run_state),
        gas_left: if keep_gas { state.gas_left } else { 0 },
        gas_refund: if keep_gas { state.gas_refund } else { 0 },
        output_data: if matches!(state.run_state, RunState::Return | RunState::Revert) {
            state.output_data.clone()
        } else {
            Bytes::new()
        },
        create_address: None,
    }
}

/// Executes `code` to completion and reports the final `Output`.
pub fn execute<H: Host, T: Tracer>(
    host: &mut H,
    mut tracer: T,
    message: Message,
    code: Bytes,
    code_hash: H256,
    revision: Revision,
) -> Output {
    let depth = message.depth;

    if let Some(run_state) = depth_exceeded(&message) {
        return finalize(&ExecutionState {
            run_state,
            ..ExecutionState::new(message, revision)
        });
    }

    let info = ANALYSIS_CACHE.lock().resolve(code_hash, code);
    let mut state = ExecutionState::new(message, revision);

    tracer.notify_execution_start(revision, depth);
    run(host, &mut tracer, &info, &mut state, None);
    tracer.notify_execution_end(depth);

    finalize(&state)
}

/// External status reported by `step_n`: `RunState::Running` means the step
/// budget ran out with more work left; anything else is terminal.
pub type StepStatusCode = RunState;

/// Wire-format interpreter state handed back by `step_n`, symmetric with the
/// inputs a caller reconstructs `ExecutionState` from on the next call.
#[derive(Clone, Debug)]
pub struct StepResult {
    pub status: StepStatusCode,
    pub pc: usize,
    pub gas_left: i64,
    pub gas_refund: i64,
    /// Stack contents, bottom first (matches `ArrayVec`'s own storage order,
    /// i.e. the last element is the top of stack).
    pub stack: Vec<U256>,
    pub memory: Vec<u8>,
    pub last_call_return_data: Bytes,
}

/// Runs at most `steps` instructions starting from a caller-supplied
/// snapshot of interpreter state, returning the updated snapshot. Calling
/// this repeatedly with the previous call's `StepResult` fields reproduces
/// the same sequence of states `execute` would pass through internally.
#[allow(clippy::too_many_arguments)]
pub fn step_n<H: Host, T: Tracer>(
    host: &mut H,
    mut tracer: T,
    message: Message,
    code: Bytes,
    code_hash: H256,
    revision: Revision,
    status: StepStatusCode,
    pc: usize,
    gas_left: i64,
    gas_refund: i64,
    stack: Vec<U256>,
    memory: Vec<u8>,
    last_call_return_data: Bytes,
    steps: i32,
) -> StepResult {
    let depth = message.depth;
    let info = ANALYSIS_CACHE.lock().resolve(code_hash, code);

    let mut state = ExecutionState {
        gas_left,
        gas_refund,
        stack: Stack(stack.into_iter().collect()),
        memory: Memory::from_vec(memory),
        message,
        evm_revision: revision,
        return_data: last_call_return_data,
        output_data: Bytes::new(),
        transient_storage: HashMap::new(),
        pc,
        run_state: status,
    };

    if matches!(state.run_state, RunState::Running) {
        if let Some(run_state) = depth_exceeded(&state.message) {
            state.run_state = run_state;
        } else {
            tracer.notify_execution_start(revision, depth);
            run(host, &mut tracer, &info, &mut state, Some(steps));
            tracer.notify_execution_end(depth);
        }
    }

    StepResult {
        status: state.run_state,
        pc: state.pc,
        gas_left: state.gas_left,
        gas_refund: state.gas_refund,
        stack: state.stack.0.into_iter().collect(),
        memory: state.memory.as_slice().to_vec(),
        last_call_return_data: state.return_data,
    }
}
