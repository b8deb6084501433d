//! Jump-target analysis and the padded-code/jump-mask pair shared between a
//! live execution and the analysis cache.

use crate::opcode::OpCode;
use bytes::Bytes;

/// Number of trailing `STOP` bytes appended to the original bytecode so the
/// dispatch loop can always read a full `PUSH32` immediate at the very end
/// of the code without a bounds check.
pub const CODE_PADDING: usize = 33;

/// One bit per byte of the *original* bytecode; set iff that offset holds a
/// `JUMPDEST` that is not inside the immediate-data of a `PUSH1..PUSH32`.
#[derive(Clone, Debug)]
pub struct JumpTargetMask(Vec<bool>);

impl JumpTargetMask {
    /// `true` iff `dst` is within the original code length and marks a
    /// valid jump destination.
    pub fn contains(&self, dst: usize) -> bool {
        self.0.get(dst).copied().unwrap_or(false)
    }
}

/// Immutable (code, jump-mask) pair produced once per distinct bytecode and
/// shared by reference between live executions and the analysis cache.
#[derive(Clone, Debug)]
pub struct ContractInfo {
    /// Original bytecode length (before padding).
    pub code_len: usize,
    /// Original bytecode followed by `CODE_PADDING` `STOP` bytes.
    pub padded_code: Bytes,
    pub jump_targets: JumpTargetMask,
}

impl ContractInfo {
    pub fn analyze(code: Bytes) -> Self {
        let code_len = code.len();
        let mut mask = vec![false; code_len];

        let mut i = 0;
        while i < code_len {
            let op = OpCode(code[i]);
            if op.0 >= OpCode::PUSH1.0 && op.0 <= OpCode::PUSH32.0 {
                i += 1 + (op.0 - OpCode::PUSH1.0 + 1) as usize;
            } else {
                if op == OpCode::JUMPDEST {
                    mask[i] = true;
                }
                i += 1;
            }
        }

        let mut padded_code = Vec::with_capacity(code_len + CODE_PADDING);
        padded_code.extend_from_slice(&code);
        padded_code.resize(code_len + CODE_PADDING, OpCode::STOP.to_u8());

        Self {
            code_len,
            padded_code: padded_code.into(),
            jump_targets: JumpTargetMask(mask),
        }
    }

    pub fn code(&self) -> &[u8] {
        &self.padded_code[..self.code_len]
    }

    pub fn is_valid_jump_target(&self, dst: usize) -> bool {
        dst < self.code_len && self.jump_targets.contains(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_with_33_stop_bytes() {
        let info = ContractInfo::analyze(Bytes::from_static(&[0x00]));
        assert_eq!(info.padded_code.len(), 1 + CODE_PADDING);
        assert!(info.padded_code[1..].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn jumpdest_inside_push_payload_is_not_a_target() {
        // PUSH1 0x5B; JUMPDEST; STOP
        let code = Bytes::from_static(&[0x60, 0x5B, 0x5B, 0x00]);
        let info = ContractInfo::analyze(code);
        assert!(!info.is_valid_jump_target(1));
        assert!(info.is_valid_jump_target(2));
    }

    #[test]
    fn out_of_range_jump_is_rejected() {
        let info = ContractInfo::analyze(Bytes::from_static(&[0x5b]));
        assert!(!info.is_valid_jump_target(100));
    }
}
