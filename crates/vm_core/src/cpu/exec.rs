//! Per-opcode execution semantics (§4.4 operand tables, §9 resolved ambiguities).
//!
//! Every opcode resolves its operands the same way (see [`Cpu::resolve`]); what differs
//! between e.g. `ADD_RI` and `ADD_MM` is only where the destination and source words come
//! from, never the arithmetic itself. Grouping by family here keeps that one-to-one with
//! the opcode table instead of hand-duplicating each addressing-mode combination.

use vm_util::{Bit, BitSet};

use crate::register::{FLAG_EQUAL, FLAG_GREATER, FLAG_LESS};

use super::{Cpu, DispatchOutcome, Opcode, OperandKind};

type Operand = (OperandKind, i32);

impl Cpu {
    pub(super) fn execute(&mut self, opcode: Opcode, instr_ip: i32) -> DispatchOutcome {
        let kinds = opcode.operand_kinds();
        let op0 = kinds.first().map(|&k| (k, self.fetch_operand()));
        let op1 = kinds.get(1).map(|&k| (k, self.fetch_operand()));

        match opcode {
            Opcode::Inv => unreachable!("Inv is trapped before dispatch"),

            Opcode::MovRI | Opcode::MovRR | Opcode::MovRM
            | Opcode::MovMI | Opcode::MovMR | Opcode::MovMM => {
                self.exec_mov(op0.unwrap(), op1.unwrap());
                DispatchOutcome::Normal
            }

            Opcode::PushI | Opcode::PushR | Opcode::PushM => {
                self.exec_push(op0.unwrap());
                DispatchOutcome::Normal
            }
            Opcode::PopR | Opcode::PopM => {
                self.exec_pop(op0.unwrap());
                DispatchOutcome::Normal
            }

            Opcode::CallI | Opcode::CallR | Opcode::CallM => {
                self.exec_call(op0.unwrap());
                DispatchOutcome::Normal
            }
            Opcode::Ret => {
                self.exec_ret();
                DispatchOutcome::Normal
            }

            Opcode::IncR | Opcode::IncM => {
                self.exec_step_by(op0.unwrap(), 1);
                DispatchOutcome::Normal
            }
            Opcode::DecR | Opcode::DecM => {
                self.exec_step_by(op0.unwrap(), -1);
                DispatchOutcome::Normal
            }

            Opcode::AddRI | Opcode::AddRR | Opcode::AddRM
            | Opcode::AddMI | Opcode::AddMR | Opcode::AddMM => {
                self.exec_binary(op0.unwrap(), op1.unwrap(), |a, b| a.wrapping_add(b));
                DispatchOutcome::Normal
            }
            Opcode::SubRI | Opcode::SubRR | Opcode::SubRM
            | Opcode::SubMI | Opcode::SubMR | Opcode::SubMM => {
                self.exec_binary(op0.unwrap(), op1.unwrap(), |a, b| a.wrapping_sub(b));
                DispatchOutcome::Normal
            }
            Opcode::MulRI | Opcode::MulRR | Opcode::MulRM
            | Opcode::MulMI | Opcode::MulMR | Opcode::MulMM => {
                self.exec_binary(op0.unwrap(), op1.unwrap(), |a, b| a.wrapping_mul(b));
                DispatchOutcome::Normal
            }
            Opcode::DivRI | Opcode::DivRR | Opcode::DivRM
            | Opcode::DivMI | Opcode::DivMR | Opcode::DivMM => {
                self.exec_div(op0.unwrap(), op1.unwrap());
                DispatchOutcome::Normal
            }
            Opcode::ModRI | Opcode::ModRR | Opcode::ModRM
            | Opcode::ModMI | Opcode::ModMR | Opcode::ModMM => {
                self.exec_mod(op0.unwrap(), op1.unwrap());
                DispatchOutcome::Normal
            }
            Opcode::RemR | Opcode::RemM => {
                self.exec_rem(op0.unwrap());
                DispatchOutcome::Normal
            }

            Opcode::NotR | Opcode::NotM => {
                self.exec_unary(op0.unwrap(), |a| !a);
                DispatchOutcome::Normal
            }
            Opcode::XorRI | Opcode::XorRR | Opcode::XorRM
            | Opcode::XorMI | Opcode::XorMR | Opcode::XorMM => {
                self.exec_binary(op0.unwrap(), op1.unwrap(), |a, b| a ^ b);
                DispatchOutcome::Normal
            }
            Opcode::OrRI | Opcode::OrRR | Opcode::OrRM
            | Opcode::OrMI | Opcode::OrMR | Opcode::OrMM => {
                self.exec_binary(op0.unwrap(), op1.unwrap(), |a, b| a | b);
                DispatchOutcome::Normal
            }
            Opcode::AndRI | Opcode::AndRR | Opcode::AndRM
            | Opcode::AndMI | Opcode::AndMR | Opcode::AndMM => {
                self.exec_binary(op0.unwrap(), op1.unwrap(), |a, b| a & b);
                DispatchOutcome::Normal
            }

            Opcode::ShlRI | Opcode::ShlRR | Opcode::ShlRM
            | Opcode::ShlMI | Opcode::ShlMR | Opcode::ShlMM => {
                self.exec_binary(op0.unwrap(), op1.unwrap(), |a, b| a.wrapping_shl(b as u32));
                DispatchOutcome::Normal
            }
            Opcode::ShrRI | Opcode::ShrRR | Opcode::ShrRM
            | Opcode::ShrMI | Opcode::ShrMR | Opcode::ShrMM => {
                self.exec_binary(op0.unwrap(), op1.unwrap(), |a, b| a.wrapping_shr(b as u32));
                DispatchOutcome::Normal
            }

            Opcode::CmpII | Opcode::CmpIR | Opcode::CmpIM
            | Opcode::CmpRI | Opcode::CmpRR | Opcode::CmpRM
            | Opcode::CmpMI | Opcode::CmpMR | Opcode::CmpMM => {
                self.exec_cmp(op0.unwrap(), op1.unwrap());
                DispatchOutcome::Normal
            }

            Opcode::JmpI | Opcode::JmpR | Opcode::JmpM => {
                self.exec_jump_if(op0.unwrap(), true);
                DispatchOutcome::Normal
            }
            Opcode::JeI | Opcode::JeR | Opcode::JeM => {
                let take = self.flag(FLAG_EQUAL);
                self.exec_jump_if(op0.unwrap(), take);
                DispatchOutcome::Normal
            }
            Opcode::JneI | Opcode::JneR | Opcode::JneM => {
                let take = !self.flag(FLAG_EQUAL);
                self.exec_jump_if(op0.unwrap(), take);
                DispatchOutcome::Normal
            }
            Opcode::JgI | Opcode::JgR | Opcode::JgM => {
                let take = self.flag(FLAG_GREATER);
                self.exec_jump_if(op0.unwrap(), take);
                DispatchOutcome::Normal
            }
            Opcode::JgeI | Opcode::JgeR | Opcode::JgeM => {
                let take = self.flag(FLAG_GREATER) || self.flag(FLAG_EQUAL);
                self.exec_jump_if(op0.unwrap(), take);
                DispatchOutcome::Normal
            }
            Opcode::JlI | Opcode::JlR | Opcode::JlM => {
                let take = self.flag(FLAG_LESS);
                self.exec_jump_if(op0.unwrap(), take);
                DispatchOutcome::Normal
            }
            Opcode::JleI | Opcode::JleR | Opcode::JleM => {
                let take = self.flag(FLAG_LESS) || self.flag(FLAG_EQUAL);
                self.exec_jump_if(op0.unwrap(), take);
                DispatchOutcome::Normal
            }

            Opcode::PrnII | Opcode::PrnIR | Opcode::PrnIM => {
                self.exec_print_int(op0.unwrap());
                DispatchOutcome::Normal
            }
            Opcode::PrnSI | Opcode::PrnSR | Opcode::PrnSM => {
                self.exec_print_string(op0.unwrap());
                DispatchOutcome::Normal
            }

            Opcode::IntI | Opcode::IntR | Opcode::IntM => {
                self.exec_software_interrupt(op0.unwrap());
                DispatchOutcome::Normal
            }

            Opcode::PauseRZ | Opcode::PauseMZ => self.exec_pause(op0.unwrap(), true, instr_ip),
            Opcode::PauseRNZ | Opcode::PauseMNZ => self.exec_pause(op0.unwrap(), false, instr_ip),

            Opcode::Halt => DispatchOutcome::Halted,
        }
    }

    fn flag(&self, bit: usize) -> bool {
        self.registers.flags().bit(bit)
    }

    fn exec_mov(&mut self, dest: Operand, src: Operand) {
        let value = self.resolve(src.0, src.1);
        self.write_back(dest.0, dest.1, value);
    }

    fn exec_unary(&mut self, dest: Operand, f: impl Fn(i32) -> i32) {
        let value = self.resolve(dest.0, dest.1);
        self.write_back(dest.0, dest.1, f(value));
    }

    fn exec_step_by(&mut self, dest: Operand, delta: i32) {
        self.exec_unary(dest, move |v| v.wrapping_add(delta));
    }

    fn exec_binary(&mut self, dest: Operand, src: Operand, f: impl Fn(i32, i32) -> i32) {
        let lhs = self.resolve(dest.0, dest.1);
        let rhs = self.resolve(src.0, src.1);
        self.write_back(dest.0, dest.1, f(lhs, rhs));
    }

    /// Divide-by-zero is a fault (§9); the destination is left unmodified.
    fn exec_div(&mut self, dest: Operand, src: Operand) {
        let divisor = self.resolve(src.0, src.1);
        if divisor == 0 {
            self.raise_fault();
            return;
        }
        let dividend = self.resolve(dest.0, dest.1);
        self.write_back(dest.0, dest.1, dividend.wrapping_div(divisor));
    }

    /// MOD writes only the remainder register; the destination operand is untouched
    /// (§4.4, distinguishing MOD from REM).
    fn exec_mod(&mut self, dest: Operand, src: Operand) {
        let divisor = self.resolve(src.0, src.1);
        if divisor == 0 {
            self.raise_fault();
            return;
        }
        let dividend = self.resolve(dest.0, dest.1);
        self.remainder = dividend.wrapping_rem(divisor);
    }

    fn exec_rem(&mut self, dest: Operand) {
        let remainder = self.remainder;
        self.write_back(dest.0, dest.1, remainder);
    }

    fn exec_cmp(&mut self, left: Operand, right: Operand) {
        let lhs = self.resolve(left.0, left.1);
        let rhs = self.resolve(right.0, right.1);

        let mut flags = 0i32;
        flags = flags.set_bit(FLAG_EQUAL, lhs == rhs);
        flags = flags.set_bit(FLAG_LESS, lhs < rhs);
        flags = flags.set_bit(FLAG_GREATER, lhs > rhs);
        self.registers.set_flags(flags);
    }

    fn exec_jump_if(&mut self, target: Operand, take: bool) {
        if take {
            let addr = self.resolve(target.0, target.1);
            self.set_ip_checked(addr);
        }
    }

    fn exec_push(&mut self, src: Operand) {
        let value = self.resolve(src.0, src.1);
        match self.stack.push(self.registers.sp(), value) {
            Ok(new_sp) => self.registers.set_sp(new_sp),
            Err(_) => self.raise_fault(),
        }
    }

    fn exec_pop(&mut self, dest: Operand) {
        match self.stack.pop(self.registers.sp()) {
            Ok((new_sp, value)) => {
                self.registers.set_sp(new_sp);
                self.write_back(dest.0, dest.1, value);
            }
            Err(_) => self.raise_fault(),
        }
    }

    fn exec_call(&mut self, target: Operand) {
        let return_ip = self.registers.ip();
        match self.stack.push(self.registers.sp(), return_ip) {
            Ok(new_sp) => {
                self.registers.set_sp(new_sp);
                let addr = self.resolve(target.0, target.1);
                self.set_ip_checked(addr);
            }
            Err(_) => self.raise_fault(),
        }
    }

    fn exec_ret(&mut self) {
        match self.stack.pop(self.registers.sp()) {
            Ok((new_sp, return_ip)) => {
                self.registers.set_sp(new_sp);
                self.set_ip_checked(return_ip);
            }
            Err(_) => self.raise_fault(),
        }
    }

    /// Software interrupt: same push-then-jump shape as CALL, landing on a vector
    /// address rather than a subroutine (§4.4).
    fn exec_software_interrupt(&mut self, target: Operand) {
        self.exec_call(target);
    }

    fn exec_print_int(&mut self, operand: Operand) {
        let value = self.resolve(operand.0, operand.1);
        self.bus.print(&value.to_string());
    }

    /// The operand resolves to the starting byte address of a null-terminated string
    /// (§4.4), never the string's contents directly — only `PRN` on an integer operand
    /// prints the resolved value itself.
    fn exec_print_string(&mut self, operand: Operand) {
        let start = self.resolve(operand.0, operand.1);
        let text = self.read_cstring(start);
        self.bus.print(&text);
    }

    /// Scan words from `start`, unpacking each as 4 little-endian ASCII bytes (matching
    /// the filesystem loader's packing, §6), stopping at the first all-zero word or at
    /// the first access fault. A scan that runs off addressable memory faults (§4.4).
    fn read_cstring(&mut self, start: i32) -> String {
        let mut bytes = Vec::new();
        let mut addr = start;
        loop {
            let word = self.load_word(addr);
            if self.pending_fault || word == 0 {
                break;
            }
            bytes.extend_from_slice(&(word as u32).to_le_bytes());
            addr = addr.wrapping_add(crate::bus::layout::WORD_SIZE);
        }
        String::from_utf8_lossy(&bytes).trim_end_matches('\0').to_owned()
    }

    /// Suspend until `operand`'s value satisfies the zero/non-zero condition, servicing
    /// interrupts each boundary in the meantime (§4.4, §9).
    fn exec_pause(&mut self, operand: Operand, want_zero: bool, instr_ip: i32) -> DispatchOutcome {
        let value = self.resolve(operand.0, operand.1);
        let satisfied = if want_zero { value == 0 } else { value != 0 };
        if satisfied {
            DispatchOutcome::Normal
        } else {
            DispatchOutcome::Paused { resume_ip: instr_ip }
        }
    }
}
