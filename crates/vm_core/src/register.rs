//! The 18-slot register file (§3, §4.2).

use serde::{Deserialize, Serialize};

pub const SP: usize = 0;
pub const BP: usize = 1;
pub const IP: usize = 2;
pub const AX: usize = 3;
pub const BX: usize = 4;
pub const CX: usize = 5;
pub const DX: usize = 6;
pub const SI: usize = 7;
pub const DI: usize = 8;
pub const R08: usize = 9;
pub const R09: usize = 10;
pub const R10: usize = 11;
pub const R11: usize = 12;
pub const R12: usize = 13;
pub const R13: usize = 14;
pub const R14: usize = 15;
pub const R15: usize = 16;
pub const FLAGS: usize = 17;

pub const REGISTER_COUNT: usize = 18;

/// Bits of the FLAGS register written by CMP, read by the conditional jumps.
pub const FLAG_EQUAL: usize = 0;
pub const FLAG_LESS: usize = 1;
pub const FLAG_GREATER: usize = 2;

/// Flat file of 18 general-purpose and special-purpose 32-bit registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    slots: [i32; REGISTER_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        let mut regs = Self { slots: [0; REGISTER_COUNT] };
        regs.slots[IP] = crate::bus::layout::RAM_BASE;
        regs
    }

    /// Read-only register index validity: the spec allows any of 0..18, decoding a
    /// wider index is a caller bug (an R operand out of range is a fault, checked by
    /// the decoder before calling this).
    pub fn get(&self, idx: usize) -> i32 {
        self.slots[idx]
    }

    pub fn set(&mut self, idx: usize, value: i32) {
        self.slots[idx] = value;
    }

    pub fn ip(&self) -> i32 {
        self.slots[IP]
    }

    pub fn set_ip(&mut self, addr: i32) {
        self.slots[IP] = addr;
    }

    /// Advance IP past `n` instruction words.
    pub fn incr_ip(&mut self, n: i32) {
        self.slots[IP] += crate::bus::layout::WORD_SIZE * n;
    }

    pub fn sp(&self) -> i32 {
        self.slots[SP]
    }

    pub fn set_sp(&mut self, value: i32) {
        self.slots[SP] = value;
    }

    pub fn flags(&self) -> i32 {
        self.slots[FLAGS]
    }

    pub fn set_flags(&mut self, value: i32) {
        self.slots[FLAGS] = value;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// A register index is valid iff it names one of the 18 slots.
pub fn is_valid_index(idx: i32) -> bool {
    (0..REGISTER_COUNT as i32).contains(&idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_sets_ip_to_ram_base() {
        let regs = Registers::new();
        assert_eq!(regs.ip(), crate::bus::layout::RAM_BASE);
    }

    #[test]
    fn incr_ip_advances_by_words_not_bytes() {
        let mut regs = Registers::new();
        let base = regs.ip();
        regs.incr_ip(3);
        assert_eq!(regs.ip(), base + 12);
    }

    #[test]
    fn get_set_round_trips_every_slot() {
        let mut regs = Registers::new();
        for idx in 0..REGISTER_COUNT {
            regs.set(idx, idx as i32 * 7);
        }
        for idx in 0..REGISTER_COUNT {
            assert_eq!(regs.get(idx), idx as i32 * 7);
        }
    }

    #[test]
    fn index_validity_matches_the_18_named_slots() {
        assert!(is_valid_index(0));
        assert!(is_valid_index(17));
        assert!(!is_valid_index(18));
        assert!(!is_valid_index(-1));
    }
}
