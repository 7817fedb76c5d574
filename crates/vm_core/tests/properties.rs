//! Property tests for the invariants in §8: IP alignment, SP monotonicity, operand
//! round-trips, arithmetic identities, and CMP/J* agreement with signed comparison.

use proptest::prelude::*;

use vm_core::cpu::Opcode;
use vm_core::devices::DeviceSet;
use vm_core::register::{self, FLAG_EQUAL, FLAG_GREATER, FLAG_LESS};
use vm_core::Cpu;

fn cpu(ram_words: usize) -> Cpu {
    Cpu::new(ram_words, 16, DeviceSet::default()).unwrap()
}

fn bit(flags: i32, n: usize) -> bool {
    (flags >> n) & 1 == 1
}

proptest! {
    #[test]
    fn mov_ri_round_trips_any_word(value: i32) {
        let mut c = cpu(8);
        c.load_program(&[Opcode::MovRI as i32, register::AX as i32, value, Opcode::Halt as i32]);
        c.run();
        prop_assert_eq!(c.register(register::AX), value);
    }

    #[test]
    fn add_zero_is_idempotent(value: i32) {
        let mut c = cpu(8);
        c.load_program(&[
            Opcode::MovRI as i32, register::AX as i32, value,
            Opcode::AddRI as i32, register::AX as i32, 0,
            Opcode::Halt as i32,
        ]);
        c.run();
        prop_assert_eq!(c.register(register::AX), value);
    }

    #[test]
    fn sub_self_is_zero(value: i32) {
        let mut c = cpu(8);
        c.load_program(&[
            Opcode::MovRI as i32, register::AX as i32, value,
            Opcode::SubRR as i32, register::AX as i32, register::AX as i32,
            Opcode::Halt as i32,
        ]);
        c.run();
        prop_assert_eq!(c.register(register::AX), 0);
    }

    #[test]
    fn xor_self_is_zero(value: i32) {
        let mut c = cpu(8);
        c.load_program(&[
            Opcode::MovRI as i32, register::AX as i32, value,
            Opcode::XorRR as i32, register::AX as i32, register::AX as i32,
            Opcode::Halt as i32,
        ]);
        c.run();
        prop_assert_eq!(c.register(register::AX), 0);
    }

    #[test]
    fn mul_one_is_identity(value: i32) {
        let mut c = cpu(8);
        c.load_program(&[
            Opcode::MovRI as i32, register::AX as i32, value,
            Opcode::MulRI as i32, register::AX as i32, 1,
            Opcode::Halt as i32,
        ]);
        c.run();
        prop_assert_eq!(c.register(register::AX), value);
    }

    #[test]
    fn div_self_is_one_for_nonzero(value in any::<i32>().prop_filter("nonzero", |v| *v != 0)) {
        let mut c = cpu(8);
        c.load_program(&[
            Opcode::MovRI as i32, register::AX as i32, value,
            Opcode::MovRI as i32, register::BX as i32, value,
            Opcode::DivRR as i32, register::AX as i32, register::BX as i32,
            Opcode::Halt as i32,
        ]);
        c.run();
        prop_assert_eq!(c.register(register::AX), 1);
    }

    #[test]
    fn cmp_sets_exactly_one_flag_agreeing_with_signed_comparison(a: i32, b: i32) {
        let mut c = cpu(8);
        c.load_program(&[
            Opcode::MovRI as i32, register::AX as i32, a,
            Opcode::MovRI as i32, register::BX as i32, b,
            Opcode::CmpRR as i32, register::AX as i32, register::BX as i32,
            Opcode::Halt as i32,
        ]);
        c.run();

        let flags = c.register(register::FLAGS);
        let (eq, lt, gt) = (bit(flags, FLAG_EQUAL), bit(flags, FLAG_LESS), bit(flags, FLAG_GREATER));

        prop_assert_eq!(eq, a == b);
        prop_assert_eq!(lt, a < b);
        prop_assert_eq!(gt, a > b);
        prop_assert_eq!([eq, lt, gt].iter().filter(|b| **b).count(), 1);
    }

    #[test]
    fn push_pop_round_trips_and_restores_sp(value: i32) {
        let mut c = cpu(8);
        let sp_before = c.register(register::SP);
        c.load_program(&[
            Opcode::PushI as i32, value,
            Opcode::PopR as i32, register::AX as i32,
            Opcode::Halt as i32,
        ]);
        c.run();
        prop_assert_eq!(c.register(register::AX), value);
        prop_assert_eq!(c.register(register::SP), sp_before);
    }
}

#[test]
fn call_ret_returns_to_the_instruction_after_call_with_sp_unchanged() {
    let mut c = cpu(64);
    // 4000: CALL 4024
    // 4008: MOV_RI AX 99     <- must run after RET
    // 4020: HALT
    // 4024: RET (the "subroutine")
    c.load_program(&[
        Opcode::CallI as i32, 4024,                     // 4000..4008
        Opcode::MovRI as i32, register::AX as i32, 99,  // 4008..4020
        Opcode::Halt as i32,                             // 4020..4024
        Opcode::Ret as i32,                               // 4024..4028
    ]);
    c.run();

    assert_eq!(c.register(register::AX), 99);
    assert_eq!(c.register(register::SP), 0);
}

#[test]
fn every_completed_instruction_leaves_ip_word_aligned() {
    let mut c = cpu(64);
    c.load_program(&[
        Opcode::MovRI as i32, register::AX as i32, 5,
        Opcode::AddRI as i32, register::AX as i32, 3,
        Opcode::Halt as i32,
    ]);
    while c.step() == vm_core::StepOutcome::Continue {
        assert_eq!(c.register(register::IP) % 4, 0);
    }
}
