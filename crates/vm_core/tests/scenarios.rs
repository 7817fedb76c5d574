//! Whole-program regression scenarios (§8), assembled as literal word arrays — no
//! assembler dependency, since one is out of scope (§1).

use std::cell::RefCell;
use std::rc::Rc;

use vm_core::cpu::Opcode;
use vm_core::devices::{Console, DeviceSet};
use vm_core::{register, Cpu};

#[derive(Clone, Default)]
struct CapturingConsole {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Console for CapturingConsole {
    fn print(&mut self, text: &str) {
        self.lines.borrow_mut().push(text.to_owned());
    }
}

fn cpu(ram_words: usize) -> Cpu {
    Cpu::new(ram_words, 16, DeviceSet::default()).unwrap()
}

#[test]
fn scenario_1_mov_ri_then_halt() {
    let mut c = cpu(8);
    c.load_program(&[Opcode::MovRI as i32, register::BX as i32, 42, Opcode::Halt as i32]);
    c.run();
    assert_eq!(c.register(register::BX), 42);
}

#[test]
fn scenario_2_prn_ii() {
    let console = CapturingConsole::default();
    let devices = DeviceSet::new().with_console(console.clone());
    let mut c = Cpu::new(8, 16, devices).unwrap();

    c.load_program(&[Opcode::PrnII as i32, 42, Opcode::Halt as i32]);
    c.run();

    assert_eq!(console.lines.borrow().last().map(String::as_str), Some("42"));
}

#[test]
fn scenario_3_mov_mm_copies_the_word_at_the_source_address() {
    let mut c = cpu(40);
    // Park the source and destination cells well past the instruction stream so
    // neither MOV_MM operand aliases a word the program itself occupies.
    c.load_program(&[
        Opcode::MovMI as i32, 4100, 777, // RAM[4100] = 777
        Opcode::MovMM as i32, 4104, 4100, // RAM[4104] = RAM[4100]
        Opcode::Halt as i32,
    ]);
    c.run();
    assert_eq!(c.peek_word(4104), 777);
}

#[test]
fn scenario_4_stack_is_lifo_through_push_and_pop_opcodes() {
    let mut c = cpu(32);
    c.load_program(&[
        Opcode::PushI as i32, 1,
        Opcode::PushI as i32, 2,
        Opcode::PushI as i32, 3,
        Opcode::PushI as i32, 4,
        Opcode::PopR as i32, register::AX as i32,
        Opcode::PopR as i32, register::BX as i32,
        Opcode::PopR as i32, register::CX as i32,
        Opcode::PopR as i32, register::DX as i32,
        Opcode::Halt as i32,
    ]);
    c.run();

    assert_eq!(c.register(register::AX), 4);
    assert_eq!(c.register(register::BX), 3);
    assert_eq!(c.register(register::CX), 2);
    assert_eq!(c.register(register::DX), 1);
    assert_eq!(c.register(register::SP), 0);
}

#[test]
fn scenario_5_cmp_and_je_take_the_jump_on_equality() {
    let mut c = cpu(64);
    // Addresses are byte addresses, words are 4 bytes; lay out explicitly so the
    // jump target is easy to follow.
    //
    //   4000: MOV_RI AX 7
    //   4012: MOV_RI BX 7
    //   4024: CMP_RR AX BX
    //   4036: JE_I 4060
    //   4044: MOV_RI AX 0
    //   4056: HALT
    //   4060: MOV_RI AX 1
    //   4072: HALT
    c.load_program(&[
        Opcode::MovRI as i32, register::AX as i32, 7,       // 4000..4012
        Opcode::MovRI as i32, register::BX as i32, 7,       // 4012..4024
        Opcode::CmpRR as i32, register::AX as i32, register::BX as i32, // 4024..4036
        Opcode::JeI as i32, 4060,                           // 4036..4044
        Opcode::MovRI as i32, register::AX as i32, 0,       // 4044..4056
        Opcode::Halt as i32,                                // 4056..4060
        Opcode::MovRI as i32, register::AX as i32, 1,       // 4060..4072
        Opcode::Halt as i32,                                // 4072..4076
    ]);
    c.run();

    assert_eq!(c.register(register::AX), 1);
}

#[test]
fn scenario_6_divide_by_zero_traps_to_the_invalid_access_vector() {
    let mut c = cpu(64);
    // Install a trap handler at 3000 by writing it through MOV_MI before the fault,
    // since the vector table lives in the (writable, non-device-field) part of the
    // device region rather than RAM.
    c.load_program(&[
        Opcode::MovMI as i32, 3000, Opcode::IncR as i32,   // word at 3000 = IncR
        Opcode::MovMI as i32, 3004, register::CX as i32,   // word at 3004 = CX operand
        Opcode::MovMI as i32, 3008, Opcode::Halt as i32,   // word at 3008 = Halt
        Opcode::MovRI as i32, register::AX as i32, 10,
        Opcode::DivRI as i32, register::AX as i32, 0,      // traps to 3000
        Opcode::Halt as i32,                               // unreached if the trap fires
    ]);
    c.run();

    assert_eq!(c.register(register::CX), 1);
}
