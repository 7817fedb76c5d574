//! The fetch/decode/execute loop (§4.4) and CPU lifecycle (§3).

mod exec;
pub mod opcode;

use log::{trace, warn};
use thiserror::Error;

use crate::bus::{layout, Bus};
use crate::devices::DeviceSet;
use crate::irq::{DeviceEvent, InterruptController, InterruptHandle};
use crate::register::{self, Registers};
use crate::stack::Stack;

pub use opcode::{Opcode, OperandKind};

/// Refused at construction rather than panicking (§7.3): a non-positive RAM or stack
/// size is a programmer error in the driver, not something the emulated program can
/// cause.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstructError {
    #[error("RAM size must be positive, got {0}")]
    NonPositiveRam(usize),
    #[error("stack size must be positive, got {0}")]
    NonPositiveStack(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Halted,
}

/// Internal result of dispatching a single decoded opcode, before fault/interrupt
/// handling is applied at the instruction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    Normal,
    Halted,
    /// A `PAUSE` whose condition isn't satisfied yet; rewind IP to `resume_ip` so the
    /// same instruction is re-evaluated next step.
    Paused { resume_ip: i32 },
}

pub struct Cpu {
    registers: Registers,
    stack: Stack,
    bus: Bus,
    irq: InterruptController,
    /// Last value written by MOD, read non-destructively by REM. Undefined before the
    /// first MOD (§3); this implementation starts it at zero.
    remainder: i32,
    pending_fault: bool,
}

impl Cpu {
    pub fn new(
        ram_words: usize,
        stack_words: usize,
        devices: DeviceSet,
    ) -> Result<Self, ConstructError> {
        if ram_words == 0 {
            return Err(ConstructError::NonPositiveRam(ram_words));
        }
        if stack_words == 0 {
            return Err(ConstructError::NonPositiveStack(stack_words));
        }

        Ok(Self {
            registers: Registers::new(),
            stack: Stack::new(stack_words),
            bus: Bus::new(ram_words, devices),
            irq: InterruptController::new(),
            remainder: 0,
            pending_fault: false,
        })
    }

    /// Load a program verbatim into RAM, starting at byte 4000 (§6). Must be called
    /// before [`Cpu::run`].
    pub fn load_program(&mut self, words: &[i32]) {
        self.bus.load_program(words);
    }

    /// Filesystem-convention loading (§6): write `words` starting at word index
    /// `word_index`, used by `vm_loader` rather than by program authors directly.
    pub fn write_words_at(&mut self, word_index: usize, words: &[i32]) {
        self.bus.write_words_at(word_index, words);
    }

    /// A cloneable, `Send` handle a host device thread uses to raise interrupts.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.irq.handle()
    }

    /// Directly enqueue one of the four user-defined interrupts (§4.5). Out-of-range
    /// indices are silently ignored, matching the "missing device is inert" policy
    /// (§7.3) applied to a host collaborator that doesn't exist.
    pub fn raise_user_interrupt(&mut self, n: usize) {
        if let Some(&vector) = layout::VEC_USER.get(n) {
            self.irq.raise_now(vector);
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn register(&self, idx: usize) -> i32 {
        self.registers.get(idx)
    }

    pub fn remainder(&self) -> i32 {
        self.remainder
    }

    pub fn stack_peek(&self, sp: i32) -> Option<i32> {
        self.stack.peek(sp)
    }

    /// Read a word from the address space for introspection (tests, a driver's
    /// debugger/state dump) without otherwise affecting fault state or devices
    /// beyond the normal read side effects (current-time refresh, switch sampling).
    pub fn peek_word(&mut self, addr: i32) -> i32 {
        self.bus.load(addr).0
    }

    /// Timer `n`'s `(period_ms, control)` configuration, for a host timer thread
    /// deciding when to raise [`crate::irq::DeviceEvent::Timer`] (§4.6.1).
    pub fn timer_config(&self, n: usize) -> (i32, i32) {
        self.bus.timer_config(n)
    }

    /// Run until HALT or a program that walks IP outside every addressable region.
    pub fn run(&mut self) {
        loop {
            if self.step() == StepOutcome::Halted {
                break;
            }
        }
    }

    /// Execute exactly one instruction (or one PAUSE re-check), draining and
    /// dispatching pending device interrupts at the following boundary (§5).
    pub fn step(&mut self) -> StepOutcome {
        let instr_ip = self.registers.ip();

        // A program that walks IP past the end of RAM without ever executing HALT
        // (§4.4 step 4) stops the loop here, before the fetch. Left unguarded, the
        // fetch would fault out-of-range, trap to 3000, and — absent a handler
        // there — fault on the reserved `Inv` word forever. Vector/handler code
        // below `RAM_BASE` (e.g. a trap handler installed at 3000, §4.5) is
        // unaffected: this only bounds the top of the range.
        if instr_ip >= self.bus.ram_end() {
            return StepOutcome::Halted;
        }

        let op_word = self.load_word(instr_ip);
        self.registers.incr_ip(1);

        let opcode = Opcode::from_word(op_word).unwrap_or_else(|| {
            warn!("decoded an unrecognised opcode word {op_word} at {instr_ip:#x}");
            self.raise_fault();
            Opcode::Inv
        });

        if opcode == Opcode::Inv {
            self.raise_fault();
        }

        let outcome = if opcode == Opcode::Inv {
            DispatchOutcome::Normal
        } else {
            trace!("exec {opcode:?} at {instr_ip:#x}");
            self.execute(opcode, instr_ip)
        };

        if self.pending_fault {
            self.pending_fault = false;
            self.registers.set_ip(layout::VEC_INVALID_ACCESS);
            return StepOutcome::Continue;
        }

        match outcome {
            DispatchOutcome::Halted => return StepOutcome::Halted,
            DispatchOutcome::Paused { resume_ip } => self.registers.set_ip(resume_ip),
            DispatchOutcome::Normal => {}
        }

        self.service_interrupts();
        StepOutcome::Continue
    }

    /// Drain every waiting device event, latching its data, then dispatch at most the
    /// oldest ready interrupt (§4.5, §5). Delivering more than one here would chain-push
    /// return addresses without letting any handler run in between, turning the FIFO
    /// into a LIFO; the remaining ready vectors stay queued for the next boundary, once
    /// this one's handler has RET'd.
    fn service_interrupts(&mut self) {
        let (switch_mask, switch_polarity) = self.bus.switch_irq_config();
        let bus = &mut self.bus;

        self.irq.drain(
            |event| match *event {
                DeviceEvent::Keyboard { code, down } => bus.latch_keyboard(code, down),
                DeviceEvent::Mouse { x, y, mask } => bus.latch_mouse(x, y, mask),
                DeviceEvent::Switch { index, level } => bus.latch_switch(index, level),
                DeviceEvent::Timer(_)
                | DeviceEvent::UserDefined(_)
                | DeviceEvent::NetIn
                | DeviceEvent::NetOut
                | DeviceEvent::DnsResolved => {}
            },
            switch_mask,
            switch_polarity,
        );

        if let Some(vector) = self.irq.pop_ready() {
            self.deliver_interrupt(vector);
        }
    }

    /// Push the current IP and jump to `vector`. Unlike a synchronous fault, this is
    /// resumable: the handler returns via RET (§4.5).
    fn deliver_interrupt(&mut self, vector: i32) {
        match self.stack.push(self.registers.sp(), self.registers.ip()) {
            Ok(new_sp) => {
                self.registers.set_sp(new_sp);
                self.registers.set_ip(vector);
            }
            Err(_) => {
                warn!("stack overflow entering interrupt vector {vector:#x}");
                self.registers.set_ip(layout::VEC_INVALID_ACCESS);
            }
        }
    }

    fn raise_fault(&mut self) {
        self.pending_fault = true;
    }

    /// Read a word from the address space, marking a pending fault on any access
    /// violation. Still returns the best-effort value (§4.1).
    fn load_word(&mut self, addr: i32) -> i32 {
        let (value, fault) = self.bus.load(addr);
        if fault.is_some() {
            self.raise_fault();
        }
        value
    }

    fn store_word(&mut self, addr: i32, val: i32) {
        if self.bus.store(addr, val).is_some() {
            self.raise_fault();
        }
    }

    /// Set IP, immediately faulting if the target is misaligned (§3 invariant), rather
    /// than waiting for the next fetch to discover it.
    fn set_ip_checked(&mut self, addr: i32) {
        if addr % layout::WORD_SIZE != 0 {
            self.raise_fault();
        }
        self.registers.set_ip(addr);
    }

    fn resolve_reg_index(&mut self, raw: i32) -> Option<usize> {
        if register::is_valid_index(raw) {
            Some(raw as usize)
        } else {
            self.raise_fault();
            None
        }
    }

    /// Resolve an operand's value: the immediate word itself, the named register's
    /// contents, or the word loaded from the named address (§4.4).
    fn resolve(&mut self, kind: OperandKind, raw: i32) -> i32 {
        match kind {
            OperandKind::Imm => raw,
            OperandKind::Reg => self
                .resolve_reg_index(raw)
                .map(|idx| self.registers.get(idx))
                .unwrap_or(0),
            OperandKind::Mem => self.load_word(raw),
        }
    }

    /// Write a value back to a destination operand. `Imm` is never a legal
    /// destination; the opcode table never produces one in first position.
    fn write_back(&mut self, kind: OperandKind, raw: i32, value: i32) {
        match kind {
            OperandKind::Reg => {
                if let Some(idx) = self.resolve_reg_index(raw) {
                    self.registers.set(idx, value);
                }
            }
            OperandKind::Mem => self.store_word(raw, value),
            OperandKind::Imm => unreachable!("immediate operand used as a destination"),
        }
    }

    fn fetch_operand(&mut self) -> i32 {
        let addr = self.registers.ip();
        self.registers.incr_ip(1);
        self.load_word(addr)
    }
}
