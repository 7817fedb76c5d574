//! Core of the assembly-fiddle virtual machine: address space, register file,
//! stack, decoder/executor, and interrupt controller (§1–§9 of the spec). No I/O,
//! no GUI, no filesystem access — callers embed this crate and supply device
//! bindings; see `vm_loader` and `vm_cli` for a concrete driver.

pub mod bus;
pub mod cpu;
pub mod devices;
pub mod irq;
pub mod register;
pub mod stack;

pub use bus::Fault;
pub use cpu::{ConstructError, Cpu, Opcode, OperandKind, StepOutcome};
pub use irq::{DeviceEvent, InterruptHandle};
pub use register::Registers;
pub use stack::StackFault;
