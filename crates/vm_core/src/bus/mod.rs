//! The address space: device region plus RAM, with alignment/range/read-only fault
//! checking (§3, §4.1).

pub mod device_region;
pub mod layout;
pub mod ram;

use std::time::{SystemTime, UNIX_EPOCH};

use vm_util::Bit;

use crate::devices::{Console, DeviceSet, Leds, Lcd, Switches};
use device_region::DeviceRegion;
use ram::Ram;

/// The reason an access was rejected. Exactly one is ever raised per faulting access
/// (§4.1): alignment is checked before range, range before a read-only-field rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Misaligned,
    OutOfRange,
    ReadOnlyWrite,
}

pub struct Bus {
    device_region: DeviceRegion,
    ram: Ram,
    lcd: Box<dyn Lcd>,
    console: Box<dyn Console>,
    leds: Box<dyn Leds>,
    switches: Box<dyn Switches>,
}

impl Bus {
    pub fn new(ram_words: usize, devices: DeviceSet) -> Self {
        Self {
            device_region: DeviceRegion::new(),
            ram: Ram::new(ram_words),
            lcd: devices.lcd,
            console: devices.console,
            leds: devices.leds,
            switches: devices.switches,
        }
    }

    pub fn ram_end(&self) -> i32 {
        self.ram.end()
    }

    pub fn load_program(&mut self, words: &[i32]) {
        self.ram.load_image(words);
    }

    /// Filesystem-convention loading: write `words` starting at `word_index` (§6).
    pub fn write_words_at(&mut self, word_index: usize, words: &[i32]) {
        self.ram.write_words_at(word_index, words);
    }

    /// Read a byte-addressed word. Always returns a best-effort value (§4.1): the
    /// containing word when one can be resolved, zero otherwise. `fault` is set
    /// whenever the access violated alignment or range.
    pub fn load(&mut self, addr: i32) -> (i32, Option<Fault>) {
        let aligned = floor_to_word(addr);
        let misaligned = addr % layout::WORD_SIZE != 0;
        let in_range = (0..self.ram.end()).contains(&aligned);

        let value = if !in_range {
            0
        } else if aligned < layout::DEVICE_REGION_END {
            self.load_device(aligned)
        } else {
            self.ram.load(aligned)
        };

        let fault = if misaligned {
            Some(Fault::Misaligned)
        } else if !in_range {
            Some(Fault::OutOfRange)
        } else {
            None
        };

        (value, fault)
    }

    /// Write a byte-addressed word. A faulting access (misaligned, out of range, or a
    /// read-only device field) performs no write.
    pub fn store(&mut self, addr: i32, val: i32) -> Option<Fault> {
        let aligned = floor_to_word(addr);
        if addr % layout::WORD_SIZE != 0 {
            return Some(Fault::Misaligned);
        }
        if !(0..self.ram.end()).contains(&aligned) {
            return Some(Fault::OutOfRange);
        }
        if aligned < layout::DEVICE_REGION_END {
            if layout::is_read_only_field(aligned) {
                return Some(Fault::ReadOnlyWrite);
            }
            self.store_device(aligned, val);
        } else {
            self.ram.store(aligned, val);
        }
        None
    }

    /// Print to the console. Called directly by the `PRN*` opcodes (§4.6); the
    /// console is not memory-mapped.
    pub fn print(&mut self, text: &str) {
        self.console.print(text);
    }

    /// Latch a keyboard event's data and raise its interrupt (driven by
    /// [`crate::irq::InterruptController::drain`]).
    pub fn latch_keyboard(&mut self, code: i32, down: bool) {
        self.device_region.set(layout::KEYBOARD_CODE, code);
        self.device_region.set(layout::KEYBOARD_DOWN, down as i32);
    }

    pub fn latch_mouse(&mut self, x: i32, y: i32, mask: i32) {
        self.device_region.set(layout::MOUSE_X, x);
        self.device_region.set(layout::MOUSE_Y, y);
        self.device_region.set(layout::MOUSE_MASK, mask);
    }

    /// Update a single switch bit in the sampled-value field.
    pub fn latch_switch(&mut self, index: u32, level: bool) {
        let current = self.device_region.get(layout::SWITCHES_VALUE);
        let updated = current.set_bit(index as usize, level);
        self.device_region.set(layout::SWITCHES_VALUE, updated);
    }

    /// The switch interrupt mask/polarity configuration, consulted by the interrupt
    /// controller when filtering `Switch` events.
    pub fn switch_irq_config(&self) -> (i32, i32) {
        (
            self.device_region.get(layout::SWITCH_IRQ_MASK),
            self.device_region.get(layout::SWITCH_POLARITY),
        )
    }

    /// Timer `n`'s `(period_ms, control)` pair, as written by the emulated program.
    /// Timers aren't ticked by the core itself (no cycle model, §1 Non-goals); a host
    /// timer thread polls this to decide when to raise [`crate::irq::DeviceEvent::Timer`].
    pub fn timer_config(&self, n: usize) -> (i32, i32) {
        (
            self.device_region.get(layout::timer_period_addr(n)),
            self.device_region.get(layout::timer_ctrl_addr(n)),
        )
    }

    fn load_device(&mut self, addr: i32) -> i32 {
        match addr {
            layout::CURRENT_TIME => wall_clock_ms(),
            layout::SWITCHES_VALUE => {
                let sampled = self.switches.sample() as i32;
                self.device_region.set(layout::SWITCHES_VALUE, sampled);
                sampled
            }
            _ => self.device_region.get(addr),
        }
    }

    fn store_device(&mut self, addr: i32, val: i32) {
        self.device_region.set(addr, val);
        match addr {
            layout::LCD_CTRL => self.handle_lcd_ctrl(val),
            layout::LEDS => self.leds.set(val as u32),
            _ => {}
        }
    }

    fn handle_lcd_ctrl(&mut self, ctrl: i32) {
        if ctrl.bit(layout::LCD_CTRL_PRESENT_BIT) {
            let mut frame = [0i32; layout::LCD_VRAM_WORDS];
            frame.copy_from_slice(
                self.device_region.slice(layout::LCD_VRAM_BASE, layout::LCD_VRAM_WORDS),
            );
            self.lcd.write(&frame);
        }
        if ctrl.bit(layout::LCD_CTRL_CLEAR_BIT) {
            self.lcd.clear();
        }
        if ctrl.bit(layout::LCD_CTRL_DIAGNOSTIC_BIT) {
            self.lcd.diagnostic_pattern();
        }
    }
}

/// Round a byte address down to the containing word. Used to resolve a best-effort
/// value even for a misaligned or negative address.
fn floor_to_word(addr: i32) -> i32 {
    addr - addr.rem_euclid(layout::WORD_SIZE)
}

fn wall_clock_ms() -> i32 {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    (ms & 0xFFFF_FFFF) as u32 as i32
}
