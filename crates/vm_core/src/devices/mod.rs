//! Device bindings: the narrow capability contracts the CPU calls into.
//!
//! Every binding is optional; a missing binding makes the matching device region inert
//! rather than an error (§7.3 of the spec). Keyboard and mouse are not represented as
//! capability traits here because the spec describes them as *asynchronous* sources:
//! the host thread pushes events through [`crate::irq::InterruptHandle`] instead of the
//! CPU calling out to them, the same way the teacher project's audio device pushes
//! samples through an `mpsc` channel rather than being polled.

use crate::bus::layout::LCD_VRAM_WORDS;

/// Pushes frames of video memory to a screen and reacts to clear/diagnostic triggers.
pub trait Lcd {
    /// Push `LCD_VRAM_WORDS` packed words of video memory to the screen.
    fn write(&mut self, frame: &[i32; LCD_VRAM_WORDS]);

    /// Clear the screen. Triggered by the LCD control register's clear bit.
    fn clear(&mut self) {}

    /// Render a fixed diagnostic pattern. Triggered by the LCD control register's
    /// diagnostic bit.
    fn diagnostic_pattern(&mut self) {}
}

/// Appends a line of text to a console pane. Used by the `PRN*` opcode family.
pub trait Console {
    fn print(&mut self, text: &str);
}

/// 32 boolean LED outputs, addressed as a single bitmask.
pub trait Leds {
    fn set(&mut self, bitmask: u32);
}

/// Sampled on demand whenever the machine reads the switches value field.
pub trait Switches {
    /// Current state of all 32 switches, one bit per switch.
    fn sample(&mut self) -> u32;
}

/// No-op binding used whenever a device is absent.
#[derive(Default)]
pub struct NoDevice;

impl Lcd for NoDevice {
    fn write(&mut self, _frame: &[i32; LCD_VRAM_WORDS]) {}
}

impl Console for NoDevice {
    fn print(&mut self, _text: &str) {}
}

impl Leds for NoDevice {
    fn set(&mut self, _bitmask: u32) {}
}

impl Switches for NoDevice {
    fn sample(&mut self) -> u32 {
        0
    }
}

/// The set of device bindings a [`crate::Cpu`] is constructed with. Any field left
/// unset falls back to [`NoDevice`], so the matching device region is simply inert
/// (§7.3) rather than an error.
pub struct DeviceSet {
    pub lcd: Box<dyn Lcd>,
    pub console: Box<dyn Console>,
    pub leds: Box<dyn Leds>,
    pub switches: Box<dyn Switches>,
}

impl DeviceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lcd(mut self, lcd: impl Lcd + 'static) -> Self {
        self.lcd = Box::new(lcd);
        self
    }

    pub fn with_console(mut self, console: impl Console + 'static) -> Self {
        self.console = Box::new(console);
        self
    }

    pub fn with_leds(mut self, leds: impl Leds + 'static) -> Self {
        self.leds = Box::new(leds);
        self
    }

    pub fn with_switches(mut self, switches: impl Switches + 'static) -> Self {
        self.switches = Box::new(switches);
        self
    }
}

impl Default for DeviceSet {
    fn default() -> Self {
        Self {
            lcd: Box::new(NoDevice),
            console: Box::new(NoDevice),
            leds: Box::new(NoDevice),
            switches: Box::new(NoDevice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_device_is_inert() {
        let mut dev = NoDevice;
        dev.write(&[0; LCD_VRAM_WORDS]);
        dev.clear();
        dev.diagnostic_pattern();
        Console::print(&mut dev, "ignored");
        Leds::set(&mut dev, 0xffff_ffff);
        assert_eq!(Switches::sample(&mut dev), 0);
    }
}
