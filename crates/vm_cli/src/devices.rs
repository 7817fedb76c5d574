//! Concrete device bindings for the terminal driver: a console that prints to
//! stdout and an LED bank that logs bit changes. Everything else (LCD, switches,
//! keyboard, mouse) stays the inert default — a terminal has nowhere to put them.

use log::info;

use vm_core::devices::{Console, Leds};

pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn print(&mut self, text: &str) {
        println!("{text}");
    }
}

pub struct TerminalLeds;

impl Leds for TerminalLeds {
    fn set(&mut self, bitmask: u32) {
        info!("leds = {bitmask:032b}");
    }
}
