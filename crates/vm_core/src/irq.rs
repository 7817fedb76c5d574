//! Interrupt controller: pending-interrupt tracking and dispatch to fixed vectors (§4.5).
//!
//! There is no priority queue. A device asserts an interrupt by enqueuing a
//! [`DeviceEvent`] into a small thread-safe FIFO; the CPU drains that FIFO once between
//! any two user instructions (§5), latches the event's data into the device region, and
//! — if the event is still live after any mask/polarity filtering — pushes the vector
//! address onto an internal ready queue for dispatch.

use std::sync::mpsc;

use crate::bus::layout;

/// A raw event crossing the host/CPU boundary, as produced by a device binding running
/// on its own thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    Keyboard { code: i32, down: bool },
    Mouse { x: i32, y: i32, mask: i32 },
    /// Switch `index` (0..32) changed to `level`.
    Switch { index: u32, level: bool },
    /// Timer `n` (0..4) expired.
    Timer(usize),
    /// User-defined interrupt `n` (0..4), raised by a host-level collaborator.
    UserDefined(usize),
    NetIn,
    NetOut,
    DnsResolved,
}

/// Cloneable, `Send` handle used by device threads to raise interrupts. Modeled on the
/// teacher project's `mpsc::Sender` handed out to its audio-callback thread.
#[derive(Clone)]
pub struct InterruptHandle {
    sender: mpsc::Sender<DeviceEvent>,
}

impl InterruptHandle {
    /// Enqueue an event. Silently dropped if the owning CPU has been destroyed.
    pub fn raise(&self, event: DeviceEvent) {
        let _ = self.sender.send(event);
    }
}

pub struct InterruptController {
    receiver: mpsc::Receiver<DeviceEvent>,
    handle: InterruptHandle,
    /// Vectors ready for dispatch, FIFO order.
    ready: std::collections::VecDeque<i32>,
}

impl InterruptController {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            receiver,
            handle: InterruptHandle { sender },
            ready: std::collections::VecDeque::new(),
        }
    }

    /// A cloneable handle that host device threads can use to raise interrupts.
    pub fn handle(&self) -> InterruptHandle {
        self.handle.clone()
    }

    /// Directly enqueue a user-defined interrupt, as used by [`crate::Cpu::raise_user_interrupt`].
    pub fn raise_now(&mut self, vector: i32) {
        self.ready.push_back(vector);
    }

    /// True if at least one interrupt is ready for dispatch.
    pub fn has_pending(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Pop the next vector ready for dispatch, in FIFO order.
    pub fn pop_ready(&mut self) -> Option<i32> {
        self.ready.pop_front()
    }

    /// Drain every event waiting on the channel. Each is translated to a latch (applied
    /// via `latch`) and, unless filtered out (switch mask/polarity), queued for dispatch.
    pub fn drain(
        &mut self,
        mut latch: impl FnMut(&DeviceEvent),
        switch_irq_mask: i32,
        switch_polarity: i32,
    ) {
        while let Ok(event) = self.receiver.try_recv() {
            latch(&event);

            let vector = match event {
                DeviceEvent::Keyboard { .. } => Some(layout::VEC_KEYBOARD),
                DeviceEvent::Mouse { .. } => Some(layout::VEC_MOUSE),
                DeviceEvent::Timer(n) => layout::VEC_TIMER.get(n).copied(),
                DeviceEvent::UserDefined(n) => layout::VEC_USER.get(n).copied(),
                DeviceEvent::NetIn => Some(layout::VEC_NET_IN),
                DeviceEvent::NetOut => Some(layout::VEC_NET_OUT),
                DeviceEvent::DnsResolved => Some(layout::VEC_DNS),
                DeviceEvent::Switch { index, level } => {
                    let enabled = (switch_irq_mask >> index) & 1 == 1;
                    let rising = (switch_polarity >> index) & 1 == 1;
                    if enabled && level == rising {
                        Some(layout::VEC_PIN)
                    } else {
                        None
                    }
                }
            };

            if let Some(vector) = vector {
                self.ready.push_back(vector);
            }
        }
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}
