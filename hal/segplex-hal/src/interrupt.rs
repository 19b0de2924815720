//! Interrupt nesting control
//!
//! The display refresh runs inside the timer overflow handler and performs
//! a blocking bus write. Some bus transports finish their transfers from
//! their own interrupt, which would never run while the timer handler has
//! interrupts masked. Such hosts re-enable interrupts at the start of the
//! handler through this trait, making the handler reentrant.

/// Re-enables interrupts from inside an interrupt handler
pub trait InterruptNesting {
    /// Allow other (and the same) interrupt sources to preempt the
    /// currently running handler
    fn allow_nesting(&mut self);
}

/// Nesting control for polled bus transports
///
/// Leaves the interrupt mask alone. Use it when the I2C transport does
/// not depend on interrupts to complete a transfer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNesting;

impl InterruptNesting for NoNesting {
    fn allow_nesting(&mut self) {}
}

impl<N: InterruptNesting + ?Sized> InterruptNesting for &mut N {
    fn allow_nesting(&mut self) {
        (**self).allow_nesting();
    }
}
