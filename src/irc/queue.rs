//! Rate-limited outbound line queue.
//!
//! The chat service drops clients that send more than a fixed number of lines
//! per time window. Lines are queued FIFO and released on each driver tick
//! while the current window still has budget.

use crate::irc::transport::Transport;
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

/// Fixed send budget over a fixed time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindow {
    budget: u32,
    remaining: u32,
    window: Duration,
    elapsed: Duration,
}

impl RateWindow {
    pub fn new(budget: u32, window: Duration) -> Self {
        Self {
            budget,
            remaining: budget,
            window,
            elapsed: Duration::ZERO,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Add `elapsed` to the window clock, starting a fresh window once it
    /// reaches the window length.
    pub fn advance(&mut self, elapsed: Duration) {
        self.elapsed += elapsed;
        if self.elapsed >= self.window {
            self.restart(0);
        }
    }

    /// Start a new window with `consumed` lines already charged to it.
    pub fn restart(&mut self, consumed: u32) {
        self.elapsed = Duration::ZERO;
        self.remaining = self.budget.saturating_sub(consumed);
    }

    /// Charge one line if budget remains.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// Charge one line unconditionally. Used for forced sends.
    pub fn consume(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// FIFO of outbound lines gated by a [`RateWindow`].
#[derive(Debug)]
pub struct OutboundQueue {
    lines: VecDeque<String>,
    window: RateWindow,
}

impl OutboundQueue {
    pub fn new(window: RateWindow) -> Self {
        Self {
            lines: VecDeque::new(),
            window,
        }
    }

    pub fn enqueue(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn window(&self) -> &RateWindow {
        &self.window
    }

    pub fn advance(&mut self, elapsed: Duration) {
        self.window.advance(elapsed);
    }

    /// Start a new window with `consumed` lines already sent outside the queue.
    pub fn restart_window(&mut self, consumed: u32) {
        self.window.restart(consumed);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Send queued lines from the head while the window has budget, then
    /// flush once if anything was written or the transport still holds output
    /// from an earlier drain. Returns the number of lines sent.
    pub fn drain(&mut self, transport: &mut dyn Transport) -> io::Result<usize> {
        let mut sent = 0;
        while !self.lines.is_empty() && self.window.try_consume() {
            if let Some(line) = self.lines.pop_front() {
                transport.write_line(&line)?;
                sent += 1;
            }
        }
        if sent > 0 || transport.has_pending() {
            transport.flush()?;
        }
        Ok(sent)
    }

    /// Write and flush `line` immediately, bypassing queued lines. The line is
    /// still charged to the current window.
    pub fn send_forced(&mut self, transport: &mut dyn Transport, line: &str) -> io::Result<()> {
        transport.write_line(line)?;
        transport.flush()?;
        self.window.consume();
        Ok(())
    }
}
