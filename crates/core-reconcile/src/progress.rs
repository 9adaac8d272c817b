//! Advisory progress reporting for reconciliation passes.

/// Receives coarse percent-complete updates (`0..=100`) during a pass.
///
/// Purely advisory: implementations must not block and nothing in the engine
/// depends on what they do with the value.
pub trait ProgressSink {
    fn report(&self, percent: u8);
}

/// Sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u8) {}
}

impl<F> ProgressSink for F
where
    F: Fn(u8),
{
    fn report(&self, percent: u8) {
        self(percent)
    }
}

/// Percentage of `done` out of `total`, clamped to `0..=100`.
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let p = done.saturating_mul(100) / total;
    p.min(100) as u8
}
