use crate::pcm::{PcmBuffer, PcmSample};

/// The overlay buffer repeated back to back `loop_count` times.
///
/// Built once per mix call and dropped when the call returns. Only the part
/// the mix can actually reach is materialized; [`len`](Self::len) still
/// reports the full looped length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayWindow {
    samples: Vec<PcmSample>,
    len: usize,
}

impl OverlayWindow {
    /// Concatenate `overlay` with itself `loop_count` times, with no gap or
    /// crossfade between repetitions, keeping at most `limit` samples.
    pub fn build(overlay: &PcmBuffer, loop_count: u32, limit: usize) -> Self {
        let len = overlay.len().saturating_mul(loop_count as usize);
        let samples = overlay
            .as_slice()
            .iter()
            .copied()
            .cycle()
            .take(len.min(limit))
            .collect();
        Self { samples, len }
    }

    /// Length of the full looped window.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sample at `cursor`, or `None` once the window (or the materialized
    /// part of it) is exhausted.
    pub fn get(&self, cursor: usize) -> Option<PcmSample> {
        self.samples.get(cursor).copied()
    }

    pub fn as_slice(&self) -> &[PcmSample] {
        &self.samples
    }
}
