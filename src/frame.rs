#[cfg(test)]
#[path = "frame_test.rs"]
mod frame_test;

/// Coalesces high-frequency samples to at most one per animation frame.
///
/// The host calls [`FrameThrottle::offer`] on every event; when it returns
/// `true` a frame callback must be requested. The callback calls
/// [`FrameThrottle::take`] and processes only the latest sample. Only that
/// callback re-arms scheduling: [`FrameThrottle::drain`] (a flush on release)
/// leaves the pending frame in place, so at most one frame is ever requested.
#[derive(Debug, Clone)]
pub struct FrameThrottle<T> {
    latest: Option<T>,
    scheduled: bool,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self { latest: None, scheduled: false }
    }
}

impl<T> FrameThrottle<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sample, replacing any pending one. Returns whether a frame
    /// callback needs to be scheduled.
    pub fn offer(&mut self, sample: T) -> bool {
        self.latest = Some(sample);
        if self.scheduled {
            return false;
        }
        self.scheduled = true;
        true
    }

    /// Take the latest sample from inside the frame callback.
    pub fn take(&mut self) -> Option<T> {
        self.scheduled = false;
        self.latest.take()
    }

    /// Take the latest sample outside a frame callback. A frame already
    /// requested stays requested and will find nothing to do.
    pub fn drain(&mut self) -> Option<T> {
        self.latest.take()
    }

    /// Drop any pending sample (gesture ended before the frame fired).
    pub fn cancel(&mut self) {
        self.latest = None;
    }
}
