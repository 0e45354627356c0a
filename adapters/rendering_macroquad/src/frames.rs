//! Frame queue shared between the canvas and the window loop.

use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

/// One presented frame waiting to be shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Opaque RGBA pixels, row by row from the top.
    pub rgba: Vec<u8>,
    /// How long the frame stays on screen before the next one.
    pub hold: Duration,
}

#[derive(Debug, Default)]
struct Queue {
    frames: VecDeque<Frame>,
    closing: bool,
}

/// Shared handle to the frames a [`crate::WindowCanvas`] presented and the
/// window has not shown yet.
#[derive(Clone, Debug)]
pub struct FrameFeed {
    width: u32,
    height: u32,
    queue: Rc<RefCell<Queue>>,
}

impl FrameFeed {
    /// Creates an empty feed for frames of the provided size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            queue: Rc::default(),
        }
    }

    /// Size of every frame in the feed.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Queues a frame behind the ones already waiting.
    pub fn push(&self, frame: Frame) {
        self.queue.borrow_mut().frames.push_back(frame);
    }

    /// Takes the oldest waiting frame.
    pub fn pop(&self) -> Option<Frame> {
        self.queue.borrow_mut().frames.pop_front()
    }

    /// Number of frames waiting to be shown.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().frames.len()
    }

    /// Reports whether every presented frame has been shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().frames.is_empty()
    }

    /// Marks the last frame as final: it stays up until the window closes.
    pub fn request_close(&self) {
        self.queue.borrow_mut().closing = true;
    }

    /// Reports whether the program asked to keep its last frame up.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.queue.borrow().closing
    }
}

/// Plays frames from a feed, keeping each one up for its hold.
#[derive(Debug, Default)]
pub(crate) struct FramePlayer {
    remaining: Duration,
}

impl FramePlayer {
    /// Advances the clock by `elapsed` and returns the next frame once the
    /// current one has been up for its hold.
    pub(crate) fn tick(&mut self, feed: &FrameFeed, elapsed: Duration) -> Option<Frame> {
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.is_holding() {
            return None;
        }
        let frame = feed.pop()?;
        self.remaining = frame.hold;
        Some(frame)
    }

    pub(crate) fn is_holding(&self) -> bool {
        !self.remaining.is_zero()
    }
}
