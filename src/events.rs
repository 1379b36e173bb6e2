use std::time::Duration;

use crate::actions::ClickEvent;
use crate::schedule::TimerId;

/// Slide selected by a `goto_slide` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GotoTarget {
    Index(usize),
    Click(ClickEvent),
}

impl From<usize> for GotoTarget {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<ClickEvent> for GotoTarget {
    fn from(click: ClickEvent) -> Self {
        Self::Click(click)
    }
}

/// Programmatic control of a running carousel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    GotoSlide(GotoTarget),
    Play,
    Pause,
}

/// Sequence number of a transition within one carousel, counting from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarouselEvent {
    Command(Command),
    Click(ClickEvent),
    AutoplayElapsed(TimerId),
    /// The environment finished the native (declarative) transition `id`.
    TransitionEnd(TransitionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Sign of the container movement: forward travel moves content left.
    pub fn sign(self) -> f32 {
        match self {
            Self::Forward => -1.0,
            Self::Backward => 1.0,
        }
    }
}

/// One navigation request; `speed` overrides the configured duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest {
    pub to: usize,
    pub direction: Direction,
    pub speed: Option<Duration>,
}

/// Emitted by a carousel once a transition has fully completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideChanged {
    pub from: usize,
    pub to: usize,
}
