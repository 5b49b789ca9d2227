//! Scan and milestone cues.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::graph::Milestone;

pub const CUE_DURATION: Duration = Duration::from_millis(600);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Scan,
    Milestone(Milestone),
}

impl Cue {
    pub fn sound_name(self) -> &'static str {
        match self {
            Self::Scan => "memonet_nodepop",
            Self::Milestone(Milestone::Radius25) => "node1",
            Self::Milestone(Milestone::Radius50) => "node2",
            Self::Milestone(Milestone::Radius100) => "node3",
            Self::Milestone(Milestone::Radius200) => "node4",
        }
    }
}

pub trait Notifier {
    /// Returns `false` when the cue was dropped because another one is still
    /// playing.
    fn play(&mut self, cue: Cue, label: &str, now: Instant) -> bool;

    fn scan_occurred(&mut self, label: &str, now: Instant) -> bool {
        self.play(Cue::Scan, label, now)
    }

    fn milestone_crossed(&mut self, label: &str, milestone: Milestone, now: Instant) -> bool {
        self.play(Cue::Milestone(milestone), label, now)
    }
}

/// Emits cues as log events, one at a time.
#[derive(Debug)]
pub struct LogNotifier {
    cue_duration: Duration,
    busy_until: Option<Instant>,
}

impl LogNotifier {
    pub fn new(cue_duration: Duration) -> Self {
        Self {
            cue_duration,
            busy_until: None,
        }
    }

    pub fn is_playing(&self, now: Instant) -> bool {
        self.busy_until.is_some_and(|until| now < until)
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new(CUE_DURATION)
    }
}

impl Notifier for LogNotifier {
    fn play(&mut self, cue: Cue, label: &str, now: Instant) -> bool {
        if self.is_playing(now) {
            debug!(cue = cue.sound_name(), label, "cue suppressed while another plays");
            return false;
        }

        self.busy_until = Some(now + self.cue_duration);
        match cue {
            Cue::Scan => debug!(label, sound = cue.sound_name(), "scan cue"),
            Cue::Milestone(milestone) => info!(
                label,
                radius = milestone.radius(),
                sound = cue.sound_name(),
                "milestone reached"
            ),
        }
        true
    }
}
