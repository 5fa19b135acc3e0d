//! A single voice: one live instance of a voice-signal-producing processor.

use crate::processor::VoiceProcState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Inactive,
    Background,
    Foreground,
}

#[derive(Debug)]
pub struct Voice {
    pub priority: Priority,
    pub channel: usize,
    pub group_id: u64,
    /// Index of the processor within its audio unit's device graph that
    /// this voice renders for.
    pub processor_index: usize,
    pub note_on: bool,
    pub frame_offset: usize,
    pub rand_seed: u64,
    pub state: VoiceProcState,
}

impl Voice {
    pub fn inactive() -> Self {
        Voice {
            priority: Priority::Inactive,
            channel: 0,
            group_id: 0,
            processor_index: 0,
            note_on: false,
            frame_offset: 0,
            rand_seed: 0,
            state: VoiceProcState::None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.priority != Priority::Inactive
    }
}
