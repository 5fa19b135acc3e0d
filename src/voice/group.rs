//! The set of voices spawned by a single note-on on a channel.

/// A read-only view over one group's member voice indices in the pool.
#[derive(Debug, Clone)]
pub struct VoiceGroup {
    pub group_id: u64,
    pub channel: usize,
    pub voice_indices: Vec<usize>,
}

/// Monotonically increasing group id allocator. Group ids are never reused.
#[derive(Debug, Default)]
pub struct GroupIdAllocator {
    next: u64,
}

impl GroupIdAllocator {
    pub fn new() -> Self {
        GroupIdAllocator { next: 1 }
    }

    pub fn next(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}
