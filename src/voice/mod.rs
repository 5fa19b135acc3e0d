//! Voice, Voice Group, and Voice Pool: the fixed-capacity, priority-stealing
//! note allocator.

pub mod group;
pub mod pool;
pub mod voice;

pub use group::VoiceGroup;
pub use pool::VoicePool;
pub use voice::{Priority, Voice};
