//! Immutable PCM sample data, as decoded by the loader from WavPack.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Off,
    Unidirectional,
    Bidirectional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

/// Planar float32 PCM, one `Vec<f32>` per channel, already normalised to
/// `[-1, 1]` regardless of the source bit depth.
#[derive(Debug, Clone)]
pub struct Sample {
    channels: Channels,
    data: Vec<Vec<f32>>,
    /// Storage sample rate of the decoded PCM, distinct from `mid_freq`.
    storage_rate: f64,
    mid_freq: f64,
    loop_mode: LoopMode,
    loop_start: usize,
    loop_end: usize,
}

impl Sample {
    pub fn new(
        channels: Channels,
        data: Vec<Vec<f32>>,
        storage_rate: f64,
        mid_freq: f64,
        loop_mode: LoopMode,
        loop_start: usize,
        loop_end: usize,
    ) -> Self {
        debug_assert_eq!(data.len(), channels.count());
        debug_assert!(loop_mode == LoopMode::Off || loop_start < loop_end);
        Sample {
            channels,
            data,
            storage_rate,
            mid_freq,
            loop_mode,
            loop_start,
            loop_end,
        }
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.data.first().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn storage_rate(&self) -> f64 {
        self.storage_rate
    }

    pub fn mid_freq(&self) -> f64 {
        self.mid_freq
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn loop_start(&self) -> usize {
        self.loop_start
    }

    pub fn loop_end(&self) -> usize {
        self.loop_end
    }

    /// Raw sample at `channel, index`, or `0.0` past the end.
    pub fn at(&self, channel: usize, index: usize) -> f32 {
        self.data
            .get(channel.min(self.data.len() - 1))
            .and_then(|c| c.get(index))
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_len_from_first_channel() {
        let s = Sample::new(Channels::Mono, vec![vec![0.0, 1.0, 2.0]], 48000.0, 48000.0, LoopMode::Off, 0, 0);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn mono_reads_broadcast_across_requested_channel() {
        let s = Sample::new(Channels::Mono, vec![vec![0.5, -0.5]], 48000.0, 48000.0, LoopMode::Off, 0, 0);
        assert_eq!(s.at(0, 1), -0.5);
    }

    #[test]
    fn out_of_range_reads_are_silent() {
        let s = Sample::new(Channels::Mono, vec![vec![1.0]], 48000.0, 48000.0, LoopMode::Off, 0, 0);
        assert_eq!(s.at(0, 5), 0.0);
    }
}
