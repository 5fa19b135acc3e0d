//! Num-list and Map parameter containers (`p_ln_*`/`p_nm_*`/`p_hm_*`).
//!
//! All three are simple immutable loader-provided tables; they get their
//! own small types rather than collapsing into `Vec<f64>` so callers don't
//! confuse a note map's pitch-to-sample-index lookup with a plain number
//! list.

/// A flat list of numbers (`p_ln_*`), e.g. arpeggio offsets.
#[derive(Debug, Clone, Default)]
pub struct NumList(Vec<f64>);

impl NumList {
    pub fn new(values: Vec<f64>) -> Self {
        NumList(values)
    }

    pub fn get(&self, i: usize) -> Option<f64> {
        self.0.get(i).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single note/hit map entry: a cent range mapped to a sample/processor
/// selector and a playback pitch/force adjustment.
#[derive(Debug, Clone, Copy)]
pub struct MapEntry {
    pub cents_lo: f64,
    pub cents_hi: f64,
    pub selector: u32,
    pub pitch_offset_cents: f64,
    pub force_offset_db: f64,
}

/// A note map (`p_nm_*`) or hit map (`p_hm_*`): ranges of input pitch/hit
/// index to an output selector plus pitch/force adjustment.
#[derive(Debug, Clone, Default)]
pub struct Map(Vec<MapEntry>);

impl Map {
    pub fn new(entries: Vec<MapEntry>) -> Self {
        Map(entries)
    }

    /// First entry whose `[cents_lo, cents_hi)` range contains `cents`.
    pub fn lookup(&self, cents: f64) -> Option<&MapEntry> {
        self.0.iter().find(|e| cents >= e.cents_lo && cents < e.cents_hi)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
