//! The validated composition tree handed in by the external loader (§6.1).
//!
//! `Module` is assembled outside this crate — albums, songs, patterns with
//! per-channel event streams, and audio units with their own processor
//! graphs — and the core only ever reads it. The loader owns `.json`/`.wv`
//! parsing, file trees, and resource directories (§1's explicit
//! Non-goals); this module's job is the in-memory shape the render path
//! consumes plus the §6.1 cross-reference checks `Engine::validate` runs.
//!
//! Inter-audio-unit effect chaining (instrument output routed through a
//! separate effect audio unit before the master bus) is not modelled: each
//! audio unit's internal graph connects straight to the master bus when
//! compiled into one flat [`crate::graph::DeviceGraph`] (see
//! `render::compile_graph`). This keeps a single acyclic graph per module
//! without a second layer of inter-unit wiring spec.md does not name as
//! required by any [MODULE]'s invariants.

pub mod keys;

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::event::types::Event;
use crate::graph::port::Edge;
use crate::ordered_map::OrderedMap;
use crate::processor::ProcessorKind;
use crate::tstamp::Tstamp;

/// `(pattern_index, instance_index)` — one occurrence of a pattern in a
/// song's order list. Global invariant (§3): each pair appears at most once
/// across every song's order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatInstRef {
    pub pattern: u32,
    pub instance: u32,
}

/// One pattern: a length plus one ordered event map per channel.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub length: Tstamp,
    pub channels: Vec<OrderedMap<Tstamp, Event>>,
}

impl Pattern {
    pub fn new(length: Tstamp, channel_count: usize) -> Self {
        Pattern { length, channels: (0..channel_count).map(|_| OrderedMap::new()).collect() }
    }
}

/// A song: an order list of pattern instances.
#[derive(Debug, Clone, Default)]
pub struct Song {
    pub order: Vec<PatInstRef>,
}

/// An album: the tracks a host can select between, each naming a song by
/// index into `Module::songs`.
#[derive(Debug, Clone, Default)]
pub struct Album {
    pub tracks: Vec<u32>,
}

/// A composite device (instrument or effect): its own processor table and
/// internal device graph, wired with port connections local to this unit.
#[derive(Debug, Clone)]
pub struct AudioUnit {
    pub is_instrument: bool,
    pub processors: Vec<ProcessorKind>,
    pub edges: Vec<Edge>,
}

impl AudioUnit {
    /// Number of processors in this unit that produce a per-voice signal —
    /// the group size a note-on on this unit reserves from the pool.
    pub fn voice_group_size(&self) -> usize {
        self.processors.iter().filter(|p| p.produces_voice_signal()).count()
    }
}

/// A side-channel event rule (§4.6): firing `source_event` on a channel
/// also fires `target_event` on `channel + channel_offset`, after user
/// events at the same timestamp.
#[derive(Debug, Clone)]
pub struct Binding {
    pub source_event: String,
    pub target_event: String,
    pub channel_offset: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub album: Option<Album>,
    pub songs: Vec<Song>,
    pub patterns: Vec<Pattern>,
    pub audio_units: Vec<AudioUnit>,
    pub bindings: Vec<Binding>,
}

impl Module {
    pub fn new() -> Self {
        Module::default()
    }

    /// §6.1's cross-reference checks. Accumulates every violation found
    /// rather than stopping at the first (SPEC_FULL §A.1), so a loader can
    /// report every problem in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if let Some(album) = &self.album {
            if album.tracks.is_empty() {
                errors.push("album: at least one track required".to_string());
            }
            for (i, &song_idx) in album.tracks.iter().enumerate() {
                if song_idx as usize >= self.songs.len() {
                    errors.push(format!("album.track[{i}]: references nonexistent song {song_idx}"));
                }
            }
        }

        let mut seen_instances: HashSet<(u32, u32)> = HashSet::new();
        for (si, song) in self.songs.iter().enumerate() {
            for (oi, r) in song.order.iter().enumerate() {
                if r.pattern as usize >= self.patterns.len() {
                    errors.push(format!("song[{si}].order[{oi}]: references nonexistent pattern {}", r.pattern));
                    continue;
                }
                if !seen_instances.insert((r.pattern, r.instance)) {
                    errors.push(format!(
                        "song[{si}].order[{oi}]: instance ({}, {}) reused across songs' order lists",
                        r.pattern, r.instance
                    ));
                }
            }
        }

        for (ai, au) in self.audio_units.iter().enumerate() {
            for (ei, e) in au.edges.iter().enumerate() {
                if e.src != crate::graph::port::MASTER && e.src >= au.processors.len() {
                    errors.push(format!("audio_unit[{ai}].edges[{ei}]: src processor index out of range"));
                }
                if e.dst != crate::graph::port::MASTER && e.dst >= au.processors.len() {
                    errors.push(format!("audio_unit[{ai}].edges[{ei}]: dst processor index out of range"));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Format(errors.join("; ")))
        }
    }

    pub fn pattern_for(&self, r: PatInstRef) -> Option<&Pattern> {
        self.patterns.get(r.pattern as usize)
    }

    pub fn song(&self, track: usize) -> Option<&Song> {
        let album = self.album.as_ref()?;
        let song_idx = *album.tracks.get(track)? as usize;
        self.songs.get(song_idx)
    }
}
