//! The render loop: [`Engine`] owns a validated [`Module`], the compiled
//! device graph it flattens into, and all per-channel/per-voice playback
//! state, and advances them one chunk at a time (§2, §6.2).

use std::ops::Range;

use tracing::{debug, trace, warn};

use crate::channel::ChannelState;
use crate::error::{Error, Result};
use crate::event::types::Event;
use crate::graph::{DeviceGraph, Edge, MASTER};
use crate::master_params::MasterParams;
use crate::module::Module;
use crate::processor::ProcessorKind;
use crate::sequencer;
use crate::tstamp::Tstamp;
use crate::voice::pool::VoicePool;

pub const DEFAULT_CHANNEL_COUNT: usize = 16;
pub const DEFAULT_VOICE_POOL_CAPACITY: usize = 256;
const DEFAULT_AUDIO_RATE: i32 = 48000;
const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Host-tunable engine parameters (SPEC_FULL §A.3), the struct form of what
/// the reference engine exposes through individual setter calls.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    pub audio_rate: i32,
    pub buffer_size: usize,
    pub voice_pool_capacity: usize,
    pub channel_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            audio_rate: DEFAULT_AUDIO_RATE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            voice_pool_capacity: DEFAULT_VOICE_POOL_CAPACITY,
            channel_count: DEFAULT_CHANNEL_COUNT,
        }
    }
}

/// One module's processors and edges flattened into a single [`DeviceGraph`]
/// (see the module-level note on [`crate::module`] about the inter-unit
/// chaining simplification this implies).
struct CompiledGraph {
    graph: DeviceGraph,
    au_ranges: Vec<Range<usize>>,
}

fn compile_graph(module: &Module, pool_capacity: usize, buffer_size: usize, audio_rate: i32) -> Result<CompiledGraph> {
    let mut processors: Vec<ProcessorKind> = Vec::new();
    let mut edges: Vec<Edge> = Vec::new();
    let mut au_ranges = Vec::with_capacity(module.audio_units.len());

    for au in &module.audio_units {
        let offset = processors.len();
        au_ranges.push(offset..offset + au.processors.len());
        processors.extend(au.processors.iter().cloned());
        for e in &au.edges {
            let src = if e.src == MASTER { MASTER } else { e.src + offset };
            let dst = if e.dst == MASTER { MASTER } else { e.dst + offset };
            edges.push(Edge { src, src_port: e.src_port, dst, dst_port: e.dst_port });
        }
    }

    let graph = DeviceGraph::new(processors, edges, pool_capacity, buffer_size, audio_rate)?;
    Ok(CompiledGraph { graph, au_ranges })
}

/// The top-level render entry point (§6.2): load a module, validate it,
/// then pull audio out chunk by chunk with [`Engine::play`].
pub struct Engine {
    config: EngineConfig,
    module: Module,
    compiled: Option<CompiledGraph>,
    validated: bool,
    params: MasterParams,
    channels: Vec<ChannelState>,
    pool: VoicePool,
    out_l: Vec<f32>,
    out_r: Vec<f32>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let params = MasterParams::new(config.channel_count, 0);
        let channels = (0..config.channel_count).map(|i| ChannelState::new(i as u64)).collect();
        let pool = VoicePool::new(config.voice_pool_capacity);
        Engine {
            config,
            module: Module::new(),
            compiled: None,
            validated: false,
            params,
            channels,
            pool,
            out_l: Vec::new(),
            out_r: Vec::new(),
        }
    }

    /// Replace the loaded module. Invalidates any previous `validate()`
    /// until the caller revalidates.
    pub fn load_module(&mut self, module: Module) {
        self.module = module;
        self.compiled = None;
        self.validated = false;
    }

    /// Run §6.1's cross-reference checks and compile the device graph. Must
    /// succeed before [`Engine::play`] will render anything.
    pub fn validate(&mut self) -> Result<()> {
        self.module.validate()?;
        let compiled = compile_graph(&self.module, self.config.voice_pool_capacity, self.config.buffer_size, self.config.audio_rate)?;
        self.compiled = Some(compiled);
        self.validated = true;
        debug!(audio_units = self.module.audio_units.len(), "module validated and graph compiled");
        Ok(())
    }

    pub fn set_audio_rate(&mut self, rate: i32) -> Result<()> {
        if rate <= 0 {
            return Err(Error::Argument("audio rate must be a positive, valid sample rate".into()));
        }
        self.config.audio_rate = rate;
        self.recompile_if_validated()
    }

    pub fn set_buffer_size(&mut self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(Error::Argument("buffer size must be a positive, valid frame count".into()));
        }
        self.config.buffer_size = size;
        self.recompile_if_validated()
    }

    fn recompile_if_validated(&mut self) -> Result<()> {
        if self.validated {
            self.validate()?;
        }
        Ok(())
    }

    /// Silence every voice and rewind playback to the start of track 0,
    /// keeping the loaded module and a freshly re-seeded RNG (§6.2).
    pub fn reset(&mut self) {
        self.pool.reset_all();
        self.params.reset(self.config.channel_count, 0);
        for (i, channel) in self.channels.iter_mut().enumerate() {
            channel.reset(i as u64);
        }
        self.out_l.clear();
        self.out_r.clear();
    }

    /// Apply one event directly to a channel, bypassing the pattern event
    /// map — the host-facing equivalent of a note played live from a
    /// keyboard rather than read from a score.
    pub fn fire_event(&mut self, channel_idx: usize, event: &Event) -> Result<()> {
        let Some(compiled) = &self.compiled else {
            return Err(Error::Argument("engine is not valid: call validate() first".into()));
        };
        if channel_idx >= self.channels.len() {
            return Err(Error::Argument(format!("channel {channel_idx} out of range")));
        }
        crate::event::dispatcher::dispatch(
            event,
            channel_idx,
            &compiled.au_ranges,
            compiled.graph.processors(),
            &mut self.params,
            &mut self.channels,
            &mut self.pool,
            self.config.audio_rate,
        );
        trace!(channel = channel_idx, event = %event.name, "fired event");
        Ok(())
    }

    /// Render up to `frames` frames, advancing the sequencer across row and
    /// pattern-instance boundaries, stopping early if the song ends.
    /// Returns the number of frames actually produced.
    pub fn play(&mut self, frames: usize) -> Result<usize> {
        let Some(compiled) = &mut self.compiled else {
            return Err(Error::Argument("engine is not valid: call validate() first".into()));
        };

        let mut produced = 0usize;
        while produced < frames {
            let Some(song) = self.module.song(self.params.track) else { break };
            let Some(pat_ref) = song.order.get(self.params.system).copied() else { break };
            let Some(pattern) = self.module.pattern_for(pat_ref) else { break };

            sequencer::dispatch_events_at_row(
                pattern,
                &self.module.bindings,
                &compiled.au_ranges,
                compiled.graph.processors(),
                &mut self.params,
                &mut self.channels,
                &mut self.pool,
                self.config.audio_rate,
            );

            let remaining = frames - produced;
            let chunk = sequencer::frames_until_next_boundary(
                pattern,
                &self.params,
                remaining.min(self.config.buffer_size),
                self.config.audio_rate,
            );

            compiled.graph.render_chunk(&mut self.pool, chunk, self.params.tempo, self.config.audio_rate);
            let (l, r) = compiled.graph.master_output();
            self.out_l.extend_from_slice(&l.as_slice()[..chunk]);
            self.out_r.extend_from_slice(&r.as_slice()[..chunk]);

            self.params.row = self.params.row + Tstamp::from_frames(chunk as f64, self.params.tempo, self.config.audio_rate);
            self.params.total_frames += chunk as u64;
            produced += chunk;

            if self.params.row >= pattern.length {
                self.params.system += 1;
                self.params.row = Tstamp::ZERO;
                self.params.reset_cursors();
                if self.module.song(self.params.track).and_then(|s| s.order.get(self.params.system)).is_none() {
                    warn!(track = self.params.track, "song order exhausted, stopping playback");
                    break;
                }
            }
        }

        Ok(produced)
    }

    pub fn get_frames_available(&self) -> usize {
        self.out_l.len()
    }

    /// Drain every rendered frame produced so far as a pair of buffers
    /// `(left, right)`.
    pub fn get_audio(&mut self) -> (Vec<f32>, Vec<f32>) {
        (std::mem::take(&mut self.out_l), std::mem::take(&mut self.out_r))
    }

    pub fn last_event_error(&self) -> Option<&str> {
        self.params.last_event_error.as_deref()
    }

    pub fn voice_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn foreground_group_of(&self, channel_idx: usize) -> Option<u64> {
        self.channels.get(channel_idx).map(|c| c.foreground_group).filter(|&g| g != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types::EventArg;
    use crate::graph::port::PortKind;
    use crate::module::{Album, AudioUnit, PatInstRef, Pattern, Song};
    use crate::ordered_map::OrderedMap;
    use crate::processor::force::ForceConfig;
    use crate::processor::oscillator::{OscillatorConfig, Waveform};
    use crate::processor::pitch::PitchConfig;

    fn simple_instrument() -> AudioUnit {
        AudioUnit {
            is_instrument: true,
            processors: vec![
                ProcessorKind::Pitch(PitchConfig::default()),
                ProcessorKind::Force(ForceConfig::default()),
                ProcessorKind::Oscillator(OscillatorConfig { waveform: Waveform::Sine, noise_integration_order: 0 }),
            ],
            edges: vec![
                Edge { src: 0, src_port: PortKind::Pitch, dst: 2, dst_port: PortKind::Pitch },
                Edge { src: 1, src_port: PortKind::Force, dst: 2, dst_port: PortKind::Force },
                Edge { src: 2, src_port: PortKind::Audio, dst: MASTER, dst_port: PortKind::MasterLeft },
                Edge { src: 2, src_port: PortKind::Audio, dst: MASTER, dst_port: PortKind::MasterRight },
            ],
        }
    }

    fn module_with_one_note() -> Module {
        let mut pattern = Pattern::new(Tstamp::from_beats(4), DEFAULT_CHANNEL_COUNT);
        let mut map = OrderedMap::new();
        map.insert(Tstamp::ZERO, Event::new("set_audio_unit", EventArg::Int(0)));
        map.insert(Tstamp::ZERO, Event::new("note_on", EventArg::Float(0.0)));
        pattern.channels[0] = map;

        Module {
            album: Some(Album { tracks: vec![0] }),
            songs: vec![Song { order: vec![PatInstRef { pattern: 0, instance: 0 }] }],
            patterns: vec![pattern],
            audio_units: vec![simple_instrument()],
            bindings: vec![],
        }
    }

    #[test]
    fn play_before_validate_is_rejected() {
        let mut engine = Engine::new(EngineConfig::default());
        let err = engine.play(64).unwrap_err();
        assert!(matches!(err, Error::Argument(msg) if msg.contains("valid")));
    }

    #[test]
    fn silent_module_produces_silence() {
        let mut engine = Engine::new(EngineConfig { audio_rate: 48000, buffer_size: 256, voice_pool_capacity: 8, channel_count: 1 });
        let pattern = Pattern::new(Tstamp::from_beats(1), 1);
        engine.load_module(Module {
            album: Some(Album { tracks: vec![0] }),
            songs: vec![Song { order: vec![PatInstRef { pattern: 0, instance: 0 }] }],
            patterns: vec![pattern],
            audio_units: vec![],
            bindings: vec![],
        });
        engine.validate().unwrap();
        let produced = engine.play(512).unwrap();
        assert!(produced > 0);
        let (l, r) = engine.get_audio();
        assert!(l.iter().all(|&x| x == 0.0));
        assert!(r.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn note_on_produces_nonzero_audio() {
        let mut engine = Engine::new(EngineConfig { audio_rate: 48000, buffer_size: 256, voice_pool_capacity: 8, channel_count: DEFAULT_CHANNEL_COUNT });
        engine.load_module(module_with_one_note());
        engine.validate().unwrap();
        let produced = engine.play(4096).unwrap();
        assert!(produced > 0);
        let (l, _r) = engine.get_audio();
        let energy: f32 = l.iter().map(|x| x.abs()).sum();
        assert!(energy > 0.0);
    }

    #[test]
    fn reset_clears_voices_and_rewinds() {
        let mut engine = Engine::new(EngineConfig { audio_rate: 48000, buffer_size: 256, voice_pool_capacity: 8, channel_count: DEFAULT_CHANNEL_COUNT });
        engine.load_module(module_with_one_note());
        engine.validate().unwrap();
        engine.play(1024).unwrap();
        assert!(engine.voice_count() > 0);
        engine.reset();
        assert_eq!(engine.voice_count(), 0);
        assert_eq!(engine.get_frames_available(), 0);
    }

    #[test]
    fn fire_event_before_validate_is_rejected() {
        let mut engine = Engine::new(EngineConfig::default());
        let err = engine.fire_event(0, &Event::new("note_off", EventArg::None)).unwrap_err();
        assert!(matches!(err, Error::Argument(msg) if msg.contains("valid")));
    }
}
