//! End-to-end scenarios from spec §8, driven entirely through the public
//! `Engine` API rather than the per-module unit tests already living next
//! to each piece of state.

use kunquat_core::event::types::{Event, EventArg};
use kunquat_core::graph::{Edge, PortKind, MASTER};
use kunquat_core::module::{Album, AudioUnit, Module, PatInstRef, Pattern, Song};
use kunquat_core::ordered_map::OrderedMap;
use kunquat_core::processor::debug_pulse::DebugPulseConfig;
use kunquat_core::processor::force::ForceConfig;
use kunquat_core::processor::oscillator::{OscillatorConfig, Waveform};
use kunquat_core::processor::pitch::PitchConfig;
use kunquat_core::processor::ProcessorKind;
use kunquat_core::render::{Engine, EngineConfig};
use kunquat_core::tstamp::Tstamp;

fn pitch_force_osc_instrument() -> AudioUnit {
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

/// Oscillator-only instrument: a single voice-producing processor, so the
/// audio unit's `voice_group_size()` is exactly 1 and every note-on
/// consumes exactly one pool slot — useful for exercising stealing at a
/// known capacity.
fn oscillator_only_instrument() -> AudioUnit {
    AudioUnit {
        is_instrument: true,
        processors: vec![ProcessorKind::Oscillator(OscillatorConfig {
            waveform: Waveform::Sine,
            noise_integration_order: 0,
        })],
        edges: vec![
            Edge { src: 0, src_port: PortKind::Audio, dst: MASTER, dst_port: PortKind::MasterLeft },
            Edge { src: 0, src_port: PortKind::Audio, dst: MASTER, dst_port: PortKind::MasterRight },
        ],
    }
}

/// Pitch-into-debug-pulse instrument used to exercise spec §8's two
/// sample-indexed scenarios against the exact render pipeline (sequencer,
/// device graph, voice pool), not just the processor in isolation.
fn debug_pulse_instrument() -> AudioUnit {
    AudioUnit {
        is_instrument: true,
        processors: vec![
            ProcessorKind::Pitch(PitchConfig::default()),
            ProcessorKind::DebugPulse(DebugPulseConfig::default()),
        ],
        edges: vec![
            Edge { src: 0, src_port: PortKind::Pitch, dst: 1, dst_port: PortKind::Pitch },
            Edge { src: 1, src_port: PortKind::Audio, dst: MASTER, dst_port: PortKind::MasterLeft },
            Edge { src: 1, src_port: PortKind::Audio, dst: MASTER, dst_port: PortKind::MasterRight },
        ],
    }
}

/// Cents value whose `440 * 2^(cents/1200)` frequency is exactly `freq` Hz,
/// so `audio_rate / freq` comes out to a whole-frame pulse period.
fn cents_for_freq(freq: f64) -> f64 {
    1200.0 * (freq / 440.0).log2()
}

fn debug_pulse_module(channel_count: usize, pattern_beats: i64) -> Module {
    let mut pattern = Pattern::new(Tstamp::from_beats(pattern_beats), channel_count);
    let mut map = OrderedMap::new();
    map.insert(Tstamp::ZERO, Event::new("set_audio_unit", EventArg::Int(0)));
    map.insert(Tstamp::ZERO, Event::new("note_on", EventArg::Float(cents_for_freq(16.0))));
    pattern.channels[0] = map;

    Module {
        album: Some(Album { tracks: vec![0] }),
        songs: vec![Song { order: vec![PatInstRef { pattern: 0, instance: 0 }] }],
        patterns: vec![pattern],
        audio_units: vec![debug_pulse_instrument()],
        bindings: vec![],
    }
}

fn single_note_module(channel_count: usize) -> Module {
    let mut pattern = Pattern::new(Tstamp::from_beats(8), channel_count);
    let mut map = OrderedMap::new();
    map.insert(Tstamp::ZERO, Event::new("set_audio_unit", EventArg::Int(0)));
    map.insert(Tstamp::ZERO, Event::new("note_on", EventArg::Float(0.0)));
    pattern.channels[0] = map;

    Module {
        album: Some(Album { tracks: vec![0] }),
        songs: vec![Song { order: vec![PatInstRef { pattern: 0, instance: 0 }] }],
        patterns: vec![pattern],
        audio_units: vec![pitch_force_osc_instrument()],
        bindings: vec![],
    }
}

fn engine_with_note(config: EngineConfig) -> Engine {
    let mut engine = Engine::new(config.clone());
    engine.load_module(single_note_module(config.channel_count));
    engine.validate().unwrap();
    engine
}

/// *Silent composition* (spec §8): an empty pattern of length `[16,0]`
/// renders exactly the requested frame count, all zero, for any `N` within
/// the pattern's length.
#[test]
fn silent_composition_produces_exact_silence() {
    let config = EngineConfig { audio_rate: 48000, buffer_size: 256, voice_pool_capacity: 8, channel_count: 1 };
    let mut engine = Engine::new(config.clone());
    let pattern = Pattern::new(Tstamp::from_beats(16), 1);
    engine.load_module(Module {
        album: Some(Album { tracks: vec![0] }),
        songs: vec![Song { order: vec![PatInstRef { pattern: 0, instance: 0 }] }],
        patterns: vec![pattern],
        audio_units: vec![],
        bindings: vec![],
    });
    engine.validate().unwrap();

    let n = 4000;
    let produced = engine.play(n).unwrap();
    assert_eq!(produced, n);
    let (l, r) = engine.get_audio();
    assert_eq!(l.len(), n);
    assert!(l.iter().all(|&x| x == 0.0));
    assert!(r.iter().all(|&x| x == 0.0));
}

/// Property #7: two consecutive render calls of sizes `a` and `b` must
/// produce the same audio as one call of size `a+b` — no chunk-boundary
/// artefacts from splitting a render into smaller pulls.
#[test]
fn consecutive_render_calls_match_one_larger_call() {
    let config = EngineConfig { audio_rate: 48000, buffer_size: 4096, voice_pool_capacity: 8, channel_count: 16 };

    let mut split = engine_with_note(config.clone());
    split.play(97).unwrap();
    split.play(163).unwrap();
    let (split_l, split_r) = split.get_audio();

    let mut whole = engine_with_note(config);
    whole.play(97 + 163).unwrap();
    let (whole_l, whole_r) = whole.get_audio();

    assert_eq!(split_l, whole_l);
    assert_eq!(split_r, whole_r);
}

/// Property #6: `validate(); reset(); play(N); reset(); play(N)` must
/// produce identical output given the deterministic per-note seeding
/// (SPEC_FULL §B.3) and an unchanged configuration.
#[test]
fn reset_then_replay_is_byte_identical() {
    let config = EngineConfig { audio_rate: 48000, buffer_size: 512, voice_pool_capacity: 8, channel_count: 16 };
    let mut engine = engine_with_note(config);

    engine.play(2000).unwrap();
    let (first_l, first_r) = engine.get_audio();

    engine.reset();
    engine.play(2000).unwrap();
    let (second_l, second_r) = engine.get_audio();

    assert_eq!(first_l, second_l);
    assert_eq!(first_r, second_r);
    assert!(first_l.iter().any(|&x| x != 0.0), "sanity: the note actually produced audio");
}

/// Voice stealing (spec §8): pool capacity 4, four consecutive note-ons on
/// different channels (one voice each, via the oscillator-only instrument)
/// followed by a fifth on an all-foreground pool. The fifth must succeed
/// and the oldest foreground group must be demoted to background.
#[test]
fn fifth_note_on_steals_the_oldest_foreground_voice() {
    let config = EngineConfig { audio_rate: 48000, buffer_size: 256, voice_pool_capacity: 4, channel_count: 5 };
    let mut engine = Engine::new(config.clone());

    let mut pattern = Pattern::new(Tstamp::from_beats(8), config.channel_count);
    for ch in 0..4 {
        let mut map = OrderedMap::new();
        map.insert(Tstamp::ZERO, Event::new("set_audio_unit", EventArg::Int(0)));
        map.insert(Tstamp::ZERO, Event::new("note_on", EventArg::Float(0.0)));
        pattern.channels[ch] = map;
    }

    engine.load_module(Module {
        album: Some(Album { tracks: vec![0] }),
        songs: vec![Song { order: vec![PatInstRef { pattern: 0, instance: 0 }] }],
        patterns: vec![pattern],
        audio_units: vec![oscillator_only_instrument()],
        bindings: vec![],
    });
    engine.validate().unwrap();

    // Row 0 fires all four note-ons in one sequencer pass.
    engine.play(64).unwrap();
    assert_eq!(engine.voice_count(), 4);
    assert!(engine.foreground_group_of(0).is_some());

    // A fifth note-on, fired directly (bypassing the pattern timeline),
    // must still succeed by stealing the oldest foreground group rather
    // than being dropped — the pool is at capacity but never overflows.
    engine.fire_event(4, &Event::new("set_audio_unit", EventArg::Int(0))).unwrap();
    engine.fire_event(4, &Event::new("note_on", EventArg::Float(0.0))).unwrap();

    assert_eq!(engine.voice_count(), 4, "pool stays at capacity after stealing, never overflows");
    assert!(engine.foreground_group_of(4).is_some(), "the fifth note-on succeeded");
}

/// An unknown event name is dropped at dispatch time and recorded as the
/// most recent event error (spec §7), rather than panicking or silently
/// misinterpreting the argument.
#[test]
fn unknown_event_is_dropped_and_recorded() {
    let config = EngineConfig::default();
    let mut engine = Engine::new(config.clone());
    engine.load_module(single_note_module(config.channel_count));
    engine.validate().unwrap();

    assert!(engine.last_event_error().is_none());
    engine.fire_event(0, &Event::new("not_a_real_event", EventArg::None)).unwrap();
    assert!(engine.last_event_error().unwrap().contains("not_a_real_event"));
}

/// Note-off on a held voice with no force-release envelope and no override
/// hits the default linear ramp, which must fully deactivate the voice
/// within the budget spec §8 property 4 names (≈0.6s at 200 dB/s from 0dB).
#[test]
fn note_off_deactivates_voice_within_ramp_budget() {
    let config = EngineConfig { audio_rate: 48000, buffer_size: 512, voice_pool_capacity: 8, channel_count: 16 };
    let mut engine = engine_with_note(config.clone());

    engine.play(256).unwrap();
    assert!(engine.voice_count() > 0, "note-on should have spawned voices");

    engine.fire_event(0, &Event::new("note_off", EventArg::None)).unwrap();

    // 0 dB to -120 dB at 200 dB/s is 0.6s; budget a couple of buffer
    // chunks of slack beyond that for the ramp to actually reach silence
    // and the pool to reclaim the voice.
    let ramp_frames = (0.6 * config.audio_rate as f64) as usize + config.buffer_size * 2;
    engine.play(ramp_frames).unwrap();

    assert_eq!(engine.voice_count(), 0, "voice should be fully released after the ramp budget");
}

/// Debug-pulse, held note (spec §8): at `audio_rate=64` and a 16Hz pitch the
/// pulse period is exactly 4 frames, so a single 128-frame render must carry
/// the peak at indices 0,4,...,36, half-scale at the other indices within
/// the first 10 cycles (0..40), and exact silence for the rest of the chunk.
#[test]
fn debug_pulse_held_note_matches_exact_sample_indices() {
    let config = EngineConfig { audio_rate: 64, buffer_size: 128, voice_pool_capacity: 4, channel_count: 1 };
    let mut engine = Engine::new(config.clone());
    engine.load_module(debug_pulse_module(config.channel_count, 1_000_000));
    engine.validate().unwrap();

    engine.play(128).unwrap();
    let (l, _r) = engine.get_audio();

    for i in (0..40).step_by(4) {
        assert!((l[i] - 1.0).abs() < 1e-6, "index {i} should be the pulse peak, got {}", l[i]);
    }
    for i in 0..40 {
        if i % 4 != 0 {
            assert!((l[i] - 0.5).abs() < 1e-6, "index {i} should be the pulse tail, got {}", l[i]);
        }
    }
    for i in 40..128 {
        assert_eq!(l[i], 0.0, "index {i} should be silent after 10 cycles, got {}", l[i]);
    }
}

/// Debug-pulse, note-off mid-phase (spec §8): note-off fired exactly at
/// frame 20 (a period boundary) truncates the held pattern into a two-cycle
/// negated release tail at indices 20..28, then silence.
#[test]
fn debug_pulse_note_off_mid_phase_emits_negated_release_tail() {
    let config = EngineConfig { audio_rate: 64, buffer_size: 128, voice_pool_capacity: 4, channel_count: 1 };
    let mut engine = Engine::new(config.clone());
    engine.load_module(debug_pulse_module(config.channel_count, 1_000_000));
    engine.validate().unwrap();

    engine.play(20).unwrap();
    engine.fire_event(0, &Event::new("note_off", EventArg::None)).unwrap();
    engine.play(108).unwrap();
    let (l, _r) = engine.get_audio();

    for i in (20..28).step_by(4) {
        assert!((l[i] - (-1.0)).abs() < 1e-6, "index {i} should be the negated peak, got {}", l[i]);
    }
    for i in 20..28 {
        if (i - 20) % 4 != 0 {
            assert!((l[i] - (-0.5)).abs() < 1e-6, "index {i} should be the negated tail, got {}", l[i]);
        }
    }
    for i in 28..128 {
        assert_eq!(l[i], 0.0, "index {i} should be silent after the release tail, got {}", l[i]);
    }
}
