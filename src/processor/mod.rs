//! Per-kind processor state machines (§4.5).
//!
//! Per spec §9's re-architecture notes, the reference engine's tagged
//! union of processor types becomes an enum of per-kind config/state
//! structs here instead of a trait object: the device graph matches on
//! [`ProcessorKind`] to call the right module's free functions, and voice
//! state is an enum rather than a type-erased byte arena since Rust gives
//! us a safe tagged union for free.

pub mod bitcrush;
pub mod chorus;
pub mod debug_pulse;
pub mod envgen;
pub mod filter;
pub mod force;
pub mod freeverb;
pub mod looper;
pub mod oscillator;
pub mod pitch;
pub mod sample_player;
pub mod time_env;

/// Static configuration for one processor instance in an audio unit's
/// device graph, as assembled from the `Module` tree.
#[derive(Debug, Clone)]
pub enum ProcessorKind {
    Pitch(pitch::PitchConfig),
    Force(force::ForceConfig),
    Oscillator(oscillator::OscillatorConfig),
    SamplePlayer(sample_player::SamplePlayerConfig),
    EnvGen(envgen::EnvGenConfig),
    DebugPulse(debug_pulse::DebugPulseConfig),
    Bitcrush(bitcrush::BitcrushConfig),
    Filter(filter::FilterConfig),
    Freeverb(freeverb::FreeverbConfig),
    Chorus(chorus::ChorusConfig),
    Looper(looper::LooperConfig),
}

impl ProcessorKind {
    /// Whether this processor kind produces a voice (per-note) signal, as
    /// opposed to running only at the mixed level.
    pub fn produces_voice_signal(&self) -> bool {
        matches!(
            self,
            ProcessorKind::Pitch(_)
                | ProcessorKind::Force(_)
                | ProcessorKind::Oscillator(_)
                | ProcessorKind::SamplePlayer(_)
                | ProcessorKind::EnvGen(_)
                | ProcessorKind::DebugPulse(_)
        )
    }
}

/// Per-voice state block. A voice holds exactly one variant, matching the
/// processor it was spawned for.
#[derive(Debug, Clone)]
pub enum VoiceProcState {
    None,
    Pitch(pitch::PitchVoiceState),
    Force(force::ForceVoiceState),
    Oscillator(oscillator::OscillatorVoiceState),
    SamplePlayer(sample_player::SamplePlayerVoiceState),
    EnvGen(envgen::EnvGenVoiceState),
    DebugPulse(debug_pulse::DebugPulseVoiceState),
}

/// Per-device mixed-level state, persistent across render calls for
/// devices that aren't per-voice (filters, delays, reverb).
#[derive(Debug, Clone)]
pub enum MixedProcState {
    None,
    Bitcrush(bitcrush::BitcrushState),
    Filter(filter::FilterState),
    Freeverb(freeverb::FreeverbState),
    Chorus(chorus::ChorusState),
    Looper(looper::LooperState),
}

impl MixedProcState {
    pub fn new_for(kind: &ProcessorKind, audio_rate: i32) -> Self {
        match kind {
            ProcessorKind::Bitcrush(_) => MixedProcState::Bitcrush(bitcrush::BitcrushState::new()),
            ProcessorKind::Filter(_) => MixedProcState::Filter(filter::FilterState::new()),
            ProcessorKind::Freeverb(cfg) => {
                MixedProcState::Freeverb(freeverb::FreeverbState::new(audio_rate, cfg.stereo_spread_frames))
            }
            ProcessorKind::Chorus(_) => MixedProcState::Chorus(chorus::ChorusState::new(audio_rate)),
            ProcessorKind::Looper(cfg) => MixedProcState::Looper(looper::LooperState::new(cfg)),
            _ => MixedProcState::None,
        }
    }
}

/// Initialise a fresh per-voice state block for the processor kind spawned
/// at note-on, seeded deterministically (§4.7 step 6).
pub fn init_voice_state(kind: &ProcessorKind, pitch_cents: f64, seed: u64) -> VoiceProcState {
    match kind {
        ProcessorKind::Pitch(_) => VoiceProcState::Pitch(pitch::PitchVoiceState::new(pitch_cents)),
        ProcessorKind::Force(_) => VoiceProcState::Force(force::ForceVoiceState::new(0.0)),
        ProcessorKind::Oscillator(cfg) => {
            VoiceProcState::Oscillator(oscillator::OscillatorVoiceState::new(seed, cfg.noise_integration_order))
        }
        ProcessorKind::SamplePlayer(_) => VoiceProcState::SamplePlayer(sample_player::SamplePlayerVoiceState::new()),
        ProcessorKind::EnvGen(_) => VoiceProcState::EnvGen(envgen::EnvGenVoiceState::new()),
        ProcessorKind::DebugPulse(_) => VoiceProcState::DebugPulse(debug_pulse::DebugPulseVoiceState::new()),
        _ => VoiceProcState::None,
    }
}

/// Uniform `fire_event(state, name, arg)` entry point (§4.5): dispatches to
/// whichever variant carries event-sensitive state. Kinds with no runtime
/// event handling (oscillator, sample player, env gen) ignore the call.
pub fn fire_event_on_voice(
    state: &mut VoiceProcState,
    name: &str,
    arg: crate::event::types::EventArg,
    tempo: f64,
    audio_rate: i32,
) {
    match state {
        VoiceProcState::Force(vs) => vs.fire_event(name, arg, tempo, audio_rate),
        VoiceProcState::Pitch(vs) => vs.fire_event(name, arg, tempo, audio_rate),
        _ => {}
    }
}
