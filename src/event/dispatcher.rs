//! Applies one parsed [`Event`] to channel/master state, spawning or
//! releasing voices as needed (§4.6, §4.7).
//!
//! The dispatcher never looks at a pattern's event map directly — the
//! sequencer walks that and calls [`dispatch`] once per fired event — so it
//! has no notion of "current row" beyond what [`MasterParams`] already
//! carries.

use std::ops::Range;

use crate::channel::{mix_seed, ChannelState};
use crate::control::LinearControl;
use crate::event::registry;
use crate::event::types::{Event, EventArg};
use crate::master_params::MasterParams;
use crate::processor::{fire_event_on_voice, init_voice_state, ProcessorKind};
use crate::tstamp::Tstamp;
use crate::voice::pool::VoicePool;

/// Side-channel event rules run after user events at a timestamp (§4.6);
/// bounds how many hops a binding chain can trigger before it's cut off.
const MAX_BINDING_DEPTH: u32 = 8;

/// Apply `event`, fired on `channel_idx`, to channel and master state. The
/// audio-unit processor ranges and flat graph processor table let a
/// note-on/hit resolve which processors to spawn voices for; `au_ranges[i]`
/// is the slice of `processors` occupied by the audio unit at index `i`.
#[allow(clippy::too_many_arguments)]
pub fn dispatch(
    event: &Event,
    channel_idx: usize,
    au_ranges: &[Range<usize>],
    processors: &[ProcessorKind],
    params: &mut MasterParams,
    channels: &mut [ChannelState],
    pool: &mut VoicePool,
    audio_rate: i32,
) {
    let Some(expected) = registry::expected_shape(&event.name) else {
        params.record_event_error(format!("unknown event '{}'", event.name));
        return;
    };
    if event.arg.shape() != expected {
        params.record_event_error(format!("event '{}': argument shape mismatch", event.name));
        return;
    }
    if channel_idx >= channels.len() {
        params.record_event_error(format!("event '{}' fired on out-of-range channel {channel_idx}", event.name));
        return;
    }

    let tempo = params.tempo;

    if let Some(stream_name) = event.name.strip_prefix("stream:") {
        if let Some(v) = event.arg.as_float() {
            let carried = channels[channel_idx]
                .streams
                .entry(stream_name.to_string())
                .or_insert_with(|| crate::channel::CarriedStream { control: LinearControl::new(0.0, f64::MIN, f64::MAX), carry: false });
            carried.control.slide_to(v, Tstamp::ZERO);
        }
        return;
    }

    match event.name.as_str() {
        "note_on" => {
            let cents = event.arg.as_float().unwrap_or(0.0);
            channels[channel_idx].pitch.current_cents = cents;
            spawn_note(channel_idx, cents, au_ranges, processors, params, channels, pool);
        }
        "note_off" => release_foreground(channels, pool, channel_idx, tempo, audio_rate),
        "hit" => {
            let index = event.arg.as_int().unwrap_or(0) as f64;
            spawn_note(channel_idx, index, au_ranges, processors, params, channels, pool);
        }
        "set_audio_unit" => {
            channels[channel_idx].audio_unit_index = event.arg.as_int().map(|i| i.max(0) as u32);
        }

        "force" | "force_slide" => {
            if let Some(v) = event.arg.as_float() {
                channels[channel_idx].force.force_db = v;
                let length = if event.name == "force_slide" { Tstamp::from_beats(1) } else { Tstamp::ZERO };
                channels[channel_idx].force.slide.start(v, length);
                forward_to_foreground(channels, pool, channel_idx, &event.name, event.arg, tempo, audio_rate);
            }
        }
        "tremolo_speed" => {
            if let Some(v) = event.arg.as_float() {
                channels[channel_idx].force.tremolo.turn_on();
                channels[channel_idx].force.tremolo.set_speed(v, Tstamp::ZERO);
            }
            forward_to_foreground(channels, pool, channel_idx, &event.name, event.arg, tempo, audio_rate);
        }
        "tremolo_depth" => {
            if let Some(v) = event.arg.as_float() {
                channels[channel_idx].force.tremolo.turn_on();
                channels[channel_idx].force.tremolo.set_depth(v, Tstamp::ZERO);
            }
            forward_to_foreground(channels, pool, channel_idx, &event.name, event.arg, tempo, audio_rate);
        }
        "tremolo_off" => {
            channels[channel_idx].force.tremolo.turn_off();
            forward_to_foreground(channels, pool, channel_idx, &event.name, event.arg, tempo, audio_rate);
        }
        "carry_force_on" => channels[channel_idx].force.carry = true,
        "carry_force_off" => channels[channel_idx].force.carry = false,

        "pitch_slide" => {
            if let Some(v) = event.arg.as_float() {
                channels[channel_idx].pitch.slide.start(v, Tstamp::from_beats(1));
            }
            forward_to_foreground(channels, pool, channel_idx, &event.name, event.arg, tempo, audio_rate);
        }
        "vibrato_speed" => {
            if let Some(v) = event.arg.as_float() {
                channels[channel_idx].pitch.vibrato.turn_on();
                channels[channel_idx].pitch.vibrato.set_speed(v, Tstamp::ZERO);
            }
            forward_to_foreground(channels, pool, channel_idx, &event.name, event.arg, tempo, audio_rate);
        }
        "vibrato_depth" => {
            if let Some(v) = event.arg.as_float() {
                channels[channel_idx].pitch.vibrato.turn_on();
                channels[channel_idx].pitch.vibrato.set_depth(v, Tstamp::ZERO);
            }
            forward_to_foreground(channels, pool, channel_idx, &event.name, event.arg, tempo, audio_rate);
        }
        "vibrato_off" => {
            channels[channel_idx].pitch.vibrato.turn_off();
            forward_to_foreground(channels, pool, channel_idx, &event.name, event.arg, tempo, audio_rate);
        }
        "arpeggio_on" | "arpeggio_off" => {
            forward_to_foreground(channels, pool, channel_idx, &event.name, event.arg, tempo, audio_rate);
        }
        "carry_pitch_on" => channels[channel_idx].pitch.carry = true,
        "carry_pitch_off" => channels[channel_idx].pitch.carry = false,

        "tempo" => {
            if let Some(v) = event.arg.as_float() {
                if v > 0.0 {
                    params.tempo = v;
                }
            }
        }
        "volume" => {
            if let Some(v) = event.arg.as_float() {
                params.global_volume_db = v;
            }
        }
        "sustain" => {
            if let Some(b) = event.arg.as_bool() {
                params.sustain = b;
            }
        }
        "jump_counter" => {
            if let Some(v) = event.arg.as_int() {
                params.jump_counter = v;
            }
        }
        "jump_to_system" => {
            if let Some(v) = event.arg.as_int() {
                if params.jump_counter > 0 {
                    params.jump_counter -= 1;
                    params.system = v.max(0) as usize;
                    params.row = Tstamp::ZERO;
                    params.reset_cursors();
                }
            }
        }
        "pattern_delay" => {
            // The sequencer reads this directly off the event map when it
            // computes the next row boundary; there is no channel/master
            // state to mutate here.
        }
        _ => {}
    }
}

fn release_foreground(channels: &mut [ChannelState], pool: &mut VoicePool, channel_idx: usize, tempo: f64, audio_rate: i32) {
    let group = channels[channel_idx].foreground_group;
    if group == 0 {
        return;
    }
    for v in pool.voices_in_group_mut(group) {
        fire_event_on_voice(&mut v.state, "note_off", EventArg::None, tempo, audio_rate);
    }
    pool.release_group(group);
    channels[channel_idx].foreground_group = 0;
}

fn forward_to_foreground(
    channels: &[ChannelState],
    pool: &mut VoicePool,
    channel_idx: usize,
    name: &str,
    arg: EventArg,
    tempo: f64,
    audio_rate: i32,
) {
    let group = channels[channel_idx].foreground_group;
    if group == 0 {
        return;
    }
    for v in pool.voices_in_group_mut(group) {
        fire_event_on_voice(&mut v.state, name, arg, tempo, audio_rate);
    }
}

/// §4.7's note-on/hit voice-spawn algorithm: release the channel's current
/// foreground group (demoting it to background rather than inactivating it,
/// so it keeps ringing out through its release phase), reserve a fresh
/// group sized to the target audio unit's voice-producing processors, and
/// seed each new voice deterministically from one note-level seed.
fn spawn_note(
    channel_idx: usize,
    pitch_or_index: f64,
    au_ranges: &[Range<usize>],
    processors: &[ProcessorKind],
    params: &mut MasterParams,
    channels: &mut [ChannelState],
    pool: &mut VoicePool,
) {
    let Some(au_idx) = channels[channel_idx].audio_unit_index else {
        return;
    };
    let Some(range) = au_ranges.get(au_idx as usize) else {
        params.record_event_error(format!("note-on: audio unit {au_idx} out of range"));
        return;
    };

    let voice_procs: Vec<usize> = range.clone().filter(|&i| processors[i].produces_voice_signal()).collect();
    let group_size = voice_procs.len();
    if group_size == 0 {
        return;
    }

    let note_seed = channels[channel_idx].derive_seed("note-on");

    // Release the outgoing foreground group before reserving its
    // replacement: reserve()'s steal order is priority-then-group_id, so an
    // old foreground group left un-released would still sort as the
    // earliest-allocated foreground group and could be partially stolen by
    // its own successor instead of cleanly demoted to background.
    let prev = channels[channel_idx].foreground_group;
    if prev != 0 {
        pool.release_group(prev);
        channels[channel_idx].foreground_group = 0;
    }

    let group_id = match pool.reserve(channel_idx, group_size) {
        Ok(id) => id,
        Err(e) => {
            params.record_event_error(format!("note-on dropped: {e}"));
            return;
        }
    };
    channels[channel_idx].foreground_group = group_id;

    let carry_pitch = channels[channel_idx].pitch.clone();
    let carry_force = channels[channel_idx].force.clone();

    let voices = pool.voices_in_group_mut(group_id);
    for (i, (voice, &proc_idx)) in voices.into_iter().zip(voice_procs.iter()).enumerate() {
        let seed = mix_seed(note_seed, &format!("np{i}"));
        voice.processor_index = proc_idx;
        voice.note_on = true;
        voice.rand_seed = seed;
        voice.state = init_voice_state(&processors[proc_idx], pitch_or_index, seed);

        match &mut voice.state {
            crate::processor::VoiceProcState::Pitch(vs) if carry_pitch.carry => {
                vs.base_cents = carry_pitch.current_cents;
                vs.slide = carry_pitch.slide;
                vs.vibrato = carry_pitch.vibrato;
            }
            crate::processor::VoiceProcState::Force(vs) if carry_force.carry => {
                vs.level = crate::control::Slider::new(carry_force.force_db);
                vs.tremolo = carry_force.tremolo;
            }
            _ => {}
        }
    }
}

/// Run a module's side-channel bindings (§4.6) against the events fired at
/// one row, recursively but to a bounded depth so a binding chain that
/// feeds back into itself can't loop forever.
#[allow(clippy::too_many_arguments)]
pub fn run_bindings(
    bindings: &[crate::module::Binding],
    fired: &[(usize, Event)],
    channel_count: usize,
    au_ranges: &[Range<usize>],
    processors: &[ProcessorKind],
    params: &mut MasterParams,
    channels: &mut [ChannelState],
    pool: &mut VoicePool,
    audio_rate: i32,
    depth: u32,
) {
    if depth >= MAX_BINDING_DEPTH || bindings.is_empty() || fired.is_empty() {
        return;
    }

    let mut triggered: Vec<(usize, Event)> = Vec::new();
    for (channel_idx, event) in fired {
        for binding in bindings {
            if binding.source_event != event.name {
                continue;
            }
            let target_channel = *channel_idx as i64 + binding.channel_offset as i64;
            if target_channel < 0 || target_channel as usize >= channel_count {
                continue;
            }
            let target_event = Event::new(binding.target_event.clone(), event.arg);
            dispatch(&target_event, target_channel as usize, au_ranges, processors, params, channels, pool, audio_rate);
            triggered.push((target_channel as usize, target_event));
        }
    }

    if !triggered.is_empty() {
        run_bindings(bindings, &triggered, channel_count, au_ranges, processors, params, channels, pool, audio_rate, depth + 1);
    }
}
