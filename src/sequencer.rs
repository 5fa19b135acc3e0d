//! Walks a pattern's per-channel event maps against [`MasterParams`]'s row
//! cursor, firing events through [`crate::event::dispatcher::dispatch`] and
//! telling the caller how many frames can be rendered before the next row
//! boundary (§4.6).

use std::ops::Range;

use crate::channel::ChannelState;
use crate::event::dispatcher;
use crate::event::types::Event;
use crate::master_params::MasterParams;
use crate::module::{Binding, Pattern};
use crate::processor::ProcessorKind;
use crate::tstamp::Tstamp;
use crate::voice::pool::VoicePool;

/// How many frames can be rendered from `params.row` before either the next
/// scheduled event or the end of the pattern is reached, capped at
/// `max_frames`. Always returns at least 1 so playback keeps making forward
/// progress even when an event lands on every single frame.
pub fn frames_until_next_boundary(pattern: &Pattern, params: &MasterParams, max_frames: usize, audio_rate: i32) -> usize {
    let mut nearest = pattern.length - params.row;

    for (channel_idx, cursor) in params.cursors.iter().enumerate() {
        let Some(channel_map) = pattern.channels.get(channel_idx) else { continue };
        if let Some((key, _)) = channel_map.at(*cursor) {
            let distance = *key - params.row;
            if distance < nearest {
                nearest = distance;
            }
        }
    }

    let frames = nearest.to_frames(params.tempo, audio_rate).floor().max(0.0) as usize;
    frames.clamp(1, max_frames.max(1))
}

/// Fire every event scheduled at the current row on every channel, then run
/// the module's bindings once against everything that fired this row.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_events_at_row(
    pattern: &Pattern,
    bindings: &[Binding],
    au_ranges: &[Range<usize>],
    processors: &[ProcessorKind],
    params: &mut MasterParams,
    channels: &mut [ChannelState],
    pool: &mut VoicePool,
    audio_rate: i32,
) {
    let mut fired: Vec<(usize, Event)> = Vec::new();

    for channel_idx in 0..channels.len() {
        let Some(channel_map) = pattern.channels.get(channel_idx) else { continue };
        loop {
            let cursor = params.cursors[channel_idx];
            let Some((&key, events)) = channel_map.at(cursor) else { break };
            if key != params.row {
                break;
            }
            for event in events {
                dispatcher::dispatch(event, channel_idx, au_ranges, processors, params, channels, pool, audio_rate);
                fired.push((channel_idx, event.clone()));
            }
            let (next, _) = channel_map.step(cursor);
            params.cursors[channel_idx] = next;
        }
    }

    dispatcher::run_bindings(bindings, &fired, channels.len(), au_ranges, processors, params, channels, pool, audio_rate, 0);
}
