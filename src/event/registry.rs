//! Static event name → argument shape table, modelled on `Event_names.c`
//! (SPEC_FULL §B.1). The dispatcher checks an event against this table
//! before applying it, so an unrecognised name or a wrongly-typed argument
//! is dropped and recorded (§7) rather than silently misinterpreted.

use crate::event::types::ArgShape;

/// The argument shape a known event name expects, or `None` if the name
/// isn't recognised at all.
pub fn expected_shape(name: &str) -> Option<ArgShape> {
    if let Some(rest) = name.strip_prefix("stream:") {
        return if rest.is_empty() { None } else { Some(ArgShape::Float) };
    }

    let shape = match name {
        "note_on" => ArgShape::Float,
        "note_off" => ArgShape::None,
        "hit" => ArgShape::Int,
        "set_audio_unit" => ArgShape::Int,

        "force" => ArgShape::Float,
        "force_slide" => ArgShape::Float,
        "tremolo_speed" => ArgShape::Float,
        "tremolo_depth" => ArgShape::Float,
        "tremolo_off" => ArgShape::None,
        "carry_force_on" => ArgShape::None,
        "carry_force_off" => ArgShape::None,

        "pitch_slide" => ArgShape::Float,
        "vibrato_speed" => ArgShape::Float,
        "vibrato_depth" => ArgShape::Float,
        "vibrato_off" => ArgShape::None,
        "arpeggio_on" => ArgShape::None,
        "arpeggio_off" => ArgShape::None,
        "carry_pitch_on" => ArgShape::None,
        "carry_pitch_off" => ArgShape::None,

        "tempo" => ArgShape::Float,
        "volume" => ArgShape::Float,
        "sustain" => ArgShape::Bool,
        "jump_counter" => ArgShape::Int,
        "jump_to_system" => ArgShape::Int,
        "pattern_delay" => ArgShape::Time,

        _ => return None,
    };
    Some(shape)
}
