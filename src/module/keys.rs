//! Device parameter key parsing: the `p_*` suffix convention of §6.1,
//! modelled on `Device_field.c`'s key-to-type dispatch. This is the
//! minimal parsing the core needs to accept typed parameter values from an
//! external loader without re-deriving the loader itself (SPEC_FULL §B.2).

use crate::error::{Error, Result};
use crate::param::envelope::Envelope;
use crate::param::numlist::{Map, NumList};
use crate::param::sample::Sample;
use crate::tstamp::Tstamp;
use std::sync::Arc;

/// The type a `p_*` key suffix declares, before the loader's raw value is
/// parsed into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Bool,
    Int,
    Float,
    Time,
    Envelope,
    SampleParams,
    NoteMap,
    HitMap,
    NumList,
    WavpackSample,
}

/// A typed parameter value handed in by the loader for one key.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Time(Tstamp),
    Envelope(Envelope),
    NoteMap(Map),
    HitMap(Map),
    NumList(NumList),
    Sample(Arc<Sample>),
}

impl ParamValue {
    pub fn kind(&self) -> KeyKind {
        match self {
            ParamValue::Bool(_) => KeyKind::Bool,
            ParamValue::Int(_) => KeyKind::Int,
            ParamValue::Float(_) => KeyKind::Float,
            ParamValue::Time(_) => KeyKind::Time,
            ParamValue::Envelope(_) => KeyKind::Envelope,
            ParamValue::NoteMap(_) => KeyKind::NoteMap,
            ParamValue::HitMap(_) => KeyKind::HitMap,
            ParamValue::NumList(_) => KeyKind::NumList,
            ParamValue::Sample(_) => KeyKind::WavpackSample,
        }
    }
}

/// Classify a loader key (e.g. `"p_f_volume.json"`, `"kick.wv"`) by its
/// suffix convention, without parsing the value itself.
pub fn classify(key: &str) -> Result<KeyKind> {
    let name = key.rsplit('/').next().unwrap_or(key);
    if name.ends_with(".wv") {
        return Ok(KeyKind::WavpackSample);
    }
    let rest = name
        .strip_suffix(".json")
        .ok_or_else(|| Error::format(key, "key suffix", "neither .json nor .wv"))?;

    if rest.starts_with("p_b_") {
        Ok(KeyKind::Bool)
    } else if rest.starts_with("p_i_") {
        Ok(KeyKind::Int)
    } else if rest.starts_with("p_f_") {
        Ok(KeyKind::Float)
    } else if rest.starts_with("p_t_") {
        Ok(KeyKind::Time)
    } else if rest.starts_with("p_e_") {
        Ok(KeyKind::Envelope)
    } else if rest.starts_with("p_sh_") {
        Ok(KeyKind::SampleParams)
    } else if rest.starts_with("p_nm_") {
        Ok(KeyKind::NoteMap)
    } else if rest.starts_with("p_hm_") {
        Ok(KeyKind::HitMap)
    } else if rest.starts_with("p_ln_") {
        Ok(KeyKind::NumList)
    } else {
        Err(Error::format(key, "key prefix", "unrecognised p_* prefix"))
    }
}

/// Check that a parsed value's dynamic type matches what its key's suffix
/// declared, the boundary validation `Device_field.c`'s dispatch performs
/// implicitly by construction and this crate must do explicitly since the
/// loader is untrusted external input.
pub fn check_shape(key: &str, value: &ParamValue) -> Result<()> {
    let expected = classify(key)?;
    if expected == KeyKind::SampleParams {
        // Sample params (p_sh_*) describe a Sample but aren't a ParamValue
        // variant themselves; the loader attaches them to the Sample it
        // builds from the matching `*.wv` key instead.
        return Ok(());
    }
    if value.kind() != expected {
        return Err(Error::format(key, "value type", format!("expected {expected:?}, got {:?}", value.kind())));
    }
    Ok(())
}
