//! # kunquat-core — real-time render core of the Kunquat synthesis engine
//!
//! This crate is the render-time heart of Kunquat: given a validated
//! [`module::Module`] (a content-addressed composition tree assembled by an
//! external loader) and a caller-chosen audio rate and buffer size, it
//! produces planar stereo PCM, sample-accurately, from a timeline of
//! patterns whose per-channel event streams drive channel state, spawn and
//! steal voices, and flow through a per-audio-unit device graph of
//! processors (oscillators, sample players, filters, envelope generators,
//! delays).
//!
//! ## Scope
//!
//! In scope: the event-driven sequencer, the voice pool/group lifecycle,
//! the device graph with mixed/voice dual-path processing, and the
//! processor state machines that synthesise and shape audio. Deliberately
//! out of scope (treated as external collaborators the host wires up):
//! persistent storage (`.json`/`.wv` loading, file trees), JSON streaming,
//! CLI framing, OSC/host messaging, sound-driver backends, and the
//! composition-editing/undo surface. See `SPEC_FULL.md` for the full
//! accounting.
//!
//! ## Entry point
//!
//! [`render::Engine`] is the host-facing API: [`render::Engine::load_module`]
//! installs a [`module::Module`], [`render::Engine::validate`] runs the
//! §6.1 cross-reference checks and compiles the device graph,
//! [`render::Engine::play`] renders chunks of PCM, and
//! [`render::Engine::fire_event`] injects host-originated control events
//! (note on/off, parameter sets) outside of the pattern timeline.
//!
//! ```no_run
//! use kunquat_core::render::{Engine, EngineConfig};
//! use kunquat_core::module::Module;
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! engine.load_module(Module::new());
//! engine.validate().unwrap();
//! let produced = engine.play(2048).unwrap();
//! let (left, right) = engine.get_audio();
//! assert_eq!(left.len(), produced);
//! ```

pub mod channel;
pub mod control;
pub mod error;
pub mod event;
pub mod graph;
pub mod master_params;
pub mod module;
pub mod ordered_map;
pub mod param;
pub mod processor;
pub mod render;
pub mod sequencer;
pub mod tstamp;
pub mod voice;
pub mod work_buffer;

pub use error::{Error, Result};
pub use render::{Engine, EngineConfig};
