//! Scalar modulators with slide and tempo awareness: `Slider`, `Lfo`, and
//! `LinearControl`.

pub mod lfo;
pub mod linear;
pub mod slider;

pub use lfo::Lfo;
pub use linear::LinearControl;
pub use slider::Slider;
