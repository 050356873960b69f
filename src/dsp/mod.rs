pub mod db;
pub mod fft;
pub mod mel;

pub use db::{DecibelScale, Quantity};
pub use fft::{frame_count, Framing, PadMode, Spectrum};
pub use mel::MelFilterbank;
