//! Linear (STFT) and Mel spectrograms in decibels, ready for plotting.
//!
//! ```no_run
//! use spectrogram_core::{audio, compute, TransformParameters};
//!
//! let signal = audio::decode_file("clip.wav".as_ref())?;
//! let result = compute(&signal, &TransformParameters::Standard { fft_size: 2048, hop_length: 512 })?;
//! println!("{} bins x {} frames", result.rows, result.columns);
//! # Ok::<(), spectrogram_core::SpectrogramError>(())
//! ```

pub mod audio;
pub mod controls;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod types;

pub use engine::{compute, EngineOptions, SpectrogramEngine, MEL_FFT_SIZE, MEL_HOP_LENGTH};
pub use error::{Result, SpectrogramError};
pub use types::{AudioSignal, FrequencyAxis, SpectrogramResult, TransformParameters};
