use crate::error::{Result, SpectrogramError};
use realfft::num_complex::Complex;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

thread_local! {
    static FFT_PLANNER: RefCell<RealFftPlanner<f32>> = RefCell::new(RealFftPlanner::new());
    static HANN_CACHE: RefCell<HashMap<usize, Arc<Vec<f32>>>> = RefCell::new(HashMap::new());
}

/// Periodic Hann window (denominator `size`), as used for spectral analysis.
pub fn hann_window(size: usize) -> Arc<Vec<f32>> {
    HANN_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .entry(size)
            .or_insert_with(|| {
                Arc::new(
                    (0..size)
                        .map(|i| {
                            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
                        })
                        .collect(),
                )
            })
            .clone()
    })
}

/// How the signal edges are padded when frames are centred.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadMode {
    #[default]
    Zeros,
    Reflect,
}

/// Where analysis windows are placed relative to the signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Windows start at sample 0 and never run past the end; no padding.
    #[default]
    Valid,
    /// Frame `t` is centred on sample `t * hop`; edges padded by `fft_size / 2`.
    Centered(PadMode),
}

/// Number of frames produced for a signal of `len` samples.
///
/// Returns 0 when `Framing::Valid` and the signal is shorter than one window.
pub fn frame_count(len: usize, fft_size: usize, hop_length: usize, framing: Framing) -> usize {
    let padded = match framing {
        Framing::Valid => len,
        Framing::Centered(_) => len + 2 * (fft_size / 2),
    };
    if padded < fft_size || hop_length == 0 {
        return 0;
    }
    (padded - fft_size) / hop_length + 1
}

/// A real-valued time/frequency grid, row-major by frequency bin:
/// `data[bin * frames + frame]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    pub bins: usize,
    pub frames: usize,
    pub data: Vec<f32>,
}

impl Spectrum {
    pub fn row(&self, bin: usize) -> &[f32] {
        &self.data[bin * self.frames..(bin + 1) * self.frames]
    }
}

/// STFT magnitude `|X|` with `fft_size / 2 + 1` bins per frame.
pub fn stft_magnitude(
    samples: &[f32],
    fft_size: usize,
    hop_length: usize,
    framing: Framing,
) -> Result<Spectrum> {
    stft_map(samples, fft_size, hop_length, framing, |c| c.norm())
}

/// STFT power `|X|²` with `fft_size / 2 + 1` bins per frame.
pub fn stft_power(
    samples: &[f32],
    fft_size: usize,
    hop_length: usize,
    framing: Framing,
) -> Result<Spectrum> {
    stft_map(samples, fft_size, hop_length, framing, |c| c.norm_sqr())
}

fn stft_map(
    samples: &[f32],
    fft_size: usize,
    hop_length: usize,
    framing: Framing,
    reduce: impl Fn(Complex<f32>) -> f32,
) -> Result<Spectrum> {
    if fft_size == 0 || hop_length == 0 {
        return Err(SpectrogramError::invalid(format!(
            "fft_size ({fft_size}) and hop_length ({hop_length}) must be positive"
        )));
    }

    let padded;
    let source: &[f32] = match framing {
        Framing::Valid => samples,
        Framing::Centered(mode) => {
            padded = pad_edges(samples, fft_size / 2, mode)?;
            &padded
        }
    };

    let frames = frame_count(samples.len(), fft_size, hop_length, framing);
    if frames == 0 {
        return Err(SpectrogramError::invalid(format!(
            "signal of {} samples is shorter than the {fft_size}-sample window",
            samples.len()
        )));
    }

    let fft = FFT_PLANNER.with(|p| p.borrow_mut().plan_fft_forward(fft_size));
    let window = hann_window(fft_size);
    let bins = fft_size / 2 + 1;

    // Pre-allocate FFT buffers once and reuse across frames
    let mut input = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();
    let mut scratch = fft.make_scratch_vec();
    let mut data = vec![0.0f32; bins * frames];

    for frame in 0..frames {
        let pos = frame * hop_length;
        for (inp, (&s, &w)) in input
            .iter_mut()
            .zip(source[pos..pos + fft_size].iter().zip(window.iter()))
        {
            *inp = s * w;
        }

        fft.process_with_scratch(&mut input, &mut spectrum, &mut scratch)
            .map_err(|e| SpectrogramError::invalid(format!("forward FFT failed: {e}")))?;

        for (bin, &c) in spectrum.iter().enumerate() {
            data[bin * frames + frame] = reduce(c);
        }
    }

    Ok(Spectrum { bins, frames, data })
}

/// Pad `pad` samples on both sides of the signal.
fn pad_edges(samples: &[f32], pad: usize, mode: PadMode) -> Result<Vec<f32>> {
    let n = samples.len();
    let mut padded = Vec::with_capacity(n + 2 * pad);
    match mode {
        PadMode::Zeros => {
            padded.resize(pad, 0.0);
            padded.extend_from_slice(samples);
            padded.resize(n + 2 * pad, 0.0);
        }
        PadMode::Reflect => {
            if pad > 0 && n <= pad {
                return Err(SpectrogramError::invalid(format!(
                    "reflect padding of {pad} samples needs a signal longer than {pad} samples, got {n}"
                )));
            }
            // Mirror around the edge samples without repeating them
            padded.extend((1..=pad).rev().map(|i| samples[i]));
            padded.extend_from_slice(samples);
            padded.extend((1..=pad).map(|i| samples[n - 1 - i]));
        }
    }
    Ok(padded)
}
