use serde::{Deserialize, Serialize};

/// Decoded mono audio at its native sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSignal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// Average interleaved multi-channel audio down to a single channel.
    ///
    /// A trailing partial frame is dropped. `channels == 0` is treated as mono.
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let samples = if channels == 1 {
            interleaved.to_vec()
        } else {
            let scale = 1.0 / channels as f32;
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() * scale)
                .collect()
        };
        Self { samples, sample_rate }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }
}

/// Which transform to run and how to tune it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TransformParameters {
    /// Linear-frequency STFT magnitude spectrogram.
    Standard { fft_size: usize, hop_length: usize },
    /// Mel-scaled power spectrogram.
    Mel { band_count: usize, max_frequency: f32 },
}

impl TransformParameters {
    pub fn axis(&self) -> FrequencyAxis {
        match self {
            TransformParameters::Standard { .. } => FrequencyAxis::Log,
            TransformParameters::Mel { .. } => FrequencyAxis::Mel,
        }
    }
}

/// How a renderer should lay out the frequency axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyAxis {
    Log,
    Mel,
}

/// A dB-scaled spectrogram plus the metadata needed to draw its axes.
///
/// `values` is row-major: `values[row * columns + col]`, row 0 = lowest
/// frequency bin.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectrogramResult {
    pub values: Vec<f32>,
    pub rows: usize,
    pub columns: usize,
    pub sample_rate: u32,
    pub fft_size: usize,
    pub hop_length: usize,
    pub axis: FrequencyAxis,
    /// Centre frequency in Hz of each row.
    pub frequencies: Vec<f32>,
    /// Linear magnitude (Standard) or power (Mel) that maps to 0 dB.
    pub reference: f32,
    /// Lowest value any cell can take; every cell of a silent grid equals it.
    pub floor_db: f32,
}

impl SpectrogramResult {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.columns {
            return None;
        }
        Some(self.values[row * self.columns + col])
    }

    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.columns;
        &self.values[start..start + self.columns]
    }

    /// One column (time frame) across all rows.
    pub fn column(&self, col: usize) -> Vec<f32> {
        (0..self.rows).map(|r| self.values[r * self.columns + col]).collect()
    }

    pub fn max_db(&self) -> f32 {
        self.values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn min_db(&self) -> f32 {
        self.values.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn is_silent(&self) -> bool {
        self.values.iter().all(|&v| v == self.floor_db)
    }

    pub fn bin_frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Time in seconds of each column, `frame * hop / sample_rate`.
    pub fn frame_times(&self) -> Vec<f64> {
        let step = self.hop_length as f64 / self.sample_rate as f64;
        (0..self.columns).map(|c| c as f64 * step).collect()
    }

    pub fn duration_secs(&self) -> f64 {
        self.columns as f64 * self.hop_length as f64 / self.sample_rate as f64
    }
}
