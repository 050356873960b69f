//! Mel filterbank construction and projection.
//!
//! Filters are triangles spaced evenly on the mel scale
//! (`mel = 2595 * log10(1 + hz / 700)`), evaluated at the centre frequency of
//! every FFT bin and area-normalised so that each filter integrates to the
//! same total regardless of its bandwidth.

use super::fft::Spectrum;
use crate::error::{Result, SpectrogramError};

/// Convert frequency in Hz to mels.
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert mels back to Hz.
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// `count` frequencies evenly spaced on the mel scale between `fmin` and `fmax`, in Hz.
pub fn mel_frequencies(count: usize, fmin: f32, fmax: f32) -> Vec<f32> {
    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    if count == 1 {
        return vec![fmin];
    }
    (0..count)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (count - 1) as f32))
        .collect()
}

/// A `bands × (fft_size / 2 + 1)` weight matrix.
#[derive(Clone, Debug)]
pub struct MelFilterbank {
    bands: usize,
    bins: usize,
    weights: Vec<f32>,
    centers: Vec<f32>,
}

impl MelFilterbank {
    /// Build a filterbank spanning `fmin..fmax` Hz.
    pub fn new(
        bands: usize,
        fft_size: usize,
        sample_rate: u32,
        fmin: f32,
        fmax: f32,
    ) -> Result<Self> {
        if bands == 0 || fft_size == 0 || sample_rate == 0 {
            return Err(SpectrogramError::invalid(format!(
                "mel filterbank needs positive bands ({bands}), fft_size ({fft_size}) and sample rate ({sample_rate})"
            )));
        }
        if !(fmin >= 0.0 && fmax > fmin && fmax.is_finite()) {
            return Err(SpectrogramError::invalid(format!(
                "mel filterbank range {fmin}..{fmax} Hz is empty or invalid"
            )));
        }

        let bins = fft_size / 2 + 1;
        let bin_hz = sample_rate as f32 / fft_size as f32;
        // Two extra points for the outer edges of the first and last triangles
        let edges = mel_frequencies(bands + 2, fmin, fmax);

        let mut weights = vec![0.0f32; bands * bins];
        for band in 0..bands {
            let (lo, mid, hi) = (edges[band], edges[band + 1], edges[band + 2]);
            let norm = 2.0 / (hi - lo);
            let row = &mut weights[band * bins..(band + 1) * bins];
            for (k, w) in row.iter_mut().enumerate() {
                let f = k as f32 * bin_hz;
                let rising = (f - lo) / (mid - lo);
                let falling = (hi - f) / (hi - mid);
                *w = rising.min(falling).max(0.0) * norm;
            }
        }

        Ok(Self {
            bands,
            bins,
            weights,
            centers: edges[1..=bands].to_vec(),
        })
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn weights(&self, band: usize) -> &[f32] {
        &self.weights[band * self.bins..(band + 1) * self.bins]
    }

    /// Centre frequency in Hz of every band.
    pub fn centers(&self) -> &[f32] {
        &self.centers
    }

    /// Project a power spectrum onto the mel bands.
    pub fn apply(&self, power: &Spectrum) -> Result<Spectrum> {
        if power.bins != self.bins {
            return Err(SpectrogramError::invalid(format!(
                "spectrum has {} bins, filterbank expects {}",
                power.bins, self.bins
            )));
        }

        let frames = power.frames;
        let mut data = vec![0.0f32; self.bands * frames];
        for band in 0..self.bands {
            let out = &mut data[band * frames..(band + 1) * frames];
            for (bin, &w) in self.weights(band).iter().enumerate() {
                if w == 0.0 {
                    continue;
                }
                for (acc, &p) in out.iter_mut().zip(power.row(bin)) {
                    *acc += w * p;
                }
            }
        }

        Ok(Spectrum {
            bins: self.bands,
            frames,
            data,
        })
    }
}
