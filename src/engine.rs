//! Spectrogram generation: validated parameters in, dB grid out.
//!
//! The engine is a pure function of its inputs. It performs no I/O and
//! holds only immutable options, so one instance can be shared across
//! threads.

use crate::dsp::{fft, DecibelScale, Framing, MelFilterbank, Quantity, Spectrum};
use crate::error::{Result, SpectrogramError};
use crate::types::{AudioSignal, FrequencyAxis, SpectrogramResult, TransformParameters};
use serde::{Deserialize, Serialize};

/// FFT size used for Mel spectrograms.
pub const MEL_FFT_SIZE: usize = 2048;
/// Hop length used for Mel spectrograms.
pub const MEL_HOP_LENGTH: usize = 512;

/// Knobs that are not exposed as UI controls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub framing: Framing,
    pub amplitude_scale: DecibelScale,
    pub power_scale: DecibelScale,
    pub mel_fft_size: usize,
    pub mel_hop_length: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            framing: Framing::Valid,
            amplitude_scale: DecibelScale::amplitude(),
            power_scale: DecibelScale::power(),
            mel_fft_size: MEL_FFT_SIZE,
            mel_hop_length: MEL_HOP_LENGTH,
        }
    }
}

impl EngineOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        self.amplitude_scale.validate()?;
        self.power_scale.validate()?;
        if self.mel_fft_size == 0 || self.mel_hop_length == 0 {
            return Err(SpectrogramError::invalid(format!(
                "mel_fft_size ({}) and mel_hop_length ({}) must be positive",
                self.mel_fft_size, self.mel_hop_length
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct SpectrogramEngine {
    options: EngineOptions,
}

impl SpectrogramEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EngineOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Compute the dB spectrogram of `signal` for the chosen transform.
    pub fn compute(
        &self,
        signal: &AudioSignal,
        params: &TransformParameters,
    ) -> Result<SpectrogramResult> {
        validate_signal(signal)?;
        match *params {
            TransformParameters::Standard { fft_size, hop_length } => {
                self.standard(signal, fft_size, hop_length)
            }
            TransformParameters::Mel { band_count, max_frequency } => {
                self.mel(signal, band_count, max_frequency)
            }
        }
    }

    fn standard(
        &self,
        signal: &AudioSignal,
        fft_size: usize,
        hop_length: usize,
    ) -> Result<SpectrogramResult> {
        if fft_size == 0 {
            return Err(SpectrogramError::invalid("fft_size must be positive"));
        }
        if hop_length == 0 {
            return Err(SpectrogramError::invalid("hop_length must be positive"));
        }

        let magnitude =
            fft::stft_magnitude(&signal.samples, fft_size, hop_length, self.options.framing)?;
        let bin_hz = signal.sample_rate as f32 / fft_size as f32;
        let frequencies = (0..magnitude.bins).map(|k| k as f32 * bin_hz).collect();

        Ok(finish(
            magnitude,
            &self.options.amplitude_scale,
            Quantity::Amplitude,
            ResultLayout {
                sample_rate: signal.sample_rate,
                fft_size,
                hop_length,
                axis: FrequencyAxis::Log,
                frequencies,
            },
        ))
    }

    fn mel(
        &self,
        signal: &AudioSignal,
        band_count: usize,
        max_frequency: f32,
    ) -> Result<SpectrogramResult> {
        if band_count == 0 {
            return Err(SpectrogramError::invalid("band_count must be positive"));
        }
        if !(max_frequency.is_finite() && max_frequency > 0.0) {
            return Err(SpectrogramError::invalid(format!(
                "max_frequency must be positive, got {max_frequency}"
            )));
        }
        let nyquist = signal.nyquist();
        if max_frequency > nyquist {
            return Err(SpectrogramError::invalid(format!(
                "max_frequency {max_frequency} Hz exceeds the Nyquist frequency {nyquist} Hz"
            )));
        }

        let fft_size = self.options.mel_fft_size;
        let hop_length = self.options.mel_hop_length;
        let power = fft::stft_power(&signal.samples, fft_size, hop_length, self.options.framing)?;
        let filterbank =
            MelFilterbank::new(band_count, fft_size, signal.sample_rate, 0.0, max_frequency)?;
        let mel = filterbank.apply(&power)?;

        Ok(finish(
            mel,
            &self.options.power_scale,
            Quantity::Power,
            ResultLayout {
                sample_rate: signal.sample_rate,
                fft_size,
                hop_length,
                axis: FrequencyAxis::Mel,
                frequencies: filterbank.centers().to_vec(),
            },
        ))
    }
}

/// Compute with default options.
pub fn compute(signal: &AudioSignal, params: &TransformParameters) -> Result<SpectrogramResult> {
    SpectrogramEngine::new().compute(signal, params)
}

fn validate_signal(signal: &AudioSignal) -> Result<()> {
    if signal.sample_rate == 0 {
        return Err(SpectrogramError::UnsupportedSampleRate(signal.sample_rate));
    }
    if signal.samples.is_empty() {
        return Err(SpectrogramError::EmptySignal);
    }
    if let Some(i) = signal.samples.iter().position(|s| !s.is_finite()) {
        return Err(SpectrogramError::invalid(format!(
            "sample {i} is not a finite number"
        )));
    }
    Ok(())
}

struct ResultLayout {
    sample_rate: u32,
    fft_size: usize,
    hop_length: usize,
    axis: FrequencyAxis,
    frequencies: Vec<f32>,
}

fn finish(
    spectrum: Spectrum,
    scale: &DecibelScale,
    quantity: Quantity,
    layout: ResultLayout,
) -> SpectrogramResult {
    let Spectrum { bins, frames, mut data } = spectrum;
    let reference = scale.apply(&mut data, quantity);
    SpectrogramResult {
        values: data,
        rows: bins,
        columns: frames,
        sample_rate: layout.sample_rate,
        fft_size: layout.fft_size,
        hop_length: layout.hop_length,
        axis: layout.axis,
        frequencies: layout.frequencies,
        reference,
        floor_db: scale.floor_db(),
    }
}
