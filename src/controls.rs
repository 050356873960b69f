//! The parameter controls a spectrogram UI offers, and their mapping onto
//! [`TransformParameters`].
//!
//! The UI itself lives elsewhere. This module pins the slider ranges,
//! steps and defaults so every front end validates input the same way.

use crate::error::{Result, SpectrogramError};
use crate::types::TransformParameters;
use serde::{Deserialize, Serialize};

/// File name offered when the rendered image is downloaded.
pub const DOWNLOAD_FILE_NAME: &str = "spectrogram.png";
/// MIME type of the downloaded image.
pub const DOWNLOAD_MIME: &str = "image/png";

/// An integer slider: inclusive `min..=max`, moving in `step` increments from `min`.
///
/// A `step` of 0 means every integer in range is reachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SliderRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
    pub default: u32,
}

pub const FFT_SIZE_RANGE: SliderRange = SliderRange { min: 256, max: 4096, step: 256, default: 2048 };
pub const HOP_LENGTH_RANGE: SliderRange = SliderRange { min: 64, max: 1024, step: 64, default: 512 };
pub const MEL_BANDS_RANGE: SliderRange = SliderRange { min: 32, max: 512, step: 32, default: 128 };
pub const MAX_FREQUENCY_RANGE: SliderRange =
    SliderRange { min: 2000, max: 24000, step: 1000, default: 16000 };

impl SliderRange {
    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max && self.on_step(value)
    }

    fn on_step(&self, value: u32) -> bool {
        self.step <= 1 || (value - self.min) % self.step == 0
    }

    /// Accept `value` only if the slider could produce it.
    pub fn check(&self, name: &str, value: u32) -> Result<u32> {
        if value < self.min || value > self.max {
            return Err(SpectrogramError::invalid(format!(
                "{name} {value} is outside {}..={}",
                self.min, self.max
            )));
        }
        if !self.on_step(value) {
            return Err(SpectrogramError::invalid(format!(
                "{name} {value} is not a multiple of {} from {}",
                self.step, self.min
            )));
        }
        Ok(value)
    }

    /// Clamp into range and round to the nearest step.
    pub fn snap(&self, value: u32) -> u32 {
        let clamped = value.max(self.min).min(self.max);
        if self.step <= 1 {
            return clamped;
        }
        let steps = (clamped - self.min + self.step / 2) / self.step;
        (self.min + steps * self.step).min(self.max)
    }

    /// Every value the slider can take, ascending.
    pub fn values(&self) -> impl Iterator<Item = u32> {
        (self.min..=self.max).step_by(self.step.max(1) as usize)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrogramMode {
    #[default]
    Standard,
    Mel,
}

impl SpectrogramMode {
    /// Plot title for this mode.
    pub fn title(&self) -> &'static str {
        match self {
            SpectrogramMode::Standard => "Spectrogram",
            SpectrogramMode::Mel => "Mel Spectrogram",
        }
    }
}

/// Colour map offered for rendering. Cosmetic; never affects the computed grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMap {
    #[default]
    Viridis,
    Plasma,
    Inferno,
    Magma,
    Cividis,
}

impl ColorMap {
    pub const ALL: [ColorMap; 5] = [
        ColorMap::Viridis,
        ColorMap::Plasma,
        ColorMap::Inferno,
        ColorMap::Magma,
        ColorMap::Cividis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColorMap::Viridis => "viridis",
            ColorMap::Plasma => "plasma",
            ColorMap::Inferno => "inferno",
            ColorMap::Magma => "magma",
            ColorMap::Cividis => "cividis",
        }
    }
}

/// Everything the sidebar currently holds. Rebuilt on every interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlState {
    pub mode: SpectrogramMode,
    pub fft_size: u32,
    pub hop_length: u32,
    pub band_count: u32,
    pub max_frequency: u32,
    pub color_map: ColorMap,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            mode: SpectrogramMode::Standard,
            fft_size: FFT_SIZE_RANGE.default,
            hop_length: HOP_LENGTH_RANGE.default,
            band_count: MEL_BANDS_RANGE.default,
            max_frequency: MAX_FREQUENCY_RANGE.default,
            color_map: ColorMap::Viridis,
        }
    }
}

impl ControlState {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Same slider values, different mode.
    pub fn with_mode(self, mode: SpectrogramMode) -> Self {
        Self { mode, ..self }
    }

    /// Validate the sliders for the active mode and build the transform request.
    ///
    /// Sliders belonging to the inactive mode are ignored.
    pub fn to_parameters(&self) -> Result<TransformParameters> {
        match self.mode {
            SpectrogramMode::Standard => {
                let fft_size = FFT_SIZE_RANGE.check("fft_size", self.fft_size)?;
                let hop_length = HOP_LENGTH_RANGE.check("hop_length", self.hop_length)?;
                if hop_length > fft_size {
                    log::warn!(
                        "hop_length {hop_length} exceeds fft_size {fft_size}; frames will skip samples"
                    );
                }
                Ok(TransformParameters::Standard {
                    fft_size: fft_size as usize,
                    hop_length: hop_length as usize,
                })
            }
            SpectrogramMode::Mel => {
                let band_count = MEL_BANDS_RANGE.check("band_count", self.band_count)?;
                let max_frequency =
                    MAX_FREQUENCY_RANGE.check("max_frequency", self.max_frequency)?;
                Ok(TransformParameters::Mel {
                    band_count: band_count as usize,
                    max_frequency: max_frequency as f32,
                })
            }
        }
    }
}
