use crate::error::{Result, SpectrogramError};
use serde::{Deserialize, Serialize};

/// Default dynamic range below the grid maximum.
pub const DEFAULT_TOP_DB: f32 = 80.0;

/// Whether the values being scaled are amplitudes or powers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantity {
    /// `20 * log10`
    Amplitude,
    /// `10 * log10`
    Power,
}

impl Quantity {
    fn multiplier(self) -> f32 {
        match self {
            Quantity::Amplitude => 20.0,
            Quantity::Power => 10.0,
        }
    }
}

/// Decibel conversion relative to the largest value in the grid.
///
/// Values are floored at `amin` before the logarithm and the result is
/// clipped to `-top_db`. The reference is also floored at `amin`, so the
/// largest cell always maps to 0 dB. Only an all-zero grid is silent; every
/// cell of it is set to `-top_db`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecibelScale {
    pub amin: f32,
    pub top_db: f32,
}

impl DecibelScale {
    pub fn amplitude() -> Self {
        Self { amin: 1e-5, top_db: DEFAULT_TOP_DB }
    }

    pub fn power() -> Self {
        Self { amin: 1e-10, top_db: DEFAULT_TOP_DB }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.amin > 0.0 && self.amin.is_finite()) {
            return Err(SpectrogramError::invalid(format!(
                "amin must be positive and finite, got {}",
                self.amin
            )));
        }
        if !(self.top_db > 0.0 && self.top_db.is_finite()) {
            return Err(SpectrogramError::invalid(format!(
                "top_db must be positive and finite, got {}",
                self.top_db
            )));
        }
        Ok(())
    }

    pub fn floor_db(&self) -> f32 {
        -self.top_db
    }

    /// Convert `values` to dB in place. Returns the reference (grid maximum).
    pub fn apply(&self, values: &mut [f32], quantity: Quantity) -> f32 {
        let reference = values.iter().copied().fold(0.0f32, f32::max);
        let floor = self.floor_db();

        if reference == 0.0 {
            values.iter_mut().for_each(|v| *v = floor);
            return reference;
        }

        let mult = quantity.multiplier();
        let ref_db = mult * reference.max(self.amin).log10();
        for v in values.iter_mut() {
            let db = mult * v.max(self.amin).log10() - ref_db;
            *v = db.max(floor);
        }
        reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_scaling() {
        let mut values = vec![1.0, 0.1, 0.01, 0.5];
        let reference = DecibelScale::amplitude().apply(&mut values, Quantity::Amplitude);
        assert_eq!(reference, 1.0);
        assert_eq!(values[0], 0.0);
        assert!((values[1] + 20.0).abs() < 1e-4);
        assert!((values[2] + 40.0).abs() < 1e-4);
        assert!((values[3] + 6.0206).abs() < 1e-3);
    }

    #[test]
    fn test_power_scaling() {
        let mut values = vec![4.0, 0.4, 0.04];
        DecibelScale::power().apply(&mut values, Quantity::Power);
        assert_eq!(values[0], 0.0);
        assert!((values[1] + 10.0).abs() < 1e-4);
        assert!((values[2] + 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_clip_to_top_db() {
        let mut values = vec![1.0, 1e-6, 0.0];
        DecibelScale::amplitude().apply(&mut values, Quantity::Amplitude);
        assert_eq!(values[1], -80.0);
        assert_eq!(values[2], -80.0);
    }

    #[test]
    fn test_silence_floor() {
        let mut values = vec![0.0; 16];
        let scale = DecibelScale::power();
        let reference = scale.apply(&mut values, Quantity::Power);
        assert_eq!(reference, 0.0);
        assert!(values.iter().all(|&v| v == -80.0));
    }

    #[test]
    fn test_max_is_exactly_zero() {
        let mut values = vec![0.123, 3.7, 2.2, 3.7];
        DecibelScale::amplitude().apply(&mut values, Quantity::Amplitude);
        assert_eq!(values.iter().copied().fold(f32::MIN, f32::max), 0.0);
        assert_eq!(values[3], 0.0);
    }

    #[test]
    fn test_quiet_grid_is_not_silent() {
        let mut values = vec![4e-7, 1e-8, 0.0];
        let scale = DecibelScale::amplitude();
        let reference = scale.apply(&mut values, Quantity::Amplitude);
        assert_eq!(reference, 4e-7);
        // Everything sits below amin, so every cell collapses onto the peak
        assert_eq!(values, vec![0.0, 0.0, 0.0]);

        let mut values = vec![2e-10, 1e-11];
        DecibelScale::power().apply(&mut values, Quantity::Power);
        assert_eq!(values[0], 0.0);
        assert!((values[1] + 3.0103).abs() < 1e-3);
    }

    #[test]
    fn test_validate() {
        assert!(DecibelScale::amplitude().validate().is_ok());
        assert!(DecibelScale { amin: 0.0, top_db: 80.0 }.validate().is_err());
        assert!(DecibelScale { amin: 1e-5, top_db: -1.0 }.validate().is_err());
        assert!(DecibelScale { amin: 1e-5, top_db: f32::INFINITY }.validate().is_err());
    }
}
