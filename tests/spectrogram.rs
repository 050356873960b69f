use proptest::prelude::*;
use spectrogram_core::controls::{ControlState, SpectrogramMode};
use spectrogram_core::dsp::frame_count;
use spectrogram_core::dsp::Framing;
use spectrogram_core::{
    compute, AudioSignal, FrequencyAxis, SpectrogramError, TransformParameters, MEL_FFT_SIZE,
    MEL_HOP_LENGTH,
};
use std::f64::consts::PI;

fn sine(freq: f64, sample_rate: u32, num_samples: usize) -> AudioSignal {
    let samples = (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (2.0 * PI * freq * t).sin() as f32
        })
        .collect();
    AudioSignal::new(samples, sample_rate)
}

fn standard(fft_size: usize, hop_length: usize) -> TransformParameters {
    TransformParameters::Standard { fft_size, hop_length }
}

fn mel(band_count: usize, max_frequency: f32) -> TransformParameters {
    TransformParameters::Mel { band_count, max_frequency }
}

#[test]
fn silent_second_at_16k_is_uniform_floor() {
    let signal = AudioSignal::new(vec![0.0; 16000], 16000);
    let result = compute(&signal, &standard(2048, 512)).unwrap();

    let expected_frames = (16000 - 2048) / 512 + 1;
    assert_eq!(result.shape(), (1025, expected_frames));
    assert_eq!(result.floor_db, -80.0);
    assert!(result.values.iter().all(|&v| v == -80.0));
    assert!(result.is_silent());
    assert_eq!(result.reference, 0.0);
}

#[test]
fn silent_mel_is_uniform_floor() {
    let signal = AudioSignal::new(vec![0.0; 16000], 16000);
    let result = compute(&signal, &mel(128, 8000.0)).unwrap();
    assert_eq!(result.rows, 128);
    assert!(result.values.iter().all(|&v| v == result.floor_db));
}

#[test]
fn quiet_tone_still_peaks_at_zero_db() {
    let mut signal = sine(440.0, 16000, 16000);
    signal.samples.iter_mut().for_each(|s| *s *= 1e-9);

    for params in [standard(2048, 512), mel(128, 8000.0)] {
        let result = compute(&signal, &params).unwrap();
        assert!(result.reference > 0.0);
        assert_eq!(result.max_db(), 0.0, "{params:?}");
        assert!(!result.is_silent(), "{params:?}");
    }
}

#[test]
fn tone_at_440_peaks_at_bin_20() {
    let signal = sine(440.0, 44100, 44100);
    let result = compute(&signal, &standard(2048, 512)).unwrap();

    for col in [0, result.columns / 2, result.columns - 1] {
        let column = result.column(col);
        let peak = (0..column.len())
            .max_by(|&a, &b| column[a].partial_cmp(&column[b]).unwrap())
            .unwrap();
        assert_eq!(peak, 20, "column {col} peaks at bin {peak}");
    }
    let bin_hz = result.bin_frequencies()[20];
    assert!((bin_hz - 20.0 * 44100.0 / 2048.0).abs() < 1e-3);
}

#[test]
fn switching_mode_changes_rows_and_axis() {
    let signal = sine(440.0, 44100, 44100);
    let state = ControlState::default();

    let linear = compute(&signal, &state.to_parameters().unwrap()).unwrap();
    assert_eq!(linear.rows, 2048 / 2 + 1);
    assert_eq!(linear.axis, FrequencyAxis::Log);

    let state = state.with_mode(SpectrogramMode::Mel);
    let mel_result = compute(&signal, &state.to_parameters().unwrap()).unwrap();
    assert_eq!(mel_result.rows, 128);
    assert_eq!(mel_result.axis, FrequencyAxis::Mel);
    assert_eq!(mel_result.hop_length, MEL_HOP_LENGTH);
}

#[test]
fn max_frequency_at_nyquist_is_valid() {
    let signal = sine(440.0, 16000, 16000);
    let result = compute(&signal, &mel(64, 8000.0)).unwrap();
    assert_eq!(result.rows, 64);

    let err = compute(&signal, &mel(64, 8001.0)).unwrap_err();
    assert!(matches!(err, SpectrogramError::InvalidParameter(_)));
}

#[test]
fn slider_extremes_produce_grids() {
    let signal = sine(1000.0, 22050, 22050);
    for fft_size in [256, 4096] {
        let result = compute(&signal, &standard(fft_size, 512)).unwrap();
        assert_eq!(result.rows, fft_size / 2 + 1);
        assert!(result.columns > 0);
        assert_eq!(result.max_db(), 0.0);
    }
}

#[test]
fn mel_frame_count_uses_internal_hop() {
    let signal = sine(300.0, 22050, 30000);
    let result = compute(&signal, &mel(32, 11025.0)).unwrap();
    assert_eq!(
        result.columns,
        frame_count(30000, MEL_FFT_SIZE, MEL_HOP_LENGTH, Framing::Valid)
    );
}

#[test]
fn signal_shorter_than_window_is_rejected() {
    let signal = sine(440.0, 8000, 1000);
    let err = compute(&signal, &standard(2048, 512)).unwrap_err();
    assert!(matches!(err, SpectrogramError::InvalidParameter(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn standard_grid_properties(
        samples in prop::collection::vec(-1.0f32..1.0, 4096..9000),
        fft_step in 1usize..=16,
        hop_step in 1usize..=16,
    ) {
        let fft_size = fft_step * 256;
        let hop_length = hop_step * 64;
        let len = samples.len();
        let signal = AudioSignal::new(samples, 22050);
        let params = standard(fft_size, hop_length);

        let first = compute(&signal, &params).unwrap();
        let second = compute(&signal, &params).unwrap();
        prop_assert_eq!(&first.values, &second.values);

        prop_assert_eq!(first.rows, fft_size / 2 + 1);
        prop_assert_eq!(first.columns, (len - fft_size) / hop_length + 1);
        prop_assert_eq!(first.max_db(), 0.0);
        prop_assert!(first.values.iter().all(|v| (-80.0..=0.0).contains(v)));
    }

    #[test]
    fn mel_grid_properties(
        samples in prop::collection::vec(-1.0f32..1.0, 2048..8000),
        band_step in 1usize..=16,
        max_frequency in 2000u32..=11025,
    ) {
        let band_count = band_step * 32;
        let len = samples.len();
        let signal = AudioSignal::new(samples, 22050);
        let params = mel(band_count, max_frequency as f32);

        let result = compute(&signal, &params).unwrap();
        prop_assert_eq!(result.rows, band_count);
        prop_assert_eq!(result.columns, (len - MEL_FFT_SIZE) / MEL_HOP_LENGTH + 1);
        prop_assert_eq!(result.max_db(), 0.0);
        prop_assert!(result.values.iter().all(|v| v.is_finite() && *v <= 0.0 && *v >= -80.0));
    }
}
