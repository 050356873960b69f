use crate::error::{Result, SpectrogramError};
use crate::types::AudioSignal;
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Container formats with a dedicated decoder. Everything else goes through Symphonia.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Flac,
    Ogg,
    Other,
}

impl AudioFormat {
    pub fn name(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "WAV",
            AudioFormat::Flac => "FLAC",
            AudioFormat::Ogg => "OGG",
            AudioFormat::Other => "compressed",
        }
    }
}

/// Sniff the container from magic bytes, falling back to the file extension.
pub fn detect_format(bytes: &[u8], extension: Option<&str>) -> AudioFormat {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        return AudioFormat::Wav;
    }
    if bytes.starts_with(b"fLaC") {
        return AudioFormat::Flac;
    }
    if bytes.starts_with(b"OggS") {
        return AudioFormat::Ogg;
    }
    match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("wav") | Some("wave") => AudioFormat::Wav,
        Some("flac") => AudioFormat::Flac,
        Some("ogg") | Some("oga") => AudioFormat::Ogg,
        _ => AudioFormat::Other,
    }
}

/// Decode an uploaded audio file into mono samples at the native sample rate.
///
/// Multi-channel audio is averaged down to one channel. Integer PCM is
/// scaled into `[-1, 1]`. No resampling is performed.
pub fn decode(bytes: &[u8], extension: Option<&str>) -> Result<AudioSignal> {
    let format = detect_format(bytes, extension);
    let signal = match format {
        AudioFormat::Wav => decode_wav(bytes)?,
        AudioFormat::Flac => decode_flac(bytes)?,
        AudioFormat::Ogg => decode_ogg(bytes)?,
        AudioFormat::Other => decode_symphonia(bytes, extension)?,
    };

    if signal.sample_rate == 0 {
        return Err(SpectrogramError::UnsupportedSampleRate(0));
    }
    if signal.is_empty() {
        return Err(SpectrogramError::EmptySignal);
    }

    log::debug!(
        "Decoded {} audio: {} samples ({:.2}s at {} Hz)",
        format.name(),
        signal.len(),
        signal.duration_secs(),
        signal.sample_rate
    );
    Ok(signal)
}

/// Read and decode an audio file from disk, using its extension as a hint.
pub fn decode_file(path: &Path) -> Result<AudioSignal> {
    let bytes = std::fs::read(path)?;
    decode(&bytes, path.extension().and_then(|e| e.to_str()))
}

/// Scale factor that maps signed integer PCM of `bits` bits into `[-1, 1]`.
fn int_scale(bits: u32) -> Result<f32> {
    if bits == 0 || bits > 32 {
        return Err(SpectrogramError::Decode(format!(
            "unsupported bit depth: {bits}"
        )));
    }
    Ok(1.0 / (1i64 << (bits - 1)) as f32)
}

fn decode_wav(bytes: &[u8]) -> Result<AudioSignal> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| SpectrogramError::Decode(format!("WAV: {e}")))?;
    let spec = reader.spec();
    log::debug!(
        "WAV: {} ch, {} Hz, {}-bit {:?}",
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| SpectrogramError::Decode(format!("WAV: {e}")))?,
        hound::SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample as u32)?;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| SpectrogramError::Decode(format!("WAV: {e}")))?
        }
    };

    Ok(AudioSignal::from_interleaved(
        &interleaved,
        spec.channels as usize,
        spec.sample_rate,
    ))
}

fn decode_flac(bytes: &[u8]) -> Result<AudioSignal> {
    let mut reader = claxon::FlacReader::new(Cursor::new(bytes))
        .map_err(|e| SpectrogramError::Decode(format!("FLAC: {e}")))?;
    let info = reader.streaminfo();
    log::debug!(
        "FLAC: {} ch, {} Hz, {}-bit",
        info.channels,
        info.sample_rate,
        info.bits_per_sample
    );

    let scale = int_scale(info.bits_per_sample)?;
    let interleaved: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 * scale))
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| SpectrogramError::Decode(format!("FLAC: {e}")))?;

    Ok(AudioSignal::from_interleaved(
        &interleaved,
        info.channels as usize,
        info.sample_rate,
    ))
}

fn decode_ogg(bytes: &[u8]) -> Result<AudioSignal> {
    let mut reader = lewton::inside_ogg::OggStreamReader::new(Cursor::new(bytes))
        .map_err(|e| SpectrogramError::Decode(format!("OGG: {e}")))?;
    let channels = reader.ident_hdr.audio_channels as usize;
    let sample_rate = reader.ident_hdr.audio_sample_rate;
    log::debug!("OGG: {} ch, {} Hz", channels, sample_rate);

    let mut interleaved = Vec::new();
    while let Some(packet) = reader
        .read_dec_packet_itl()
        .map_err(|e| SpectrogramError::Decode(format!("OGG: {e}")))?
    {
        interleaved.extend(packet.into_iter().map(|s| s as f32 / 32768.0));
    }

    Ok(AudioSignal::from_interleaved(&interleaved, channels, sample_rate))
}

fn decode_symphonia(bytes: &[u8], extension: Option<&str>) -> Result<AudioSignal> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| SpectrogramError::Decode(format!("unsupported audio format: {e}")))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| SpectrogramError::Decode("no audio track found".into()))?
        .clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SpectrogramError::Decode(format!("failed to create decoder: {e}")))?;

    // Sample rate may only be known after the first packet for some codecs
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut mono = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => break,
            Err(e) => return Err(SpectrogramError::Decode(format!("reading packet: {e}"))),
        };

        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                log::warn!("Skipping corrupt packet: {e}");
                continue;
            }
            Err(e) => return Err(SpectrogramError::Decode(format!("decoding packet: {e}"))),
        };

        let spec = *decoded.spec();
        if sample_rate == 0 {
            sample_rate = spec.rate;
        }
        let channels = spec.channels.count().max(1);

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let scale = 1.0 / channels as f32;
        mono.extend(
            sample_buf
                .samples()
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() * scale),
        );
    }

    log::debug!("Symphonia: {} Hz, codec {:?}", sample_rate, track.codec_params.codec);
    Ok(AudioSignal::new(mono, sample_rate))
}
