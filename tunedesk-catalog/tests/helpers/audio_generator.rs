//! WAV fixture generator

use std::path::{Path, PathBuf};

/// Write a mono 16-bit tone of `duration_seconds` to `path`
pub fn generate_test_wav(path: &Path, duration_seconds: f64, sample_rate: u32) -> PathBuf {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV");
    let total_samples = (duration_seconds * sample_rate as f64) as usize;
    for i in 0..total_samples {
        let t = i as f64 / sample_rate as f64;
        let sample = (t * 440.0 * 2.0 * std::f64::consts::PI).sin() * 0.3;
        writer
            .write_sample((sample * i16::MAX as f64) as i16)
            .expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");

    path.to_path_buf()
}
