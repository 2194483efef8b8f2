// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reads format metadata from encoded audio without decoding it.

use super::VirtualSource;
use anyhow::{anyhow, Context, Result};
use resona_core::audio::backend::{SampleFormat, SoundFormat};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::{
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};

/// Probes a file on disk.
pub fn probe_file(path: &Path) -> Result<VirtualSource> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read audio source '{}'", path.display()))?;
    let extension = path.extension().and_then(|ext| ext.to_str());
    probe_bytes(&bytes, extension)
}

/// Probes an encoded buffer. WAV is read with `hound`; anything else goes
/// through `symphonia`'s format probe, using `extension` as a hint.
pub fn probe_bytes(bytes: &[u8], extension: Option<&str>) -> Result<VirtualSource> {
    match probe_wav(bytes) {
        Ok(source) => Ok(source),
        Err(wav_err) => {
            log::trace!("Not a WAV stream ({wav_err}), trying symphonia");
            probe_container(bytes, extension)
        }
    }
}

fn probe_wav(bytes: &[u8]) -> Result<VirtualSource> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let sample_format = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, _) => SampleFormat::PcmFloat,
        (hound::SampleFormat::Int, 8) => SampleFormat::Pcm8,
        (hound::SampleFormat::Int, 16) => SampleFormat::Pcm16,
        (hound::SampleFormat::Int, 24) => SampleFormat::Pcm24,
        (hound::SampleFormat::Int, 32) => SampleFormat::Pcm32,
        (_, bits) => return Err(anyhow!("Unsupported WAV bit depth: {bits}")),
    };
    let bytes_per_sample = sample_format.bytes_per_sample().unwrap_or(0);
    let duration =
        (spec.sample_rate > 0).then(|| reader.duration() as f32 / spec.sample_rate as f32);

    Ok(VirtualSource {
        format: SoundFormat {
            sample_format,
            channels: spec.channels,
            frequency: spec.sample_rate as f32,
            length_bytes: reader.len() * bytes_per_sample,
        },
        duration,
    })
}

fn probe_container(bytes: &[u8], extension: Option<&str>) -> Result<VirtualSource> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }
    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let format_reader = probed.format;

    let track = format_reader
        .default_track()
        .ok_or_else(|| anyhow!("No default audio track found"))?;
    let params = &track.codec_params;
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| anyhow!("Unknown sample rate"))?;
    let channels = params
        .channels
        .ok_or_else(|| anyhow!("Unknown channel count"))?;

    Ok(VirtualSource {
        format: SoundFormat {
            sample_format: SampleFormat::Compressed,
            channels: channels.count() as u16,
            frequency: sample_rate as f32,
            length_bytes: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
        },
        duration: params.n_frames.map(|frames| frames as f32 / sample_rate as f32),
    })
}
