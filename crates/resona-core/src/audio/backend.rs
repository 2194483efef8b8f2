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

//! Defines the abstract `AudioBackend` trait and the handles it hands out.

use super::error::BackendError;
use crate::math::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An opaque reference to a sound resource created by a backend.
///
/// The handle is deliberately neither `Clone` nor `Copy`: exactly one owner
/// holds it, and it is released by moving it into
/// [`AudioBackend::release_sound`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SoundHandle(u64);

impl SoundHandle {
    /// Wraps a backend-specific identifier. Only backends should call this.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The backend-specific identifier.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// An opaque reference to a playing voice created by a backend.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ChannelHandle(u64);

impl ChannelHandle {
    /// Wraps a backend-specific identifier. Only backends should call this.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The backend-specific identifier.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Creation flags for a sound resource.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SoundMode {
    /// Positioned in 3D space (otherwise a plain 2D sound).
    pub is_3d: bool,
    /// Loops back to the start instead of ending.
    pub looping: bool,
    /// Decoded on the fly rather than fully resident in memory.
    pub streaming: bool,
    /// The source is an in-memory buffer rather than a path.
    pub open_memory: bool,
    /// Open for inspection only, without prebuffering or reading data.
    pub open_only: bool,
}

/// The encoding of the samples in a source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    /// Unknown or not yet probed.
    #[default]
    None,
    /// 8-bit integer PCM.
    Pcm8,
    /// 16-bit integer PCM.
    Pcm16,
    /// 24-bit integer PCM.
    Pcm24,
    /// 32-bit integer PCM.
    Pcm32,
    /// 32-bit floating-point PCM.
    PcmFloat,
    /// A compressed bitstream (MP3, Vorbis, ...).
    Compressed,
}

impl SampleFormat {
    /// The size of one sample in bytes, if the format is uncompressed PCM.
    pub fn bytes_per_sample(self) -> Option<u32> {
        match self {
            SampleFormat::Pcm8 => Some(1),
            SampleFormat::Pcm16 => Some(2),
            SampleFormat::Pcm24 => Some(3),
            SampleFormat::Pcm32 | SampleFormat::PcmFloat => Some(4),
            SampleFormat::None | SampleFormat::Compressed => None,
        }
    }
}

/// Format metadata discovered by a read-only probe of a source.
///
/// Creating a sound from memory needs this upfront; creating from a path
/// lets the backend derive it itself.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SoundFormat {
    /// The sample encoding.
    pub sample_format: SampleFormat,
    /// The number of interleaved channels (e.g., 2 for stereo).
    pub channels: u16,
    /// The default playback frequency in Hz.
    pub frequency: f32,
    /// The length of the sample data in raw bytes.
    pub length_bytes: u32,
}

impl SoundFormat {
    /// The playback duration in seconds, when it can be derived from the raw length.
    pub fn duration_seconds(&self) -> Option<f32> {
        let bytes_per_frame = self.sample_format.bytes_per_sample()? * self.channels as u32;
        if bytes_per_frame == 0 || self.frequency <= 0.0 {
            return None;
        }
        Some(self.length_bytes as f32 / bytes_per_frame as f32 / self.frequency)
    }
}

/// The position and orientation of the single 3D listener.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListenerAttributes {
    /// Where the listener is.
    pub position: Vec3,
    /// How fast the listener moves, in units per second.
    pub velocity: Vec3,
    /// The direction the listener faces.
    pub forward: Vec3,
    /// The listener's up direction.
    pub up: Vec3,
}

impl Default for ListenerAttributes {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            forward: Vec3::Z,
            up: Vec3::Y,
        }
    }
}

/// The abstract contract for the external audio engine.
///
/// This trait is the boundary between the playback logic (sound registry,
/// channel state machine) and the third-party library that decodes, mixes and
/// outputs audio. Everything is driven from a single thread: the owner calls
/// [`AudioBackend::update`] once per frame after updating its channels.
pub trait AudioBackend {
    /// Opens `path` read-only to discover its format, without creating a
    /// playable resource.
    fn probe(&mut self, path: &Path, mode: SoundMode) -> Result<SoundFormat, BackendError>;

    /// Creates a playable resource from a file.
    fn create_sound(&mut self, path: &Path, mode: SoundMode) -> Result<SoundHandle, BackendError>;

    /// Creates a playable resource from an in-memory buffer whose format was
    /// obtained by [`AudioBackend::probe`].
    fn create_sound_from_memory(
        &mut self,
        data: &[u8],
        mode: SoundMode,
        format: &SoundFormat,
    ) -> Result<SoundHandle, BackendError>;

    /// Releases a resource. Voices still playing it are stopped.
    fn release_sound(&mut self, sound: SoundHandle) -> Result<(), BackendError>;

    /// Sets the distance attenuation range of a 3D sound.
    fn set_sound_distance(
        &mut self,
        sound: &SoundHandle,
        min_distance: f32,
        max_distance: f32,
    ) -> Result<(), BackendError>;

    /// Returns the creation flags of a resource.
    fn sound_mode(&self, sound: &SoundHandle) -> Result<SoundMode, BackendError>;

    /// Starts a sound on a new voice, optionally paused.
    fn play_sound(
        &mut self,
        sound: &SoundHandle,
        paused: bool,
    ) -> Result<ChannelHandle, BackendError>;

    /// Sets the 3D position and velocity of a voice.
    fn set_channel_3d_attributes(
        &mut self,
        channel: &ChannelHandle,
        position: Vec3,
        velocity: Vec3,
    ) -> Result<(), BackendError>;

    /// Sets the linear volume of a voice.
    fn set_channel_volume(&mut self, channel: &ChannelHandle, volume: f32)
        -> Result<(), BackendError>;

    /// Returns the linear volume of a voice.
    fn channel_volume(&self, channel: &ChannelHandle) -> Result<f32, BackendError>;

    /// Pauses or resumes a voice.
    fn set_channel_paused(&mut self, channel: &ChannelHandle, paused: bool)
        -> Result<(), BackendError>;

    /// Returns whether a voice is still alive (paused voices count as playing).
    fn is_channel_playing(&self, channel: &ChannelHandle) -> Result<bool, BackendError>;

    /// Stops a voice immediately.
    fn stop_channel(&mut self, channel: &ChannelHandle) -> Result<(), BackendError>;

    /// Sets the attributes of the single listener (index 0).
    fn set_listener(&mut self, listener: &ListenerAttributes) -> Result<(), BackendError>;

    /// Advances the backend's own per-frame processing.
    fn update(&mut self, dt: f32) -> Result<(), BackendError>;

    /// Shuts the backend down. Further calls may fail with
    /// [`BackendError::NotInitialized`].
    fn close(&mut self) -> Result<(), BackendError>;
}
