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

//! A headless [`AudioBackend`] that tracks sounds and voices without any
//! output device.
//!
//! Voices advance a virtual cursor on every [`AudioBackend::update`] and end
//! on their own once the cursor passes the end of the source, which makes
//! the backend suitable for servers, tools and deterministic tests.

mod probe;

pub use probe::{probe_bytes, probe_file};

use resona_core::audio::backend::{ListenerAttributes, SampleFormat, SoundFormat, SoundMode};
use resona_core::{AudioBackend, BackendError, ChannelHandle, SoundHandle, Vec3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Format and length of a source known to the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualSource {
    /// The format reported by a probe.
    pub format: SoundFormat,
    /// The playback duration in seconds. `None` plays until stopped.
    pub duration: Option<f32>,
}

impl VirtualSource {
    /// A 16-bit stereo 44.1 kHz source lasting `seconds`.
    pub fn with_duration(seconds: f32) -> Self {
        let seconds = seconds.max(0.0);
        let frames = (seconds * 44100.0) as u64;
        Self {
            format: SoundFormat {
                sample_format: SampleFormat::Pcm16,
                channels: 2,
                frequency: 44100.0,
                length_bytes: u32::try_from(frames.saturating_mul(4)).unwrap_or(u32::MAX),
            },
            duration: Some(seconds),
        }
    }

    /// A source with no known end.
    pub fn endless() -> Self {
        Self {
            format: SoundFormat::default(),
            duration: None,
        }
    }
}

#[derive(Debug)]
struct VirtualSound {
    mode: SoundMode,
    duration: Option<f32>,
    min_distance: f32,
    max_distance: f32,
}

/// The observable state of one voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualVoice {
    /// The raw id of the sound this voice plays.
    pub sound: u64,
    /// Seconds played so far.
    pub cursor: f32,
    /// The linear volume.
    pub volume: f32,
    /// Whether the voice is paused.
    pub paused: bool,
    /// The 3D position.
    pub position: Vec3,
    /// The 3D velocity.
    pub velocity: Vec3,
}

/// The headless backend.
#[derive(Debug)]
pub struct VirtualAudioBackend {
    max_channels: u32,
    sources: HashMap<PathBuf, VirtualSource>,
    sounds: HashMap<u64, VirtualSound>,
    voices: HashMap<u64, VirtualVoice>,
    listener: ListenerAttributes,
    next_sound: u64,
    next_voice: u64,
    closed: bool,
}

impl VirtualAudioBackend {
    /// Creates a backend that allows at most `max_channels` simultaneous voices.
    pub fn new(max_channels: u32) -> Self {
        log::info!("Virtual audio backend ready with {max_channels} voices.");
        Self {
            max_channels,
            sources: HashMap::new(),
            sounds: HashMap::new(),
            voices: HashMap::new(),
            listener: ListenerAttributes::default(),
            next_sound: 1,
            next_voice: 1,
            closed: false,
        }
    }

    /// Registers an in-memory description for `path`. Paths with a source
    /// here never touch the filesystem.
    pub fn insert_source(&mut self, path: impl Into<PathBuf>, source: VirtualSource) {
        self.sources.insert(path.into(), source);
    }

    /// The current listener attributes.
    pub fn listener(&self) -> &ListenerAttributes {
        &self.listener
    }

    /// The state of a live voice.
    pub fn voice(&self, channel: &ChannelHandle) -> Option<&VirtualVoice> {
        self.voices.get(&channel.raw())
    }

    /// Every live voice, in no particular order.
    pub fn voices(&self) -> impl Iterator<Item = &VirtualVoice> {
        self.voices.values()
    }

    /// The number of live sound resources.
    pub fn live_sounds(&self) -> usize {
        self.sounds.len()
    }

    /// The number of live voices.
    pub fn live_channels(&self) -> usize {
        self.voices.len()
    }

    /// The distance range of a sound, by raw id.
    pub fn sound_distance(&self, raw: u64) -> Option<(f32, f32)> {
        self.sounds
            .get(&raw)
            .map(|sound| (sound.min_distance, sound.max_distance))
    }

    /// The distance gain a live 3D voice would get from the listener, using
    /// inverse rolloff between its sound's min and max distance. 2D voices
    /// always get `1.0`.
    pub fn attenuation(&self, channel: &ChannelHandle) -> Option<f32> {
        let voice = self.voices.get(&channel.raw())?;
        let sound = self.sounds.get(&voice.sound)?;
        if !sound.mode.is_3d {
            return Some(1.0);
        }
        let distance = voice
            .position
            .distance(self.listener.position)
            .clamp(sound.min_distance, sound.max_distance.max(sound.min_distance));
        if distance <= 0.0 {
            return Some(1.0);
        }
        Some(sound.min_distance / distance)
    }

    /// Whether [`AudioBackend::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.closed {
            Err(BackendError::NotInitialized)
        } else {
            Ok(())
        }
    }

    fn resolve(&self, path: &Path) -> Result<VirtualSource, BackendError> {
        if let Some(source) = self.sources.get(path) {
            return Ok(*source);
        }
        if !path.is_file() {
            return Err(BackendError::NotFound(path.display().to_string()));
        }
        probe_file(path).map_err(|e| BackendError::InvalidFormat(format!("{e:#}")))
    }

    fn insert_sound(&mut self, mode: SoundMode, duration: Option<f32>) -> SoundHandle {
        let raw = self.next_sound;
        self.next_sound += 1;
        self.sounds.insert(
            raw,
            VirtualSound {
                mode,
                duration,
                min_distance: 1.0,
                max_distance: 10000.0,
            },
        );
        SoundHandle::from_raw(raw)
    }

    fn sound_ref(&self, sound: &SoundHandle) -> Result<&VirtualSound, BackendError> {
        self.ensure_open()?;
        self.sounds
            .get(&sound.raw())
            .ok_or(BackendError::InvalidHandle(sound.raw()))
    }

    fn voice_mut(&mut self, channel: &ChannelHandle) -> Result<&mut VirtualVoice, BackendError> {
        self.ensure_open()?;
        self.voices
            .get_mut(&channel.raw())
            .ok_or(BackendError::InvalidHandle(channel.raw()))
    }
}

impl AudioBackend for VirtualAudioBackend {
    fn probe(&mut self, path: &Path, _mode: SoundMode) -> Result<SoundFormat, BackendError> {
        self.ensure_open()?;
        Ok(self.resolve(path)?.format)
    }

    fn create_sound(&mut self, path: &Path, mode: SoundMode) -> Result<SoundHandle, BackendError> {
        self.ensure_open()?;
        let source = self.resolve(path)?;
        log::debug!("Created sound from '{}'.", path.display());
        Ok(self.insert_sound(mode, source.duration))
    }

    fn create_sound_from_memory(
        &mut self,
        data: &[u8],
        mode: SoundMode,
        format: &SoundFormat,
    ) -> Result<SoundHandle, BackendError> {
        self.ensure_open()?;
        if data.is_empty() {
            return Err(BackendError::InvalidFormat("empty buffer".to_string()));
        }
        let duration = match format.duration_seconds() {
            Some(duration) => Some(duration),
            None => probe_bytes(data, None).ok().and_then(|source| source.duration),
        };
        Ok(self.insert_sound(mode, duration))
    }

    fn release_sound(&mut self, sound: SoundHandle) -> Result<(), BackendError> {
        self.ensure_open()?;
        let raw = sound.raw();
        self.sounds
            .remove(&raw)
            .ok_or(BackendError::InvalidHandle(raw))?;
        self.voices.retain(|_, voice| voice.sound != raw);
        Ok(())
    }

    fn set_sound_distance(
        &mut self,
        sound: &SoundHandle,
        min_distance: f32,
        max_distance: f32,
    ) -> Result<(), BackendError> {
        self.ensure_open()?;
        let entry = self
            .sounds
            .get_mut(&sound.raw())
            .ok_or(BackendError::InvalidHandle(sound.raw()))?;
        entry.min_distance = min_distance;
        entry.max_distance = max_distance;
        Ok(())
    }

    fn sound_mode(&self, sound: &SoundHandle) -> Result<SoundMode, BackendError> {
        Ok(self.sound_ref(sound)?.mode)
    }

    fn play_sound(
        &mut self,
        sound: &SoundHandle,
        paused: bool,
    ) -> Result<ChannelHandle, BackendError> {
        self.sound_ref(sound)?;
        if self.voices.len() >= self.max_channels as usize {
            return Err(BackendError::ChannelLimit(self.max_channels));
        }
        let raw = self.next_voice;
        self.next_voice += 1;
        self.voices.insert(
            raw,
            VirtualVoice {
                sound: sound.raw(),
                cursor: 0.0,
                volume: 1.0,
                paused,
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
            },
        );
        Ok(ChannelHandle::from_raw(raw))
    }

    fn set_channel_3d_attributes(
        &mut self,
        channel: &ChannelHandle,
        position: Vec3,
        velocity: Vec3,
    ) -> Result<(), BackendError> {
        let voice = self.voice_mut(channel)?;
        voice.position = position;
        voice.velocity = velocity;
        Ok(())
    }

    fn set_channel_volume(
        &mut self,
        channel: &ChannelHandle,
        volume: f32,
    ) -> Result<(), BackendError> {
        self.voice_mut(channel)?.volume = volume;
        Ok(())
    }

    fn channel_volume(&self, channel: &ChannelHandle) -> Result<f32, BackendError> {
        self.ensure_open()?;
        self.voices
            .get(&channel.raw())
            .map(|voice| voice.volume)
            .ok_or(BackendError::InvalidHandle(channel.raw()))
    }

    fn set_channel_paused(
        &mut self,
        channel: &ChannelHandle,
        paused: bool,
    ) -> Result<(), BackendError> {
        self.voice_mut(channel)?.paused = paused;
        Ok(())
    }

    fn is_channel_playing(&self, channel: &ChannelHandle) -> Result<bool, BackendError> {
        self.ensure_open()?;
        Ok(self.voices.contains_key(&channel.raw()))
    }

    fn stop_channel(&mut self, channel: &ChannelHandle) -> Result<(), BackendError> {
        self.ensure_open()?;
        self.voices.remove(&channel.raw());
        Ok(())
    }

    fn set_listener(&mut self, listener: &ListenerAttributes) -> Result<(), BackendError> {
        self.ensure_open()?;
        self.listener = *listener;
        Ok(())
    }

    fn update(&mut self, dt: f32) -> Result<(), BackendError> {
        self.ensure_open()?;
        let dt = dt.max(0.0);
        let sounds = &self.sounds;
        self.voices.retain(|_, voice| {
            if voice.paused {
                return true;
            }
            let Some(sound) = sounds.get(&voice.sound) else {
                return false;
            };
            voice.cursor += dt;
            match sound.duration {
                None => true,
                Some(duration) if sound.mode.looping => {
                    if duration > 0.0 {
                        voice.cursor %= duration;
                    }
                    true
                }
                Some(duration) => voice.cursor < duration,
            }
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.ensure_open()?;
        self.voices.clear();
        self.sounds.clear();
        self.closed = true;
        log::info!("Virtual audio backend closed.");
        Ok(())
    }
}
