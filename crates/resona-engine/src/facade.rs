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

//! The application-facing entry point.

use crate::channel::ChannelState;
use crate::config::EngineConfig;
use crate::engine::{AudioEngineCore, ChannelId};
use crate::sound::{SoundDescriptor, SoundId};
use resona_core::audio::backend::AudioBackend;
use resona_core::audio::volume;
use resona_core::math::Vec3;

/// The public audio API: an explicitly owned engine with an `init` /
/// `shutdown` lifecycle.
///
/// Before [`AudioEngine::init`] (and after [`AudioEngine::shutdown`]) every
/// operation is a no-op, queries answer `false`, and calls that would hand
/// out an id return `None`.
///
/// ```
/// use resona_engine::{AudioEngine, EngineConfig, SoundDescriptor};
/// use resona_infra::{VirtualAudioBackend, VirtualSource};
///
/// let mut backend = VirtualAudioBackend::new(32);
/// backend.insert_source("bark.wav", VirtualSource::with_duration(2.0));
///
/// let mut audio = AudioEngine::new();
/// audio.init(backend, &EngineConfig::default());
/// let bark = audio.register_sound(SoundDescriptor::file("bark.wav")).unwrap();
/// let channel = audio.play_sound(bark, [0.0, 0.0, 0.0], 0.0).unwrap();
/// assert!(audio.is_playing(channel));
/// audio.shutdown();
/// ```
pub struct AudioEngine<B: AudioBackend> {
    core: Option<AudioEngineCore<B>>,
}

impl<B: AudioBackend> Default for AudioEngine<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Creates an uninitialised engine.
    pub fn new() -> Self {
        Self { core: None }
    }

    /// Starts the engine on `backend`. An engine that is already running is
    /// shut down first.
    pub fn init(&mut self, backend: B, config: &EngineConfig) {
        if let Some(previous) = self.core.take() {
            log::warn!("Audio engine initialised twice, shutting down the previous instance");
            previous.shutdown();
        }
        self.core = Some(AudioEngineCore::with_config(backend, config));
    }

    /// Stops all channels, unloads all sounds and releases the backend.
    pub fn shutdown(&mut self) {
        if let Some(core) = self.core.take() {
            core.shutdown();
        }
    }

    /// Whether `init` has been called without a matching `shutdown`.
    pub fn is_initialized(&self) -> bool {
        self.core.is_some()
    }

    /// Advances the engine by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let Some(core) = &mut self.core {
            core.update(dt);
        }
    }

    /// Registers a sound, loading it now if the descriptor asks for it.
    pub fn register_sound(&mut self, descriptor: SoundDescriptor) -> Option<SoundId> {
        self.core
            .as_mut()
            .map(|core| core.register_sound(descriptor))
    }

    /// Unloads and forgets a sound.
    pub fn unregister_sound(&mut self, sound_id: SoundId) {
        if let Some(core) = &mut self.core {
            core.unregister_sound(sound_id);
        }
    }

    /// Loads a sound. Embedded sounds take their bytes through `data`.
    pub fn load_sound(&mut self, sound_id: SoundId, data: Option<&[u8]>) {
        if let Some(core) = &mut self.core {
            core.load_sound(sound_id, data);
        }
    }

    /// Releases a sound's resource, keeping it registered.
    pub fn unload_sound(&mut self, sound_id: SoundId) {
        if let Some(core) = &mut self.core {
            core.unload_sound(sound_id);
        }
    }

    /// Plays a sound. The returned id may map to no channel if the sound
    /// could not be loaded.
    pub fn play_sound(
        &mut self,
        sound_id: SoundId,
        position: impl Into<Vec3>,
        volume_db: f32,
    ) -> Option<ChannelId> {
        let position = position.into();
        self.core
            .as_mut()
            .map(|core| core.play_sound(sound_id, position, volume_db))
    }

    /// Moves a channel.
    pub fn set_channel_3d_position(&mut self, channel_id: ChannelId, position: impl Into<Vec3>) {
        if let Some(core) = &mut self.core {
            core.set_channel_3d_position(channel_id, position.into());
        }
    }

    /// Sets a channel's volume in decibels.
    pub fn set_channel_volume(&mut self, channel_id: ChannelId, volume_db: f32) {
        if let Some(core) = &mut self.core {
            core.set_channel_volume(channel_id, volume_db);
        }
    }

    /// Places and orients the listener.
    pub fn set_3d_listener_and_orientation(
        &mut self,
        position: impl Into<Vec3>,
        look: impl Into<Vec3>,
        up: impl Into<Vec3>,
    ) {
        if let Some(core) = &mut self.core {
            core.set_listener(position.into(), look.into(), up.into());
        }
    }

    /// Stops a channel, fading out over `fade_seconds` when positive.
    pub fn stop_channel(&mut self, channel_id: ChannelId, fade_seconds: f32) {
        if let Some(core) = &mut self.core {
            core.stop_channel(channel_id, fade_seconds);
        }
    }

    /// Stops every channel immediately.
    pub fn stop_all_channels(&mut self) {
        if let Some(core) = &mut self.core {
            core.stop_all_channels();
        }
    }

    /// Whether a channel is playing.
    pub fn is_playing(&self, channel_id: ChannelId) -> bool {
        self.core
            .as_ref()
            .is_some_and(|core| core.is_playing(channel_id))
    }

    /// The state of a live channel.
    pub fn channel_state(&self, channel_id: ChannelId) -> Option<ChannelState> {
        self.core.as_ref()?.channel_state(channel_id)
    }

    /// The running engine core, if initialised.
    pub fn core(&self) -> Option<&AudioEngineCore<B>> {
        self.core.as_ref()
    }

    /// Mutable access to the running engine core, if initialised.
    pub fn core_mut(&mut self) -> Option<&mut AudioEngineCore<B>> {
        self.core.as_mut()
    }

    /// Converts decibels to a linear volume.
    pub fn db_to_volume(db: f32) -> f32 {
        volume::db_to_volume(db)
    }

    /// Converts a linear volume to decibels.
    pub fn volume_to_db(volume: f32) -> f32 {
        volume::volume_to_db(volume)
    }
}
