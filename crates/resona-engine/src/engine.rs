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

//! The engine core: owns the sound registry and the live channels, and drives
//! them once per frame against an [`AudioBackend`].

use crate::channel::{Channel, ChannelState};
use crate::config::EngineConfig;
use crate::sound::{SoundDescriptor, SoundId, SoundRegistry};
use resona_core::audio::backend::{AudioBackend, ListenerAttributes};
use resona_core::audio::error::check;
use resona_core::audio::volume::db_to_volume;
use resona_core::math::Vec3;
use std::collections::BTreeMap;
use std::fmt;

/// Identifies a playback request. Allocated monotonically, never reused.
///
/// An id may map to no live channel: the sound could not be loaded when it
/// was requested, or the channel already finished. Every operation taking a
/// `ChannelId` tolerates that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub u32);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel#{}", self.0)
    }
}

/// Owns the registered sounds, the live channels and the backend.
///
/// Everything happens on the caller's thread inside the public methods; no
/// call blocks. Dropping the core performs the same teardown as
/// [`AudioEngineCore::shutdown`].
pub struct AudioEngineCore<B: AudioBackend> {
    backend: B,
    sounds: SoundRegistry,
    channels: BTreeMap<ChannelId, Channel>,
    next_channel_id: u32,
    shut_down: bool,
}

impl<B: AudioBackend> AudioEngineCore<B> {
    /// Creates a core driving `backend` with default settings.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, &EngineConfig::default())
    }

    /// Creates a core driving `backend` and applies `config`.
    pub fn with_config(backend: B, config: &EngineConfig) -> Self {
        let mut core = Self {
            backend,
            sounds: SoundRegistry::new(),
            channels: BTreeMap::new(),
            next_channel_id: 0,
            shut_down: false,
        };
        core.set_listener_attributes(&config.listener);
        log::info!(
            "Audio engine initialised (max channels: {})",
            config.max_channels
        );
        core
    }

    // --- Sounds ---

    /// Registers a sound and loads it right away if the descriptor asks for
    /// it and the data is available. Never fails; a failed load simply leaves
    /// the sound unloaded.
    pub fn register_sound(&mut self, descriptor: SoundDescriptor) -> SoundId {
        let auto_load = descriptor.auto_load;
        let id = self.sounds.register(descriptor);
        if self.sounds.wants_auto_load(id, auto_load) {
            self.sounds.load(&mut self.backend, id, None);
        }
        log::debug!("Registered {id}");
        id
    }

    /// Unloads and forgets a sound. Unknown ids are ignored.
    ///
    /// Channels still playing it see their voice end and stop on the next update.
    pub fn unregister_sound(&mut self, id: SoundId) {
        self.sounds.unregister(&mut self.backend, id);
    }

    /// Loads a sound, optionally supplying the bytes of an embedded sound.
    pub fn load_sound(&mut self, id: SoundId, data: Option<&[u8]>) {
        self.sounds.load(&mut self.backend, id, data);
    }

    /// Releases a sound's resource while keeping it registered.
    pub fn unload_sound(&mut self, id: SoundId) {
        self.sounds.unload(&mut self.backend, id);
    }

    /// Whether a sound holds a backend resource.
    pub fn is_sound_loaded(&self, id: SoundId) -> bool {
        self.sounds.is_loaded(id)
    }

    /// The registry of sounds.
    pub fn sounds(&self) -> &SoundRegistry {
        &self.sounds
    }

    /// The number of registered sounds.
    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }

    // --- Channels ---

    /// Requests playback of a sound at `position` and `volume_db`.
    ///
    /// A load is attempted if the sound is not loaded yet. If it still is not
    /// loaded, the returned id maps to no channel. Otherwise the channel is
    /// updated once with a zero time step so that it is already playing when
    /// this returns.
    pub fn play_sound(&mut self, sound_id: SoundId, position: Vec3, volume_db: f32) -> ChannelId {
        let channel_id = ChannelId(self.next_channel_id);
        self.next_channel_id += 1;

        if !self.sounds.is_loaded(sound_id) {
            self.sounds.load(&mut self.backend, sound_id, None);
            if !self.sounds.is_loaded(sound_id) {
                log::warn!("Cannot play {sound_id}: not loaded, {channel_id} is inert");
                return channel_id;
            }
        }

        let mut channel = Channel::new(sound_id, position, volume_db);
        channel.update(0.0, &mut self.sounds, &mut self.backend);
        self.channels.insert(channel_id, channel);
        channel_id
    }

    /// Moves a channel. No-op for unknown channels and 2D sounds.
    pub fn set_channel_3d_position(&mut self, id: ChannelId, position: Vec3) {
        if let Some(channel) = self.channels.get_mut(&id) {
            channel.set_3d_attributes(position, Vec3::ZERO, &mut self.backend);
        }
    }

    /// Sets a channel's volume in decibels. No-op for unknown channels.
    pub fn set_channel_volume(&mut self, id: ChannelId, volume_db: f32) {
        if let Some(channel) = self.channels.get_mut(&id) {
            channel.set_volume(db_to_volume(volume_db), &mut self.backend);
        }
    }

    /// Requests a stop, fading out over `fade_seconds` when positive.
    pub fn stop_channel(&mut self, id: ChannelId, fade_seconds: f32) {
        if let Some(channel) = self.channels.get_mut(&id) {
            channel.stop(fade_seconds, &mut self.backend);
        }
    }

    /// Stops every channel immediately, whatever its state, including
    /// channels still waiting for their sound to load.
    pub fn stop_all_channels(&mut self) {
        for channel in self.channels.values_mut() {
            channel.stop(0.0, &mut self.backend);
        }
    }

    /// Whether a channel's voice is alive. `false` for unknown channels.
    pub fn is_playing(&self, id: ChannelId) -> bool {
        self.channels
            .get(&id)
            .is_some_and(|channel| channel.is_playing(&self.backend))
    }

    /// The state of a live channel.
    pub fn channel_state(&self, id: ChannelId) -> Option<ChannelState> {
        self.channels.get(&id).map(Channel::state)
    }

    /// A live channel.
    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    /// The number of live channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    // --- Listener ---

    /// Places the listener at `position`, facing `look` with `up` as its up
    /// direction. `look` and `up` are normalized; the listener velocity is
    /// reset to zero.
    pub fn set_listener(&mut self, position: Vec3, look: Vec3, up: Vec3) {
        self.set_listener_attributes(&ListenerAttributes {
            position,
            velocity: Vec3::ZERO,
            forward: look.normalize(),
            up: up.normalize(),
        });
    }

    /// Sets every listener attribute at once.
    pub fn set_listener_attributes(&mut self, listener: &ListenerAttributes) {
        check(self.backend.set_listener(listener), "set_listener");
    }

    // --- Frame ---

    /// Advances every channel by `dt` seconds, reaps those that reached
    /// [`ChannelState::Stopped`], then lets the backend run its own frame.
    pub fn update(&mut self, dt: f32) {
        let mut stopped = Vec::new();
        for (id, channel) in self.channels.iter_mut() {
            channel.update(dt, &mut self.sounds, &mut self.backend);
            if channel.state() == ChannelState::Stopped {
                stopped.push(*id);
            }
        }
        for id in stopped {
            self.channels.remove(&id);
            log::trace!("Reaped {id}");
        }
        check(self.backend.update(dt), "update");
    }

    /// The backend driven by this core.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend driven by this core.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Stops every channel, unloads every sound and closes the backend.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    // Channels go first: their voices play the sounds' resources.
    fn teardown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        for channel in self.channels.values_mut() {
            if channel.is_playing(&self.backend) {
                channel.stop(0.0, &mut self.backend);
            }
        }
        self.channels.clear();
        self.sounds.unload_all(&mut self.backend);
        check(self.backend.close(), "close");
        log::info!("Audio engine shut down");
    }
}

impl<B: AudioBackend> Drop for AudioEngineCore<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
