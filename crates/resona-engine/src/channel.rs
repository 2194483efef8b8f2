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

//! A single playback instance and the state machine that drives it.
//!
//! A channel can be requested before its sound is loaded. It then waits in
//! [`ChannelState::Loading`] and starts as soon as the resource appears. A
//! stop request is likewise decoupled from the actual stop: the channel
//! passes through [`ChannelState::Stopping`], fading out first if asked to.
//!
//! ```text
//! Initialize ─┬─> Loading ──> ToPlay ──> Playing ──> Stopping ──> Stopped
//!             └──────────────────────────^    │          ^
//!                                              └──────────┘ (start failed / stop)
//! ```

use crate::sound::{SoundId, SoundRegistry};
use resona_core::audio::backend::{AudioBackend, ChannelHandle};
use resona_core::audio::error::check;
use resona_core::audio::fader::Fader;
use resona_core::audio::volume::{db_to_volume, volume_to_db};
use resona_core::math::Vec3;

/// The lifecycle phase of a [`Channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// Just created, nothing requested from the backend yet.
    Initialize,
    /// The sound is loaded and playback should start on the next update.
    ToPlay,
    /// Waiting for the sound's resource to become available.
    ///
    /// There is no load timeout: only a stop request or the sound being
    /// unregistered ends the wait, so a sound that never loads keeps the
    /// channel here.
    Loading,
    /// A backend voice is playing.
    Playing,
    /// Fading out or waiting for the backend to confirm the stop.
    Stopping,
    /// Terminal. The owner reaps the channel.
    Stopped,
}

/// One in-flight playback of a registered sound.
///
/// The channel refers to its sound by id only; the [`SoundRegistry`] keeps
/// ownership of the sound's resource.
#[derive(Debug)]
pub struct Channel {
    sound_id: SoundId,
    handle: Option<ChannelHandle>,
    position: Vec3,
    volume: f32,
    is_3d: bool,
    state: ChannelState,
    stop_requested: bool,
    stop_fader: Fader,
}

impl Channel {
    /// Creates a channel for `sound_id` in [`ChannelState::Initialize`].
    pub fn new(sound_id: SoundId, position: Vec3, volume_db: f32) -> Self {
        let volume = db_to_volume(volume_db);
        let mut stop_fader = Fader::new();
        stop_fader.set_initial_volume(volume);
        Self {
            sound_id,
            handle: None,
            position,
            volume,
            is_3d: false,
            state: ChannelState::Initialize,
            stop_requested: false,
            stop_fader,
        }
    }

    /// Advances the state machine by one frame of `dt` seconds.
    ///
    /// Never fails: backend errors are logged and push the channel toward
    /// [`ChannelState::Stopped`].
    pub fn update<B: AudioBackend + ?Sized>(
        &mut self,
        dt: f32,
        sounds: &mut SoundRegistry,
        backend: &mut B,
    ) {
        match self.state {
            ChannelState::Initialize | ChannelState::ToPlay => {
                if self.stop_requested {
                    self.begin_stopping(dt, backend);
                    return;
                }
                if !sounds.is_loaded(self.sound_id) {
                    sounds.load(backend, self.sound_id, None);
                    self.transition(ChannelState::Loading);
                    return;
                }
                match self.start_playback(sounds, backend) {
                    Some(handle) => {
                        self.handle = Some(handle);
                        self.transition(ChannelState::Playing);
                    }
                    None => self.begin_stopping(dt, backend),
                }
            }
            ChannelState::Loading => {
                if self.stop_requested {
                    self.begin_stopping(dt, backend);
                } else if sounds.is_loaded(self.sound_id) {
                    self.transition(ChannelState::ToPlay);
                } else if !sounds.contains(self.sound_id) {
                    log::warn!("{} was unregistered while a channel waited on it", self.sound_id);
                    self.begin_stopping(dt, backend);
                }
            }
            ChannelState::Playing => {
                if self.stop_requested || !self.is_playing(&*backend) {
                    self.begin_stopping(dt, backend);
                }
            }
            ChannelState::Stopping => self.update_stopping(dt, backend),
            ChannelState::Stopped => {}
        }
    }

    /// Requests a stop, fading out over `fade_seconds` when positive.
    ///
    /// Idempotent. A later call replaces the fade of an earlier one; a
    /// non-positive fade stops the voice right away. A fade starts from the
    /// volume the voice currently has, so restarting one mid-way is seamless.
    pub fn stop<B: AudioBackend + ?Sized>(&mut self, fade_seconds: f32, backend: &mut B) {
        self.stop_requested = true;
        if let Some(handle) = self.handle.as_ref().filter(|_| fade_seconds > 0.0) {
            if let Some(current) = check(backend.channel_volume(handle), "channel_volume") {
                self.stop_fader.set_initial_volume(current);
            }
        }
        self.stop_fader.start_fade(0.0, fade_seconds);
        if fade_seconds <= 0.0 {
            if let Some(handle) = &self.handle {
                check(backend.stop_channel(handle), "stop_channel");
            }
        }
    }

    /// Sets the linear volume, pushing it to the voice if there is one.
    ///
    /// Also becomes the starting point of any later fade-out.
    pub fn set_volume<B: AudioBackend + ?Sized>(&mut self, volume: f32, backend: &mut B) {
        self.volume = volume;
        self.stop_fader.set_initial_volume(volume);
        if let Some(handle) = &self.handle {
            check(backend.set_channel_volume(handle, volume), "set_channel_volume");
        }
    }

    /// Moves the channel. Pushed to the voice only for 3D sounds; before the
    /// voice exists the position is kept and applied when playback starts.
    pub fn set_3d_attributes<B: AudioBackend + ?Sized>(
        &mut self,
        position: Vec3,
        velocity: Vec3,
        backend: &mut B,
    ) {
        self.position = position;
        if !self.is_3d {
            return;
        }
        if let Some(handle) = &self.handle {
            check(
                backend.set_channel_3d_attributes(handle, position, velocity),
                "set_channel_3d_attributes",
            );
        }
    }

    /// Whether the backend voice is alive. `false` while no voice exists.
    pub fn is_playing<B: AudioBackend + ?Sized>(&self, backend: &B) -> bool {
        let Some(handle) = &self.handle else {
            return false;
        };
        match backend.is_channel_playing(handle) {
            Ok(playing) => playing,
            Err(err) => {
                log::debug!("Treating voice {} as stopped: {err}", handle.raw());
                false
            }
        }
    }

    /// The current lifecycle phase.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// The sound this channel plays.
    pub fn sound_id(&self) -> SoundId {
        self.sound_id
    }

    /// The last requested position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// The last requested volume, in decibels.
    pub fn volume_db(&self) -> f32 {
        volume_to_db(self.volume)
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested
    }

    fn start_playback<B: AudioBackend + ?Sized>(
        &mut self,
        sounds: &SoundRegistry,
        backend: &mut B,
    ) -> Option<ChannelHandle> {
        let entry = sounds.get(self.sound_id)?;
        let sound = entry.handle()?;
        let handle = check(backend.play_sound(sound, true), "play_sound")?;

        self.is_3d = check(backend.sound_mode(sound), "sound_mode")
            .map_or(entry.is_3d(), |mode| mode.is_3d);
        if self.is_3d {
            check(
                backend.set_channel_3d_attributes(&handle, self.position, Vec3::ZERO),
                "set_channel_3d_attributes",
            );
        }
        check(backend.set_channel_volume(&handle, self.volume), "set_channel_volume");
        check(backend.set_channel_paused(&handle, false), "set_channel_paused");
        Some(handle)
    }

    // Entering Stopping runs the first stopping step in the same frame, so an
    // unfaded stop completes within a single update.
    fn begin_stopping<B: AudioBackend + ?Sized>(&mut self, dt: f32, backend: &mut B) {
        self.transition(ChannelState::Stopping);
        self.update_stopping(dt, backend);
    }

    fn update_stopping<B: AudioBackend + ?Sized>(&mut self, dt: f32, backend: &mut B) {
        if !self.stop_fader.is_finished() {
            self.stop_fader.update(dt);
            if let Some(handle) = &self.handle {
                check(
                    backend.set_channel_volume(handle, self.stop_fader.volume()),
                    "set_channel_volume",
                );
            }
        }
        if self.stop_fader.is_finished() {
            if let Some(handle) = &self.handle {
                check(backend.stop_channel(handle), "stop_channel");
            }
        }
        if !self.is_playing(&*backend) {
            self.handle = None;
            self.transition(ChannelState::Stopped);
        }
    }

    fn transition(&mut self, next: ChannelState) {
        log::trace!("Channel on {}: {:?} -> {:?}", self.sound_id, self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::SoundDescriptor;
    use crate::testing::MockBackend;
    use approx::assert_relative_eq;

    fn loaded_sound(
        backend: &mut MockBackend,
        registry: &mut SoundRegistry,
        is_3d: bool,
    ) -> SoundId {
        let id = registry.register(SoundDescriptor::file("bark.wav").three_d(is_3d));
        registry.load(backend, id, None);
        id
    }

    #[test]
    fn test_loaded_sound_starts_playing_on_first_update() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, true);

        let mut channel = Channel::new(sound, Vec3::new(1.0, 2.0, 3.0), 0.0);
        assert_eq!(channel.state(), ChannelState::Initialize);
        assert!(!channel.is_playing(&backend));

        channel.update(0.0, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Playing);
        assert!(channel.is_playing(&backend));

        let voice = backend.only_channel().unwrap();
        assert!(!voice.paused, "voice starts paused then is resumed");
        assert_eq!(voice.position, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(voice.volume, 1.0);
    }

    #[test]
    fn test_unloaded_sound_goes_through_loading() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = registry.register(SoundDescriptor::file("bark.wav").auto_load(false));
        backend.fail_next_creates(2);

        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Loading);
        assert!(!channel.is_playing(&backend));

        // Still not loaded: keeps polling.
        channel.update(0.016, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Loading);

        registry.load(&mut backend, sound, None);
        assert!(!registry.is_loaded(sound));
        registry.load(&mut backend, sound, None);
        assert!(registry.is_loaded(sound));

        channel.update(0.016, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::ToPlay);
        channel.update(0.016, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Playing);
    }

    #[test]
    fn test_failed_start_ends_stopped() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, false);
        backend.fail_play(true);

        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Stopped);
    }

    #[test]
    fn test_unfaded_stop_completes_in_one_update() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, false);
        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);

        channel.stop(0.0, &mut backend);
        assert!(!channel.is_playing(&backend), "hard stop is immediate");
        channel.update(0.016, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Stopped);
    }

    #[test]
    fn test_fade_out_ramps_volume_then_stops() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, false);
        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);

        channel.stop(1.0, &mut backend);
        channel.update(0.25, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Stopping);
        assert!(channel.is_playing(&backend));
        assert_relative_eq!(backend.only_channel().unwrap().volume, 0.75, epsilon = 1e-5);

        channel.update(0.25, &mut registry, &mut backend);
        channel.update(0.25, &mut registry, &mut backend);
        assert_relative_eq!(backend.only_channel().unwrap().volume, 0.25, epsilon = 1e-5);
        assert_eq!(channel.state(), ChannelState::Stopping);

        channel.update(0.25, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Stopped);
        assert!(!channel.is_playing(&backend));
    }

    #[test]
    fn test_later_stop_overrides_fade() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, false);
        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);

        channel.stop(10.0, &mut backend);
        channel.update(0.1, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Stopping);

        channel.stop(0.0, &mut backend);
        channel.update(0.1, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Stopped);
    }

    #[test]
    fn test_fade_starts_from_last_set_volume() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, false);
        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);

        channel.set_volume(0.5, &mut backend);
        assert_relative_eq!(backend.only_channel().unwrap().volume, 0.5);

        channel.stop(2.0, &mut backend);
        channel.update(1.0, &mut registry, &mut backend);
        assert_relative_eq!(backend.only_channel().unwrap().volume, 0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_restarted_fade_continues_from_voice_volume() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, false);
        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);

        channel.stop(2.0, &mut backend);
        channel.update(1.0, &mut registry, &mut backend);
        assert_relative_eq!(backend.only_channel().unwrap().volume, 0.5, epsilon = 1e-5);

        channel.stop(1.0, &mut backend);
        channel.update(0.5, &mut registry, &mut backend);
        assert_relative_eq!(backend.only_channel().unwrap().volume, 0.25, epsilon = 1e-5);
        assert_eq!(channel.state(), ChannelState::Stopping);
    }

    #[test]
    fn test_stop_before_start_never_plays() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, false);
        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.stop(0.5, &mut backend);

        channel.update(0.0, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Stopped);
        assert!(backend.only_channel().is_none());
    }

    #[test]
    fn test_stop_cancels_loading() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = registry.register(SoundDescriptor::embedded("bark.wav", None));
        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Loading);

        channel.stop(0.0, &mut backend);
        channel.update(0.016, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Stopped);
    }

    #[test]
    fn test_voice_ending_by_itself_stops_channel() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, false);
        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);

        backend.finish_all_channels();
        channel.update(0.016, &mut registry, &mut backend);
        assert_eq!(channel.state(), ChannelState::Stopped);
    }

    #[test]
    fn test_position_is_ignored_for_2d_sounds() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, false);
        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);

        channel.set_3d_attributes(Vec3::X, Vec3::ZERO, &mut backend);
        assert_eq!(backend.only_channel().unwrap().position, Vec3::ZERO);
        assert_eq!(channel.position(), Vec3::X);
    }

    #[test]
    fn test_position_is_pushed_for_3d_sounds() {
        let mut backend = MockBackend::new();
        let mut registry = SoundRegistry::new();
        let sound = loaded_sound(&mut backend, &mut registry, true);
        let mut channel = Channel::new(sound, Vec3::ZERO, 0.0);
        channel.update(0.0, &mut registry, &mut backend);

        channel.set_3d_attributes(Vec3::new(5.0, 0.0, 1.0), Vec3::ZERO, &mut backend);
        assert_eq!(backend.only_channel().unwrap().position, Vec3::new(5.0, 0.0, 1.0));
    }
}
