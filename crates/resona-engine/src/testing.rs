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

//! An in-process backend double for unit tests.

use resona_core::audio::backend::{
    AudioBackend, ChannelHandle, ListenerAttributes, SampleFormat, SoundFormat, SoundHandle,
    SoundMode,
};
use resona_core::audio::error::BackendError;
use resona_core::math::Vec3;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug)]
pub struct MockSound {
    pub mode: SoundMode,
    pub distance: (f32, f32),
    pub memory_length: Option<usize>,
}

#[derive(Debug)]
pub struct MockChannel {
    pub sound: u64,
    pub playing: bool,
    pub paused: bool,
    pub volume: f32,
    pub position: Vec3,
}

#[derive(Debug, Default)]
pub struct MockBackend {
    sounds: BTreeMap<u64, MockSound>,
    channels: BTreeMap<u64, MockChannel>,
    next_id: u64,
    created: usize,
    released: usize,
    probes: usize,
    fail_creates: usize,
    fail_play: bool,
    updates: usize,
    closed: bool,
    pub listener: Option<ListenerAttributes>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_creates(&mut self, count: usize) {
        self.fail_creates = count;
    }

    pub fn fail_play(&mut self, fail: bool) {
        self.fail_play = fail;
    }

    pub fn finish_all_channels(&mut self) {
        for channel in self.channels.values_mut() {
            channel.playing = false;
        }
    }

    pub fn sound(&self, raw: u64) -> Option<&MockSound> {
        self.sounds.get(&raw)
    }

    pub fn only_channel(&self) -> Option<&MockChannel> {
        self.channels.values().next()
    }

    pub fn playing_channels(&self) -> usize {
        self.channels.values().filter(|c| c.playing).count()
    }

    pub fn created_sounds(&self) -> usize {
        self.created
    }

    pub fn released_sounds(&self) -> usize {
        self.released
    }

    pub fn live_sounds(&self) -> usize {
        self.sounds.len()
    }

    pub fn probes(&self) -> usize {
        self.probes
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn create(
        &mut self,
        mode: SoundMode,
        memory_length: Option<usize>,
    ) -> Result<SoundHandle, BackendError> {
        if self.fail_creates > 0 {
            self.fail_creates -= 1;
            return Err(BackendError::Other("scripted create failure".to_string()));
        }
        self.next_id += 1;
        self.created += 1;
        self.sounds.insert(
            self.next_id,
            MockSound {
                mode,
                distance: (0.0, 0.0),
                memory_length,
            },
        );
        Ok(SoundHandle::from_raw(self.next_id))
    }

    fn channel_mut(&mut self, channel: &ChannelHandle) -> Result<&mut MockChannel, BackendError> {
        self.channels
            .get_mut(&channel.raw())
            .ok_or(BackendError::InvalidHandle(channel.raw()))
    }
}

impl AudioBackend for MockBackend {
    fn probe(&mut self, _path: &Path, mode: SoundMode) -> Result<SoundFormat, BackendError> {
        assert!(mode.open_only, "probes must not create playable resources");
        self.probes += 1;
        Ok(SoundFormat {
            sample_format: SampleFormat::Pcm16,
            channels: 1,
            frequency: 44100.0,
            length_bytes: 0,
        })
    }

    fn create_sound(&mut self, _path: &Path, mode: SoundMode) -> Result<SoundHandle, BackendError> {
        self.create(mode, None)
    }

    fn create_sound_from_memory(
        &mut self,
        data: &[u8],
        mode: SoundMode,
        format: &SoundFormat,
    ) -> Result<SoundHandle, BackendError> {
        assert_eq!(format.length_bytes as usize, data.len());
        self.create(mode, Some(data.len()))
    }

    fn release_sound(&mut self, sound: SoundHandle) -> Result<(), BackendError> {
        self.sounds
            .remove(&sound.raw())
            .ok_or(BackendError::InvalidHandle(sound.raw()))?;
        self.released += 1;
        for channel in self.channels.values_mut().filter(|c| c.sound == sound.raw()) {
            channel.playing = false;
        }
        Ok(())
    }

    fn set_sound_distance(
        &mut self,
        sound: &SoundHandle,
        min_distance: f32,
        max_distance: f32,
    ) -> Result<(), BackendError> {
        let entry = self
            .sounds
            .get_mut(&sound.raw())
            .ok_or(BackendError::InvalidHandle(sound.raw()))?;
        entry.distance = (min_distance, max_distance);
        Ok(())
    }

    fn sound_mode(&self, sound: &SoundHandle) -> Result<SoundMode, BackendError> {
        self.sounds
            .get(&sound.raw())
            .map(|s| s.mode)
            .ok_or(BackendError::InvalidHandle(sound.raw()))
    }

    fn play_sound(
        &mut self,
        sound: &SoundHandle,
        paused: bool,
    ) -> Result<ChannelHandle, BackendError> {
        if self.fail_play {
            return Err(BackendError::ChannelLimit(0));
        }
        if !self.sounds.contains_key(&sound.raw()) {
            return Err(BackendError::InvalidHandle(sound.raw()));
        }
        self.next_id += 1;
        self.channels.insert(
            self.next_id,
            MockChannel {
                sound: sound.raw(),
                playing: true,
                paused,
                volume: 1.0,
                position: Vec3::ZERO,
            },
        );
        Ok(ChannelHandle::from_raw(self.next_id))
    }

    fn set_channel_3d_attributes(
        &mut self,
        channel: &ChannelHandle,
        position: Vec3,
        _velocity: Vec3,
    ) -> Result<(), BackendError> {
        self.channel_mut(channel)?.position = position;
        Ok(())
    }

    fn set_channel_volume(
        &mut self,
        channel: &ChannelHandle,
        volume: f32,
    ) -> Result<(), BackendError> {
        self.channel_mut(channel)?.volume = volume;
        Ok(())
    }

    fn channel_volume(&self, channel: &ChannelHandle) -> Result<f32, BackendError> {
        self.channels
            .get(&channel.raw())
            .map(|c| c.volume)
            .ok_or(BackendError::InvalidHandle(channel.raw()))
    }

    fn set_channel_paused(
        &mut self,
        channel: &ChannelHandle,
        paused: bool,
    ) -> Result<(), BackendError> {
        self.channel_mut(channel)?.paused = paused;
        Ok(())
    }

    fn is_channel_playing(&self, channel: &ChannelHandle) -> Result<bool, BackendError> {
        Ok(self.channels.get(&channel.raw()).is_some_and(|c| c.playing))
    }

    fn stop_channel(&mut self, channel: &ChannelHandle) -> Result<(), BackendError> {
        self.channel_mut(channel)?.playing = false;
        Ok(())
    }

    fn set_listener(&mut self, listener: &ListenerAttributes) -> Result<(), BackendError> {
        self.listener = Some(*listener);
        Ok(())
    }

    fn update(&mut self, _dt: f32) -> Result<(), BackendError> {
        self.updates += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.closed = true;
        Ok(())
    }
}
