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

//! # Resona Engine
//!
//! Sound registration, spatialized playback, fade-out and per-channel
//! lifecycle management on top of an [`AudioBackend`](resona_core::AudioBackend).
//!
//! Applications own an [`AudioEngine`], call [`AudioEngine::init`] with a
//! backend, then drive it with [`AudioEngine::update`] once per frame.

#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod engine;
pub mod facade;
pub mod sound;

#[cfg(test)]
mod testing;

pub use channel::{Channel, ChannelState};
pub use config::EngineConfig;
pub use engine::{AudioEngineCore, ChannelId};
pub use facade::AudioEngine;
pub use sound::{SoundDescriptor, SoundEntry, SoundId, SoundRegistry, SoundSource};
