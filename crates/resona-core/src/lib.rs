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

//! # Resona Core
//!
//! Foundational crate containing the contract with the external audio engine,
//! the opaque resource handles it hands out, and the small value types shared
//! by the rest of the workspace (fader, decibel conversion, vectors).

#![warn(missing_docs)]

pub mod audio;
pub mod math;

pub use audio::backend::{AudioBackend, ChannelHandle, SoundHandle};
pub use audio::error::BackendError;
pub use audio::fader::Fader;
pub use audio::volume::{db_to_volume, volume_to_db};
pub use math::Vec3;
