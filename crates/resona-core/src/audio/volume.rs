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

//! Decibel and linear volume conversion.
//!
//! Callers express volume in decibels; backends expect a linear gain where
//! `1.0` is unity. These two functions are the only place the conversion
//! happens.

/// Converts a gain in decibels to a linear volume: `10^(db / 20)`.
///
/// # Examples
///
/// ```
/// use resona_core::audio::volume::db_to_volume;
/// assert_eq!(db_to_volume(0.0), 1.0);
/// assert!((db_to_volume(20.0) - 10.0).abs() < 1e-4);
/// ```
#[inline]
pub fn db_to_volume(db: f32) -> f32 {
    10.0_f32.powf(0.05 * db)
}

/// Converts a linear volume to a gain in decibels: `20 * log10(volume)`.
///
/// A volume of `0.0` yields negative infinity.
#[inline]
pub fn volume_to_db(volume: f32) -> f32 {
    20.0 * volume.log10()
}
