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

//! A linear volume ramp driven by frame time.

/// Interpolates a linear volume from an initial value toward a final value
/// while a countdown runs down to zero.
///
/// A fresh fader is finished and not started. [`Fader::start_fade`] arms it;
/// [`Fader::update`] counts down until the remaining time reaches zero, at
/// which point it stays finished until the next `start_fade`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fader {
    started: bool,
    finished: bool,
    remaining: f32,
    duration: f32,
    initial_volume: f32,
    final_volume: f32,
}

impl Default for Fader {
    fn default() -> Self {
        Self::new()
    }
}

impl Fader {
    /// Creates an idle fader with unity initial volume.
    pub fn new() -> Self {
        Self {
            started: false,
            finished: true,
            remaining: 0.0,
            duration: 0.0,
            initial_volume: 1.0,
            final_volume: 1.0,
        }
    }

    /// Starts a ramp toward `final_volume` lasting `duration` seconds.
    ///
    /// A non-positive duration finishes the fade immediately.
    pub fn start_fade(&mut self, final_volume: f32, duration: f32) {
        self.started = true;
        self.final_volume = final_volume;
        if duration > 0.0 {
            self.duration = duration;
            self.remaining = duration;
            self.finished = false;
        } else {
            self.duration = 0.0;
            self.remaining = 0.0;
            self.finished = true;
        }
    }

    /// Advances the countdown by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.finished {
            return;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.finished = true;
        }
    }

    /// The normalized progress of the ramp, from `0.0` (just started) to `1.0`.
    pub fn progress(&self) -> f32 {
        if self.duration > 0.0 {
            1.0 - self.remaining / self.duration
        } else if self.started {
            1.0
        } else {
            0.0
        }
    }

    /// The interpolated volume at the current point of the ramp.
    pub fn volume(&self) -> f32 {
        self.initial_volume - self.progress() * (self.initial_volume - self.final_volume)
    }

    /// Sets the volume the ramp starts from.
    pub fn set_initial_volume(&mut self, volume: f32) {
        self.initial_volume = volume;
    }

    /// The volume the ramp starts from.
    pub fn initial_volume(&self) -> f32 {
        self.initial_volume
    }

    /// The volume the ramp ends at.
    pub fn final_volume(&self) -> f32 {
        self.final_volume
    }

    /// Returns `true` once `start_fade` has been called.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns `true` when no ramp is in progress.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
