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

//! Defines the error type reported by audio backends.

use thiserror::Error;

/// An error reported by an [`AudioBackend`](super::backend::AudioBackend) call.
///
/// The playback layer never propagates these to the application: they are
/// logged through [`check`] and the caller degrades to a safe state.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The named source could not be found.
    #[error("Audio source not found: '{0}'")]
    NotFound(String),
    /// The handle does not refer to a live sound or channel.
    #[error("Invalid or released handle: {0}")]
    InvalidHandle(u64),
    /// The source data could not be understood.
    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),
    /// An I/O error occurred while reading a source.
    #[error("I/O error while reading audio source")]
    Io(#[from] std::io::Error),
    /// The backend was closed or never initialised.
    #[error("Audio backend is not initialized")]
    NotInitialized,
    /// Every playback voice is already in use.
    #[error("Channel limit of {0} reached")]
    ChannelLimit(u32),
    /// Any other backend-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Logs a failed backend call and converts the result to an `Option`.
///
/// `context` names the operation that was attempted, e.g. `"play_sound"`.
pub fn check<T>(result: Result<T, BackendError>, context: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log::error!("Audio backend error during {context}: {err}");
            None
        }
    }
}
