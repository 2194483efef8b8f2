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

//! The registry of sounds known to the engine and their backend resources.

use resona_core::audio::backend::{AudioBackend, SoundHandle, SoundMode};
use resona_core::audio::error::check;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifies a registered sound. Allocated monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SoundId(pub u32);

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sound#{}", self.0)
    }
}

/// Where the bytes of a sound come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundSource {
    /// A file the backend opens by path.
    File(PathBuf),
    /// An in-memory buffer. `path` names a file with the same encoding, which
    /// is probed read-only for the format metadata the memory path needs.
    Embedded {
        /// The file probed for format metadata.
        path: PathBuf,
        /// The encoded bytes, if already supplied.
        data: Option<Arc<[u8]>>,
    },
}

impl SoundSource {
    /// The path the source refers to.
    pub fn path(&self) -> &Path {
        match self {
            SoundSource::File(path) | SoundSource::Embedded { path, .. } => path,
        }
    }
}

/// Everything needed to register a sound.
///
/// ```
/// use resona_engine::SoundDescriptor;
///
/// let bark = SoundDescriptor::file("assets/deepbark.wav")
///     .volume_db(-3.0)
///     .distance(1.0, 360.0)
///     .three_d(true)
///     .looping(true);
/// assert!(bark.auto_load);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SoundDescriptor {
    /// The source of the sound's data.
    pub source: SoundSource,
    /// The default playback volume in decibels.
    pub default_volume_db: f32,
    /// Distance at which attenuation starts.
    pub min_distance: f32,
    /// Distance beyond which attenuation stops.
    pub max_distance: f32,
    /// Whether the sound is positioned in 3D.
    pub is_3d: bool,
    /// Whether playback loops.
    pub looping: bool,
    /// Whether the backend streams rather than fully loading the sound.
    pub streaming: bool,
    /// Whether to load the resource at registration time.
    pub auto_load: bool,
}

impl SoundDescriptor {
    fn with_source(source: SoundSource) -> Self {
        Self {
            source,
            default_volume_db: 0.0,
            min_distance: 1.0,
            max_distance: 10_000.0,
            is_3d: false,
            looping: false,
            streaming: false,
            auto_load: true,
        }
    }

    /// A sound read from a file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_source(SoundSource::File(path.into()))
    }

    /// A sound created from memory. `path` is probed for format metadata;
    /// the bytes may be supplied now or later through a load call.
    pub fn embedded(path: impl Into<PathBuf>, data: Option<Vec<u8>>) -> Self {
        Self::with_source(SoundSource::Embedded {
            path: path.into(),
            data: data.map(Arc::from),
        })
    }

    /// Sets the default volume in decibels.
    pub fn volume_db(mut self, volume_db: f32) -> Self {
        self.default_volume_db = volume_db;
        self
    }

    /// Sets the distance attenuation range.
    pub fn distance(mut self, min_distance: f32, max_distance: f32) -> Self {
        self.min_distance = min_distance;
        self.max_distance = max_distance;
        self
    }

    /// Marks the sound as positioned in 3D.
    pub fn three_d(mut self, is_3d: bool) -> Self {
        self.is_3d = is_3d;
        self
    }

    /// Makes playback loop.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Makes the backend stream the sound.
    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Controls loading at registration time.
    pub fn auto_load(mut self, auto_load: bool) -> Self {
        self.auto_load = auto_load;
        self
    }
}

/// A registered sound. It is loaded exactly when it holds a backend handle.
#[derive(Debug)]
pub struct SoundEntry {
    source: SoundSource,
    default_volume_db: f32,
    min_distance: f32,
    max_distance: f32,
    is_3d: bool,
    looping: bool,
    streaming: bool,
    handle: Option<SoundHandle>,
}

impl SoundEntry {
    fn new(descriptor: SoundDescriptor) -> Self {
        Self {
            source: descriptor.source,
            default_volume_db: descriptor.default_volume_db,
            min_distance: descriptor.min_distance,
            max_distance: descriptor.max_distance,
            is_3d: descriptor.is_3d,
            looping: descriptor.looping,
            streaming: descriptor.streaming,
            handle: None,
        }
    }

    /// The source of the sound's data.
    pub fn source(&self) -> &SoundSource {
        &self.source
    }

    /// The default playback volume in decibels.
    pub fn default_volume_db(&self) -> f32 {
        self.default_volume_db
    }

    /// The distance attenuation range.
    pub fn distance(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    /// Whether the sound is positioned in 3D.
    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    /// Whether playback loops.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Whether the backend streams the sound.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Whether the sound is created from memory.
    pub fn uses_embedded_data(&self) -> bool {
        matches!(self.source, SoundSource::Embedded { .. })
    }

    /// Whether the backend resource exists.
    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// The backend resource, once loaded.
    pub fn handle(&self) -> Option<&SoundHandle> {
        self.handle.as_ref()
    }

    /// The creation flags derived from this entry.
    pub fn mode(&self) -> SoundMode {
        SoundMode {
            is_3d: self.is_3d,
            looping: self.looping,
            streaming: self.streaming,
            ..SoundMode::default()
        }
    }

    fn can_auto_load(&self) -> bool {
        match &self.source {
            SoundSource::File(_) => true,
            SoundSource::Embedded { data, .. } => data.is_some(),
        }
    }
}

/// Owns every registered sound and the backend resources they hold.
#[derive(Debug, Default)]
pub struct SoundRegistry {
    sounds: BTreeMap<SoundId, SoundEntry>,
    next_id: u32,
}

impl SoundRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new entry and returns its id. Does not load anything.
    pub fn register(&mut self, descriptor: SoundDescriptor) -> SoundId {
        let id = SoundId(self.next_id);
        self.next_id += 1;
        self.sounds.insert(id, SoundEntry::new(descriptor));
        id
    }

    /// Whether `register` would be followed by a load for this entry.
    pub(crate) fn wants_auto_load(&self, id: SoundId, requested: bool) -> bool {
        requested && self.sounds.get(&id).is_some_and(SoundEntry::can_auto_load)
    }

    /// Unloads the sound if needed, then forgets it. Unknown ids are ignored.
    pub fn unregister<B: AudioBackend + ?Sized>(&mut self, backend: &mut B, id: SoundId) {
        self.unload(backend, id);
        if self.sounds.remove(&id).is_some() {
            log::debug!("Unregistered {id}");
        }
    }

    /// Creates the backend resource for a sound.
    ///
    /// No-op when the id is unknown or the sound is already loaded. For an
    /// embedded sound, `data` replaces any bytes held so far; the format is
    /// probed from the source path before the resource is created from memory.
    /// Failures are logged and leave the sound unloaded.
    pub fn load<B: AudioBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        id: SoundId,
        data: Option<&[u8]>,
    ) {
        let Some(entry) = self.sounds.get_mut(&id) else {
            log::debug!("Ignoring load of unknown {id}");
            return;
        };
        if entry.is_loaded() {
            return;
        }

        let mode = entry.mode();
        let handle = match &mut entry.source {
            SoundSource::File(path) => check(backend.create_sound(path, mode), "create_sound"),
            SoundSource::Embedded {
                path,
                data: retained,
            } => {
                if let Some(bytes) = data {
                    *retained = Some(Arc::from(bytes));
                }
                match retained {
                    Some(bytes) => load_from_memory(backend, path, bytes, mode),
                    None => {
                        log::warn!("No embedded data supplied for {id} ({})", path.display());
                        None
                    }
                }
            }
        };

        if let Some(handle) = handle {
            check(
                backend.set_sound_distance(&handle, entry.min_distance, entry.max_distance),
                "set_sound_distance",
            );
            log::debug!("Loaded {id} from {}", entry.source.path().display());
            entry.handle = Some(handle);
        }
    }

    /// Releases the backend resource of a sound, if any.
    pub fn unload<B: AudioBackend + ?Sized>(&mut self, backend: &mut B, id: SoundId) {
        let Some(handle) = self.sounds.get_mut(&id).and_then(|entry| entry.handle.take()) else {
            return;
        };
        check(backend.release_sound(handle), "release_sound");
        log::debug!("Unloaded {id}");
    }

    /// Releases every loaded resource.
    pub fn unload_all<B: AudioBackend + ?Sized>(&mut self, backend: &mut B) {
        let loaded: Vec<SoundId> = self
            .sounds
            .iter()
            .filter(|(_, entry)| entry.is_loaded())
            .map(|(id, _)| *id)
            .collect();
        for id in loaded {
            self.unload(backend, id);
        }
    }

    /// Whether the sound exists and holds a backend resource.
    pub fn is_loaded(&self, id: SoundId) -> bool {
        self.sounds.get(&id).is_some_and(SoundEntry::is_loaded)
    }

    /// Whether the id is registered.
    pub fn contains(&self, id: SoundId) -> bool {
        self.sounds.contains_key(&id)
    }

    /// Looks up an entry.
    pub fn get(&self, id: SoundId) -> Option<&SoundEntry> {
        self.sounds.get(&id)
    }

    /// The number of registered sounds.
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// Whether no sound is registered.
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Iterates over the entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SoundId, &SoundEntry)> {
        self.sounds.iter().map(|(id, entry)| (*id, entry))
    }
}

// Memory-backed creation needs the format upfront, so the same source is
// first opened read-only to discover it.
fn load_from_memory<B: AudioBackend + ?Sized>(
    backend: &mut B,
    path: &Path,
    bytes: &[u8],
    mode: SoundMode,
) -> Option<SoundHandle> {
    let probe_mode = SoundMode {
        open_only: true,
        ..mode
    };
    let mut format = check(backend.probe(path, probe_mode), "probe")?;
    format.length_bytes = u32::try_from(bytes.len()).unwrap_or(u32::MAX);

    let memory_mode = SoundMode {
        open_memory: true,
        ..mode
    };
    check(
        backend.create_sound_from_memory(bytes, memory_mode, &format),
        "create_sound_from_memory",
    )
}
