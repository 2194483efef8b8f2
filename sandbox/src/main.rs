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

//! Drives the audio engine for a few simulated seconds: a looping 3D source
//! circles the listener while one-shots fire, then everything fades out.
//!
//! Pass a RON config file as the first argument to override the defaults.

use anyhow::Result;
use resona_core::math::Vec3;
use resona_engine::{AudioEngine, EngineConfig, SoundDescriptor};
use resona_infra::{VirtualAudioBackend, VirtualSource};

const FRAME: f32 = 1.0 / 60.0;
const SECONDS: u32 = 6;

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let mut backend = VirtualAudioBackend::new(config.max_channels);
    backend.insert_source("assets/engine_hum.ogg", VirtualSource::endless());
    backend.insert_source("assets/footstep.wav", VirtualSource::with_duration(0.4));

    let mut audio = AudioEngine::new();
    audio.init(backend, &config);

    let hum = audio.register_sound(
        SoundDescriptor::file("assets/engine_hum.ogg")
            .three_d(true)
            .looping(true)
            .distance(2.0, 50.0)
            .volume_db(-6.0),
    );
    let footstep = audio.register_sound(SoundDescriptor::file("assets/footstep.wav"));
    let (Some(hum), Some(footstep)) = (hum, footstep) else {
        anyhow::bail!("audio engine is not initialised");
    };

    audio.set_3d_listener_and_orientation(Vec3::ZERO, Vec3::Z, Vec3::Y);
    let orbit = audio.play_sound(hum, [10.0, 0.0, 0.0], -6.0);

    let frames = SECONDS * 60;
    for frame in 0..frames {
        let t = frame as f32 * FRAME;

        if let Some(orbit) = orbit {
            let angle = t * std::f32::consts::TAU / 4.0;
            audio.set_channel_3d_position(orbit, [10.0 * angle.cos(), 0.0, 10.0 * angle.sin()]);
        }
        if frame % 30 == 0 {
            audio.play_sound(footstep, Vec3::ZERO, -12.0);
        }
        if frame == frames - 120 {
            log::info!("Fading everything out over one second");
            if let Some(orbit) = orbit {
                audio.stop_channel(orbit, 1.0);
            }
        }

        audio.update(FRAME);

        if frame % 60 == 0 {
            if let Some(core) = audio.core() {
                let gains: Vec<String> = core
                    .backend()
                    .voices()
                    .map(|voice| format!("{:.2}", voice.volume))
                    .collect();
                log::info!(
                    "t = {t:.1}s, {} live channels, voice volumes [{}]",
                    core.channel_count(),
                    gains.join(", ")
                );
            }
        }
    }

    audio.stop_all_channels();
    audio.update(FRAME);
    audio.shutdown();
    Ok(())
}
