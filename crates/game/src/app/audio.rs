use std::fs;
use std::path::Path;

use saveload::{PlayerId, Volume, DEFAULT_VOLUME, MAX_VOLUME, NB_PLAYERS};
use serde::Deserialize;

pub(crate) const AUDIO_CONFIG_FILE: &str = "audio.json";

/// Balance points the per-player volume settings are mixed around.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AudioConfig {
    pub music_base: f32,
    pub sfx_base: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            music_base: 0.25,
            sfx_base: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VolumeMix {
    pub music_volume: f32,
    /// -1.0 is fully toward player 1's side, 1.0 toward player 2's.
    pub music_pan: f32,
    pub sfx_volume: [f32; NB_PLAYERS],
}

impl VolumeMix {
    pub(crate) fn sfx_volume(&self, player: PlayerId) -> f32 {
        self.sfx_volume[player.index()]
    }
}

pub(crate) fn load_audio_config(data_dir: &Path) -> Result<AudioConfig, String> {
    let path = data_dir.join(AUDIO_CONFIG_FILE);
    if !path.exists() {
        return Ok(AudioConfig::default());
    }
    let raw = fs::read_to_string(&path)
        .map_err(|error| format!("read audio config '{}': {error}", path.display()))?;
    parse_audio_config(&raw)
}

fn parse_audio_config(raw: &str) -> Result<AudioConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config = match serde_path_to_error::deserialize::<_, AudioConfig>(&mut deserializer) {
        Ok(config) => config,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                return Err(format!("parse audio config: {source}"));
            }
            return Err(format!("parse audio config at {path}: {source}"));
        }
    };

    for (field, value) in [("music_base", config.music_base), ("sfx_base", config.sfx_base)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!(
                "validation failed at {field}: expected value in 0..=1, got {value}"
            ));
        }
    }
    Ok(config)
}

/// Derives music level, stereo pan and per-player effect levels from the two
/// players' volume settings. Both at the default volume yields the bases.
pub(crate) fn mix_volumes(config: &AudioConfig, volumes: [Volume; NB_PLAYERS]) -> VolumeMix {
    let default = f32::from(DEFAULT_VOLUME);
    let scale = f32::from(MAX_VOLUME);
    let [p1, p2] = volumes.map(|volume| f32::from(volume.get()));

    let music_fraction = if config.music_base > 0.5 {
        (1.0 - config.music_base) / scale
    } else {
        config.music_base / scale
    };
    let music_volume = config.music_base + ((p1 - default) + (p2 - default)) * music_fraction;
    let music_pan = (p2 - p1) / scale;

    let sfx_volume = [p1, p2].map(|volume| {
        let fraction = if volume > default {
            (1.0 - config.sfx_base) / scale
        } else {
            config.sfx_base / default
        };
        config.sfx_base + (volume - default) * fraction
    });

    VolumeMix {
        music_volume,
        music_pan,
        sfx_volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volumes(p1: u8, p2: u8) -> [Volume; NB_PLAYERS] {
        [
            Volume::new(p1).expect("p1 volume"),
            Volume::new(p2).expect("p2 volume"),
        ]
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn default_volumes_reproduce_bases() {
        let config = AudioConfig::default();
        let mix = mix_volumes(&config, volumes(5, 5));
        assert!(approx(mix.music_volume, 0.25));
        assert!(approx(mix.music_pan, 0.0));
        assert!(approx(mix.sfx_volume(PlayerId::Player1), 0.75));
        assert!(approx(mix.sfx_volume(PlayerId::Player2), 0.75));
    }

    #[test]
    fn uneven_volumes_shift_balance() {
        let mix = mix_volumes(&AudioConfig::default(), volumes(2, 6));
        assert!(approx(mix.music_volume, 0.2));
        assert!(approx(mix.music_pan, 0.4));
        assert!(approx(mix.sfx_volume(PlayerId::Player1), 0.3));
        assert!(approx(mix.sfx_volume(PlayerId::Player2), 0.775));
    }

    #[test]
    fn mix_stays_within_unit_range_at_extremes() {
        for (p1, p2) in [(0, 0), (0, 10), (10, 0), (10, 10)] {
            let mix = mix_volumes(&AudioConfig::default(), volumes(p1, p2));
            assert!((0.0..=1.0).contains(&mix.music_volume));
            assert!((-1.0..=1.0).contains(&mix.music_pan));
            for sfx in mix.sfx_volume {
                assert!((0.0..=1.0).contains(&sfx), "sfx {sfx} for {p1}/{p2}");
            }
        }
    }

    #[test]
    fn loud_music_base_uses_headroom_fraction() {
        let config = AudioConfig {
            music_base: 0.8,
            sfx_base: 0.5,
        };
        let mix = mix_volumes(&config, volumes(10, 10));
        assert!(approx(mix.music_volume, 0.8 + 10.0 * 0.02));
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config = parse_audio_config(r#"{ "music_base": 0.4 }"#).expect("parse");
        assert!(approx(config.music_base, 0.4));
        assert!(approx(config.sfx_base, 0.75));
    }

    #[test]
    fn config_errors_name_the_field() {
        let error = parse_audio_config(r#"{ "sfx_base": "loud" }"#).expect_err("type");
        assert!(error.contains("sfx_base"), "{error}");

        let error = parse_audio_config(r#"{ "music_base": 1.5 }"#).expect_err("range");
        assert!(error.contains("music_base"), "{error}");
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let temp = tempfile::TempDir::new().expect("temp");
        let config = load_audio_config(temp.path()).expect("load");
        assert_eq!(config, AudioConfig::default());
    }
}
