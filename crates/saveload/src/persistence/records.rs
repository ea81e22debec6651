use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const NB_PLAYERS: usize = 2;
pub const MAX_VOLUME: u8 = 10;
pub const DEFAULT_VOLUME: u8 = 5;
pub const TWO_MINUTES_AUTOSAVE_SECS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    Player1,
    Player2,
}

impl PlayerId {
    pub const ALL: [PlayerId; NB_PLAYERS] = [PlayerId::Player1, PlayerId::Player2];

    pub fn index(self) -> usize {
        match self {
            PlayerId::Player1 => 0,
            PlayerId::Player2 => 1,
        }
    }

    pub fn other(self) -> PlayerId {
        match self {
            PlayerId::Player1 => PlayerId::Player2,
            PlayerId::Player2 => PlayerId::Player1,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::Player1 => f.write_str("player1"),
            PlayerId::Player2 => f.write_str("player2"),
        }
    }
}

/// Player volume on the 0..=10 settings scale.
///
/// Construction rejects anything above [`MAX_VOLUME`], so a `PlayerSettings`
/// can never hold a value the audio mixer is not prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Volume(u8);

impl Volume {
    pub const MIN: Volume = Volume(0);
    pub const MAX: Volume = Volume(MAX_VOLUME);

    pub fn new(value: u8) -> Option<Self> {
        (value <= MAX_VOLUME).then_some(Self(value))
    }

    /// Clamps into range. Intended for slider input.
    pub fn saturating(value: i32) -> Self {
        Self(value.clamp(0, MAX_VOLUME as i32) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(DEFAULT_VOLUME)
    }
}

impl TryFrom<u8> for Volume {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Volume::new(value).ok_or_else(|| format!("volume {value} exceeds {MAX_VOLUME}"))
    }
}

impl From<Volume> for u8 {
    fn from(volume: Volume) -> Self {
        volume.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    French,
    Spanish,
    German,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AutosaveMode {
    Off,
    OneMinute,
    #[default]
    TwoMinutes,
    FiveMinutes,
    TenMinutes,
}

impl AutosaveMode {
    /// Interval implied by the mode. `Off` reports zero.
    pub fn interval_secs(self) -> u32 {
        match self {
            AutosaveMode::Off => 0,
            AutosaveMode::OneMinute => 60,
            AutosaveMode::TwoMinutes => TWO_MINUTES_AUTOSAVE_SECS,
            AutosaveMode::FiveMinutes => 300,
            AutosaveMode::TenMinutes => 600,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AutosaveMode::Off => "off",
            AutosaveMode::OneMinute => "one minute",
            AutosaveMode::TwoMinutes => "two minutes",
            AutosaveMode::FiveMinutes => "five minutes",
            AutosaveMode::TenMinutes => "ten minutes",
        }
    }
}

/// Settings shared by both players.
///
/// The autosave interval is not stored: it is always derived from `autosave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub language: Language,
    pub autosave: AutosaveMode,
}

impl GlobalSettings {
    pub fn autosave_interval_secs(&self) -> u32 {
        self.autosave.interval_secs()
    }

    /// `None` when autosave is off.
    pub fn autosave_interval(&self) -> Option<Duration> {
        match self.autosave {
            AutosaveMode::Off => None,
            mode => Some(Duration::from_secs(u64::from(mode.interval_secs()))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSettings {
    pub show_hud: bool,
    pub volume: Volume,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            show_hud: true,
            volume: Volume::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameState {
    pub player_positions: [Position; NB_PLAYERS],
    pub phase: GamePhase,
    pub collectibles: Vec<u32>,
    pub switches: Vec<bool>,
    pub has_been_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_rejects_values_above_ten() {
        assert_eq!(Volume::new(10).map(Volume::get), Some(10));
        assert!(Volume::new(11).is_none());
        assert_eq!(Volume::saturating(-3), Volume::MIN);
        assert_eq!(Volume::saturating(42), Volume::MAX);
        assert_eq!(Volume::default().get(), DEFAULT_VOLUME);
    }

    #[test]
    fn default_settings_use_two_minute_autosave() {
        let settings = GlobalSettings::default();
        assert_eq!(settings.language, Language::English);
        assert_eq!(settings.autosave, AutosaveMode::TwoMinutes);
        assert_eq!(settings.autosave_interval_secs(), TWO_MINUTES_AUTOSAVE_SECS);
        assert_eq!(
            settings.autosave_interval(),
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    fn autosave_off_has_no_interval() {
        let settings = GlobalSettings {
            autosave: AutosaveMode::Off,
            ..GlobalSettings::default()
        };
        assert_eq!(settings.autosave_interval_secs(), 0);
        assert_eq!(settings.autosave_interval(), None);
    }

    #[test]
    fn default_game_state_is_not_loaded() {
        let state = GameState::default();
        assert!(!state.has_been_loaded);
        assert_eq!(state.phase, GamePhase::NotStarted);
        assert!(state.collectibles.is_empty());
    }

    #[test]
    fn volume_json_rejects_out_of_range() {
        let parsed = serde_json::from_str::<Volume>("17");
        assert!(parsed.is_err());
        let ok = serde_json::from_str::<Volume>("7").expect("parse");
        assert_eq!(ok.get(), 7);
    }

    #[test]
    fn player_ids_are_distinct() {
        assert_eq!(PlayerId::Player1.other(), PlayerId::Player2);
        assert_ne!(PlayerId::Player1.index(), PlayerId::Player2.index());
    }
}
