use std::fmt;
use std::path::{Path, PathBuf};

use super::records::PlayerId;

pub(crate) const GAME_SAVE_FILE: &str = "save";
pub(crate) const GLOBAL_SETTINGS_FILE: &str = "settings";
pub(crate) const PLAYER1_SETTINGS_FILE: &str = "psettings1";
pub(crate) const PLAYER2_SETTINGS_FILE: &str = "psettings2";

/// What is being persisted. Player settings always name their player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    GameSave,
    GlobalSettings,
    PlayerSettings(PlayerId),
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::GameSave => f.write_str("game save"),
            Category::GlobalSettings => f.write_str("global settings"),
            Category::PlayerSettings(player) => write!(f, "{player} settings"),
        }
    }
}

pub fn resolve(data_dir: &Path, category: Category) -> PathBuf {
    let file_name = match category {
        Category::GameSave => GAME_SAVE_FILE,
        Category::GlobalSettings => GLOBAL_SETTINGS_FILE,
        Category::PlayerSettings(PlayerId::Player1) => PLAYER1_SETTINGS_FILE,
        Category::PlayerSettings(PlayerId::Player2) => PLAYER2_SETTINGS_FILE,
    };
    data_dir.join(file_name)
}

/// All four record locations, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SavePaths {
    data_dir: PathBuf,
    game_save: PathBuf,
    global_settings: PathBuf,
    player_settings: [PathBuf; 2],
}

impl SavePaths {
    pub fn resolve(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            game_save: resolve(data_dir, Category::GameSave),
            global_settings: resolve(data_dir, Category::GlobalSettings),
            player_settings: PlayerId::ALL
                .map(|player| resolve(data_dir, Category::PlayerSettings(player))),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, category: Category) -> &Path {
        match category {
            Category::GameSave => &self.game_save,
            Category::GlobalSettings => &self.global_settings,
            Category::PlayerSettings(player) => &self.player_settings[player.index()],
        }
    }
}
