use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use super::atomic_io::{read_record_bytes, write_record_atomic};
use super::codec::{self, PersistedRecord};
use super::error::PersistenceError;
use super::paths::{Category, SavePaths};
use super::records::{GameState, GlobalSettings, PlayerId, PlayerSettings, NB_PLAYERS};

static MANAGER_LIVE: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    pub data_dir: PathBuf,
}

/// Supplies the full game state to persist. Implemented by the live session.
pub trait SnapshotProvider {
    fn snapshot(&self) -> GameState;
}

/// Holds the process-wide "a manager is live" flag until dropped.
#[derive(Debug)]
struct InstanceGuard;

impl InstanceGuard {
    fn acquire() -> Result<Self, PersistenceError> {
        MANAGER_LIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InstanceGuard)
            .map_err(|_| PersistenceError::AlreadyInitialized)
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        MANAGER_LIVE.store(false, Ordering::Release);
    }
}

/// Owns the in-memory game state, global settings and both players' settings,
/// and moves each of them to and from its own file.
///
/// Only one manager may be live per process. Every operation blocks on file
/// I/O and fully replaces its target record; nothing is merged field by field.
/// Saves of different categories are independent: a crash between two saves
/// can leave one file updated and the other stale.
///
/// The manager does no locking of its own. A multi-threaded host should guard
/// each record separately (game state, global settings, one lock per player)
/// so that the two players can save without contending.
#[derive(Debug)]
pub struct SaveLoadManager {
    paths: SavePaths,
    game_state: GameState,
    settings: GlobalSettings,
    player_settings: [PlayerSettings; NB_PLAYERS],
    _instance: InstanceGuard,
}

impl SaveLoadManager {
    /// Claims the process-wide instance, then loads global settings or, on
    /// first run, writes the defaults so the file exists from then on.
    pub fn initialize(config: &PersistenceConfig) -> Result<Self, PersistenceError> {
        let instance = InstanceGuard::acquire()?;
        let mut manager = Self {
            paths: SavePaths::resolve(&config.data_dir),
            game_state: GameState::default(),
            settings: GlobalSettings::default(),
            player_settings: [PlayerSettings::default(); NB_PLAYERS],
            _instance: instance,
        };

        let settings_path = manager.paths.path(Category::GlobalSettings);
        let settings_present = settings_path
            .try_exists()
            .map_err(|source| PersistenceError::io(settings_path, source))?;

        if settings_present {
            manager.load_settings()?;
        } else {
            manager.settings = GlobalSettings::default();
            manager.save_settings()?;
            info!(
                path = %manager.paths.path(Category::GlobalSettings).display(),
                language = ?manager.settings.language,
                autosave = manager.settings.autosave.as_str(),
                autosave_interval_secs = manager.settings.autosave_interval_secs(),
                "global_settings_bootstrapped"
            );
        }

        info!(
            data_dir = %manager.paths.data_dir().display(),
            "save_load_manager_initialized"
        );
        Ok(manager)
    }

    pub fn paths(&self) -> &SavePaths {
        &self.paths
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut GlobalSettings {
        &mut self.settings
    }

    pub fn player_settings(&self, player: PlayerId) -> &PlayerSettings {
        &self.player_settings[player.index()]
    }

    pub fn player_settings_mut(&mut self, player: PlayerId) -> &mut PlayerSettings {
        &mut self.player_settings[player.index()]
    }

    /// Writes the game save.
    ///
    /// With a provider, its snapshot replaces the in-memory state. Without one
    /// there is no live session, so the state is reset to a fresh default
    /// rather than re-persisting whatever was loaded last. Either way the
    /// stored state is not flagged as loaded; only [`Self::load`] sets that.
    pub fn save(
        &mut self,
        provider: Option<&dyn SnapshotProvider>,
    ) -> Result<(), PersistenceError> {
        let mut state = match provider {
            Some(provider) => provider.snapshot(),
            None => {
                debug!("game_state_reset_without_session");
                GameState::default()
            }
        };
        state.has_been_loaded = false;
        self.game_state = state;
        self.write_record(Category::GameSave, &self.game_state)?;
        info!(
            path = %self.paths.path(Category::GameSave).display(),
            phase = ?self.game_state.phase,
            collectible_count = self.game_state.collectibles.len(),
            switch_count = self.game_state.switches.len(),
            "game_state_saved"
        );
        Ok(())
    }

    pub fn save_settings(&self) -> Result<(), PersistenceError> {
        self.write_record(Category::GlobalSettings, &self.settings)?;
        info!(
            language = ?self.settings.language,
            autosave = self.settings.autosave.as_str(),
            "global_settings_saved"
        );
        Ok(())
    }

    pub fn save_player_settings(&self, player: PlayerId) -> Result<(), PersistenceError> {
        let settings = self.player_settings(player);
        self.write_record(Category::PlayerSettings(player), settings)?;
        info!(
            player = %player,
            show_hud = settings.show_hud,
            volume = settings.volume.get(),
            "player_settings_saved"
        );
        Ok(())
    }

    /// Replaces the in-memory game state with the saved one, flagged as loaded.
    ///
    /// Fails with [`PersistenceError::NotFound`] when no save exists; whether
    /// that is recoverable is the caller's call.
    pub fn load(&mut self) -> Result<&GameState, PersistenceError> {
        let mut state = self.read_record::<GameState>(Category::GameSave)?;
        state.has_been_loaded = true;
        self.game_state = state;
        info!(
            phase = ?self.game_state.phase,
            collectible_count = self.game_state.collectibles.len(),
            switch_count = self.game_state.switches.len(),
            "game_state_loaded"
        );
        Ok(&self.game_state)
    }

    pub fn load_settings(&mut self) -> Result<&GlobalSettings, PersistenceError> {
        self.settings = self.read_record::<GlobalSettings>(Category::GlobalSettings)?;
        info!(
            language = ?self.settings.language,
            autosave = self.settings.autosave.as_str(),
            autosave_interval_secs = self.settings.autosave_interval_secs(),
            "global_settings_loaded"
        );
        Ok(&self.settings)
    }

    pub fn load_player_settings(
        &mut self,
        player: PlayerId,
    ) -> Result<&PlayerSettings, PersistenceError> {
        let loaded = self.read_record::<PlayerSettings>(Category::PlayerSettings(player))?;
        self.player_settings[player.index()] = loaded;
        info!(
            player = %player,
            show_hud = loaded.show_hud,
            volume = loaded.volume.get(),
            "player_settings_loaded"
        );
        Ok(self.player_settings(player))
    }

    pub fn check_save_file_exists(&self) -> bool {
        self.paths.path(Category::GameSave).exists()
    }

    fn write_record<R: PersistedRecord>(
        &self,
        category: Category,
        record: &R,
    ) -> Result<(), PersistenceError> {
        let path = self.paths.path(category);
        let bytes = codec::encode(record)
            .map_err(|error| PersistenceError::from_codec(category, path, error))?;
        write_record_atomic(path, &bytes).map_err(|source| PersistenceError::io(path, source))?;
        debug!(
            category = %category,
            path = %path.display(),
            byte_count = bytes.len(),
            "record_written"
        );
        Ok(())
    }

    fn read_record<R: PersistedRecord>(&self, category: Category) -> Result<R, PersistenceError> {
        let path = self.paths.path(category);
        let bytes = read_record_bytes(path)
            .map_err(|source| PersistenceError::io(path, source))?
            .ok_or_else(|| PersistenceError::NotFound {
                category,
                path: path.to_path_buf(),
            })?;
        codec::decode::<R>(&bytes)
            .map_err(|error| PersistenceError::from_codec(category, path, error))
    }
}
