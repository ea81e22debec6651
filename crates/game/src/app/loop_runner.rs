use std::process::ExitCode;

use saveload::{
    GameState, GlobalSettings, PersistenceConfig, PersistenceError, PlayerId, PlayerSettings,
    SaveLoadManager, NB_PLAYERS,
};
use serde::Serialize;
use tracing::{error, info, warn};

use super::audio::{mix_volumes, AudioConfig, VolumeMix};
use super::bootstrap::{usage_text, AppWiring, Command};
use super::session::GameSession;

type RunResult<T> = Result<T, String>;

#[derive(Debug, Serialize)]
struct StatusReport {
    data_dir: String,
    save_file_exists: bool,
    settings: GlobalSettings,
    autosave_interval_secs: u32,
    players: [PlayerSettings; NB_PLAYERS],
    game_state: Option<GameState>,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let result = match app.command {
        Command::Help => {
            println!("{}", usage_text());
            Ok(())
        }
        Command::Resume => resume(&app.persistence, &app.audio).map(|_| ()),
        Command::NewGame => new_game(&app.persistence),
        Command::Status => status(&app.persistence).and_then(|report| {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|error| format!("encode status json: {error}"))?;
            println!("{json}");
            Ok(())
        }),
    };

    if let Err(err) = result {
        error!(error = %err, "run_failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn resume(config: &PersistenceConfig, audio: &AudioConfig) -> RunResult<GameState> {
    let mut manager = initialize(config)?;
    restore_player_settings(&mut manager)?;
    let mix = apply_audio_mix(&manager, audio);
    info!(
        music_volume = mix.music_volume,
        music_pan = mix.music_pan,
        sfx_player1 = mix.sfx_volume(PlayerId::Player1),
        sfx_player2 = mix.sfx_volume(PlayerId::Player2),
        "audio_mix_updated"
    );

    let mut session = if manager.check_save_file_exists() {
        let loaded = manager
            .load()
            .map_err(|error| format!("load game save: {error}"))?;
        GameSession::resume(loaded)
    } else {
        info!("no_save_found_starting_new_session");
        GameSession::new()
    };

    session.advance();
    info!(
        phase = ?session.state().phase,
        collectible_count = session.state().collectibles.len(),
        "session_advanced"
    );
    manager
        .save(Some(&session))
        .map_err(|error| format!("save game: {error}"))?;
    info!(
        autosave = manager.settings().autosave.as_str(),
        autosave_interval_secs = manager.settings().autosave_interval_secs(),
        "session_step_saved"
    );
    Ok(manager.game_state().clone())
}

fn new_game(config: &PersistenceConfig) -> RunResult<()> {
    let mut manager = initialize(config)?;
    manager
        .save(None)
        .map_err(|error| format!("reset game save: {error}"))?;
    info!("game_save_reset");
    Ok(())
}

fn status(config: &PersistenceConfig) -> RunResult<StatusReport> {
    let mut manager = initialize(config)?;
    restore_player_settings(&mut manager)?;
    let save_file_exists = manager.check_save_file_exists();
    let game_state = if save_file_exists {
        Some(
            manager
                .load()
                .map_err(|error| format!("load game save: {error}"))?
                .clone(),
        )
    } else {
        None
    };

    Ok(StatusReport {
        data_dir: manager.paths().data_dir().display().to_string(),
        save_file_exists,
        settings: *manager.settings(),
        autosave_interval_secs: manager.settings().autosave_interval_secs(),
        players: PlayerId::ALL.map(|player| *manager.player_settings(player)),
        game_state,
    })
}

fn initialize(config: &PersistenceConfig) -> RunResult<SaveLoadManager> {
    SaveLoadManager::initialize(config).map_err(|error| format!("initialize persistence: {error}"))
}

/// Missing player files mean first run; unreadable ones are reported and the
/// defaults kept, since neither blocks play.
fn restore_player_settings(manager: &mut SaveLoadManager) -> RunResult<()> {
    for player in PlayerId::ALL {
        match manager.load_player_settings(player) {
            Ok(_) => {}
            Err(PersistenceError::NotFound { .. }) => {
                info!(player = %player, "player_settings_defaults_in_use");
            }
            Err(
                error @ (PersistenceError::Format { .. } | PersistenceError::Corruption { .. }),
            ) => {
                warn!(
                    player = %player,
                    error = %error,
                    "player_settings_unreadable_using_defaults"
                );
            }
            Err(error) => return Err(format!("load {player} settings: {error}")),
        }
    }
    Ok(())
}

fn apply_audio_mix(manager: &SaveLoadManager, audio: &AudioConfig) -> VolumeMix {
    let volumes = PlayerId::ALL.map(|player| manager.player_settings(player).volume);
    mix_volumes(audio, volumes)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use saveload::{Category, GamePhase, Volume};
    use tempfile::TempDir;

    use super::*;

    static MANAGER_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn exclusive() -> MutexGuard<'static, ()> {
        MANAGER_TEST_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn config(temp: &TempDir) -> PersistenceConfig {
        PersistenceConfig {
            data_dir: temp.path().to_path_buf(),
        }
    }

    #[test]
    fn resume_starts_new_session_then_continues_it() {
        let _lock = exclusive();
        let temp = TempDir::new().expect("temp");
        let audio = AudioConfig::default();

        let first = resume(&config(&temp), &audio).expect("first run");
        assert_eq!(first.collectibles, vec![1]);
        assert!(!first.has_been_loaded);

        let second = resume(&config(&temp), &audio).expect("second run");
        assert_eq!(second.collectibles, vec![1, 2]);
        assert!(!second.has_been_loaded);
        assert_eq!(second.phase, GamePhase::InProgress);
    }

    #[test]
    fn new_game_discards_previous_progress() {
        let _lock = exclusive();
        let temp = TempDir::new().expect("temp");
        resume(&config(&temp), &AudioConfig::default()).expect("resume");

        new_game(&config(&temp)).expect("new game");
        let report = status(&config(&temp)).expect("status");
        let expected = GameState {
            has_been_loaded: true,
            ..GameState::default()
        };
        assert_eq!(report.game_state, Some(expected));
    }

    #[test]
    fn status_reports_saved_player_settings() {
        let _lock = exclusive();
        let temp = TempDir::new().expect("temp");
        {
            let mut manager = initialize(&config(&temp)).expect("init");
            manager.player_settings_mut(PlayerId::Player2).volume =
                Volume::new(9).expect("volume");
            manager.player_settings_mut(PlayerId::Player2).show_hud = false;
            manager
                .save_player_settings(PlayerId::Player2)
                .expect("save p2");
        }

        let report = status(&config(&temp)).expect("status");
        assert!(!report.save_file_exists);
        assert_eq!(report.game_state, None);
        assert_eq!(report.autosave_interval_secs, 120);
        assert_eq!(report.players[0], PlayerSettings::default());
        assert_eq!(report.players[1].volume.get(), 9);
        assert!(!report.players[1].show_hud);
    }

    #[test]
    fn corrupt_player_file_falls_back_to_defaults() {
        let _lock = exclusive();
        let temp = TempDir::new().expect("temp");
        let mut manager = initialize(&config(&temp)).expect("init");
        let path = manager
            .paths()
            .path(Category::PlayerSettings(PlayerId::Player1))
            .to_path_buf();
        fs::write(&path, b"garbage").expect("seed");

        restore_player_settings(&mut manager).expect("restore");
        assert_eq!(
            manager.player_settings(PlayerId::Player1),
            &PlayerSettings::default()
        );
    }
}
