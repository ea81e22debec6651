use saveload::{resolve_persistence_config, PersistenceConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::audio::{load_audio_config, AudioConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Resume,
    NewGame,
    Status,
    Help,
}

pub(crate) struct AppWiring {
    pub(crate) command: Command,
    pub(crate) persistence: PersistenceConfig,
    pub(crate) audio: AudioConfig,
}

pub(crate) fn build_app(args: &[String]) -> Result<AppWiring, String> {
    init_tracing();
    info!("=== Save/Load Startup ===");

    let command = parse_command(args)?;
    let persistence =
        resolve_persistence_config().map_err(|error| format!("resolve data dir: {error}"))?;
    let audio = load_audio_config(&persistence.data_dir)?;
    info!(
        data_dir = %persistence.data_dir.display(),
        command = ?command,
        music_base = audio.music_base,
        sfx_base = audio.sfx_base,
        "app_wiring_ready"
    );

    Ok(AppWiring {
        command,
        persistence,
        audio,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn parse_command(args: &[String]) -> Result<Command, String> {
    match args {
        [] => Ok(Command::Resume),
        [only] => match only.as_str() {
            "resume" => Ok(Command::Resume),
            "new" => Ok(Command::NewGame),
            "status" => Ok(Command::Status),
            "-h" | "--help" => Ok(Command::Help),
            other => Err(format!("unknown subcommand '{other}'\n{}", usage_text())),
        },
        _ => Err(format!("expected at most one subcommand\n{}", usage_text())),
    }
}

pub(crate) fn usage_text() -> String {
    [
        "game - two-player save/load demo",
        "",
        "Usage:",
        "  game [resume]   load the save if present, play one step, save",
        "  game new        overwrite the save with a fresh default state",
        "  game status     print the persisted records as JSON",
        "",
        "Environment:",
        "  SAVELOAD_DATA_DIR   directory holding the record files",
        "  RUST_LOG            tracing filter (default: info)",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_arguments_resumes() {
        assert_eq!(parse_command(&args(&[])), Ok(Command::Resume));
    }

    #[test]
    fn known_subcommands_parse() {
        assert_eq!(parse_command(&args(&["new"])), Ok(Command::NewGame));
        assert_eq!(parse_command(&args(&["status"])), Ok(Command::Status));
        assert_eq!(parse_command(&args(&["--help"])), Ok(Command::Help));
    }

    #[test]
    fn unknown_or_extra_arguments_fail_with_usage() {
        let error = parse_command(&args(&["delete"])).expect_err("unknown");
        assert!(error.contains("unknown subcommand 'delete'"));
        assert!(error.contains("Usage:"));
        assert!(parse_command(&args(&["new", "status"])).is_err());
    }
}
