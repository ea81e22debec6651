mod atomic_io;
mod codec;
mod error;
mod manager;
mod paths;
mod records;

pub use codec::{decode, encode, CodecError, PersistedRecord, RecordKind, RECORD_FORMAT_VERSION};
pub use error::PersistenceError;
pub use manager::{PersistenceConfig, SaveLoadManager, SnapshotProvider};
pub use paths::{resolve, Category, SavePaths};
pub use records::{
    AutosaveMode, GamePhase, GameState, GlobalSettings, Language, PlayerId, PlayerSettings,
    Position, Volume, DEFAULT_VOLUME, MAX_VOLUME, NB_PLAYERS, TWO_MINUTES_AUTOSAVE_SECS,
};
