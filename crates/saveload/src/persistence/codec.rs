use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::records::{
    AutosaveMode, GamePhase, GameState, GlobalSettings, Language, PlayerSettings, Position,
    Volume, MAX_VOLUME, NB_PLAYERS,
};

const MAGIC: &[u8; 4] = b"SLRC";
const DIGEST_LEN: usize = 32;

pub const RECORD_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    GameState,
    GlobalSettings,
    PlayerSettings,
}

impl RecordKind {
    fn tag(self) -> u8 {
        match self {
            RecordKind::GameState => 1,
            RecordKind::GlobalSettings => 2,
            RecordKind::PlayerSettings => 3,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::GameState => f.write_str("game state"),
            RecordKind::GlobalSettings => f.write_str("global settings"),
            RecordKind::PlayerSettings => f.write_str("player settings"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("failed to encode {kind} record: {message}")]
    Encode { kind: RecordKind, message: String },
    #[error("{kind} stream has invalid format: {message}")]
    Format { kind: RecordKind, message: String },
    #[error("{kind} stream is corrupt: {message}")]
    Corruption { kind: RecordKind, message: String },
}

/// A record with a stable field-by-field wire payload.
pub trait PersistedRecord: Sized {
    const KIND: RecordKind;

    fn encode_payload(&self, payload: &mut Vec<u8>) -> Result<(), CodecError>;

    fn decode_payload(payload: &[u8], cursor: &mut usize) -> Result<Self, CodecError>;
}

pub fn encode<R: PersistedRecord>(record: &R) -> Result<Vec<u8>, CodecError> {
    let mut payload = Vec::<u8>::new();
    record.encode_payload(&mut payload)?;
    frame(R::KIND, &payload)
}

pub fn decode<R: PersistedRecord>(bytes: &[u8]) -> Result<R, CodecError> {
    let kind = R::KIND;
    let mut cursor = 0usize;

    let magic = read_exact(bytes, &mut cursor, MAGIC.len(), kind)?;
    if magic != MAGIC {
        return Err(invalid_format(kind, "invalid magic"));
    }
    let kind_tag = read_u8(bytes, &mut cursor, kind)?;
    if kind_tag != kind.tag() {
        return Err(invalid_format(
            kind,
            format!("record kind tag {kind_tag} does not match expected {}", kind.tag()),
        ));
    }
    let version = read_u16(bytes, &mut cursor, kind)?;
    if version != RECORD_FORMAT_VERSION {
        return Err(invalid_format(
            kind,
            format!("unsupported format version {version} (expected {RECORD_FORMAT_VERSION})"),
        ));
    }
    let payload_len = read_u32(bytes, &mut cursor, kind)? as usize;
    let expected_digest = read_exact(bytes, &mut cursor, DIGEST_LEN, kind)?;
    let payload = read_exact(bytes, &mut cursor, payload_len, kind)?;
    if cursor != bytes.len() {
        return Err(invalid_format(kind, "unexpected trailing bytes"));
    }
    if expected_digest != sha256_bytes(payload) {
        return Err(corrupt(kind, "payload digest mismatch"));
    }

    let mut payload_cursor = 0usize;
    let record = R::decode_payload(payload, &mut payload_cursor)?;
    if payload_cursor != payload.len() {
        return Err(invalid_format(kind, "payload length mismatch"));
    }
    Ok(record)
}

pub(crate) fn frame(kind: RecordKind, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let payload_len = u32::try_from(payload.len())
        .map_err(|_| encode_error(kind, "payload too long for u32 length"))?;

    let mut bytes = Vec::<u8>::with_capacity(MAGIC.len() + 7 + DIGEST_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(kind.tag());
    bytes.extend_from_slice(&RECORD_FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload_len.to_le_bytes());
    bytes.extend_from_slice(&sha256_bytes(payload));
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

impl PersistedRecord for GameState {
    const KIND: RecordKind = RecordKind::GameState;

    fn encode_payload(&self, payload: &mut Vec<u8>) -> Result<(), CodecError> {
        for position in &self.player_positions {
            if !position.x.is_finite() || !position.y.is_finite() {
                return Err(encode_error(Self::KIND, "non-finite player position"));
            }
            payload.extend_from_slice(&position.x.to_le_bytes());
            payload.extend_from_slice(&position.y.to_le_bytes());
        }
        payload.push(phase_tag(self.phase));
        payload.push(u8::from(self.has_been_loaded));

        write_len(payload, self.collectibles.len(), Self::KIND)?;
        for id in &self.collectibles {
            payload.extend_from_slice(&id.to_le_bytes());
        }
        write_len(payload, self.switches.len(), Self::KIND)?;
        for state in &self.switches {
            payload.push(u8::from(*state));
        }
        Ok(())
    }

    fn decode_payload(payload: &[u8], cursor: &mut usize) -> Result<Self, CodecError> {
        let kind = Self::KIND;
        let mut player_positions = [Position::default(); NB_PLAYERS];
        for position in &mut player_positions {
            let x = read_f32(payload, cursor, kind)?;
            let y = read_f32(payload, cursor, kind)?;
            if !x.is_finite() || !y.is_finite() {
                return Err(corrupt(kind, "non-finite player position"));
            }
            *position = Position { x, y };
        }

        let phase_tag = read_u8(payload, cursor, kind)?;
        let phase = phase_from_tag(phase_tag)
            .ok_or_else(|| corrupt(kind, format!("unknown game phase tag {phase_tag}")))?;
        let has_been_loaded = read_bool(payload, cursor, kind, "has_been_loaded")?;

        let collectible_count = read_len(payload, cursor, 4, kind, "collectible")?;
        let mut collectibles = Vec::<u32>::with_capacity(collectible_count);
        for _ in 0..collectible_count {
            collectibles.push(read_u32(payload, cursor, kind)?);
        }

        let switch_count = read_len(payload, cursor, 1, kind, "switch")?;
        let mut switches = Vec::<bool>::with_capacity(switch_count);
        for _ in 0..switch_count {
            switches.push(read_bool(payload, cursor, kind, "switch")?);
        }

        Ok(GameState {
            player_positions,
            phase,
            collectibles,
            switches,
            has_been_loaded,
        })
    }
}

impl PersistedRecord for GlobalSettings {
    const KIND: RecordKind = RecordKind::GlobalSettings;

    fn encode_payload(&self, payload: &mut Vec<u8>) -> Result<(), CodecError> {
        payload.push(language_tag(self.language));
        payload.push(autosave_tag(self.autosave));
        payload.extend_from_slice(&self.autosave_interval_secs().to_le_bytes());
        Ok(())
    }

    fn decode_payload(payload: &[u8], cursor: &mut usize) -> Result<Self, CodecError> {
        let kind = Self::KIND;
        let language_tag = read_u8(payload, cursor, kind)?;
        let language = language_from_tag(language_tag)
            .ok_or_else(|| corrupt(kind, format!("unknown language tag {language_tag}")))?;
        let autosave_tag = read_u8(payload, cursor, kind)?;
        let autosave = autosave_from_tag(autosave_tag)
            .ok_or_else(|| corrupt(kind, format!("unknown autosave mode tag {autosave_tag}")))?;
        let interval = read_u32(payload, cursor, kind)?;
        if interval != autosave.interval_secs() {
            return Err(corrupt(
                kind,
                format!(
                    "autosave interval {interval}s does not match mode '{}' ({}s)",
                    autosave.as_str(),
                    autosave.interval_secs()
                ),
            ));
        }
        Ok(GlobalSettings { language, autosave })
    }
}

impl PersistedRecord for PlayerSettings {
    const KIND: RecordKind = RecordKind::PlayerSettings;

    fn encode_payload(&self, payload: &mut Vec<u8>) -> Result<(), CodecError> {
        payload.push(u8::from(self.show_hud));
        payload.push(self.volume.get());
        Ok(())
    }

    fn decode_payload(payload: &[u8], cursor: &mut usize) -> Result<Self, CodecError> {
        let kind = Self::KIND;
        let show_hud = read_bool(payload, cursor, kind, "show_hud")?;
        let raw_volume = read_u8(payload, cursor, kind)?;
        let volume = Volume::new(raw_volume).ok_or_else(|| {
            corrupt(
                kind,
                format!("volume {raw_volume} outside 0..={MAX_VOLUME}"),
            )
        })?;
        Ok(PlayerSettings { show_hud, volume })
    }
}

fn phase_tag(phase: GamePhase) -> u8 {
    match phase {
        GamePhase::NotStarted => 0,
        GamePhase::InProgress => 1,
        GamePhase::Completed => 2,
    }
}

fn phase_from_tag(tag: u8) -> Option<GamePhase> {
    match tag {
        0 => Some(GamePhase::NotStarted),
        1 => Some(GamePhase::InProgress),
        2 => Some(GamePhase::Completed),
        _ => None,
    }
}

fn language_tag(language: Language) -> u8 {
    match language {
        Language::English => 0,
        Language::French => 1,
        Language::Spanish => 2,
        Language::German => 3,
    }
}

fn language_from_tag(tag: u8) -> Option<Language> {
    match tag {
        0 => Some(Language::English),
        1 => Some(Language::French),
        2 => Some(Language::Spanish),
        3 => Some(Language::German),
        _ => None,
    }
}

fn autosave_tag(mode: AutosaveMode) -> u8 {
    match mode {
        AutosaveMode::Off => 0,
        AutosaveMode::OneMinute => 1,
        AutosaveMode::TwoMinutes => 2,
        AutosaveMode::FiveMinutes => 3,
        AutosaveMode::TenMinutes => 4,
    }
}

fn autosave_from_tag(tag: u8) -> Option<AutosaveMode> {
    match tag {
        0 => Some(AutosaveMode::Off),
        1 => Some(AutosaveMode::OneMinute),
        2 => Some(AutosaveMode::TwoMinutes),
        3 => Some(AutosaveMode::FiveMinutes),
        4 => Some(AutosaveMode::TenMinutes),
        _ => None,
    }
}

fn write_len(target: &mut Vec<u8>, len: usize, kind: RecordKind) -> Result<(), CodecError> {
    let len = u32::try_from(len)
        .map_err(|_| encode_error(kind, "collection too long for u32 length"))?;
    target.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

/// Reads a collection length and rejects counts the remaining bytes cannot hold.
fn read_len(
    bytes: &[u8],
    cursor: &mut usize,
    element_size: usize,
    kind: RecordKind,
    what: &str,
) -> Result<usize, CodecError> {
    let count = read_u32(bytes, cursor, kind)? as usize;
    let remaining = bytes.len().saturating_sub(*cursor);
    if count.saturating_mul(element_size) > remaining {
        return Err(invalid_format(
            kind,
            format!("{what} count {count} exceeds remaining payload"),
        ));
    }
    Ok(count)
}

fn read_bool(
    bytes: &[u8],
    cursor: &mut usize,
    kind: RecordKind,
    field: &str,
) -> Result<bool, CodecError> {
    match read_u8(bytes, cursor, kind)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(corrupt(kind, format!("invalid {field} flag {other}"))),
    }
}

fn read_u8(bytes: &[u8], cursor: &mut usize, kind: RecordKind) -> Result<u8, CodecError> {
    read_exact(bytes, cursor, 1, kind)?
        .first()
        .copied()
        .ok_or_else(|| invalid_format(kind, "unexpected end of stream"))
}

fn read_u16(bytes: &[u8], cursor: &mut usize, kind: RecordKind) -> Result<u16, CodecError> {
    Ok(u16::from_le_bytes(
        read_exact(bytes, cursor, 2, kind)?
            .try_into()
            .map_err(|_| invalid_format(kind, "invalid u16 encoding"))?,
    ))
}

fn read_u32(bytes: &[u8], cursor: &mut usize, kind: RecordKind) -> Result<u32, CodecError> {
    Ok(u32::from_le_bytes(
        read_exact(bytes, cursor, 4, kind)?
            .try_into()
            .map_err(|_| invalid_format(kind, "invalid u32 encoding"))?,
    ))
}

fn read_f32(bytes: &[u8], cursor: &mut usize, kind: RecordKind) -> Result<f32, CodecError> {
    Ok(f32::from_le_bytes(
        read_exact(bytes, cursor, 4, kind)?
            .try_into()
            .map_err(|_| invalid_format(kind, "invalid f32 encoding"))?,
    ))
}

fn read_exact<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
    kind: RecordKind,
) -> Result<&'a [u8], CodecError> {
    let end = cursor.saturating_add(len);
    if end > bytes.len() {
        return Err(invalid_format(kind, "unexpected end of stream"));
    }
    let out = &bytes[*cursor..end];
    *cursor = end;
    Ok(out)
}

fn sha256_bytes(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

fn encode_error(kind: RecordKind, message: impl Into<String>) -> CodecError {
    CodecError::Encode {
        kind,
        message: message.into(),
    }
}

fn invalid_format(kind: RecordKind, message: impl Into<String>) -> CodecError {
    CodecError::Format {
        kind,
        message: message.into(),
    }
}

fn corrupt(kind: RecordKind, message: impl Into<String>) -> CodecError {
    CodecError::Corruption {
        kind,
        message: message.into(),
    }
}
