use saveload::{GamePhase, GameState, PlayerId, Position, SnapshotProvider};

const SWITCH_COUNT: usize = 4;
const STEP_DISTANCE: f32 = 1.5;

/// Minimal live session standing in for the simulation: it owns the working
/// copy of the game state and hands full snapshots to the save manager.
#[derive(Debug, Clone)]
pub(crate) struct GameSession {
    state: GameState,
}

impl GameSession {
    pub(crate) fn new() -> Self {
        Self {
            state: GameState {
                switches: vec![false; SWITCH_COUNT],
                ..GameState::default()
            },
        }
    }

    pub(crate) fn resume(loaded: &GameState) -> Self {
        Self {
            state: loaded.clone(),
        }
    }

    pub(crate) fn state(&self) -> &GameState {
        &self.state
    }

    /// One scripted step of play: both players move, the next collectible is
    /// picked up and the next switch flips.
    pub(crate) fn advance(&mut self) {
        let state = &mut self.state;
        if state.phase == GamePhase::Completed {
            return;
        }
        state.phase = GamePhase::InProgress;

        for player in PlayerId::ALL {
            let position = &mut state.player_positions[player.index()];
            let direction = match player {
                PlayerId::Player1 => 1.0,
                PlayerId::Player2 => -1.0,
            };
            *position = Position {
                x: position.x + STEP_DISTANCE * direction,
                y: position.y,
            };
        }

        let next_collectible = state.collectibles.last().map_or(1, |last| last + 1);
        state.collectibles.push(next_collectible);

        if state.switches.is_empty() {
            state.switches = vec![false; SWITCH_COUNT];
        }
        if let Some(switch) = state.switches.iter_mut().find(|on| !**on) {
            *switch = true;
        } else {
            state.phase = GamePhase::Completed;
        }
    }
}

impl SnapshotProvider for GameSession {
    fn snapshot(&self) -> GameState {
        self.state.clone()
    }
}
