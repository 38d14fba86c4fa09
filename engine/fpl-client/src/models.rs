//! DTOs mirroring the upstream JSON payloads.
//!
//! Parsed once at the API boundary; the rest of the system works with the
//! typed records from `fpl-domain`.

use crate::error::FplClientError;
use fpl_domain::{ElementType, Player, PlayerStatus};
use serde::{Deserialize, Serialize};

/// One gameweek entry from the bootstrap `events` array.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: u32,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
}

/// One player entry from the bootstrap `elements` array.
#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    pub id: u32,
    pub web_name: String,
    pub element_type: u8,
    pub team: u32,
    pub now_cost: u32,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub chance_of_playing_next_round: Option<u8>,
    #[serde(default)]
    pub news: String,
}

fn default_status() -> String {
    "a".to_string()
}

impl Element {
    /// Convert to the typed domain record, rejecting position codes the
    /// game does not define.
    pub fn into_player(self) -> Result<Player, FplClientError> {
        let position = ElementType::try_from(self.element_type).map_err(|e| {
            FplClientError::InvalidData(format!("element {}: {e}", self.id))
        })?;
        Ok(Player {
            id: self.id,
            web_name: self.web_name,
            position,
            team: self.team,
            now_cost: self.now_cost,
            status: PlayerStatus::from_code(&self.status),
            chance_of_playing_next_round: self.chance_of_playing_next_round,
        })
    }
}

/// Static bootstrap payload (events + elements; other arrays are ignored).
#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Bootstrap {
    /// Current gameweek id, falling back to the next one between rounds.
    pub fn current_gameweek(&self) -> Option<u32> {
        self.events
            .iter()
            .find(|e| e.is_current)
            .or_else(|| self.events.iter().find(|e| e.is_next))
            .map(|e| e.id)
    }
}

/// One fixture from the fixtures list.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub event: Option<u32>,
    pub team_h: u32,
    pub team_a: u32,
    #[serde(default)]
    pub team_h_difficulty: Option<u8>,
    #[serde(default)]
    pub team_a_difficulty: Option<u8>,
}

/// One pick slot in a gameweek squad.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pick {
    pub element: u32,
    pub position: u32,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
}

/// Bank and transfer state recorded alongside the picks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryHistory {
    /// Unspent budget, in tenths of a million.
    #[serde(default)]
    pub bank: i64,
    #[serde(default)]
    pub event_transfers: u32,
}

/// Authenticated gameweek picks payload.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryPicks {
    #[serde(default)]
    pub picks: Vec<Pick>,
    #[serde(default)]
    pub entry_history: EntryHistory,
}
