use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Position category as encoded by the upstream API (1-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ElementType {
    Goalkeeper = 1,
    Defender = 2,
    Midfielder = 3,
    Forward = 4,
}

/// Raised when the upstream sends a position code outside 1-4.
#[derive(Debug, Clone, Error)]
#[error("invalid element type code: {0}")]
pub struct InvalidElementType(pub u8);

impl TryFrom<u8> for ElementType {
    type Error = InvalidElementType;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Goalkeeper),
            2 => Ok(Self::Defender),
            3 => Ok(Self::Midfielder),
            4 => Ok(Self::Forward),
            other => Err(InvalidElementType(other)),
        }
    }
}

impl From<ElementType> for u8 {
    fn from(position: ElementType) -> Self {
        position as u8
    }
}

impl ElementType {
    /// All positions in upstream code order.
    pub const ALL: [ElementType; 4] =
        [Self::Goalkeeper, Self::Defender, Self::Midfielder, Self::Forward];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Goalkeeper => "Goalkeeper",
            Self::Defender => "Defender",
            Self::Midfielder => "Midfielder",
            Self::Forward => "Forward",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Availability status, parsed from the upstream single-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlayerStatus {
    Available,
    Doubtful,
    Injured,
    Suspended,
    Unavailable,
}

impl PlayerStatus {
    /// Upstream status codes: a/d/i/s/u. Anything unrecognised is treated
    /// as unavailable rather than silently selectable.
    pub fn from_code(code: &str) -> Self {
        match code {
            "a" => Self::Available,
            "d" => Self::Doubtful,
            "i" => Self::Injured,
            "s" => Self::Suspended,
            _ => Self::Unavailable,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Available => "a",
            Self::Doubtful => "d",
            Self::Injured => "i",
            Self::Suspended => "s",
            Self::Unavailable => "u",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl From<String> for PlayerStatus {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<PlayerStatus> for String {
    fn from(status: PlayerStatus) -> Self {
        status.code().to_string()
    }
}

/// The subset of upstream player data the transfer pipeline needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Upstream element id.
    pub id: u32,

    /// Short display name (e.g. "Haaland").
    pub web_name: String,

    /// Position category.
    pub position: ElementType,

    /// Club id; at most three squad players may share one.
    pub team: u32,

    /// Current price in tenths of a million.
    pub now_cost: u32,

    /// Availability flag from the upstream news feed.
    pub status: PlayerStatus,

    /// 0-100 when the upstream publishes a doubt, None otherwise.
    pub chance_of_playing_next_round: Option<u8>,
}

impl Player {
    /// Minimal constructor used by tests and boundary conversions.
    pub fn new(id: u32, position: ElementType, team: u32, now_cost: u32) -> Self {
        Self {
            id,
            web_name: format!("player-{id}"),
            position,
            team,
            now_cost,
            status: PlayerStatus::Available,
            chance_of_playing_next_round: None,
        }
    }

    pub fn with_status(mut self, status: PlayerStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_chance_of_playing(mut self, chance: u8) -> Self {
        self.chance_of_playing_next_round = Some(chance);
        self
    }
}

/// One proposed swap: `player_out` leaves the squad, `player_in` joins it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub player_out: Player,
    pub player_in: Player,
}

/// Chips active for the gameweek a transfer batch targets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActiveChips {
    pub wildcard: bool,
    pub free_hit: bool,
    pub bench_boost: bool,
    pub triple_captain: bool,
}

impl ActiveChips {
    /// Wildcard and free hit lift the per-gameweek transfer allowance.
    pub fn lifts_transfer_limit(&self) -> bool {
        self.wildcard || self.free_hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_type_round_trips_through_codes() {
        for position in ElementType::ALL {
            let code: u8 = position.into();
            assert_eq!(ElementType::try_from(code).unwrap(), position);
        }
        assert!(ElementType::try_from(0).is_err());
        assert!(ElementType::try_from(5).is_err());
    }

    #[test]
    fn element_type_serde_uses_numeric_repr() {
        let json = serde_json::to_string(&ElementType::Midfielder).unwrap();
        assert_eq!(json, "3");
        let back: ElementType = serde_json::from_str("4").unwrap();
        assert_eq!(back, ElementType::Forward);
    }

    #[test]
    fn status_parses_upstream_codes() {
        assert_eq!(PlayerStatus::from_code("a"), PlayerStatus::Available);
        assert_eq!(PlayerStatus::from_code("i"), PlayerStatus::Injured);
        assert_eq!(PlayerStatus::from_code("s"), PlayerStatus::Suspended);
        assert_eq!(PlayerStatus::from_code("d"), PlayerStatus::Doubtful);
        // Unknown codes must never read as available.
        assert_eq!(PlayerStatus::from_code("x"), PlayerStatus::Unavailable);
        assert!(!PlayerStatus::from_code("x").is_available());
    }

    #[test]
    fn chips_lift_transfer_limit() {
        assert!(!ActiveChips::default().lifts_transfer_limit());
        assert!(ActiveChips { wildcard: true, ..Default::default() }.lifts_transfer_limit());
        assert!(ActiveChips { free_hit: true, ..Default::default() }.lifts_transfer_limit());
        assert!(!ActiveChips { bench_boost: true, ..Default::default() }.lifts_transfer_limit());
    }
}
