//! Typed domain records for the FPL automation system.
//!
//! Everything the validator and execution pipeline reason about lives here:
//! players, squads, transfer requests, and the game's squad-rule constants.
//! Player data is validated once at the API boundary and flows through the
//! rest of the system as these types.

pub mod squad;
pub mod types;

pub use squad::{Squad, ALLOWED_FORMATIONS, MAX_PLAYERS_PER_CLUB, POSITION_LIMITS, SQUAD_SIZE};
pub use types::{
    ActiveChips, ElementType, InvalidElementType, Player, PlayerStatus, TransferRequest,
};

/// Transfers allowed per gameweek without a wildcard or free hit.
pub const TRANSFERS_PER_GAMEWEEK: usize = 2;

/// Points deducted for each transfer beyond the free allowance.
pub const TRANSFER_COST_POINTS: u32 = 4;

/// Format a price in tenths of a million as the familiar display string.
pub fn format_currency(tenths: i64) -> String {
    let sign = if tenths < 0 { "-" } else { "" };
    let tenths = tenths.abs();
    format!("{sign}\u{a3}{}.{}m", tenths / 10, tenths % 10)
}

/// Total purchase value of a set of players, in tenths.
pub fn squad_value(players: &[Player]) -> i64 {
    players.iter().map(|p| i64::from(p.now_cost)).sum()
}
