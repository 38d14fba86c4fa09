//! The transfer rule checks, applied in a fixed order.

use crate::verdict::{codes, Level, Verdict};
use fpl_domain::{
    format_currency, ActiveChips, Squad, TransferRequest, ALLOWED_FORMATIONS,
    MAX_PLAYERS_PER_CLUB, POSITION_LIMITS, SQUAD_SIZE, TRANSFERS_PER_GAMEWEEK,
    TRANSFER_COST_POINTS,
};
use serde_json::json;
use std::collections::HashSet;
use tracing::debug;

/// Everything needed to judge one transfer batch.
#[derive(Debug, Clone)]
pub struct ValidationRequest<'a> {
    /// The squad as it stands before the batch.
    pub squad: &'a Squad,
    pub transfers: &'a [TransferRequest],
    /// Money in the bank, in tenths of a million.
    pub bank: i64,
    /// Gameweek the batch targets; informational, carried into messages.
    pub gameweek: u32,
    pub chips: ActiveChips,
    /// Downgrades the execution gate on a failed verdict.
    pub override_failures: bool,
}

/// Chance-of-playing below this fails the batch.
const CHANCE_FAIL_BELOW: u8 = 25;
/// Chance-of-playing below this (and at or above the fail line) warns.
const CHANCE_WARN_BELOW: u8 = 75;

/// Stateless rule engine. Checks run in a fixed order and all applicable
/// messages are collected; only a malformed batch stops evaluation early.
#[derive(Debug, Default)]
pub struct TransferValidator;

impl TransferValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, request: &ValidationRequest<'_>) -> Verdict {
        let mut verdict = Verdict::pass();

        self.check_shape(request, &mut verdict);
        if !verdict.passed() {
            // The batch is malformed; projecting it onto the squad would
            // judge nonsense.
            return finish(verdict, request.override_failures);
        }

        let projected = request.squad.apply(request.transfers);
        self.check_composition(&projected, &mut verdict);
        self.check_budget(request, &mut verdict);
        self.check_formation(&projected, &mut verdict);
        self.check_transfer_count(request, &mut verdict);
        self.check_availability(request, &mut verdict);

        let verdict = finish(verdict, request.override_failures);
        debug!(
            status = ?verdict.status,
            messages = verdict.messages.len(),
            transfers = request.transfers.len(),
            "transfer batch validated"
        );
        verdict
    }

    fn check_shape(&self, request: &ValidationRequest<'_>, verdict: &mut Verdict) {
        if request.transfers.is_empty() {
            verdict.fail(codes::INVALID_TRANSFER, "transfer batch is empty");
            return;
        }

        let mut outgoing = HashSet::new();
        let mut incoming = HashSet::new();
        for transfer in request.transfers {
            let out = &transfer.player_out;
            let inc = &transfer.player_in;

            if !request.squad.contains(out.id) {
                verdict.fail(
                    codes::INVALID_TRANSFER,
                    format!("{} is not in the current squad", out.web_name),
                );
            }
            if request.squad.contains(inc.id) {
                verdict.fail(
                    codes::INVALID_TRANSFER,
                    format!("{} is already in the squad", inc.web_name),
                );
            }
            if !outgoing.insert(out.id) {
                verdict.fail(
                    codes::INVALID_TRANSFER,
                    format!("{} is transferred out more than once", out.web_name),
                );
            }
            if !incoming.insert(inc.id) {
                verdict.fail(
                    codes::INVALID_TRANSFER,
                    format!("{} is transferred in more than once", inc.web_name),
                );
            }
        }
    }

    fn check_composition(&self, projected: &Squad, verdict: &mut Verdict) {
        if projected.len() != SQUAD_SIZE {
            verdict.push_with_details(
                Level::Fail,
                codes::INVALID_SQUAD_SIZE,
                format!("squad would have {} players, expected {SQUAD_SIZE}", projected.len()),
                Some(json!({ "size": projected.len(), "expected": SQUAD_SIZE })),
            );
        }

        let counts = projected.position_counts();
        for (position, min, max) in POSITION_LIMITS {
            let count = counts.get(&position).copied().unwrap_or(0);
            if count < min || count > max {
                verdict.push_with_details(
                    Level::Fail,
                    codes::INVALID_POSITION_COUNT,
                    format!("{count} {position}s, allowed {min}-{max}"),
                    Some(json!({
                        "position": position.name(),
                        "count": count,
                        "min": min,
                        "max": max,
                    })),
                );
            }
        }

        for (club, count) in projected.club_counts() {
            if count > MAX_PLAYERS_PER_CLUB {
                verdict.push_with_details(
                    Level::Fail,
                    codes::CLUB_LIMIT_EXCEEDED,
                    format!("{count} players from club {club}, maximum {MAX_PLAYERS_PER_CLUB}"),
                    Some(json!({ "club": club, "count": count })),
                );
            }
        }
    }

    fn check_budget(&self, request: &ValidationRequest<'_>, verdict: &mut Verdict) {
        let sold: i64 = request
            .transfers
            .iter()
            .map(|t| i64::from(t.player_out.now_cost))
            .sum();
        let bought: i64 = request
            .transfers
            .iter()
            .map(|t| i64::from(t.player_in.now_cost))
            .sum();
        let remaining = request.bank + sold - bought;

        if remaining < 0 {
            verdict.push_with_details(
                Level::Fail,
                codes::INSUFFICIENT_BUDGET,
                format!("batch is {} over budget", format_currency(-remaining)),
                Some(json!({
                    "bank": request.bank,
                    "sold": sold,
                    "bought": bought,
                    "shortfall": -remaining,
                })),
            );
        }
    }

    fn check_formation(&self, projected: &Squad, verdict: &mut Verdict) {
        let formation = projected.formation();
        if !ALLOWED_FORMATIONS.contains(&formation) {
            verdict.push_with_details(
                Level::Warn,
                codes::INVALID_FORMATION,
                format!(
                    "starting eleven would line up {}-{}-{} which is not a legal formation",
                    formation[1], formation[2], formation[3]
                ),
                Some(json!({ "formation": formation })),
            );
        }
    }

    fn check_transfer_count(&self, request: &ValidationRequest<'_>, verdict: &mut Verdict) {
        let count = request.transfers.len();
        if count > TRANSFERS_PER_GAMEWEEK && !request.chips.lifts_transfer_limit() {
            let extra = count - TRANSFERS_PER_GAMEWEEK;
            let hit = extra as u32 * TRANSFER_COST_POINTS;
            verdict.push_with_details(
                Level::Warn,
                codes::TRANSFER_LIMIT_EXCEEDED,
                format!("{count} transfers will cost a {hit} point hit"),
                Some(json!({
                    "transfers": count,
                    "points_hit": hit,
                    "gameweek": request.gameweek,
                })),
            );
        }
    }

    fn check_availability(&self, request: &ValidationRequest<'_>, verdict: &mut Verdict) {
        for transfer in request.transfers {
            let player = &transfer.player_in;
            if !player.status.is_available() {
                verdict.push_with_details(
                    Level::Warn,
                    codes::PLAYER_UNAVAILABLE,
                    format!("{} is flagged as {:?}", player.web_name, player.status),
                    Some(json!({ "player": player.id, "status": player.status.code() })),
                );
            }
            if let Some(chance) = player.chance_of_playing_next_round {
                if chance < CHANCE_FAIL_BELOW {
                    verdict.push_with_details(
                        Level::Fail,
                        codes::LOW_CHANCE_OF_PLAYING,
                        format!("{} has only a {chance}% chance of playing", player.web_name),
                        Some(json!({ "player": player.id, "chance": chance })),
                    );
                } else if chance < CHANCE_WARN_BELOW {
                    verdict.push_with_details(
                        Level::Warn,
                        codes::LOW_CHANCE_OF_PLAYING,
                        format!("{} has a {chance}% chance of playing", player.web_name),
                        Some(json!({ "player": player.id, "chance": chance })),
                    );
                }
            }
        }
    }
}

/// Apply override semantics: an explicit override keeps the failed status
/// and its messages but opens the execution gate, with an audit trail entry.
fn finish(mut verdict: Verdict, override_failures: bool) -> Verdict {
    if override_failures && verdict.failures().next().is_some() {
        verdict.messages.push(crate::verdict::Message {
            code: codes::OVERRIDE_USED,
            level: Level::Warn,
            message: "validation failures were explicitly overridden".to_string(),
            details: None,
        });
        verdict.override_required = false;
    }
    verdict
}
