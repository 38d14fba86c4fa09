use crate::types::{ElementType, Player, TransferRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A legal squad holds exactly this many players.
pub const SQUAD_SIZE: usize = 15;

/// Per-position (min, max) counts the squad-composition rule enforces.
/// Together with [`SQUAD_SIZE`] these admit exactly one composition:
/// 2 GK, 5 DEF, 5 MID, 3 FWD.
pub const POSITION_LIMITS: [(ElementType, usize, usize); 4] = [
    (ElementType::Goalkeeper, 1, 2),
    (ElementType::Defender, 3, 5),
    (ElementType::Midfielder, 3, 5),
    (ElementType::Forward, 1, 3),
];

/// No club may contribute more than this many squad players.
pub const MAX_PLAYERS_PER_CLUB: usize = 3;

/// Legal starting-XI shapes as [GK, DEF, MID, FWD].
pub const ALLOWED_FORMATIONS: [[usize; 4]; 7] = [
    [1, 3, 4, 3],
    [1, 3, 5, 2],
    [1, 4, 3, 3],
    [1, 4, 4, 2],
    [1, 4, 5, 1],
    [1, 5, 3, 2],
    [1, 5, 4, 1],
];

/// An account's 15-player roster, in pick order (starting XI first).
///
/// Squads are read-only projections: applying transfers always produces a
/// new value, never mutates in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Squad {
    players: Vec<Player>,
}

impl Squad {
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, player_id: u32) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    /// The first eleven picks, the slice the formation rule applies to.
    pub fn starting_xi(&self) -> &[Player] {
        let cut = self.players.len().min(11);
        &self.players[..cut]
    }

    /// Simulate a transfer batch: each `player_out` is removed by id and
    /// each `player_in` appended. The current squad is left untouched.
    pub fn apply(&self, transfers: &[TransferRequest]) -> Squad {
        let mut players = self.players.clone();
        for transfer in transfers {
            players.retain(|p| p.id != transfer.player_out.id);
            players.push(transfer.player_in.clone());
        }
        Squad::new(players)
    }

    /// Player count per position, zero-filled for absent positions.
    pub fn position_counts(&self) -> HashMap<ElementType, usize> {
        let mut counts: HashMap<ElementType, usize> =
            ElementType::ALL.iter().map(|&p| (p, 0)).collect();
        for player in &self.players {
            *counts.entry(player.position).or_insert(0) += 1;
        }
        counts
    }

    /// Player count per club id.
    pub fn club_counts(&self) -> HashMap<u32, usize> {
        let mut counts = HashMap::new();
        for player in &self.players {
            *counts.entry(player.team).or_insert(0) += 1;
        }
        counts
    }

    /// Starting-XI shape as [GK, DEF, MID, FWD].
    pub fn formation(&self) -> [usize; 4] {
        let mut shape = [0usize; 4];
        for player in self.starting_xi() {
            shape[player.position as usize - 1] += 1;
        }
        shape
    }
}

impl From<Vec<Player>> for Squad {
    fn from(players: Vec<Player>) -> Self {
        Self::new(players)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_squad() -> Squad {
        // Two GK, five DEF, five MID, three FWD spread over clubs 1-6.
        let mut players = Vec::new();
        let mut id = 1;
        let mut push = |position: ElementType, count: usize, players: &mut Vec<Player>| {
            for _ in 0..count {
                players.push(Player::new(id, position, (id % 6) + 1, 50));
                id += 1;
            }
        };
        push(ElementType::Goalkeeper, 1, &mut players);
        push(ElementType::Defender, 4, &mut players);
        push(ElementType::Midfielder, 4, &mut players);
        push(ElementType::Forward, 2, &mut players);
        // Bench: one of each plus a spare defender and midfielder.
        push(ElementType::Goalkeeper, 1, &mut players);
        push(ElementType::Defender, 1, &mut players);
        push(ElementType::Midfielder, 1, &mut players);
        push(ElementType::Forward, 1, &mut players);
        Squad::new(players)
    }

    #[test]
    fn apply_replaces_without_mutating_original() {
        let squad = full_squad();
        let out = squad.players()[5].clone();
        let incoming = Player::new(99, out.position, 10, 60);
        let transfers =
            vec![TransferRequest { player_out: out.clone(), player_in: incoming.clone() }];

        let next = squad.apply(&transfers);
        assert_eq!(next.len(), SQUAD_SIZE);
        assert!(!next.contains(out.id));
        assert!(next.contains(incoming.id));
        // Original projection is untouched.
        assert!(squad.contains(out.id));
        assert!(!squad.contains(incoming.id));
    }

    #[test]
    fn apply_of_unknown_player_out_grows_the_squad() {
        let squad = full_squad();
        let ghost = Player::new(500, ElementType::Forward, 9, 40);
        let incoming = Player::new(501, ElementType::Forward, 9, 40);
        let next =
            squad.apply(&[TransferRequest { player_out: ghost, player_in: incoming }]);
        // The validator catches this via the squad-size rule.
        assert_eq!(next.len(), SQUAD_SIZE + 1);
    }

    #[test]
    fn position_counts_cover_all_positions() {
        let counts = full_squad().position_counts();
        assert_eq!(counts[&ElementType::Goalkeeper], 2);
        assert_eq!(counts[&ElementType::Defender], 5);
        assert_eq!(counts[&ElementType::Midfielder], 5);
        assert_eq!(counts[&ElementType::Forward], 3);
    }

    #[test]
    fn formation_reads_first_eleven() {
        let squad = full_squad();
        assert_eq!(squad.formation(), [1, 4, 4, 2]);
        assert!(ALLOWED_FORMATIONS.contains(&squad.formation()));
    }

    #[test]
    fn starting_xi_clamps_short_squads() {
        let squad = Squad::new(vec![Player::new(1, ElementType::Goalkeeper, 1, 40)]);
        assert_eq!(squad.starting_xi().len(), 1);
    }
}
