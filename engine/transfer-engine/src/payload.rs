//! Wire format of the upstream transfer-submission endpoint.

use fpl_domain::{ActiveChips, TransferRequest};
use serde::Serialize;

/// One swap as the upstream expects it: element ids plus the prices the
/// batch was priced at.
#[derive(Debug, Clone, Serialize)]
pub struct TransferLine {
    pub element_in: u32,
    pub element_out: u32,
    pub purchase_price: u32,
    pub selling_price: u32,
}

impl From<&TransferRequest> for TransferLine {
    fn from(transfer: &TransferRequest) -> Self {
        Self {
            element_in: transfer.player_in.id,
            element_out: transfer.player_out.id,
            purchase_price: transfer.player_in.now_cost,
            selling_price: transfer.player_out.now_cost,
        }
    }
}

/// Body of the authenticated POST that commits a transfer batch.
#[derive(Debug, Clone, Serialize)]
pub struct TransferPayload {
    pub confirmed: bool,
    pub entry: u64,
    pub wildcard: bool,
    pub freehit: bool,
    pub benchboost: bool,
    pub triple_captain: bool,
    pub transfers: Vec<TransferLine>,
}

impl TransferPayload {
    pub fn new(entry: u64, chips: ActiveChips, transfers: &[TransferRequest]) -> Self {
        Self {
            confirmed: true,
            entry,
            wildcard: chips.wildcard,
            freehit: chips.free_hit,
            benchboost: chips.bench_boost,
            triple_captain: chips.triple_captain,
            transfers: transfers.iter().map(TransferLine::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpl_domain::{ElementType, Player};

    #[test]
    fn payload_carries_ids_and_prices() {
        let transfers = vec![TransferRequest {
            player_out: Player::new(10, ElementType::Midfielder, 1, 55),
            player_in: Player::new(20, ElementType::Midfielder, 2, 80),
        }];
        let payload = TransferPayload::new(
            12345,
            ActiveChips { wildcard: true, ..Default::default() },
            &transfers,
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["confirmed"], true);
        assert_eq!(json["entry"], 12345);
        assert_eq!(json["wildcard"], true);
        assert_eq!(json["freehit"], false);
        assert_eq!(json["triple_captain"], false);
        assert_eq!(json["transfers"][0]["element_in"], 20);
        assert_eq!(json["transfers"][0]["element_out"], 10);
        assert_eq!(json["transfers"][0]["purchase_price"], 80);
        assert_eq!(json["transfers"][0]["selling_price"], 55);
    }
}
