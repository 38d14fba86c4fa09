//! The execution orchestrator: gate on the verdict, then submit.

use crate::payload::TransferPayload;
use dashmap::DashMap;
use fpl_client::{FplClient, FplClientError};
use fpl_domain::{ActiveChips, Squad, TransferRequest};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use transfer_validator::{codes, Level, TransferValidator, ValidationRequest, Verdict};

/// One transfer batch to execute for an account's team entry.
#[derive(Debug, Clone)]
pub struct ExecutionRequest<'a> {
    pub entry: u64,
    pub transfers: &'a [TransferRequest],
    pub squad: &'a Squad,
    /// Bank in tenths of a million.
    pub bank: i64,
    pub gameweek: u32,
    pub chips: ActiveChips,
    pub override_failures: bool,
}

/// What came back: the final verdict (validation messages plus any
/// execution-stage errors) and whether the batch was committed upstream.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub success: bool,
    pub verdict: Verdict,
}

/// Runs the validate-authenticate-submit pipeline.
///
/// Execution is serialized per team entry: two batches for the same entry
/// never race upstream, batches for different entries run independently.
pub struct TransferExecutor {
    client: Arc<FplClient>,
    validator: TransferValidator,
    locks: DashMap<u64, Arc<tokio::sync::Mutex<()>>>,
}

impl TransferExecutor {
    pub fn new(client: Arc<FplClient>) -> Self {
        Self {
            client,
            validator: TransferValidator::new(),
            locks: DashMap::new(),
        }
    }

    pub async fn execute(&self, request: &ExecutionRequest<'_>) -> ExecutionReport {
        let lock = self
            .locks
            .entry(request.entry)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut verdict = self.validator.validate(&ValidationRequest {
            squad: request.squad,
            transfers: request.transfers,
            bank: request.bank,
            gameweek: request.gameweek,
            chips: request.chips,
            override_failures: request.override_failures,
        });

        if verdict.blocked() {
            warn!(
                entry = request.entry,
                failures = verdict.failures().count(),
                "transfer batch rejected by validation"
            );
            return ExecutionReport { success: false, verdict };
        }

        if verdict.has_code(codes::OVERRIDE_USED) {
            tracing::warn!(
                target: "audit",
                entry = request.entry,
                event = "validation override used",
                "security event"
            );
        }

        let payload = TransferPayload::new(request.entry, request.chips, request.transfers);
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => {
                verdict.push(
                    Level::Error,
                    codes::TRANSFER_EXECUTION_FAILED,
                    format!("could not encode transfer payload: {e}"),
                );
                return ExecutionReport { success: false, verdict };
            }
        };

        match self.client.submit_transfers(body).await {
            Ok(_) => {
                for transfer in request.transfers {
                    audit_transfer(request.entry, transfer, true);
                }
                info!(
                    entry = request.entry,
                    transfers = request.transfers.len(),
                    "transfer batch committed"
                );
                ExecutionReport { success: true, verdict }
            }
            Err(FplClientError::AuthRequired { reason }) => {
                for transfer in request.transfers {
                    audit_transfer(request.entry, transfer, false);
                }
                verdict.push(
                    Level::Error,
                    codes::AUTH_FAILED,
                    format!("could not authenticate for transfer submission: {reason}"),
                );
                ExecutionReport { success: false, verdict }
            }
            Err(e) => {
                for transfer in request.transfers {
                    audit_transfer(request.entry, transfer, false);
                }
                let details = match &e {
                    FplClientError::Upstream { status, body } => {
                        Some(json!({ "status": status, "body": body }))
                    }
                    FplClientError::Exhausted { attempts, last_error } => {
                        Some(json!({ "attempts": attempts, "last_error": last_error }))
                    }
                    _ => None,
                };
                verdict.push_with_details(
                    Level::Error,
                    codes::TRANSFER_EXECUTION_FAILED,
                    format!("transfer submission failed: {e}"),
                    details,
                );
                ExecutionReport { success: false, verdict }
            }
        }
    }
}

/// One audit record per transfer in the batch.
fn audit_transfer(entry: u64, transfer: &TransferRequest, success: bool) {
    info!(
        target: "audit",
        entry,
        player_out = transfer.player_out.id,
        player_in = transfer.player_in.id,
        success,
        "transfer outcome"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fpl_client::{
        AuthSession, FplClientConfig, HttpTransport, PreparedRequest, RawResponse, RetryPolicy,
        SessionProvider, TransportError,
    };
    use fpl_domain::{ElementType, Player};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedTransport {
        script: Mutex<VecDeque<RawResponse>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<(u16, &str)>) -> Arc<Self> {
            let script = responses
                .into_iter()
                .map(|(status, body)| RawResponse { status, body: body.to_string() })
                .collect();
            Arc::new(Self { script: Mutex::new(script), calls: AtomicU32::new(0) })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, _req: PreparedRequest) -> Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(RawResponse { status: 200, body: "{}".to_string() }))
        }
    }

    struct StubProvider;

    #[async_trait]
    impl SessionProvider for StubProvider {
        async fn authenticated_session(&self) -> Result<AuthSession, FplClientError> {
            Ok(AuthSession { session_id: "sid".into(), csrf_token: "csrf".into() })
        }

        async fn invalidate(&self) {}
    }

    fn fast_config() -> FplClientConfig {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        };
        FplClientConfig {
            retry: policy.clone(),
            transfer_retry: policy,
            ..FplClientConfig::default()
        }
    }

    fn executor(transport: Arc<ScriptedTransport>, with_session: bool) -> TransferExecutor {
        let mut client = FplClient::new(fast_config(), transport);
        if with_session {
            client = client.with_session(Arc::new(StubProvider));
        }
        TransferExecutor::new(Arc::new(client))
    }

    fn squad() -> Squad {
        let mut players = Vec::new();
        let mut id = 0u32;
        let mut push = |position: ElementType, count: usize, players: &mut Vec<Player>| {
            for _ in 0..count {
                id += 1;
                players.push(Player::new(id, position, (id % 6) + 1, 50));
            }
        };
        push(ElementType::Goalkeeper, 1, &mut players);
        push(ElementType::Defender, 4, &mut players);
        push(ElementType::Midfielder, 4, &mut players);
        push(ElementType::Forward, 2, &mut players);
        push(ElementType::Goalkeeper, 1, &mut players);
        push(ElementType::Defender, 1, &mut players);
        push(ElementType::Midfielder, 1, &mut players);
        push(ElementType::Forward, 1, &mut players);
        Squad::new(players)
    }

    fn bench_swap(squad: &Squad, now_cost: u32) -> Vec<TransferRequest> {
        let out = squad.players()[13].clone();
        vec![TransferRequest {
            player_in: Player::new(100, out.position, 7, now_cost),
            player_out: out,
        }]
    }

    fn request<'a>(
        squad: &'a Squad,
        transfers: &'a [TransferRequest],
        bank: i64,
        override_failures: bool,
    ) -> ExecutionRequest<'a> {
        ExecutionRequest {
            entry: 42,
            transfers,
            squad,
            bank,
            gameweek: 5,
            chips: ActiveChips::default(),
            override_failures,
        }
    }

    #[tokio::test]
    async fn a_valid_batch_is_submitted_and_reported() {
        let squad = squad();
        let transfers = bench_swap(&squad, 50);
        let transport = ScriptedTransport::new(vec![(200, "{}")]);
        let executor = executor(transport.clone(), true);

        let report = executor.execute(&request(&squad, &transfers, 100, false)).await;
        assert!(report.success);
        assert!(report.verdict.passed());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn a_blocked_verdict_never_reaches_the_network() {
        let squad = squad();
        // Unaffordable: bank 0, buying 90.0 for a 5.0 sale.
        let transfers = bench_swap(&squad, 900);
        let transport = ScriptedTransport::new(vec![]);
        let executor = executor(transport.clone(), true);

        let report = executor.execute(&request(&squad, &transfers, 0, false)).await;
        assert!(!report.success);
        assert!(report.verdict.has_code(codes::INSUFFICIENT_BUDGET));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn an_override_lets_a_failed_batch_through() {
        let squad = squad();
        let transfers = bench_swap(&squad, 900);
        let transport = ScriptedTransport::new(vec![(200, "{}")]);
        let executor = executor(transport.clone(), true);

        let report = executor.execute(&request(&squad, &transfers, 0, true)).await;
        assert!(report.success);
        assert!(report.verdict.has_code(codes::OVERRIDE_USED));
        assert!(report.verdict.has_code(codes::INSUFFICIENT_BUDGET));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn missing_session_surfaces_as_auth_failed() {
        let squad = squad();
        let transfers = bench_swap(&squad, 50);
        let transport = ScriptedTransport::new(vec![]);
        let executor = executor(transport.clone(), false);

        let report = executor.execute(&request(&squad, &transfers, 100, false)).await;
        assert!(!report.success);
        assert!(report.verdict.has_code(codes::AUTH_FAILED));
        // Authentication failure is detected before any connection.
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn terminal_upstream_rejection_carries_status_and_body() {
        let squad = squad();
        let transfers = bench_swap(&squad, 50);
        let transport = ScriptedTransport::new(vec![(400, r#"{"detail":"too late"}"#)]);
        let executor = executor(transport.clone(), true);

        let report = executor.execute(&request(&squad, &transfers, 100, false)).await;
        assert!(!report.success);
        let message = report
            .verdict
            .messages
            .iter()
            .find(|m| m.code == codes::TRANSFER_EXECUTION_FAILED)
            .unwrap();
        assert_eq!(message.details.as_ref().unwrap()["status"], 400);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_within_the_transfer_budget() {
        let squad = squad();
        let transfers = bench_swap(&squad, 50);
        let transport =
            ScriptedTransport::new(vec![(502, ""), (502, ""), (200, "{}")]);
        let executor = executor(transport.clone(), true);

        let report = executor.execute(&request(&squad, &transfers, 100, false)).await;
        assert!(report.success);
        assert_eq!(transport.calls(), 3);
    }
}
