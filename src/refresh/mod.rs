//! Periodic board refresh.
//!
//! Participants converge by polling: on every tick each live session gets a
//! freshly loaded board. The loop is optional. Without it a session only
//! picks up peer changes when its participant fetches the session again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::models::{BoardId, BoardState};
use crate::session::{SessionHandle, SessionRegistry};
use crate::store::BoardStore;

/// Counters from one refresh pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub boards_loaded: usize,
    pub sessions_refreshed: usize,
    pub sessions_skipped: usize,
    pub failures: usize,
}

/// Reload every board that has a live session and hand the snapshot to each
/// of its sessions.
///
/// Each board is loaded once per pass with no session locked. A session is
/// only refreshed if it has not written to the store since the pass started;
/// sessions that are busy or wrote in the meantime are picked up on the next
/// tick.
pub async fn refresh_all(registry: &SessionRegistry, store: &dyn BoardStore) -> RefreshReport {
    let mut report = RefreshReport::default();
    let mut boards: HashMap<BoardId, Vec<(SessionHandle, u64)>> = HashMap::new();

    for handle in registry.handles().await {
        let Ok(session) = handle.try_lock() else {
            report.sessions_skipped += 1;
            continue;
        };
        let board_id = session.board_id().clone();
        let seen = session.generation();
        drop(session);
        boards.entry(board_id).or_default().push((handle, seen));
    }

    for (board_id, sessions) in boards {
        let board = match BoardState::load(store, &board_id).await {
            Ok(board) => {
                report.boards_loaded += 1;
                board
            }
            Err(e) => {
                tracing::warn!("Failed to refresh board {}: {}", board_id, e);
                report.failures += 1;
                report.sessions_skipped += sessions.len();
                continue;
            }
        };

        for (handle, seen) in sessions {
            let Ok(mut session) = handle.try_lock() else {
                report.sessions_skipped += 1;
                continue;
            };
            if session.apply_snapshot_since(board.clone(), seen) {
                report.sessions_refreshed += 1;
            } else {
                report.sessions_skipped += 1;
            }
        }
    }

    report
}

/// Timing for the background refresh task.
#[derive(Debug, Clone, Copy)]
pub struct RefreshSettings {
    /// Poll interval; `None` disables the loop entirely.
    pub interval: Option<Duration>,
    /// Idle sessions older than this are dropped; `None` keeps them forever.
    pub session_ttl: Option<Duration>,
}

/// Spawn the refresh loop. Returns `None` when refreshing is disabled.
pub fn spawn(
    registry: Arc<SessionRegistry>,
    store: Arc<dyn BoardStore>,
    settings: RefreshSettings,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Option<JoinHandle<()>> {
    let Some(period) = settings.interval else {
        tracing::info!("Board refresh loop disabled");
        return None;
    };

    tracing::info!("Refreshing boards every {:?}", period);
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Some(ttl) = settings.session_ttl {
                        let evicted = registry.evict_idle(ttl).await;
                        if evicted > 0 {
                            tracing::info!(
                                "Evicted {} idle sessions, {} remain",
                                evicted,
                                registry.len().await
                            );
                        }
                    }
                    let report = refresh_all(&registry, store.as_ref()).await;
                    tracing::trace!(
                        "Refreshed {} sessions across {} boards ({} skipped, {} failed)",
                        report.sessions_refreshed,
                        report.boards_loaded,
                        report.sessions_skipped,
                        report.failures
                    );
                }
                _ = shutdown_rx.changed() => {
                    tracing::info!("Board refresh loop shutting down");
                    break;
                }
            }
        }
    }))
}
