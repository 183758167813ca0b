use super::types::{StatusSnapshot, TriggerOutcome, TriggerSource};
use tokio::sync::RwLock;

/// Read side of the trigger path.
///
/// Updated by the trigger controller at the start and end of each trigger and
/// read by the web layer, which therefore never waits on an in-flight capture.
pub struct StatusBoard {
    inner: RwLock<StatusSnapshot>,
}

impl StatusBoard {
    pub fn new(sites: Vec<String>, next_index: usize) -> Self {
        Self {
            inner: RwLock::new(StatusSnapshot {
                sites,
                next_index,
                in_flight: None,
                triggers_run: 0,
                captures_failed: 0,
                last_outcome: None,
            }),
        }
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().await.clone()
    }

    pub(crate) async fn mark_started(&self, source: TriggerSource) {
        self.inner.write().await.in_flight = Some(source);
    }

    pub(crate) async fn record(&self, outcome: &TriggerOutcome) {
        let mut status = self.inner.write().await;
        status.in_flight = None;
        status.triggers_run += 1;
        if !outcome.success {
            status.captures_failed += 1;
        }
        status.next_index = outcome.next_index;
        status.last_outcome = Some(outcome.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn outcome(success: bool, next_index: usize) -> TriggerOutcome {
        TriggerOutcome {
            id: Uuid::new_v4(),
            source: TriggerSource::Timer,
            index: 0,
            url: String::from("https://a.example"),
            success,
            local_path: None,
            remote_ref: None,
            error: None,
            warnings: Vec::new(),
            next_index,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_updates_counters() {
        let board = StatusBoard::new(vec![String::from("https://a.example")], 0);
        board.mark_started(TriggerSource::OnDemand).await;
        assert_eq!(board.snapshot().await.in_flight, Some(TriggerSource::OnDemand));

        board.record(&outcome(true, 1)).await;
        board.record(&outcome(false, 2)).await;
        let snapshot = board.snapshot().await;
        assert_eq!(snapshot.in_flight, None);
        assert_eq!(snapshot.triggers_run, 2);
        assert_eq!(snapshot.captures_failed, 1);
        assert_eq!(snapshot.next_index, 2);
        assert_eq!(snapshot.last_outcome.map(|o| o.success), Some(false));
    }
}
