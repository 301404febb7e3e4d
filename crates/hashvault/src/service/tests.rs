use crate::{Error, HashService, RequestId, ServiceState, StopOutcome};
use core::time::Duration;
use std::{collections::HashSet, time::Instant};

const ANGRY_MONKEY: &str =
    "ZEHhWB65gUlzdVwtDQArEyx+KVLzp/aTaRaPlBzYRIFj6vjFdqEb0Q5B8zVKCZ0vKbZPZklJz0Fd7su2A+gf7Q==";
const DELAY: Duration = Duration::from_secs(5);
const TIMEOUT: Duration = Duration::from_secs(10);

fn service() -> HashService {
    HashService::new(DELAY, TIMEOUT)
}

#[tokio::test(start_paused = true)]
async fn submit_then_lookup_after_delay() {
    let service = service();

    let id = service.submit("angryMonkey").unwrap();
    assert_eq!(id, RequestId::new(1));
    assert_eq!(service.lookup(id), Err(Error::NotFound { id }));

    tokio::time::sleep(DELAY + Duration::from_millis(1)).await;
    assert_eq!(service.lookup(id).as_deref(), Ok(ANGRY_MONKEY));
}

#[tokio::test(start_paused = true)]
async fn never_issued_matches_pending() {
    let service = service();
    let pending = service.submit("angryMonkey").unwrap();
    let unknown = RequestId::new(999);

    assert!(matches!(service.lookup(pending), Err(Error::NotFound { .. })));
    assert!(matches!(service.lookup(unknown), Err(Error::NotFound { .. })));
}

#[tokio::test(start_paused = true)]
async fn stats_count_one_sample_per_submission() {
    let service = service();
    assert_eq!(service.stats().total, 0);
    assert_eq!(service.stats().average, 0.0);

    service.submit("one").unwrap();
    let snapshot = service.stats();
    assert_eq!(snapshot.total, 1);
    assert!(snapshot.average >= 0.0);

    // Rejected submissions are not counted.
    assert!(service.submit("").is_err());
    service.submit("two").unwrap();
    assert_eq!(service.stats().total, 2);
}

#[tokio::test]
async fn latency_is_measured_from_request_start() {
    let service = service();
    let head_start = Duration::from_millis(50);
    let start = Instant::now().checked_sub(head_start).unwrap();

    let accepted = service.submit_at("angryMonkey", start).unwrap();
    assert_eq!(accepted.id, RequestId::new(1));
    assert!(accepted.latency.as_micros() >= 50_000);

    let snapshot = service.stats();
    assert_eq!(snapshot.total, 1);
    assert!(snapshot.average >= 50.0, "average was {}", snapshot.average);
}

#[tokio::test]
async fn rejected_submit_at_records_nothing() {
    let service = service();
    let start = Instant::now();
    service.trigger_shutdown();

    assert_eq!(
        service.submit_at("angryMonkey", start),
        Err(Error::ServiceShutdown)
    );
    assert_eq!(service.stats().total, 0);
}

#[tokio::test(start_paused = true)]
async fn empty_password_is_rejected_without_allocating() {
    let service = service();
    assert!(matches!(
        service.submit(""),
        Err(Error::InvalidRequest { .. })
    ));
    assert_eq!(service.submit("x").unwrap(), RequestId::new(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_get_distinct_ids() {
    let service = HashService::new(Duration::from_secs(3600), TIMEOUT);

    let handles: Vec<_> = (0..64)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                (0..16)
                    .map(|j| service.submit(&format!("pw-{i}-{j}")).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.await.unwrap() {
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }
    assert_eq!(seen.len(), 64 * 16);
    assert_eq!(service.stats().total, 64 * 16);
    service.jobs().cancel();
}

#[tokio::test(start_paused = true)]
async fn shutdown_refuses_new_work() {
    let service = service();
    assert!(service.trigger_shutdown());
    assert!(!service.trigger_shutdown());
    assert_eq!(service.submit("late"), Err(Error::ServiceShutdown));
    assert_eq!(service.stats().total, 0);
}

#[tokio::test(start_paused = true)]
async fn drain_waits_for_pending_jobs() {
    let service = service();
    let id = service.submit("angryMonkey").unwrap();

    service.trigger_shutdown();
    let outcome = service.drain(async {}).await;

    assert_eq!(outcome, StopOutcome::Clean);
    assert_eq!(
        service.shutdown_coordinator().state(),
        ServiceState::Stopped
    );
    assert_eq!(service.lookup(id).as_deref(), Ok(ANGRY_MONKEY));
}

#[tokio::test(start_paused = true)]
async fn forced_drain_abandons_jobs() {
    let service = HashService::new(Duration::from_secs(60), TIMEOUT);
    let id = service.submit("angryMonkey").unwrap();

    service.trigger_shutdown();
    let outcome = service.drain(async {}).await;

    assert_eq!(outcome, StopOutcome::Forced);
    // Give the cancelled job a chance to observe the token.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(service.lookup(id).is_err());
    assert_eq!(service.jobs().pending(), 0);
}
