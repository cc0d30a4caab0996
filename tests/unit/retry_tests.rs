/*!
 * Unit tests for multi-round retry orchestration
 */

use crate::common;

use yantwai::providers::mock::MockClient;
use yantwai::translation::scheduler::CancelFlag;
use yantwai::translation::{FinalState, RetryController};

#[tokio::test]
async fn test_transient_failures_should_stop_at_the_attempt_bound() {
    let mock = MockClient::transient();
    let counter = mock.clone();
    let controller = RetryController::uniform(common::mock_runner(mock, 4), 2);
    let units = common::content_units(&["a", "b", "c"]);

    let result = controller.run(&units, &CancelFlag::new(), &common::null_sink()).await;

    // 3 units x (1 first attempt + 2 retries)
    assert_eq!(counter.request_count(), 9);
    assert_eq!(result.failed, 3);
    for outcome in &result.outcomes {
        assert_eq!(outcome.attempts, 3);
        assert!(matches!(outcome.state, FinalState::Failed { retryable: true, .. }));
    }
}

#[tokio::test]
async fn test_fatal_failures_should_short_circuit_after_one_attempt() {
    let mock = MockClient::fatal();
    let counter = mock.clone();
    let controller = RetryController::uniform(common::mock_runner(mock, 4), 5);
    let units = common::content_units(&["a", "b"]);

    let result = controller.run(&units, &CancelFlag::new(), &common::null_sink()).await;

    assert_eq!(counter.request_count(), 2);
    for outcome in &result.outcomes {
        assert_eq!(outcome.attempts, 1);
        assert!(matches!(outcome.state, FinalState::Failed { retryable: false, .. }));
    }
}

#[tokio::test]
async fn test_content_blocks_should_be_fatal() {
    let mock = MockClient::blocked();
    let counter = mock.clone();
    let controller = RetryController::uniform(common::mock_runner(mock, 2), 4);
    let units = common::content_units(&["a"]);

    let result = controller.run(&units, &CancelFlag::new(), &common::null_sink()).await;

    assert_eq!(counter.request_count(), 1);
    assert!(matches!(result.outcomes[0].state, FinalState::Failed { retryable: false, .. }));
}

#[tokio::test]
async fn test_only_failed_units_should_be_redispatched() {
    // Ten units, units 2 and 5 fail exactly once: the retry round must
    // carry exactly those two and nothing else
    let mock = MockClient::fail_once_for(["body two", "body five"]);
    let counter = mock.clone();
    let controller = RetryController::uniform(common::mock_runner(mock, 3), 3);
    let units = common::content_units(&[
        "body one", "body two", "body three", "body four", "body five",
        "body six", "body seven", "body eight", "body nine", "body ten",
    ]);

    let result = controller.run(&units, &CancelFlag::new(), &common::null_sink()).await;

    // 10 first-round dispatches + 2 retry dispatches
    assert_eq!(counter.request_count(), 12);
    assert_eq!(result.failed, 0);
    assert_eq!(result.first_try, 8);
    assert_eq!(result.recovered, 2);

    for (position, outcome) in result.outcomes.iter().enumerate() {
        assert_eq!(outcome.ordinal, position, "settled outcomes must keep input order");
        let expected_attempts = if position == 1 || position == 4 { 2 } else { 1 };
        assert_eq!(outcome.attempts, expected_attempts, "unit {}", outcome.id);
        match &outcome.state {
            FinalState::Translated(text) => {
                assert!(text.contains(&units[position].text));
            }
            other => panic!("unit {} not translated: {:?}", outcome.id, other),
        }
    }
}

#[tokio::test]
async fn test_retry_rounds_should_use_the_retry_runner() {
    // First pass always fails retryably; the retry runner always works.
    // Every unit must settle translated via the second runner.
    let first = MockClient::transient();
    let first_counter = first.clone();
    let second = MockClient::working();
    let second_counter = second.clone();

    let controller = RetryController::new(
        common::mock_runner(first, 4),
        common::mock_runner(second, 2),
        1,
    );
    let units = common::content_units(&["a", "b", "c"]);

    let result = controller.run(&units, &CancelFlag::new(), &common::null_sink()).await;

    assert_eq!(first_counter.request_count(), 3);
    assert_eq!(second_counter.request_count(), 3);
    assert_eq!(result.failed, 0);
    assert_eq!(result.recovered, 3);
}

#[tokio::test]
async fn test_cancelled_run_should_settle_units_as_retryable() {
    let controller = RetryController::uniform(common::mock_runner(MockClient::working(), 2), 3);
    let units = common::content_units(&["a", "b"]);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let result = controller.run(&units, &cancel, &common::null_sink()).await;

    assert_eq!(result.failed, 2);
    for outcome in &result.outcomes {
        assert!(matches!(outcome.state, FinalState::Failed { retryable: true, .. }));
    }
}
