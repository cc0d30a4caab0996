/*!
 * Unit tests for outcome reconciliation and failure reports
 */

use crate::common;

use yantwai::providers::mock::MockClient;
use yantwai::segment_processor;
use yantwai::translation::reconcile::{self, FailureReport};
use yantwai::translation::scheduler::CancelFlag;
use yantwai::translation::RetryController;

#[tokio::test]
async fn test_merge_after_clean_run_should_translate_every_record() {
    let records = common::chapter_records(6);
    let units = segment_processor::content_units(&records);
    let controller = RetryController::uniform(common::mock_runner(MockClient::working(), 3), 2);

    let result = controller.run(&units, &CancelFlag::new(), &common::null_sink()).await;
    let (merged, report) = reconcile::merge(&records, &result).unwrap();

    assert!(report.is_empty());
    assert_eq!(merged.len(), records.len());
    for (merged_record, source_record) in merged.iter().zip(&records) {
        assert_eq!(merged_record.id, source_record.id);
        assert!(merged_record.content.contains(&source_record.content));
        assert_ne!(merged_record.content, source_record.content);
    }
}

#[tokio::test]
async fn test_merge_after_partial_failure_should_keep_length_and_order() {
    let records = common::chapter_records(5);
    let units = segment_processor::content_units(&records);
    // Chapter_3's body fails every attempt
    let mock = MockClient::fail_once_for(["source text 3"]);
    let controller = RetryController::uniform(common::mock_runner(mock, 2), 0);

    let result = controller.run(&units, &CancelFlag::new(), &common::null_sink()).await;
    let (merged, report) = reconcile::merge(&records, &result).unwrap();

    assert_eq!(merged.len(), 5);
    let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["Chapter_1", "Chapter_2", "Chapter_3", "Chapter_4", "Chapter_5"]);

    assert_eq!(merged[2].content, "[untranslated: Chapter_3]");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, "Chapter_3");
    assert!(report.failures[0].retryable);
}

#[tokio::test]
async fn test_patch_should_recover_placeholder_slots_only() {
    // Simulate a retry run over the failure left by the previous test setup
    let sources = common::chapter_records(5);
    let units = segment_processor::content_units(&sources);
    let mock = MockClient::fail_once_for(["source text 3"]);
    let controller = RetryController::uniform(common::mock_runner(mock, 2), 0);
    let result = controller.run(&units, &CancelFlag::new(), &common::null_sink()).await;
    let (mut outputs, report) = reconcile::merge(&sources, &result).unwrap();
    assert_eq!(report.failures.len(), 1);

    // The retry run dispatches only the failed unit, now against a
    // client that works
    let retry_units = vec![yantwai::translation::Unit {
        id: "Chapter_3".to_string(),
        ordinal: 2,
        text: sources[2].content.clone(),
        kind: yantwai::translation::UnitKind::Content,
    }];
    let retry_controller =
        RetryController::uniform(common::mock_runner(MockClient::working(), 1), 1);
    let retry_result = retry_controller
        .run(&retry_units, &CancelFlag::new(), &common::null_sink())
        .await;

    let before: Vec<String> = outputs.iter().map(|r| r.content.clone()).collect();
    let remaining = reconcile::patch(&mut outputs, &retry_result).unwrap();

    assert!(remaining.is_empty());
    assert!(outputs[2].content.contains("source text 3"));
    assert_ne!(outputs[2].content, "[untranslated: Chapter_3]");
    // Every other slot is untouched
    for (index, record) in outputs.iter().enumerate() {
        if index != 2 {
            assert_eq!(record.content, before[index]);
        }
    }
}

#[test]
fn test_failure_report_round_trip_should_preserve_entries() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("novel_gmn_report.yaml");
    let report = FailureReport {
        failures: vec![
            yantwai::translation::FailureEntry {
                id: "Chapter_3".to_string(),
                reason: "Rate limited: quota exceeded".to_string(),
                attempts: 4,
                retryable: true,
            },
            yantwai::translation::FailureEntry {
                id: "Chapter_7".to_string(),
                reason: "Content blocked: SAFETY".to_string(),
                attempts: 1,
                retryable: false,
            },
        ],
    };

    report.save(&path).unwrap();
    let loaded = FailureReport::load(&path).unwrap();
    assert_eq!(loaded, report);
}
