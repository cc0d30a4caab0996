/*!
 * End-to-end pipeline tests over mock providers: load a document,
 * translate content and titles, reconcile, write outputs, then recover
 * failures through a standalone retry pass.
 */

use crate::common;

use yantwai::providers::mock::MockClient;
use yantwai::segment_processor::{self, SegmentRecord};
use yantwai::translation::reconcile::{self, FailureReport};
use yantwai::translation::scheduler::CancelFlag;
use yantwai::translation::{FinalState, RetryController};

fn sample_document() -> Vec<SegmentRecord> {
    vec![
        SegmentRecord {
            id: "Chapter_1".to_string(),
            title: "第一章".to_string(),
            content: "第一章的正文。".to_string(),
        },
        SegmentRecord {
            id: "Chapter_1_Segment_2".to_string(),
            title: String::new(),
            content: "第一章的后半部分。".to_string(),
        },
        SegmentRecord {
            id: "Chapter_2".to_string(),
            title: "第二章".to_string(),
            content: "第二章的正文。".to_string(),
        },
    ]
}

#[tokio::test]
async fn test_full_run_should_produce_ordered_translated_document() {
    let dir = common::create_temp_dir().unwrap();
    let input = dir.path().join("novel.yaml");
    segment_processor::save_records(&input, &sample_document()).unwrap();

    let records = segment_processor::load_records(&input).unwrap();

    // Content pass
    let controller = RetryController::uniform(common::mock_runner(MockClient::working(), 4), 2);
    let units = segment_processor::content_units(&records);
    let result = controller.run(&units, &CancelFlag::new(), &common::null_sink()).await;
    let (mut merged, report) = reconcile::merge(&records, &result).unwrap();
    assert!(report.is_empty());

    // Title pass
    let title_units = segment_processor::title_units(&records);
    assert_eq!(title_units.len(), 2);
    let title_result = controller.run(&title_units, &CancelFlag::new(), &common::null_sink()).await;
    segment_processor::merge_titles(&mut merged, &title_result.outcomes);

    let output = dir.path().join("novel_oai.yaml");
    segment_processor::save_records(&output, &merged).unwrap();
    let reloaded = segment_processor::load_records(&output).unwrap();

    assert_eq!(reloaded.len(), 3);
    let ids: Vec<&str> = reloaded.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["Chapter_1", "Chapter_1_Segment_2", "Chapter_2"]);
    for record in &reloaded {
        assert!(record.content.starts_with("[translated]"));
    }
    assert!(reloaded[0].title.contains("第一章"));
    assert!(reloaded[1].title.is_empty());
    assert!(reloaded[2].title.contains("第二章"));
}

#[tokio::test]
async fn test_failed_units_should_be_recoverable_by_a_retry_run() {
    let dir = common::create_temp_dir().unwrap();
    let input = dir.path().join("novel.yaml");
    let output = dir.path().join("novel_oai.yaml");
    let report_path = dir.path().join("novel_oai_report.yaml");
    segment_processor::save_records(&input, &sample_document()).unwrap();

    // First run: Chapter_2's body fails its only attempt
    let sources = segment_processor::load_records(&input).unwrap();
    let failing = MockClient::fail_once_for(["第二章的正文"]);
    let first_run = RetryController::uniform(common::mock_runner(failing, 4), 0);
    let units = segment_processor::content_units(&sources);
    let result = first_run.run(&units, &CancelFlag::new(), &common::null_sink()).await;

    let (merged, report) = reconcile::merge(&sources, &result).unwrap();
    segment_processor::save_records(&output, &merged).unwrap();
    report.save(&report_path).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(merged[2].content, "[untranslated: Chapter_2]");

    // Retry run: consume the report, re-dispatch only the failure
    let report = FailureReport::load(&report_path).unwrap();
    let mut outputs = segment_processor::load_records(&output).unwrap();
    let retry_units: Vec<_> = report
        .failures
        .iter()
        .filter(|f| f.retryable)
        .map(|f| {
            let source = sources.iter().find(|r| r.id == f.id).unwrap();
            let ordinal = outputs.iter().position(|r| r.id == f.id).unwrap();
            yantwai::translation::Unit {
                id: f.id.clone(),
                ordinal,
                text: source.content.clone(),
                kind: yantwai::translation::UnitKind::Content,
            }
        })
        .collect();
    assert_eq!(retry_units.len(), 1);

    let retry_run = RetryController::uniform(common::mock_runner(MockClient::working(), 2), 1);
    let retry_result = retry_run.run(&retry_units, &CancelFlag::new(), &common::null_sink()).await;
    assert!(retry_result.outcomes.iter().all(|o| matches!(o.state, FinalState::Translated(_))));

    let remaining = reconcile::patch(&mut outputs, &retry_result).unwrap();
    segment_processor::save_records(&output, &outputs).unwrap();

    assert!(remaining.is_empty());
    let final_records = segment_processor::load_records(&output).unwrap();
    assert!(final_records[2].content.contains("第二章的正文"));
    assert!(!final_records.iter().any(|r| r.content.starts_with("[untranslated:")));
}
