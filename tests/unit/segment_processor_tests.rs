/*!
 * Unit tests for segment document handling
 */

use crate::common;

use yantwai::app_config::{FilterConfig, FilterMode};
use yantwai::segment_processor::{self, SegmentRecord};

#[test]
fn test_multibyte_documents_should_round_trip() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("novel.yaml");
    let records = vec![
        SegmentRecord {
            id: "Volume_1_Chapter_1".to_string(),
            title: "第一章：风起".to_string(),
            content: "山雨欲来风满楼。\n\n这是第二段。".to_string(),
        },
        SegmentRecord {
            id: "Volume_1_Chapter_1_Segment_2".to_string(),
            title: String::new(),
            content: "第二段的正文。".to_string(),
        },
    ];

    segment_processor::save_records(&path, &records).unwrap();
    let loaded = segment_processor::load_records(&path).unwrap();
    assert_eq!(loaded, records);
}

#[test]
fn test_load_records_with_malformed_yaml_should_fail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        &dir.path().to_path_buf(),
        "broken.yaml",
        "- id: Chapter_1\n  content: [unclosed",
    )
    .unwrap();
    assert!(segment_processor::load_records(&path).is_err());
}

#[test]
fn test_unit_derivation_should_pair_titles_with_their_record() {
    let mut records = common::chapter_records(3);
    records[0].title = "序章".to_string();
    records[2].title = "终章".to_string();

    let content = segment_processor::content_units(&records);
    let titles = segment_processor::title_units(&records);

    assert_eq!(content.len(), 3);
    assert_eq!(titles.len(), 2);
    assert_eq!(titles[0].ordinal, 0);
    assert_eq!(titles[1].ordinal, 2);
    assert_eq!(titles[1].text, "终章");
}

#[test]
fn test_chapter_filter_should_ignore_unparseable_ids() {
    let mut records = common::chapter_records(4);
    records.push(common::record("Afterword", "thanks"));
    let filter = FilterConfig {
        mode: FilterMode::Chapter,
        start_chapter: Some(1),
        end_chapter: Some(4),
        ..FilterConfig::default()
    };

    let kept = segment_processor::filter_records(records, &filter);
    assert_eq!(kept.len(), 4);
    assert!(kept.iter().all(|r| r.id.starts_with("Chapter_")));
}

#[test]
fn test_open_ended_chapter_filter_should_keep_tail() {
    let records = common::chapter_records(5);
    let filter = FilterConfig {
        mode: FilterMode::Chapter,
        start_chapter: Some(4),
        end_chapter: None,
        ..FilterConfig::default()
    };

    let kept = segment_processor::filter_records(records, &filter);
    let ids: Vec<&str> = kept.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["Chapter_4", "Chapter_5"]);
}

#[test]
fn test_volume_prefixed_ids_should_parse_chapter_numbers() {
    let record = common::record("Volume_3_Chapter_27_Segment_2", "body");
    assert_eq!(record.chapter_number(), Some(27));
    assert_eq!(record.segment_number(), Some(2));
}
