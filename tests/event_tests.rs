// Tests for transcript event identity and metadata formatting.

use chrono::DateTime;
use hey_listen::store::TranscriptEvent;

fn event(text: &str, speaker: &str, timestamp: f64) -> TranscriptEvent {
    TranscriptEvent {
        text: text.to_string(),
        speaker: speaker.to_string(),
        timestamp,
    }
}

#[test]
fn test_record_id_is_deterministic() {
    let a = event("hello", "A", 1700000000.0);
    let b = event("different text, same identity", "A", 1700000000.0);

    // Identity derives from (timestamp, speaker), not from the text
    assert_eq!(a.record_id(), b.record_id());
}

#[test]
fn test_record_id_differs_by_timestamp_and_speaker() {
    let base = event("hello", "A", 1700000000.0);
    let later = event("hello", "A", 1700000001.0);
    let other_speaker = event("hello", "B", 1700000000.0);

    assert_ne!(base.record_id(), later.record_id());
    assert_ne!(base.record_id(), other_speaker.record_id());
}

#[test]
fn test_title_names_the_speaker() {
    let e = event("hello", "A", 1700000000.0);
    let title = e.title();

    assert!(title.starts_with("Transcription - Speaker A at "));
}

#[test]
fn test_summary_truncates_long_text() {
    let long_text = "x".repeat(500);
    let e = event(&long_text, "A", 1700000000.0);
    let summary = e.summary();

    assert!(summary.starts_with("Transcript from A: "));
    assert!(summary.ends_with("..."));
    assert!(summary.chars().count() < 150);
}

#[test]
fn test_created_at_is_rfc3339() {
    let e = event("hello", "A", 1700000000.5);

    let parsed = DateTime::parse_from_rfc3339(&e.created_at()).unwrap();
    assert_eq!(parsed.timestamp(), 1700000000);
}

#[test]
fn test_new_stamps_current_time() {
    let before = chrono::Utc::now().timestamp() as f64;
    let e = TranscriptEvent::new("hello".to_string(), "A".to_string());
    let after = chrono::Utc::now().timestamp() as f64 + 1.0;

    assert!(e.timestamp >= before && e.timestamp <= after);
}
