use bujo_core::db::open_db_in_memory;
use bujo_core::{
    search_entries, EntryKind, EntryRequest, EntryService, EntryType, ExtractionOptions, OcrText,
    ScanRequest, ScanService, SearchQuery,
};
use rusqlite::Connection;
use uuid::Uuid;

fn seed(conn: &mut Connection, owner: Uuid) {
    ScanService::new(conn, ExtractionOptions::default())
        .scan_page(
            owner,
            ScanRequest {
                ocr: OcrText::recognized(
                    "• buy milk\nX buy bread\nO milk delivery 02/03/2025\nfeeling sad about milk",
                ),
                page_number: 4,
                thread_id: None,
            },
        )
        .unwrap();
    EntryService::new(conn)
        .create_entry(owner, &EntryRequest::new("habit", "Drink milk"))
        .unwrap();
}

#[test]
fn substring_search_is_case_insensitive_and_owner_scoped() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    seed(&mut conn, owner);
    seed(&mut conn, Uuid::new_v4());

    let results = search_entries(&conn, owner, &SearchQuery::new("MILK")).unwrap();

    assert_eq!(results.total, 4);
    assert_eq!(results.hits.len(), 4);
    let event = results
        .hits
        .iter()
        .find(|hit| hit.kind == EntryType::Event)
        .unwrap();
    assert_eq!(event.event_date.as_deref(), Some("2025-03-02"));
    assert_eq!(event.page_number, 4);
    let habit = results
        .hits
        .iter()
        .find(|hit| hit.kind == EntryType::Habit)
        .unwrap();
    assert_eq!(habit.emotion_tag, None);
    let emotion = results
        .hits
        .iter()
        .find(|hit| hit.kind == EntryType::Emotion)
        .unwrap();
    assert_eq!(emotion.emotion_tag.as_deref(), Some("sad"));
}

#[test]
fn kind_and_status_filters_narrow_results() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    seed(&mut conn, owner);

    let query = SearchQuery {
        kind: Some(EntryKind::Task),
        status: Some("completed".to_string()),
        ..SearchQuery::new("buy")
    };
    let results = search_entries(&conn, owner, &query).unwrap();
    assert_eq!(results.total, 1);
    assert_eq!(results.hits[0].content, "buy bread");
    assert_eq!(results.hits[0].status, "COMPLETED");
}

#[test]
fn unknown_status_is_ignored() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    seed(&mut conn, owner);

    let query = SearchQuery {
        kind: Some(EntryKind::Task),
        status: Some("someday".to_string()),
        ..SearchQuery::new("buy")
    };
    assert_eq!(search_entries(&conn, owner, &query).unwrap().total, 2);
}

#[test]
fn limit_caps_hits_but_not_total() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    seed(&mut conn, owner);

    let query = SearchQuery {
        limit: 1,
        ..SearchQuery::new("")
    };
    let results = search_entries(&conn, owner, &query).unwrap();
    assert_eq!(results.total, 5);
    assert_eq!(results.hits.len(), 1);
}

#[test]
fn like_wildcards_are_matched_literally() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    seed(&mut conn, owner);

    assert_eq!(
        search_entries(&conn, owner, &SearchQuery::new("%"))
            .unwrap()
            .total,
        0
    );
}
