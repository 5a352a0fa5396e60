use nota_core::db::open_db_in_memory;
use nota_core::model::note::Note;
use nota_core::{NoteRepository, Page, RepoError, SqliteNoteRepository};
use rusqlite::{params, Connection};
use serde_json::json;

fn set_updated_at(conn: &Connection, id: &str, millis: i64) {
    conn.execute(
        "UPDATE note SET updated_at = ?2 WHERE id = ?1;",
        params![id, millis],
    )
    .unwrap();
}

#[test]
fn save_assigns_id_and_equal_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let created = repo.save(&Note::draft("First", "body")).unwrap();
    assert!(created.id.starts_with("note_"));
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(created.version, 1);
    assert!(created.deleted_at.is_none());

    let loaded = repo.find_by_id(&created.id).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn save_existing_only_touches_title_content_and_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let mut draft = Note::draft("Original", "one");
    draft.metadata.insert("color".to_string(), json!("blue"));
    let created = repo.save(&draft).unwrap();

    let mut edited = created.clone();
    edited.title = "Renamed".to_string();
    edited.content = "two".to_string();
    edited.version = 7;
    edited.metadata.insert("color".to_string(), json!("red"));
    edited.created_at = chrono::DateTime::from_timestamp_millis(0).unwrap();

    let updated = repo.save(&edited).unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.content, "two");
    assert_eq!(updated.version, 1);
    assert_eq!(updated.metadata["color"], json!("blue"));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[test]
fn save_with_unknown_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let mut ghost = Note::draft("Ghost", "");
    ghost.id = "note_missing".to_string();

    assert!(matches!(repo.save(&ghost), Err(RepoError::NotFound(id)) if id == "note_missing"));
    assert!(repo.find_all_sorted().unwrap().is_empty());
}

#[test]
fn delete_is_soft_and_keeps_first_deletion_time() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let created = repo.save(&Note::draft("Doomed", "")).unwrap();
    repo.delete(&created.id).unwrap();

    let deleted = repo.find_by_id(&created.id).unwrap();
    let first_deleted_at = deleted.deleted_at.expect("tombstone set");
    assert!(deleted.updated_at > created.updated_at);
    assert!(repo.find_all_sorted().unwrap().is_empty());

    repo.delete(&created.id).unwrap();
    let again = repo.find_by_id(&created.id).unwrap();
    assert_eq!(again.deleted_at, Some(first_deleted_at));
    assert!(again.updated_at > deleted.updated_at);

    assert!(matches!(
        repo.delete("note_missing"),
        Err(RepoError::NotFound(_))
    ));
}

#[test]
fn listing_is_newest_first_with_id_tie_break() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let a = repo.save(&Note::draft("A", "")).unwrap();
    let b = repo.save(&Note::draft("B", "")).unwrap();
    let c = repo.save(&Note::draft("C", "")).unwrap();
    set_updated_at(&conn, &a.id, 1_000);
    set_updated_at(&conn, &b.id, 3_000);
    set_updated_at(&conn, &c.id, 3_000);

    let ids = repo
        .find_all_sorted()
        .unwrap()
        .into_iter()
        .map(|note| note.id)
        .collect::<Vec<_>>();
    let mut tied = vec![b.id.clone(), c.id.clone()];
    tied.sort();
    assert_eq!(ids, vec![tied[0].clone(), tied[1].clone(), a.id.clone()]);

    let page = repo.find_all_sorted_paginated(Page::new(1, 1)).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, tied[1]);
    assert!(repo
        .find_all_sorted_paginated(Page::new(5, 10))
        .unwrap()
        .is_empty());
}

#[test]
fn find_by_title_and_last_modified_ignore_deleted_notes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let older = repo.save(&Note::draft("Same", "older")).unwrap();
    let newer = repo.save(&Note::draft("Same", "newer")).unwrap();
    set_updated_at(&conn, &older.id, 1_000);
    set_updated_at(&conn, &newer.id, 2_000);

    assert_eq!(repo.find_by_title("Same").unwrap().id, newer.id);
    assert_eq!(repo.find_last_modified().unwrap().id, newer.id);

    repo.delete(&newer.id).unwrap();
    assert_eq!(repo.find_by_title("Same").unwrap().id, older.id);
    assert_eq!(repo.find_last_modified().unwrap().id, older.id);

    repo.delete(&older.id).unwrap();
    assert!(matches!(
        repo.find_by_title("Same"),
        Err(RepoError::NotFound(_))
    ));
    assert!(matches!(
        repo.find_last_modified(),
        Err(RepoError::NotFound(_))
    ));
}

#[test]
fn upsert_preserves_given_id_and_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let mut note = Note::draft("Imported", "from elsewhere");
    note.id = "note_external".to_string();
    note.created_at = chrono::DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
    note.updated_at = chrono::DateTime::from_timestamp_millis(1_700_000_500_000).unwrap();
    note.metadata.insert("source".to_string(), json!("import"));

    repo.upsert(&note).unwrap();
    assert_eq!(repo.find_by_id("note_external").unwrap(), note);

    note.title = "Overwritten".to_string();
    repo.upsert(&note).unwrap();
    assert_eq!(repo.find_by_id("note_external").unwrap().title, "Overwritten");
    assert_eq!(repo.find_all_sorted().unwrap().len(), 1);

    assert!(matches!(
        repo.upsert(&Note::draft("no id", "")),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn overwrite_replaces_fields_but_keeps_tombstone_and_creation_time() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let created = repo.save(&Note::draft("Local", "local body")).unwrap();
    repo.delete(&created.id).unwrap();
    let deleted = repo.find_by_id(&created.id).unwrap();

    let mut incoming = created.clone();
    incoming.title = "Remote".to_string();
    incoming.content = "remote body".to_string();
    incoming.deleted_at = None;
    incoming.updated_at = chrono::DateTime::from_timestamp_millis(1_000).unwrap();
    incoming.metadata.insert("origin".to_string(), json!("remote"));

    let overwritten = repo.overwrite(&incoming).unwrap();
    assert_eq!(overwritten.title, "Remote");
    assert_eq!(overwritten.content, "remote body");
    assert_eq!(overwritten.metadata.get("origin"), Some(&json!("remote")));
    assert_eq!(overwritten.created_at, created.created_at);
    assert_eq!(overwritten.version, created.version);
    assert_eq!(overwritten.deleted_at, deleted.deleted_at);
    assert!(overwritten.updated_at > deleted.updated_at);
    assert!(repo.find_all_sorted().unwrap().is_empty());

    let mut ghost = Note::draft("Ghost", "");
    ghost.id = "note_missing".to_string();
    assert!(matches!(
        repo.overwrite(&ghost),
        Err(RepoError::NotFound(id)) if id == "note_missing"
    ));
}

#[test]
fn corrupt_metadata_surfaces_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let created = repo.save(&Note::draft("Broken", "")).unwrap();
    conn.execute(
        "UPDATE note SET metadata = '[1, 2' WHERE id = ?1;",
        [created.id.as_str()],
    )
    .unwrap();

    assert!(matches!(
        repo.find_by_id(&created.id),
        Err(RepoError::InvalidData(_))
    ));
}
