use nota_core::db::open_db_in_memory;
use nota_core::model::config::{ConfigEntry, CONFIG_KEY_LANGUAGE};
use nota_core::repo::config_repo::{ConfigRepository, SqliteConfigRepository};
use nota_core::{Language, PreferenceService, RepoError};

#[test]
fn language_defaults_to_english_and_round_trips() {
    let conn = open_db_in_memory().unwrap();
    let service = PreferenceService::new(SqliteConfigRepository::new(&conn));

    assert_eq!(service.language().unwrap(), Language::English);

    service.save_language(Language::Chinese).unwrap();
    assert_eq!(service.language().unwrap(), Language::Chinese);

    service.save_language(Language::English).unwrap();
    assert_eq!(service.language().unwrap(), Language::English);
}

#[test]
fn unknown_stored_language_falls_back_to_english() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteConfigRepository::new(&conn);
    repo.save(&ConfigEntry::new(CONFIG_KEY_LANGUAGE, "klingon"))
        .unwrap();

    let service = PreferenceService::new(repo);
    assert_eq!(service.language().unwrap(), Language::English);
}

#[test]
fn config_repository_upserts_lists_and_deletes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteConfigRepository::new(&conn);

    repo.save(&ConfigEntry::new("theme", "dark")).unwrap();
    repo.save(&ConfigEntry::new("editor", "vim")).unwrap();
    repo.save(&ConfigEntry::new("theme", "light")).unwrap();

    assert_eq!(repo.find_by_name("theme").unwrap().value, "light");
    assert_eq!(
        repo.find_all().unwrap(),
        vec![
            ConfigEntry::new("editor", "vim"),
            ConfigEntry::new("theme", "light"),
        ]
    );

    repo.delete("theme").unwrap();
    assert!(matches!(
        repo.find_by_name("theme"),
        Err(RepoError::NotFound(name)) if name == "theme"
    ));
    assert!(matches!(repo.delete("theme"), Err(RepoError::NotFound(_))));
}
