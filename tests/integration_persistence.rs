use keyball_tutor::config::Config;
use keyball_tutor::keys::KeyEvent;
use keyball_tutor::presenter::Discard;
use keyball_tutor::stats::SessionKind;
use keyball_tutor::store::{self, JsonFileStore, SqliteStore, StatsStore};
use keyball_tutor::tutor::Tutor;

/// Type every exercise of `lesson` at a steady pace without mistakes
fn complete_lesson<S: StatsStore>(tutor: &mut Tutor<S, Discard>, lesson: u32) {
    tutor.start_lesson(lesson).unwrap();
    let exercises = tutor.current_lesson().unwrap().exercises.clone();
    let mut now = 0;
    for text in exercises {
        for c in text.chars() {
            tutor.key_down(&KeyEvent::char(c, now));
            tutor.key_up(&KeyEvent::char(c, now + 10));
            now += 100;
        }
    }
}

#[test]
fn json_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");

    let mut tutor = Tutor::new(&Config::default(), JsonFileStore::with_path(&path), Discard).unwrap();
    complete_lesson(&mut tutor, 1);
    let stars = tutor.statistics().stars_for(1);
    assert!(stars >= 1);
    drop(tutor);

    let reopened = Tutor::new(&Config::default(), JsonFileStore::with_path(&path), Discard).unwrap();
    let stats = reopened.statistics();
    assert!(stats.is_completed(1));
    assert_eq!(stats.stars_for(1), stars);
    assert_eq!(stats.sessions_count, 1);
    assert_eq!(stats.session_history[0].category, "lesson-1");
    assert_eq!(stats.session_history[0].kind, SessionKind::Lesson);
}

#[test]
fn sqlite_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.db");

    let mut tutor = Tutor::new(&Config::default(), SqliteStore::open(&path).unwrap(), Discard).unwrap();
    tutor.start_lesson(11).unwrap();
    tutor.acknowledge_theory().unwrap();
    complete_lesson(&mut tutor, 2);
    drop(tutor);

    let reopened = Tutor::new(&Config::default(), SqliteStore::open(&path).unwrap(), Discard).unwrap();
    let stats = reopened.statistics();
    assert!(stats.is_completed(11));
    assert!(stats.is_completed(2));
    // theory lessons do not count as sessions
    assert_eq!(stats.sessions_count, 1);
}

#[test]
fn corrupt_json_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    std::fs::write(&path, "{ not json").unwrap();

    let tutor = Tutor::new(&Config::default(), JsonFileStore::with_path(&path), Discard).unwrap();
    assert_eq!(tutor.statistics().sessions_count, 0);
    assert!(tutor.statistics().session_history.is_empty());
}

#[test]
fn history_exports_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let mut tutor = Tutor::new(
        &Config::default(),
        JsonFileStore::with_path(dir.path().join("stats.json")),
        Discard,
    )
    .unwrap();
    complete_lesson(&mut tutor, 1);
    tutor.seed(7);
    tutor.start_typing_test("quotes").unwrap();

    let csv_path = dir.path().join("history.csv");
    let rows = store::export_history_csv(tutor.statistics(), &csv_path).unwrap();
    assert_eq!(rows, 1);

    let contents = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("date,category,kind,wpm,accuracy,duration_secs")
    );
    assert!(lines.next().unwrap().contains(",lesson-1,lesson,"));
}
