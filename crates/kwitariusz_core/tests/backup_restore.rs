use kwitariusz_core::model::snapshot::SNAPSHOT_FORMAT_VERSION;
use kwitariusz_core::{
    BackupError, BackupOutcome, BackupService, NewChild, NewParent, NewPayment, NewRate,
    RecordStore, RepoError, Snapshot,
};

fn populated_store() -> RecordStore {
    let store = RecordStore::open_in_memory().unwrap();
    let anna = store
        .add_parent(&NewParent::new("Anna", "Nowak", "anna@example.com", "600100200"))
        .unwrap();
    let jan = store
        .add_parent(&NewParent::new("Jan", "Kowalski", "jan@example.com", "500600700"))
        .unwrap();
    let ola = store
        .add_child(&NewChild::new("Ola", "Nowak", "Motylki", "2021-03-04", anna.id))
        .unwrap();
    let kuba = store
        .add_child(&NewChild::new("Kuba", "Kowalski", "Biedronki", "2020-01-15", jan.id))
        .unwrap();
    store
        .add_rate(&NewRate::new("monthly", 350.0, "2024-09-01"))
        .unwrap();
    store
        .add_rate(&NewRate::new("meal", 12.5, "2024-09-01").with_description("lunch"))
        .unwrap();
    store
        .add_payment(&NewPayment::new(ola.id, anna.id, 350.0, "2024-09-05"))
        .unwrap();
    store.set_attendance(ola.id, "2024-09-02", true).unwrap();
    store.set_attendance(kuba.id, "2024-09-02", false).unwrap();
    store
}

#[test]
fn backup_then_restore_reproduces_every_table() {
    let source = populated_store();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup-kwitariusz-2024-09-30.json");

    let saved = BackupService::new(&source).backup(Some(&path)).unwrap();
    assert_eq!(
        saved,
        BackupOutcome::Saved {
            path: path.clone(),
            records: 9
        }
    );

    let target = RecordStore::open_in_memory().unwrap();
    let restored = BackupService::new(&target).restore(Some(&path)).unwrap();
    assert_eq!(
        restored,
        BackupOutcome::Restored {
            path: path.clone(),
            records: 9
        }
    );

    let before = source.snapshot().unwrap();
    let after = target.snapshot().unwrap();
    assert!(before.same_rows(&after));
}

#[test]
fn restore_replaces_existing_rows_and_keeps_ids_usable() {
    let source = populated_store();
    let snapshot = source.snapshot().unwrap();

    let target = RecordStore::open_in_memory().unwrap();
    target
        .add_parent(&NewParent::new("Stary", "Wpis", "old@example.com", "1"))
        .unwrap();
    target.restore(&snapshot).unwrap();

    assert!(target.snapshot().unwrap().same_rows(&snapshot));
    let next = target
        .add_parent(&NewParent::new("Nowy", "Wpis", "new@example.com", "2"))
        .unwrap();
    assert!(snapshot.parents.iter().all(|row| row.id != next.id));
}

#[test]
fn restore_with_dangling_reference_leaves_store_untouched() {
    let store = populated_store();
    let before = store.snapshot().unwrap();

    let mut broken = before.clone();
    broken.children[0].parent_id = 4242;
    let err = store.restore(&broken).unwrap_err();

    assert!(matches!(err, RepoError::Referential(_)));
    assert!(store.snapshot().unwrap().same_rows(&before));
}

#[test]
fn restore_with_duplicate_attendance_is_invalid_data() {
    let store = populated_store();
    let mut broken = store.snapshot().unwrap();
    let mut duplicate = broken.attendance[0].clone();
    duplicate.id = 99;
    broken.attendance.push(duplicate);

    let err = store.restore(&broken).unwrap_err();

    assert_eq!(err.code(), "invalid_data");
}

#[test]
fn cancelled_dialogs_are_reported_without_touching_files() {
    let store = populated_store();
    let service = BackupService::new(&store);

    assert_eq!(service.backup(None).unwrap(), BackupOutcome::Cancelled);
    assert_eq!(service.restore(None).unwrap(), BackupOutcome::Cancelled);
}

#[test]
fn ui_payload_backup_is_written_verbatim() {
    let store = RecordStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("payload.json");
    let payload = populated_store().snapshot().unwrap();

    BackupService::new(&store)
        .backup_payload(&payload, Some(&path))
        .unwrap();

    let written: Snapshot =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, payload);
}

#[test]
fn corrupt_backup_file_is_reported() {
    let store = RecordStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"parents\": [").unwrap();

    let err = BackupService::new(&store).restore(Some(&path)).unwrap_err();

    assert!(matches!(err, BackupError::Json { .. }));
    assert_eq!(err.code(), "invalid_backup");
}

#[test]
fn restore_rejects_newer_format_version_and_keeps_rows() {
    let store = populated_store();
    let before = store.snapshot().unwrap();

    let newer = Snapshot {
        format_version: SNAPSHOT_FORMAT_VERSION + 1,
        ..Snapshot::default()
    };
    let err = store.restore(&newer).unwrap_err();

    assert_eq!(err.code(), "invalid_data");
    assert!(store.snapshot().unwrap().same_rows(&before));
}

#[test]
fn restore_with_invalid_row_midway_rolls_back() {
    let store = populated_store();
    let before = store.snapshot().unwrap();

    let mut broken = before.clone();
    let mut extra = broken.parents[0].clone();
    extra.id = 3;
    broken.parents.push(extra);
    broken.parents[1].first_name = "   ".to_string();
    let err = store.restore(&broken).unwrap_err();

    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(err.code(), "validation");
    assert!(store.snapshot().unwrap().same_rows(&before));
}

#[test]
fn restore_accepts_attendance_written_as_integers() {
    let store = RecordStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup-kwitariusz-2024-09-30.json");
    std::fs::write(
        &path,
        r#"{
  "parents": [
    {"id": 1, "firstName": "Anna", "lastName": "Nowak", "email": "anna@example.com", "phone": "600100200"}
  ],
  "children": [
    {"id": 1, "firstName": "Ola", "lastName": "Nowak", "groupName": "Motylki", "birthDate": "2021-03-04", "parentId": 1}
  ],
  "attendance": [
    {"id": 1, "childId": 1, "date": "2024-09-02", "present": 1},
    {"id": 2, "childId": 1, "date": "2024-09-03", "present": 0}
  ]
}"#,
    )
    .unwrap();

    let restored = BackupService::new(&store).restore(Some(&path)).unwrap();
    assert_eq!(
        restored,
        BackupOutcome::Restored {
            path: path.clone(),
            records: 4
        }
    );

    let september = store.get_attendance("2024-09").unwrap();
    let marks: Vec<(String, bool)> = september
        .into_iter()
        .map(|record| (record.date, record.present))
        .collect();
    assert_eq!(
        marks,
        vec![
            ("2024-09-02".to_string(), true),
            ("2024-09-03".to_string(), false)
        ]
    );
}

#[test]
fn restore_rejects_attendance_flag_outside_zero_one() {
    let store = populated_store();
    let before = store.snapshot().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad-flag.json");
    std::fs::write(
        &path,
        r#"{"attendance": [{"id": 1, "childId": 1, "date": "2024-09-02", "present": 2}]}"#,
    )
    .unwrap();

    let err = BackupService::new(&store).restore(Some(&path)).unwrap_err();

    assert_eq!(err.code(), "invalid_backup");
    assert!(store.snapshot().unwrap().same_rows(&before));
}
