use kwitariusz_core::db::migrations::latest_version;
use kwitariusz_core::db::open_db_in_memory;
use kwitariusz_core::repo::attendance_repo::SqliteAttendanceRepository;
use kwitariusz_core::repo::billing_repo::{BillingRepository, SqliteBillingRepository};
use kwitariusz_core::repo::family_repo::{FamilyRepository, SqliteFamilyRepository};
use kwitariusz_core::{NewChild, NewParent, RepoError};
use rusqlite::Connection;

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteFamilyRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteAttendanceRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("attendance"))
    ));
}

#[test]
fn repositories_share_one_connection() {
    let conn = open_db_in_memory().unwrap();
    let family = SqliteFamilyRepository::try_new(&conn).unwrap();
    let billing = SqliteBillingRepository::try_new(&conn).unwrap();

    let parent = family
        .insert_parent(&NewParent::new("Anna", "Nowak", "anna@example.com", "600"))
        .unwrap();
    let child = family
        .insert_child(&NewChild::new("Ola", "Nowak", "Motylki", "2021-03-04", parent.id))
        .unwrap();

    assert_eq!(family.list_parents().unwrap(), vec![parent]);
    assert_eq!(family.list_children().unwrap(), vec![child]);
    assert!(billing.list_payments().unwrap().is_empty());
}
