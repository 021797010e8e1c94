use crate::database::entity::{book, user};
use crate::database::seaorm_repo::{SeaOrmBookRepository, SeaOrmUserRepository};
use folio_core::error::RepoError;
use folio_core::ports::{BookRepository, UserRepository};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

#[tokio::test]
async fn find_user_by_login_maps_row_to_domain() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user::Model {
            id: 7,
            name: "Ann".to_owned(),
            login: "ann".to_owned(),
            password_hash: "argon2-hash".to_owned(),
            email: Some("ann@example.com".to_owned()),
            is_active: true,
            is_admin: true,
        }]])
        .into_connection();

    let repo = SeaOrmUserRepository::new(db);

    let user = repo.find_by_login("ann").await.unwrap().unwrap();
    assert_eq!(user.id, 7);
    assert!(user.is_admin);
    assert_eq!(user.groups(), vec!["user".to_owned(), "admin".to_owned()]);
}

#[tokio::test]
async fn find_book_by_id_returns_none_when_no_active_row() {
    // The query itself filters on is_active, so an inactive row comes back
    // as an empty result set.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<book::Model>::new()])
        .into_connection();

    let repo = SeaOrmBookRepository::new(db);

    assert!(repo.find_by_id(42).await.unwrap().is_none());
}

#[tokio::test]
async fn soft_delete_updates_single_row() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let repo = SeaOrmBookRepository::new(db);

    repo.soft_delete(3).await.unwrap();
}

#[tokio::test]
async fn soft_delete_missing_row_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = SeaOrmBookRepository::new(db);

    let err = repo.soft_delete(3).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
}
