use crm_core::db::open_db_in_memory;
use crm_core::model::contact::Stage;
use crm_core::model::saved_view::{NewSavedView, SavedViewPatch};
use crm_core::query::{ListContactsParams, Pagination};
use crm_core::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use crm_core::repo::view_repo::SqliteSavedViewRepository;
use crm_core::service::view_service::SavedViewService;
use crm_core::ServiceError;

fn new_view(name: &str, is_default: bool) -> NewSavedView {
    NewSavedView {
        name: name.to_string(),
        filters: ListContactsParams::from_pairs([("stage", "LOST"), ("limit", "10")]),
        is_default,
    }
}

#[test]
fn only_one_default_view_per_user() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteDirectoryRepository::new(&conn);
    let user = directory.create_user("views@example.com", None).unwrap();
    let service = SavedViewService::new(SqliteSavedViewRepository::new(&conn));

    let first = service.create_view(user.id, new_view("First", true)).unwrap();
    let second = service.create_view(user.id, new_view("Second", true)).unwrap();

    assert!(!service.get_view(user.id, first.id).unwrap().is_default);
    assert!(service.get_view(user.id, second.id).unwrap().is_default);

    service
        .update_view(
            user.id,
            first.id,
            SavedViewPatch {
                is_default: Some(true),
                ..SavedViewPatch::default()
            },
        )
        .unwrap();
    let defaults = service
        .list_views(user.id)
        .unwrap()
        .into_iter()
        .filter(|view| view.is_default)
        .map(|view| view.id)
        .collect::<Vec<_>>();
    assert_eq!(defaults, vec![first.id]);
}

#[test]
fn views_of_other_users_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteDirectoryRepository::new(&conn);
    let owner = directory.create_user("owner@example.com", None).unwrap();
    let intruder = directory.create_user("intruder@example.com", None).unwrap();
    let service = SavedViewService::new(SqliteSavedViewRepository::new(&conn));

    let view = service.create_view(owner.id, new_view("Mine", false)).unwrap();

    assert!(matches!(
        service.get_view(intruder.id, view.id),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        service.update_view(intruder.id, view.id, SavedViewPatch::default()),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        service.delete_view(intruder.id, view.id),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(service.list_views(intruder.id).unwrap().is_empty());

    service.delete_view(owner.id, view.id).unwrap();
    assert!(service.list_views(owner.id).unwrap().is_empty());
}

#[test]
fn stored_filters_round_trip_into_a_query() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteDirectoryRepository::new(&conn);
    let user = directory.create_user("filters@example.com", None).unwrap();
    let service = SavedViewService::new(SqliteSavedViewRepository::new(&conn));

    let created = service.create_view(user.id, new_view("Lost", false)).unwrap();
    let loaded = service.get_view(user.id, created.id).unwrap();

    assert_eq!(loaded.filters, created.filters);
    let query = loaded.to_query();
    assert_eq!(query.filter.stage, Some(Stage::Lost));
    assert!(matches!(
        query.pagination,
        Pagination::Cursor {
            limit: 10,
            cursor: None
        }
    ));
}

#[test]
fn invalid_names_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteDirectoryRepository::new(&conn);
    let user = directory.create_user("names@example.com", None).unwrap();
    let service = SavedViewService::new(SqliteSavedViewRepository::new(&conn));

    assert!(matches!(
        service.create_view(user.id, new_view("   ", false)),
        Err(ServiceError::Invalid(_))
    ));
    assert!(matches!(
        service.create_view(user.id, new_view(&"v".repeat(101), false)),
        Err(ServiceError::Invalid(_))
    ));
}
