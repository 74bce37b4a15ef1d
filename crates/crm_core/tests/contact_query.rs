mod common;

use common::{
    ids, legacy, paged, params, seed, seed_named, walk_all, JAN_01_2024, JAN_03_2024,
};
use crm_core::db::open_db_in_memory;
use crm_core::model::contact::{ContactType, NewContact, Stage, VehicleFlag};
use crm_core::query::{ContactCursor, SortDirection, SortField, SortSpec};
use crm_core::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use uuid::Uuid;

#[test]
fn null_last_touch_sorts_after_older_touches_across_pages() {
    let conn = open_db_in_memory().unwrap();
    let a = seed_named(&conn, 1, "A", Some(JAN_03_2024));
    let b = seed_named(&conn, 2, "B", None);
    let c = seed_named(&conn, 3, "C", Some(JAN_01_2024));

    let (first, next) = paged(&conn, &params(&[("sort", "lastTouchAt_desc"), ("limit", "2")]));
    assert_eq!(ids(&first), vec![a.id, c.id]);
    let token = next.expect("first page should carry a cursor");

    let mut request = params(&[("sort", "lastTouchAt_desc"), ("limit", "2")]);
    request.cursor = Some(token);
    let (second, next) = paged(&conn, &request);
    assert_eq!(ids(&second), vec![b.id]);
    assert_eq!(next, None);
}

#[test]
fn nulls_stay_last_in_ascending_order() {
    let conn = open_db_in_memory().unwrap();
    let a = seed_named(&conn, 1, "A", Some(JAN_03_2024));
    let b = seed_named(&conn, 2, "B", None);
    let c = seed_named(&conn, 3, "C", Some(JAN_01_2024));
    let d = seed_named(&conn, 4, "D", None);

    assert_eq!(
        walk_all(&conn, "lastTouchAt_asc", 1),
        vec![c.id, a.id, b.id, d.id]
    );
    assert_eq!(
        walk_all(&conn, "lastTouchAt_desc", 1),
        vec![a.id, c.id, d.id, b.id]
    );
}

#[test]
fn stage_and_text_filters_combine_with_and() {
    let conn = open_db_in_memory().unwrap();
    let john_lost = seed(
        &conn,
        1,
        NewContact {
            first_name: Some("John".to_string()),
            last_name: Some("Smith".to_string()),
            stage: Some(Stage::Lost),
            ..NewContact::default()
        },
    );
    seed(
        &conn,
        2,
        NewContact {
            first_name: Some("John".to_string()),
            last_name: Some("Fresh".to_string()),
            ..NewContact::default()
        },
    );
    let johnson_email = seed(
        &conn,
        3,
        NewContact {
            display_name: Some("Mary Lee".to_string()),
            email: Some("mary@johnson-realty.com".to_string()),
            stage: Some(Stage::Lost),
            ..NewContact::default()
        },
    );
    seed(
        &conn,
        4,
        NewContact {
            display_name: Some("Pete Lost".to_string()),
            stage: Some(Stage::Lost),
            ..NewContact::default()
        },
    );

    let items = legacy(&conn, &params(&[("stage", "LOST"), ("q", "JOHN")]));
    let mut found = ids(&items);
    found.sort();
    assert_eq!(found, vec![john_lost.id, johnson_email.id]);
}

#[test]
fn digit_query_matches_normalized_phone() {
    let conn = open_db_in_memory().unwrap();
    let target = seed(
        &conn,
        1,
        NewContact {
            display_name: Some("Phone Match".to_string()),
            phone: Some("(555) 123-4567".to_string()),
            ..NewContact::default()
        },
    );
    seed(
        &conn,
        2,
        NewContact {
            display_name: Some("Other".to_string()),
            phone: Some("(212) 000-1111".to_string()),
            ..NewContact::default()
        },
    );

    assert_eq!(ids(&legacy(&conn, &params(&[("q", "555")]))), vec![target.id]);
    assert_eq!(
        ids(&legacy(&conn, &params(&[("q", "555-123")]))),
        vec![target.id]
    );
}

#[test]
fn text_query_matches_organization_name_and_legacy_search_alias() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteDirectoryRepository::new(&conn);
    let acme = directory.create_organization("Acme Capital").unwrap();

    let member = seed(
        &conn,
        1,
        NewContact {
            display_name: Some("Dana".to_string()),
            organization_id: Some(acme.id),
            ..NewContact::default()
        },
    );
    seed_named(&conn, 2, "Eve", None);

    assert_eq!(member.organization.as_ref().unwrap().name, "Acme Capital");
    assert_eq!(ids(&legacy(&conn, &params(&[("q", "acme")]))), vec![member.id]);
    assert_eq!(
        ids(&legacy(&conn, &params(&[("search", "ACME")]))),
        vec![member.id]
    );
    // `q` takes precedence over `search`.
    assert_eq!(
        ids(&legacy(&conn, &params(&[("q", "eve"), ("search", "acme")]))).len(),
        1
    );
}

#[test]
fn owner_vehicle_and_type_filters_narrow_results() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteDirectoryRepository::new(&conn);
    let owner = directory.create_user("owner@example.com", Some("Owner")).unwrap();

    let tagged = seed(
        &conn,
        1,
        NewContact {
            display_name: Some("Tagged".to_string()),
            types: vec![ContactType::InvestorCash, ContactType::Partner],
            vehicle: Some(VehicleFlag::Cast3),
            owner_user_id: Some(owner.id),
            ..NewContact::default()
        },
    );
    seed(
        &conn,
        2,
        NewContact {
            display_name: Some("Plain".to_string()),
            vehicle: Some(VehicleFlag::Core),
            ..NewContact::default()
        },
    );

    let owner_id = owner.id.to_string();
    assert_eq!(
        ids(&legacy(&conn, &params(&[("ownerUserId", owner_id.as_str())]))),
        vec![tagged.id]
    );
    assert_eq!(
        ids(&legacy(&conn, &params(&[("vehicle", "CAST3")]))),
        vec![tagged.id]
    );
    assert_eq!(
        ids(&legacy(&conn, &params(&[("contactType", "PARTNER")]))),
        vec![tagged.id]
    );
    assert_eq!(tagged.types, vec![ContactType::InvestorCash, ContactType::Partner]);
}

#[test]
fn unrecognized_filter_values_are_ignored() {
    let conn = open_db_in_memory().unwrap();
    seed_named(&conn, 1, "One", None);
    seed_named(&conn, 2, "Two", None);

    let items = legacy(
        &conn,
        &params(&[("stage", "NOT_A_STAGE"), ("ownerUserId", "nope"), ("q", "   ")]),
    );
    assert_eq!(items.len(), 2);
}

#[test]
fn ties_break_by_id_in_sort_direction_for_any_page_size() {
    let conn = open_db_in_memory().unwrap();
    for n in 1..=7 {
        seed_named(&conn, n, &format!("Tie {n}"), Some(JAN_01_2024));
    }

    let expected_desc = (1..=7).rev().map(Uuid::from_u128).collect::<Vec<_>>();
    assert_eq!(walk_all(&conn, "lastTouchAt_desc", 1), expected_desc);
    assert_eq!(walk_all(&conn, "lastTouchAt_desc", 3), expected_desc);
    assert_eq!(walk_all(&conn, "lastTouchAt_desc", 50), expected_desc);

    let expected_asc = (1..=7).map(Uuid::from_u128).collect::<Vec<_>>();
    assert_eq!(walk_all(&conn, "lastTouchAt_asc", 2), expected_asc);
}

#[test]
fn display_name_sort_pages_through_text_cursor() {
    let conn = open_db_in_memory().unwrap();
    let names = ["delta", "alpha", "charlie", "bravo", "echo"];
    for (n, name) in names.iter().enumerate() {
        seed_named(&conn, n as u128 + 1, name, None);
    }
    let unnamed = seed(&conn, 9, NewContact::default());
    assert_eq!(unnamed.display_name, None);

    let walked = walk_all(&conn, "displayName_asc", 2);
    assert_eq!(
        walked,
        vec![
            Uuid::from_u128(2),
            Uuid::from_u128(4),
            Uuid::from_u128(3),
            Uuid::from_u128(1),
            Uuid::from_u128(5),
            unnamed.id,
        ]
    );
}

#[test]
fn created_at_sort_uses_timestamps_with_id_tiebreak() {
    let conn = open_db_in_memory().unwrap();
    for n in 1..=4 {
        seed_named(&conn, n, &format!("C{n}"), None);
    }
    conn.execute_batch(&format!(
        "UPDATE contacts SET created_at = 100 WHERE id IN ('{}', '{}');
         UPDATE contacts SET created_at = 200 WHERE id IN ('{}', '{}');",
        Uuid::from_u128(1),
        Uuid::from_u128(4),
        Uuid::from_u128(2),
        Uuid::from_u128(3),
    ))
    .unwrap();

    assert_eq!(
        walk_all(&conn, "createdAt_asc", 1),
        vec![
            Uuid::from_u128(1),
            Uuid::from_u128(4),
            Uuid::from_u128(2),
            Uuid::from_u128(3),
        ]
    );
}

#[test]
fn offset_mode_returns_bare_array_bounded_by_take() {
    let conn = open_db_in_memory().unwrap();
    for n in 1..=120 {
        seed_named(&conn, n, &format!("Contact {n}"), Some(JAN_01_2024 + n as i64));
    }

    assert_eq!(legacy(&conn, &params(&[])).len(), 50);
    assert_eq!(legacy(&conn, &params(&[("take", "500")])).len(), 100);
    assert_eq!(legacy(&conn, &params(&[("take", "-3")])).len(), 50);

    let tail = legacy(&conn, &params(&[("skip", "115")]));
    assert_eq!(tail.len(), 5);
    // Newest touch first, so the tail holds the oldest five.
    assert_eq!(tail.last().unwrap().id, Uuid::from_u128(1));

    let window = legacy(&conn, &params(&[("skip", "10"), ("take", "5")]));
    let all = legacy(&conn, &params(&[("take", "100")]));
    assert_eq!(ids(&window), ids(&all[10..15]));
}

#[test]
fn cursor_limit_defaults_and_caps() {
    let conn = open_db_in_memory().unwrap();
    for n in 1..=130 {
        seed_named(&conn, n, &format!("Contact {n}"), None);
    }

    let (items, next) = paged(&conn, &params(&[("limit", "0")]));
    assert_eq!(items.len(), 25);
    assert!(next.is_some());

    let (items, _) = paged(&conn, &params(&[("limit", "abc")]));
    assert_eq!(items.len(), 25);

    let (items, next) = paged(&conn, &params(&[("limit", "1000")]));
    assert_eq!(items.len(), 100);
    assert!(next.is_some());
}

#[test]
fn exact_final_page_has_no_cursor() {
    let conn = open_db_in_memory().unwrap();
    for n in 1..=4 {
        seed_named(&conn, n, &format!("C{n}"), None);
    }

    let (items, next) = paged(&conn, &params(&[("limit", "4")]));
    assert_eq!(items.len(), 4);
    assert_eq!(next, None);

    let (items, next) = paged(&conn, &params(&[("limit", "5")]));
    assert_eq!(items.len(), 4);
    assert_eq!(next, None);
}

#[test]
fn malformed_cursor_restarts_from_first_page() {
    let conn = open_db_in_memory().unwrap();
    for n in 1..=3 {
        seed_named(&conn, n, &format!("C{n}"), Some(JAN_01_2024 + n as i64));
    }

    let (first, _) = paged(&conn, &params(&[("limit", "2")]));
    let (garbage, _) = paged(&conn, &params(&[("limit", "2"), ("cursor", "%%%not-base64")]));
    assert_eq!(ids(&garbage), ids(&first));
}

#[test]
fn unknown_sort_falls_back_to_last_touch_desc() {
    let conn = open_db_in_memory().unwrap();
    let older = seed_named(&conn, 1, "Older", Some(JAN_01_2024));
    let newer = seed_named(&conn, 2, "Newer", Some(JAN_03_2024));

    let items = legacy(&conn, &params(&[("sort", "favoriteColor_sideways")]));
    assert_eq!(ids(&items), vec![newer.id, older.id]);
}

#[test]
fn cursor_from_another_sort_is_ignored() {
    let conn = open_db_in_memory().unwrap();
    for n in 1..=3 {
        seed_named(&conn, n, &format!("C{n}"), Some(JAN_01_2024 + n as i64));
    }
    let foreign = ContactCursor {
        sort: SortSpec::new(SortField::DisplayName, SortDirection::Asc),
        sort_value: crm_core::query::CursorValue::Text("C1".to_string()),
        id: Uuid::from_u128(1),
    }
    .encode();

    let (first, _) = paged(&conn, &params(&[("limit", "2")]));
    let (restarted, _) = paged(&conn, &params(&[("limit", "2"), ("cursor", foreign.as_str())]));
    assert_eq!(ids(&restarted), ids(&first));
}

#[test]
fn cursor_excludes_its_row_and_everything_before_it() {
    let conn = open_db_in_memory().unwrap();
    let contacts = (1..=6)
        .map(|n| seed_named(&conn, n, &format!("C{n}"), Some(JAN_01_2024 + (n as i64 % 3))))
        .collect::<Vec<_>>();
    let sort = SortSpec::default();
    let full = walk_all(&conn, "lastTouchAt_desc", 100);

    for (position, id) in full.iter().enumerate() {
        let contact = contacts.iter().find(|contact| contact.id == *id).unwrap();
        let token = ContactCursor::from_contact(contact, sort).encode();
        let mut request = params(&[("limit", "100")]);
        request.cursor = Some(token);
        let (rest, _) = paged(&conn, &request);
        assert_eq!(ids(&rest), full[position + 1..].to_vec());
    }
}

#[test]
fn replaying_a_cursor_returns_the_same_page() {
    let conn = open_db_in_memory().unwrap();
    for n in 1..=5 {
        seed_named(&conn, n, &format!("C{n}"), Some(JAN_01_2024 + (n as i64 % 2)));
    }

    let (_, next) = paged(&conn, &params(&[("limit", "2")]));
    let token = next.unwrap();
    let (once, once_next) = paged(&conn, &params(&[("limit", "2"), ("cursor", token.as_str())]));
    let (twice, twice_next) = paged(&conn, &params(&[("limit", "2"), ("cursor", token.as_str())]));
    assert_eq!(ids(&once), ids(&twice));
    assert_eq!(once_next, twice_next);
}

#[test]
fn text_query_folds_case_beyond_ascii() {
    let conn = open_db_in_memory().unwrap();
    let zola = seed_named(&conn, 1, "ÉMILE ZOLA", None);
    seed_named(&conn, 2, "Emile Other", None);
    let directory = SqliteDirectoryRepository::new(&conn);
    let org = directory.create_organization("Société Générale").unwrap();
    let banker = seed(
        &conn,
        3,
        NewContact {
            display_name: Some("Banker".to_string()),
            organization_id: Some(org.id),
            ..NewContact::default()
        },
    );

    for needle in ["émile", "ÉMILE", "Émile zola"] {
        let hits = legacy(&conn, &params(&[("q", needle)]));
        assert_eq!(ids(&hits), vec![zola.id], "needle {needle}");
    }

    let hits = legacy(&conn, &params(&[("q", "SOCIÉTÉ")]));
    assert_eq!(ids(&hits), vec![banker.id]);
}

#[test]
fn display_name_sort_ignores_case() {
    let conn = open_db_in_memory().unwrap();
    let bravo = seed_named(&conn, 1, "Bravo", None);
    let alpha = seed_named(&conn, 2, "alpha", None);
    let emile = seed_named(&conn, 3, "Émile", None);
    let charlie = seed_named(&conn, 4, "charlie", None);
    let alpha_upper = seed_named(&conn, 5, "ALPHA", None);

    let expected = vec![alpha.id, alpha_upper.id, bravo.id, charlie.id, emile.id];
    assert_eq!(walk_all(&conn, "displayName_asc", 1), expected);
    assert_eq!(walk_all(&conn, "displayName_asc", 2), expected);

    let mut reversed = expected.clone();
    reversed.reverse();
    assert_eq!(walk_all(&conn, "displayName_desc", 2), reversed);
}
