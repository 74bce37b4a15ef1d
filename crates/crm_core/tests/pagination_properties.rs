mod common;

use common::{legacy, params, seed_named, walk_all, JAN_01_2024};
use crm_core::db::open_db_in_memory;
use proptest::prelude::*;
use std::cmp::Ordering;
use uuid::Uuid;

/// Reference ordering: non-null values first, value then id in `direction`.
fn expected_order(touches: &[Option<i64>], descending: bool) -> Vec<Uuid> {
    let mut rows = touches
        .iter()
        .enumerate()
        .map(|(index, touch)| (*touch, Uuid::from_u128(index as u128 + 1)))
        .collect::<Vec<_>>();
    rows.sort_by(|(left_touch, left_id), (right_touch, right_id)| {
        let by_key = match (left_touch, right_touch) {
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (Some(left), Some(right)) => left.cmp(right).then(left_id.cmp(right_id)),
            (None, None) => left_id.cmp(right_id),
        };
        if descending {
            by_key.reverse()
        } else {
            by_key
        }
    });
    rows.into_iter().map(|(_, id)| id).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn cursor_walk_visits_every_row_once_in_total_order(
        touches in prop::collection::vec(prop::option::of(0i64..4), 0..18),
        limit in 1u32..7,
        descending in any::<bool>(),
    ) {
        let conn = open_db_in_memory().unwrap();
        for (index, touch) in touches.iter().enumerate() {
            seed_named(
                &conn,
                index as u128 + 1,
                &format!("Row {index}"),
                touch.map(|offset| JAN_01_2024 + offset),
            );
        }

        let sort = if descending { "lastTouchAt_desc" } else { "lastTouchAt_asc" };
        let walked = walk_all(&conn, sort, limit);
        prop_assert_eq!(walked, expected_order(&touches, descending));
    }

    #[test]
    fn page_size_does_not_change_order(
        touches in prop::collection::vec(prop::option::of(0i64..3), 1..15),
        small in 1u32..4,
    ) {
        let conn = open_db_in_memory().unwrap();
        for (index, touch) in touches.iter().enumerate() {
            seed_named(&conn, index as u128 + 1, "Same", *touch);
        }

        let single_page = walk_all(&conn, "lastTouchAt_desc", 50);
        prop_assert_eq!(walk_all(&conn, "lastTouchAt_desc", small), single_page.clone());

        let offset_ids = legacy(&conn, &params(&[("take", "100")]))
            .into_iter()
            .map(|contact| contact.id)
            .collect::<Vec<_>>();
        prop_assert_eq!(offset_ids, single_page);
    }
}
