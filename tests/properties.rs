use std::collections::HashSet;

use iqcat::estimation::newton_raphson_path;
use iqcat::{
    IrtModel, IrtParams, Item, Response, fisher_information, percentile, prob_correct,
    select_next, should_stop,
};
use proptest::prelude::*;

fn pool_from(bs: &[f64]) -> Vec<Item> {
    bs.iter()
        .enumerate()
        .map(|(i, &b)| Item::new(format!("q{i}"), 1.0, b))
        .collect()
}

proptest! {
    #[test]
    fn probability_in_open_unit_interval(theta in -6.0f64..6.0, a in 0.1f64..3.0, b in -4.0f64..4.0) {
        let p = prob_correct(theta, a, b);
        prop_assert!(p > 0.0 && p < 1.0);
    }

    #[test]
    fn probability_is_half_at_difficulty(a in 0.1f64..3.0, b in -4.0f64..4.0) {
        prop_assert_eq!(prob_correct(b, a, b), 0.5);
    }

    #[test]
    fn information_decreases_away_from_difficulty(
        a in 0.2f64..3.0,
        b in -3.0f64..3.0,
        d1 in 0.0f64..3.0,
        extra in 0.01f64..2.0,
    ) {
        let near = fisher_information(b + d1, a, b);
        let far = fisher_information(b + d1 + extra, a, b);
        prop_assert!(near > far);
        prop_assert!(fisher_information(b, a, b) >= near);
        prop_assert!((fisher_information(b - d1, a, b) - near).abs() < 1e-12);
    }

    #[test]
    fn all_correct_never_decreases(bs in prop::collection::vec(-3.0f64..3.0, 1..15)) {
        let responses: Vec<Response> = bs
            .iter()
            .map(|&b| Response::new(IrtParams::new(1.0, b), true))
            .collect();
        let path = newton_raphson_path(IrtModel::TwoPl, &responses, 10);
        for w in path.windows(2) {
            prop_assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn all_incorrect_never_increases(bs in prop::collection::vec(-3.0f64..3.0, 1..15)) {
        let responses: Vec<Response> = bs
            .iter()
            .map(|&b| Response::new(IrtParams::new(1.0, b), false))
            .collect();
        let path = newton_raphson_path(IrtModel::TwoPl, &responses, 10);
        for w in path.windows(2) {
            prop_assert!(w[1] <= w[0]);
        }
    }

    #[test]
    fn ceiling_stops_any_pattern(
        theta in -4.0f64..4.0,
        pattern in prop::collection::vec(any::<bool>(), 20),
    ) {
        let answers: Vec<Response> = pattern
            .iter()
            .map(|&u| Response::new(IrtParams::new(1.0, 0.0), u))
            .collect();
        prop_assert!(should_stop(theta, &answers));
    }

    #[test]
    fn selection_never_repeats(
        bs in prop::collection::vec(-3.0f64..3.0, 0..12),
        asked_mask in prop::collection::vec(any::<bool>(), 12),
        theta in -3.0f64..3.0,
    ) {
        let pool = pool_from(&bs);
        let asked: HashSet<String> = pool
            .iter()
            .zip(&asked_mask)
            .filter(|(_, m)| **m)
            .map(|(item, _)| item.id.clone())
            .collect();
        let all_asked = pool.iter().all(|item| asked.contains(&item.id));

        match select_next(theta, &asked, &pool) {
            Some(item) => {
                prop_assert!(!asked.contains(&item.id));
                prop_assert!(!all_asked);
            }
            None => prop_assert!(all_asked),
        }
    }

    #[test]
    fn percentile_is_monotone(
        dist in prop::collection::vec(40.0f64..160.0, 1..50),
        s1 in 40.0f64..160.0,
        delta in 0.0f64..40.0,
    ) {
        let lo = percentile(s1, &dist).unwrap();
        let hi = percentile(s1 + delta, &dist).unwrap();
        prop_assert!(hi >= lo);
        prop_assert!((0.0..=100.0).contains(&lo));
    }
}
