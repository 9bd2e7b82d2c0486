use std::collections::HashSet;

use iqcat::{
    AdaptiveTest, AnswerEvent, EngineConfig, InMemorySessionStore, IrtParams, Item,
    NormativeDistribution, Response, SessionStore, Step, StopReason, estimate_theta, iq_score,
    percentile, select_next, should_stop, standard_error, update_theta_online,
};
use rand::SeedableRng;
use rand_pcg::Pcg64;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("iqcat=debug".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

fn three_item_pool() -> Vec<Item> {
    vec![
        Item::new("easy", 1.0, -1.0),
        Item::new("medium", 1.0, 0.0),
        Item::new("hard", 1.0, 1.0),
    ]
}

#[test]
fn first_answer_walkthrough() {
    let pool = three_item_pool();
    let first = select_next(0.0, &HashSet::new(), &pool).unwrap();
    assert_eq!(first.irt.b, 0.0);

    let theta = update_theta_online(0.0, 1.0, 0.0, true, 0.1);
    assert!((theta - 0.05).abs() < 1e-12);
}

#[test]
fn twenty_answers_always_stop() {
    let patterns: [fn(usize) -> bool; 3] = [|_| true, |_| false, |i| i % 3 == 0];
    for pattern in patterns {
        let answers: Vec<Response> = (0..20)
            .map(|i| Response::new(IrtParams::new(0.3, 5.0), pattern(i)))
            .collect();
        assert!(should_stop(estimate_theta(&answers), &answers));
        assert!(should_stop(-3.0, &answers));
    }
}

#[test]
fn normative_percentile() {
    let dist = [80.0, 90.0, 100.0, 100.0, 110.0, 120.0];
    let p = percentile(100.0, &dist).unwrap();
    assert!((p - 66.666_666_666_666_67).abs() < 1e-9);
}

#[test]
fn degenerate_inputs_fall_back() {
    assert_eq!(estimate_theta(&[]), 0.0);
    assert!(standard_error(0.0, &[]).is_none());
    assert!(percentile(100.0, &[]).is_err());
    assert_eq!(iq_score(0.0), 100.0);
    assert_eq!(iq_score(1.0), 115.0);
}

#[test]
fn full_session_through_store() {
    init_tracing();
    let pool: Vec<Item> = (0..40)
        .map(|j| Item::new(format!("q{j}"), 1.2, -2.0 + 0.1 * j as f64))
        .collect();
    let norms = NormativeDistribution::from_json_str("[70, 85, 95, 100, 100, 105, 115, 130]").unwrap();
    let test = AdaptiveTest::new(EngineConfig::default()).with_norms(norms);
    let store = InMemorySessionStore::new();
    let mut rng = Pcg64::seed_from_u64(2024);

    let (state, first) = test.start(&pool, &mut rng);
    store.put("respondent-1", state);

    // Answers everything correctly: theta only moves up.
    let mut current = first.map(|item| item.id.clone());
    let mut last_theta = 0.0;
    let mut report = None;
    while let Some(id) = current {
        let step = test
            .submit_to_store(&store, "respondent-1", &pool, &AnswerEvent::new(id, 0), &mut rng)
            .unwrap();
        let theta = store.get("respondent-1").unwrap().theta;
        assert!(theta > last_theta);
        last_theta = theta;
        current = match step {
            Step::Next(item) => Some(item.id.clone()),
            Step::Finished(r) => {
                report = Some(r);
                None
            }
        };
    }

    let report = report.unwrap();
    assert!(report.items_answered <= 20);
    assert_eq!(report.correct, report.items_answered);
    assert!(report.theta > 0.0);
    assert!(report.iq_score > 100.0);
    assert!(report.percentile.unwrap() > 50.0);
    assert!(matches!(
        report.stop_reason,
        Some(StopReason::MaxItems) | Some(StopReason::Precision)
    ));

    let state = store.delete("respondent-1").unwrap();
    assert_eq!(state.asked.len(), report.items_answered);
    assert!(store.is_empty());
}

#[test]
fn config_file_drives_session() {
    init_tracing();
    let raw = r#"
        [selection]
        strategy = "maximum_information"
        top_k = 3
        p_expose = 0.6

        [stopping]
        max_items = 5
    "#;
    let config = EngineConfig::from_toml_str(raw).unwrap();
    let test = AdaptiveTest::new(config);
    let pool: Vec<Item> = (0..12)
        .map(|j| Item::new(format!("q{j}"), 1.0, -1.5 + 0.25 * j as f64))
        .collect();
    let mut rng = Pcg64::seed_from_u64(1);

    let (mut state, mut current) = test.start(&pool, &mut rng);
    let mut answered = 0;
    while let Some(item) = current {
        answered += 1;
        current = match test
            .submit(&mut state, &pool, &AnswerEvent::new(item.id.clone(), answered % 2), &mut rng)
            .unwrap()
        {
            Step::Next(next) => Some(next),
            Step::Finished(report) => {
                assert_eq!(report.stop_reason, Some(StopReason::MaxItems));
                None
            }
        };
    }
    assert_eq!(answered, 5);
}
