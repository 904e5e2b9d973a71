use pretty_assertions::assert_eq;
use synctest::{
    config::HarnessConfig, datastore::MemoryStore, formatter::no::NoFormatter, harness, suite,
};

const REGISTERED: usize = 44;
const SKIPPED: usize = 6;

#[tokio::test(start_paused = true)]
async fn memory_store_passes_the_suite() {
    let store = MemoryStore::new();
    let report = harness()
        .with_formatter(NoFormatter)
        .run(|registry| async move { suite::register(&registry, store).await })
        .await
        .unwrap();

    let failures: Vec<_> = report
        .outcomes
        .iter()
        .filter(|outcome| outcome.is_bad())
        .map(|outcome| (outcome.name.to_string(), outcome.error()))
        .collect();
    assert_eq!(failures, Vec::<(String, String)>::new());
    assert_eq!(report.outcomes.len(), REGISTERED);
    assert_eq!(report.skipped(), SKIPPED);
    assert_eq!(report.passed(), REGISTERED - SKIPPED);
    assert!(report.is_success());
}

#[tokio::test(start_paused = true)]
async fn suite_names_follow_the_suite_path() {
    let store = MemoryStore::new();
    let report = harness()
        .with_formatter(NoFormatter)
        .run(|registry| async move { suite::register(&registry, store).await })
        .await
        .unwrap();

    let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_ref()).collect();
    assert_eq!(names[0], "Sanity checks > test name is accessible");
    assert_eq!(names[1], "Basic > Save > Can save a basic model");
    assert_eq!(names[REGISTERED - 1], "Expected error cases");
    assert!(report.outcomes[REGISTERED - 1].skipped());
}

#[tokio::test(start_paused = true)]
async fn config_selects_a_single_suite() {
    let config = HarnessConfig {
        filters: vec!["Basic > Delete".into()],
        ..Default::default()
    };
    let store = MemoryStore::new();
    let report = harness()
        .with_formatter(NoFormatter)
        .with_config(&config)
        .run(|registry| async move { suite::register(&registry, store).await })
        .await
        .unwrap();

    assert_eq!(report.passed(), 10);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.filtered_out, REGISTERED - 12);
    assert!(report.outcomes.iter().all(|o| o.name.starts_with("Basic > Delete > ")));
}
