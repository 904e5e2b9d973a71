use pretty_assertions::assert_eq;
use serde_json::Value;
use synctest::{
    filter::NoFilter,
    formatter::{common::color::ColorSetting, json::JsonFormatter, table::TableFormatter},
    harness,
    registry::Registry,
};

use crate::{Buffer, lib::sanitize_durations};

async fn mixed_suite(registry: Registry) -> Result<(), ()> {
    registry
        .describe("A", |s| async move {
            s.test("b", || async { Err::<(), _>("x") });
            s.test("c", || async {});
            s.test_skip("s", || async {});
        })
        .await;
    registry.test("d", || async {
        if true {
            panic!("boom")
        }
    });
    Ok(())
}

#[tokio::test]
async fn table_lists_every_outcome_in_order() {
    let out = Buffer::default();
    let report = harness()
        .with_filter(NoFilter)
        .with_formatter(
            TableFormatter::default()
                .with_target(out.clone())
                .with_color_setting(ColorSetting::Never),
        )
        .run(mixed_suite)
        .await
        .unwrap();

    assert!(report.fmt_errors.is_empty());
    assert_eq!(
        sanitize_durations(&out.contents()),
        "RESULT  NAME\n\
         FAILED  A > b\n\
         \x20       x\n\
         PASSED  A > c\n\
         SKIPPED A > s\n\
         FAILED  d\n\
         \x20       panicked: boom\n\
         \n\
         4 tests: 1 passed; 2 failed; 1 skipped; 0 filtered out; finished in <duration>\n"
    );
}

#[tokio::test]
async fn json_writes_one_object_per_outcome() {
    let out = Buffer::default();
    harness()
        .with_filter(NoFilter)
        .with_formatter(JsonFormatter::default().with_target(out.clone()))
        .run(mixed_suite)
        .await
        .unwrap();

    let contents = sanitize_durations(&out.contents());
    let lines: Vec<Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[0],
        serde_json::json!({"name": "A > b", "outcome": "FAILED", "error": "x", "duration_ms": 0})
    );
    assert_eq!(lines[2]["outcome"], "SKIPPED");
    assert_eq!(lines[3]["error"], "panicked: boom");
    assert_eq!(
        lines[4],
        serde_json::json!({
            "passed": 1,
            "failed": 2,
            "skipped": 1,
            "filtered_out": 0,
            "duration_ms": 0
        })
    );
}
