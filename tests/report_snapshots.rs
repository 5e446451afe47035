use std::time::Duration;

use agentchain::report::{BenchmarkSummary, failure_summary, timing_summary};
use agentchain::{PipelineResult, StageOutcome};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn timing_summary_for_complete_run() {
    let outcomes = vec![
        StageOutcome::succeeded("architecture", ms(12_340), "a"),
        StageOutcome::succeeded("development", ms(8_500), "b"),
        StageOutcome::succeeded("testing", ms(4_250), "c"),
        StageOutcome::succeeded("documentation", ms(3_000), "d"),
    ];

    insta::assert_snapshot!(timing_summary(&outcomes, ms(28_200)), @r"
*** TIMING SUMMARY ***
--------------------------------------------------
architecture                       :    12.34 sec [SUCCESS]
development                        :     8.50 sec [SUCCESS]
testing                            :     4.25 sec [SUCCESS]
documentation                      :     3.00 sec [SUCCESS]
--------------------------------------------------
Total Pipeline Time: 28.20 seconds
==================================================
");
}

#[test]
fn reports_for_aborted_run() {
    let result = PipelineResult::new(
        vec![
            StageOutcome::succeeded("architecture", ms(12_340), "a"),
            StageOutcome::failed("development", ms(750), "quota exceeded"),
        ],
        ms(13_100),
        4,
    );

    insta::assert_snapshot!(timing_summary(result.outcomes(), result.total_duration()), @r"
*** TIMING SUMMARY ***
--------------------------------------------------
architecture                       :    12.34 sec [SUCCESS]
development                        :     0.75 sec [FAILED]
--------------------------------------------------
Total Pipeline Time: 13.10 seconds
==================================================
");

    insta::assert_snapshot!(failure_summary(&result, Some("us-east-1")).unwrap(), @r"
[FAILED] PIPELINE FAILED at stage 2/4 (development)
Error details: quota exceeded
Stage time: 0.75 seconds
Time spent before failure: 13.10 seconds
Stages not run: 2

Possible causes:
1. Network connectivity issue
2. Invalid AWS credentials
3. Model not available in region us-east-1
4. Insufficient permissions for the model
");
}

#[test]
fn benchmark_summary_over_three_runs() {
    let summary = BenchmarkSummary::new(vec![
        PipelineResult::new(
            vec![
                StageOutcome::succeeded("architecture", ms(9_000), "a"),
                StageOutcome::succeeded("development", ms(11_000), "b"),
            ],
            ms(20_000),
            2,
        ),
        PipelineResult::new(
            vec![
                StageOutcome::succeeded("architecture", ms(13_000), "a"),
                StageOutcome::succeeded("development", ms(13_000), "b"),
            ],
            ms(26_000),
            2,
        ),
        PipelineResult::new(
            vec![
                StageOutcome::succeeded("architecture", ms(11_000), "a"),
                StageOutcome::failed("development", ms(500), "throttled"),
            ],
            ms(12_000),
            2,
        ),
    ]);

    assert!(!summary.all_succeeded());
    insta::assert_snapshot!(summary.render(), @r"
*** BENCHMARK SUMMARY ***
================================================================================
Run        Status     Total Time      Performance
--------------------------------------------------------------------------------
#1         [SUCCESS]  20.00s          *** FASTEST ***
#2         [SUCCESS]  26.00s          1.3x slower
#3         [FAILED]   12.00s          FAILED
--------------------------------------------------------------------------------
Stage averages (successful stages):
  architecture                     :    11.00 sec (3 of 3 runs)
  development                      :    12.00 sec (2 of 3 runs)
Fastest: run #1 (20.00s)
Slowest: run #2 (26.00s)
Speed difference: 1.3x
");
}

#[test]
fn json_result_shape() {
    let result = PipelineResult::new(
        vec![StageOutcome::failed("architecture", ms(1_500), "AccessDeniedException")],
        ms(2_000),
        4,
    );

    insta::assert_json_snapshot!(result, @r#"
{
  "stages": [
    {
      "name": "architecture",
      "duration_seconds": 1.5,
      "success": false,
      "error": "AccessDeniedException"
    }
  ],
  "total_duration_seconds": 2.0,
  "overall_success": false,
  "state": "aborted"
}
"#);
}
