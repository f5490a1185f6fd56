use itertools::Itertools;
use serde::Serialize;

use crate::core::domain::{RunResult, UnitTestResult};

/// How a finished run is turned into a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    Simple,
    UnitTest,
    /// Compares stdout line by line with `expected`.
    OutputDiff { expected: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RunResponse {
    Output {
        run: String,
        err: String,
    },
    Tests {
        run: String,
        err: String,
        tests: UnitTestResult,
    },
    Diff {
        run: String,
        #[serde(rename = "diffLines")]
        diff_lines: Vec<usize>,
    },
    Stdout {
        run: String,
    },
    Stderr {
        err: String,
    },
}

impl Strategy {
    pub fn wants_test_report(&self) -> bool {
        matches!(self, Strategy::UnitTest)
    }

    pub fn respond(&self, result: &RunResult, report: Option<UnitTestResult>) -> RunResponse {
        match self {
            Strategy::Simple => RunResponse::Output {
                run: result.stdout.clone(),
                err: result.stderr.clone(),
            },
            Strategy::UnitTest => RunResponse::Tests {
                run: result.stdout.clone(),
                err: result.stderr.clone(),
                tests: report.unwrap_or_default(),
            },
            Strategy::OutputDiff { expected } => compare_output(expected, result),
        }
    }
}

fn compare_output(expected: &str, result: &RunResult) -> RunResponse {
    if !result.stderr.is_empty() {
        return RunResponse::Stderr {
            err: result.stderr.clone(),
        };
    }

    match diff_lines(expected, &result.stdout) {
        Some(diff_lines) => RunResponse::Diff {
            run: result.stdout.clone(),
            diff_lines,
        },
        None => RunResponse::Stdout {
            run: result.stdout.clone(),
        },
    }
}

/// Zero-based indices of the lines where `actual` differs from `expected`.
/// `None` when the two have a different number of lines.
pub fn diff_lines(expected: &str, actual: &str) -> Option<Vec<usize>> {
    let expected: Vec<_> = expected.split('\n').collect();
    let actual: Vec<_> = actual.split('\n').collect();

    if expected.len() != actual.len() {
        return None;
    }

    Some(
        expected
            .iter()
            .zip(&actual)
            .positions(|(e, a)| e != a)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{RunConfig, TestCaseResult};

    fn result(stdout: &str, stderr: &str) -> RunResult {
        RunResult {
            config: RunConfig {
                image: "coduno/fingerprint-py".to_string(),
                workspace: "/tmp/coduno-volume".into(),
                code: "print('a')".to_string(),
                language: "py".to_string(),
                challenge: None,
                user: None,
            },
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            usage: Default::default(),
            prepare_log: String::new(),
            started_at: chrono::Utc::now(),
            ended_at: chrono::Utc::now(),
            exit: String::new(),
        }
    }

    #[test]
    fn test_diff_reports_mismatching_lines() {
        assert_eq!(diff_lines("a\nb\nc", "a\nx\nc"), Some(vec![1]));
        assert_eq!(diff_lines("a\nb\nc\n", "a\nb\nc\n"), Some(vec![]));
        assert_eq!(diff_lines("1\n2\n3", "0\n2\n4"), Some(vec![0, 2]));
    }

    #[test]
    fn test_diff_is_undefined_for_different_shapes() {
        assert_eq!(diff_lines("a\nb\nc", "a\nb"), None);
    }

    #[test]
    fn test_simple_returns_both_streams() {
        let response = Strategy::Simple.respond(&result("out", "err"), None);

        assert_eq!(
            response,
            RunResponse::Output {
                run: "out".to_string(),
                err: "err".to_string()
            }
        );
    }

    #[test]
    fn test_unit_test_without_report_is_zero_valued() {
        let response = Strategy::UnitTest.respond(&result("built", "warn"), None);

        assert_eq!(
            response,
            RunResponse::Tests {
                run: "built".to_string(),
                err: "warn".to_string(),
                tests: UnitTestResult::default(),
            }
        );
    }

    #[test]
    fn test_unit_test_carries_report() {
        let report = UnitTestResult {
            tests: 1,
            failures: 0,
            errors: 0,
            test_cases: vec![TestCaseResult {
                name: "testAdd".to_string(),
                time: "0.001".to_string(),
                failure: None,
            }],
        };

        let response = Strategy::UnitTest.respond(&result("", ""), Some(report.clone()));

        assert!(matches!(response, RunResponse::Tests { tests, .. } if tests == report));
    }

    #[test]
    fn test_output_diff_prefers_stderr() {
        let strategy = Strategy::OutputDiff {
            expected: "a\nb".to_string(),
        };

        let response = strategy.respond(&result("a\nb", "Traceback"), None);

        assert_eq!(
            response,
            RunResponse::Stderr {
                err: "Traceback".to_string()
            }
        );
    }

    #[test]
    fn test_output_diff_lists_lines() {
        let strategy = Strategy::OutputDiff {
            expected: "a\nb\nc".to_string(),
        };

        let response = strategy.respond(&result("a\nx\nc", ""), None);

        assert_eq!(
            response,
            RunResponse::Diff {
                run: "a\nx\nc".to_string(),
                diff_lines: vec![1],
            }
        );
    }

    #[test]
    fn test_output_diff_with_different_line_count_returns_stdout() {
        let strategy = Strategy::OutputDiff {
            expected: "a\nb\nc".to_string(),
        };

        let response = strategy.respond(&result("a\nb", ""), None);

        assert_eq!(
            response,
            RunResponse::Stdout {
                run: "a\nb".to_string()
            }
        );
    }

    #[test]
    fn test_response_json_shapes() {
        let diff = RunResponse::Diff {
            run: "a".to_string(),
            diff_lines: vec![0],
        };
        let tests = RunResponse::Tests {
            run: String::new(),
            err: String::new(),
            tests: UnitTestResult::default(),
        };

        assert_eq!(
            serde_json::to_value(diff).unwrap(),
            serde_json::json!({"run": "a", "diffLines": [0]})
        );
        assert_eq!(
            serde_json::to_value(tests).unwrap(),
            serde_json::json!({
                "run": "",
                "err": "",
                "tests": {"tests": 0, "failures": 0, "errors": 0, "testCases": []}
            })
        );
    }
}
