//! Sample suite binaries driven through their command line

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn basic_tests() -> Command {
    let mut cmd = Command::cargo_bin("basic_tests").unwrap();
    cmd.env_remove("RUTEST_SAMPLE_CRASH")
        .env_remove("RUTEST_ISOLATION")
        .env_remove("RUTEST_TIMEOUT_MS")
        .arg("--no-color");
    cmd
}

fn json_report(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.arg("--json").output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

// ══════════════════════════════════════════════════════════════════════════════
// LISTING
// ══════════════════════════════════════════════════════════════════════════════

mod listing {
    use super::*;

    #[test]
    fn test_list_names() {
        basic_tests()
            .arg("-ln")
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "Specials.AnotherStuff Specials.Crash SecondClass.ShouldBeIgnored",
            ))
            .stdout(predicate::str::contains("ClassName.Create"));
    }

    #[test]
    fn test_list_groups() {
        basic_tests()
            .arg("-lg")
            .assert()
            .success()
            .stdout("Specials SecondClass ClassName\n");
    }

    #[test]
    fn test_list_locations() {
        basic_tests()
            .arg("-ll")
            .assert()
            .success()
            .stdout(predicate::str::is_match(r"SecondClass\.ShouldFail\..*basic_tests\.rs\.\d+").unwrap());
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// RUNNING
// ══════════════════════════════════════════════════════════════════════════════

mod running {
    use super::*;

    #[test]
    fn test_full_run_fails_with_summary() {
        basic_tests()
            .assert()
            .code(1)
            .stdout(predicate::str::contains(
                "error: Failure in TEST(SecondClass, ShouldFail)",
            ))
            .stdout(predicate::str::contains("Message: This is failing"))
            .stdout(predicate::str::contains(
                "Test result: FAILED | 9 total, 5 passed, 2 failed, 2 ignored, 0 filtered out",
            ));
    }

    #[test]
    fn test_full_run_counts() {
        let report = json_report(&mut basic_tests());
        assert_eq!(report["total"], 9);
        assert_eq!(report["passed"], 5);
        assert_eq!(report["failed"], 2);
        assert_eq!(report["ignored"], 2);
        assert_eq!(report["failures"][0]["case"], "ShouldFail");
        assert_eq!(report["failures"][1]["case"], "Create");
    }

    #[test]
    fn test_selected_passing_case_succeeds() {
        basic_tests()
            .args(["-sg", "SecondClass", "-sn", "ShouldPass", "-v"])
            .assert()
            .success()
            .stdout(predicate::str::contains("TEST(SecondClass, ShouldPass) - "));
    }

    #[test]
    fn test_selected_ignored_case_reports_ignore() {
        basic_tests()
            .args(["-sg", "SecondClass", "-sn", "ShouldBeIgnored", "-v"])
            .assert()
            .success()
            .stdout(predicate::str::contains("IGNORE_TEST(SecondClass, ShouldBeIgnored) - "));
    }

    #[test]
    fn test_in_process_run_matches_process_run() {
        let report = json_report(basic_tests().args(["--isolation", "in-process"]));
        assert_eq!(report["total"], 9);
        assert_eq!(report["passed"], 5);
        assert_eq!(report["failed"], 2);
    }

    #[test]
    fn test_excluded_group_is_filtered_out() {
        let report = json_report(basic_tests().args(["-xg", "Class"]));
        assert_eq!(report["total"], 2);
        assert_eq!(report["filtered_out"], 7);
        assert_eq!(report["failed"], 0);
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        basic_tests()
            .arg("--frobnicate")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("--frobnicate"));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// CRASHES
// ══════════════════════════════════════════════════════════════════════════════

mod crashes {
    use super::*;

    #[test]
    fn test_crash_is_fault_under_process_isolation() {
        let mut cmd = basic_tests();
        cmd.env("RUTEST_SAMPLE_CRASH", "1").args(["-sg", "Specials"]);

        let report = json_report(&mut cmd);
        assert_eq!(report["total"], 2);
        assert_eq!(report["passed"], 1);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["failures"][0]["case"], "Crash");
        assert_eq!(report["failures"][0]["kind"], "fault");
    }

    #[test]
    fn test_crash_console_output_continues() {
        basic_tests()
            .env("RUTEST_SAMPLE_CRASH", "1")
            .args(["-sg", "Specials", "-v"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("error: Fault in TEST(Specials, Crash)"))
            .stdout(predicate::str::contains("Test result: FAILED"));
    }

    #[test]
    fn test_crash_without_isolation_takes_process_down() {
        basic_tests()
            .env("RUTEST_SAMPLE_CRASH", "1")
            .args(["--isolation", "in-process", "-sg", "Specials", "-sn", "Crash"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Test result").not());
    }
}
