//! Sample suite with passing, failing, ignored and (optionally) crashing cases.
//!
//! Set `RUTEST_SAMPLE_CRASH=1` to make `Specials.Crash` abort the process.

use rutest::{check_text, HarnessResult, Registry};

fn specials(registry: &mut Registry) -> HarnessResult<()> {
    let group = registry.declare_group("Specials")?;

    registry.declare_case(&group, "AnotherStuff", || {
        check_text!(true, "Another stuff is fine")
    })?;

    registry.declare_case(&group, "Crash", || {
        if std::env::var_os("RUTEST_SAMPLE_CRASH").is_some() {
            std::process::abort();
        }
        Ok(())
    })?;

    Ok(())
}

fn second_class(registry: &mut Registry) -> HarnessResult<()> {
    let group = registry.declare_group("SecondClass")?;

    registry.declare_ignored_case(&group, "ShouldBeIgnored", || {
        check_text!(false, "This should not run")
    })?;
    registry.declare_ignored_case(&group, "ShouldAlsoBeIgnored", || {
        check_text!(false, "This should not run either")
    })?;
    registry.declare_case(&group, "ShouldBeNew", || {
        check_text!(true, "This is a new test")
    })?;
    registry.declare_case(&group, "ShouldFail", || {
        check_text!(false, "This is failing")
    })?;
    registry.declare_case(&group, "ShouldPass", || {
        check_text!(true, "This is passing")
    })?;

    Ok(())
}

fn class_name(registry: &mut Registry) -> HarnessResult<()> {
    let group = registry.declare_group("ClassName")?;

    registry.declare_case(&group, "ShouldPass", || {
        check_text!(true, "Should pass")
    })?;
    registry.declare_case(&group, "Create", || {
        check_text!(false, "Should fail")
    })?;

    Ok(())
}

fn main() {
    std::process::exit(rutest::run_suite(|registry| {
        specials(registry)?;
        second_class(registry)?;
        class_name(registry)
    }));
}
