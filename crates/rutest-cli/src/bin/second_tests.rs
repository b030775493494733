//! Second sample suite, for runs that span several executables.

use rutest::{check_equal, check_text, HarnessResult, Registry};

fn declare(registry: &mut Registry) -> HarnessResult<()> {
    let group = registry.declare_group("OtherTests")?;

    registry.declare_case(&group, "AnotherStuff", || check_equal!(2 * 21, 42))?;
    registry.declare_ignored_case(&group, "ShouldBeIgnored", || {
        check_text!(false, "This should not run")
    })?;
    registry.declare_ignored_case(&group, "ShouldAlsoBeIgnored", || {
        check_text!(false, "This should not run either")
    })?;
    registry.declare_case(&group, "ShouldFail", || {
        check_equal!("actual", "expected")
    })?;
    registry.declare_case(&group, "ShouldPass", || {
        check_text!(true, "This is passing")
    })?;

    Ok(())
}

fn main() {
    let mut registry = Registry::new();
    if let Err(e) = declare(&mut registry) {
        eprintln!("error: {}", e);
        std::process::exit(rutest::entry::USAGE_ERROR);
    }
    std::process::exit(rutest::run_main(&registry));
}
