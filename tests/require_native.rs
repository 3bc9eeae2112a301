//! Runs in its own process because it sets an environment variable.

mod common;

use std::panic;

use zenmagick::Magick;

#[test]
fn required_library_fails_instead_of_skipping() {
    // SAFETY: the only test in this binary, so no other thread reads the
    // environment concurrently.
    unsafe { std::env::set_var(common::REQUIRE_NATIVE_ENV, "1") };
    assert!(common::native_required());

    let outcome = panic::catch_unwind(common::magick);
    match Magick::global() {
        Ok(magick) => {
            let found = outcome.expect("library is available");
            assert!(found.is_some_and(|m| std::ptr::eq(m, magick)));
        }
        Err(_) => assert!(outcome.is_err(), "missing library must fail the test"),
    }
}
