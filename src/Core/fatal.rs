use std::fmt;
use tracing::error;

/// Reports a broken invariant and terminates the process.
///
/// This is the crate's only reaction to precondition violations (a missing
/// output location, a block handed to the wrong pool). It never unwinds:
/// callers sit on lock-free paths that cannot be left half-done.
#[cold]
#[inline(never)]
pub fn fatal(args: fmt::Arguments<'_>) -> ! {
    error!(target: "mtq_events::fatal", "{args}");
    eprintln!("mtq_events fatal error: {args}");
    std::process::abort()
}
