// Shared helpers for tests that expect the process to abort.

use std::process::{Command, Stdio};

/// Set in the child process that runs the aborting half of a test.
pub const ABORT_CHILD: &str = "MTQ_EVENTS_ABORT_CHILD";

/// True inside the child started by [`child_exits_cleanly`].
pub fn in_abort_child() -> bool {
    std::env::var_os(ABORT_CHILD).is_some()
}

/// Run `test_name` alone in a fresh copy of this test binary, with
/// [`ABORT_CHILD`] set, and report whether it exited successfully.
pub fn child_exits_cleanly(test_name: &str) -> bool {
    let status = Command::new(std::env::current_exe().unwrap())
        .args([test_name, "--exact", "--test-threads=1", "--nocapture"])
        .env(ABORT_CHILD, "1")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    println!("Child running {test_name} exited with {status}");
    status.success()
}
