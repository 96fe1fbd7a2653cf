//! Process-group cleanup for timed-out commands.
//!
//! The dispatcher starts every child as the leader of a new process group, so a pipeline
//! or loop and everything it spawned can be killed with one `killpg`.
//! On non-Unix platforms these helpers are no-ops.

use std::io;

#[cfg(unix)]
/// Send SIGKILL to the whole process group (best-effort).
///
/// A group that is already gone is not an error.
pub fn kill_process_group(process_group_id: u32) -> io::Result<()> {
    let pgid = process_group_id as libc::pid_t;
    let result = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if result == -1 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(not(unix))]
/// No-op on non-Unix platforms.
pub fn kill_process_group(_process_group_id: u32) -> io::Result<()> {
    Ok(())
}
