use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::trace;

/// How long a terminated child gets to exit before it is killed outright.
const TERM_GRACE: Duration = Duration::from_secs(5);

pub fn cmd_program(program: &std::path::Path, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd
}

/// Numeric exit code of a finished process; `128 + signal` when killed by a signal.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// SIGTERM, a short grace period, then SIGKILL. Always reaps the child.
pub async fn kill_graceful(child: &mut Child) -> std::io::Result<()> {
    kill_graceful_all([child]).await
}

/// [`kill_graceful`] for many children at once: every child is signalled before any is
/// reaped, so all of them share one grace period.
///
/// Every child is reaped even if some fail; the first error is returned.
pub async fn kill_graceful_all<'a, I>(children: I) -> std::io::Result<()>
where
    I: IntoIterator<Item = &'a mut Child>,
{
    let mut children: Vec<&mut Child> = children.into_iter().collect();
    let signalled = children.iter().filter(|child| send_term(child)).count();
    let grace = if signalled > 0 { TERM_GRACE } else { Duration::ZERO };
    let deadline = Instant::now() + grace;

    let mut first_err = None;
    for child in children.iter_mut() {
        if let Err(e) = reap_by(child, deadline).await {
            first_err.get_or_insert(e);
        }
    }
    first_err.map_or(Ok(()), Err)
}

async fn reap_by(child: &mut Child, deadline: Instant) -> std::io::Result<()> {
    if child.id().is_none() {
        // Already reaped.
        return Ok(());
    }
    if tokio::time::timeout_at(deadline, child.wait()).await.is_ok() {
        return Ok(());
    }
    trace!(target: "vdl.exec.proc", pid = ?child.id(), "grace period over, killing");
    child.kill().await
}

#[cfg(target_family = "unix")]
fn send_term(child: &Child) -> bool {
    let Some(id) = child.id() else {
        return false;
    };
    trace!(target: "vdl.exec.proc", pid = id, "sending SIGTERM");
    // SAFETY: plain syscall on a pid we own and have not reaped yet.
    let rc = unsafe { libc::kill(id as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        trace!(target: "vdl.exec.proc", pid = id, error = %err, "SIGTERM failed");
        return false;
    }
    true
}

#[cfg(not(target_family = "unix"))]
fn send_term(_child: &Child) -> bool {
    false
}
