//! Core-scheduling policy for the launcher's process group.
//!
//! With `CONFIG_SCHED_CORE=y` the kernel refuses to co-schedule tasks from different
//! cookies on sibling hyperthreads. Putting every launcher descendant into one cookie
//! lets the device processes share cores again.

use crate::error::ExecError;

#[cfg(target_os = "linux")]
mod linux {
    pub const PR_SCHED_CORE: libc::c_int = 62;
    pub const PR_SCHED_CORE_CREATE: libc::c_ulong = 1;
    pub const PR_SCHED_CORE_SCOPE_PROCESS_GROUP: libc::c_ulong = 2;
}

/// Apply `PR_SCHED_CORE_CREATE` to the current process group.
#[cfg(target_os = "linux")]
pub fn share_sched_core() -> Result<(), ExecError> {
    use linux::*;

    // SAFETY: prctl with integer arguments only; no memory is passed to the kernel.
    let rc = unsafe {
        libc::prctl(
            PR_SCHED_CORE,
            PR_SCHED_CORE_CREATE,
            libc::getpid() as libc::c_ulong,
            PR_SCHED_CORE_SCOPE_PROCESS_GROUP,
            0 as libc::c_ulong,
        )
    };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn share_sched_core() -> Result<(), ExecError> {
    Err(ExecError::Unsupported("share_sched_core"))
}
