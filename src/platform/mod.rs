//! Best-effort scheduling hints for steadier measurements.

use std::io;
use tracing::{debug, warn};

/// Pins the calling thread to `core_id`.
#[cfg(target_os = "linux")]
pub fn set_affinity(core_id: usize) -> io::Result<()> {
    if core_id >= libc::CPU_SETSIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("core id {core_id} is out of range"),
        ));
    }
    // SAFETY: cpu_set_t is plain data, zeroed is its empty state, and the
    // core id was bounds checked above.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(core_id, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn set_affinity(_core_id: usize) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "thread affinity is only supported on linux",
    ))
}

/// Raises the process scheduling priority. Usually needs elevated privileges.
#[cfg(unix)]
pub fn raise_priority() -> io::Result<()> {
    // SAFETY: only changes the scheduling priority of the calling process.
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, -20) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn raise_priority() -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "priority changes are only supported on unix",
    ))
}

/// Applies both hints, logging failures instead of returning them.
pub fn apply_benchmark_hints(core_id: Option<usize>) {
    if let Some(core_id) = core_id {
        match set_affinity(core_id) {
            Ok(()) => debug!(core_id, "pinned to core"),
            Err(e) => warn!(core_id, error = %e, "could not set thread affinity"),
        }
    }
    match raise_priority() {
        Ok(()) => debug!("scheduling priority raised"),
        Err(e) => debug!(error = %e, "could not raise scheduling priority"),
    }
}
