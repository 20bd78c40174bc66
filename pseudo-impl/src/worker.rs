use std::any::Any;
use std::io;
use std::thread::{self, JoinHandle};

/// Interpreted recursion uses the native stack, so workers get more than the default.
pub const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Run `job` on a dedicated, named worker thread.
pub fn spawn<F>(name: &str, job: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .stack_size(WORKER_STACK_SIZE)
        .spawn(job)
}

/// Best-effort text of a caught panic.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
