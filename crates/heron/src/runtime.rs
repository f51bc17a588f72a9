//! Runtime used by the blocking execution model.
//!
//! Blocking callers drive the same pipeline future as async callers, on a
//! lazily created current-thread runtime owned by this crate.

use heron_core::{HeronError, HeronResult};
use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Handle, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn runtime() -> HeronResult<&'static Runtime> {
    if let Some(rt) = RUNTIME.get() {
        return Ok(rt);
    }
    let rt = Builder::new_current_thread()
        .enable_all()
        .thread_name("heron-blocking")
        .build()?;
    // A racing initializer may win; its runtime is kept and ours dropped.
    Ok(RUNTIME.get_or_init(|| rt))
}

/// Runs `future` to completion on the calling thread.
///
/// Fails when called from inside an async runtime, where blocking would
/// stall the caller's scheduler.
pub(crate) fn block_on<F: Future>(future: F) -> HeronResult<F::Output> {
    if Handle::try_current().is_ok() {
        return Err(HeronError::internal(
            "blocking execution requested from inside an async runtime",
        ));
    }
    Ok(runtime()?.block_on(future))
}
