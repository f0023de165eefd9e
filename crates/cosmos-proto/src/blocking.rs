//! Runtime shared by the generated blocking clients.

use crate::Error;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

/// A small multi-threaded runtime for driving blocking stubs.
///
/// One worker keeps the channel's background tasks moving between calls.
pub fn runtime() -> Result<Arc<Runtime>, Error> {
    let runtime = Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("cosmos-grpc-blocking")
        .enable_all()
        .build()?;
    Ok(Arc::new(runtime))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_runs_futures() {
        let runtime = runtime().unwrap();
        assert_eq!(runtime.block_on(async { 40 + 2 }), 42);
    }
}
