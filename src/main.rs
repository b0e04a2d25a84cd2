use anyhow::{Context, Result};

fn main() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime.block_on(gptctx::run());
    // After Ctrl+C a stdin read is still parked on a blocking thread.
    runtime.shutdown_background();
    result
}
