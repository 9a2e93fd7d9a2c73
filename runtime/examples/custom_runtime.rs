//! Power-user example: pretty stdout, no metrics server, custom heartbeat output.
//!
//! ```bash
//! echo '{"kind":"message","body":{"machine":{"temperature":40}}}' \
//!     | cargo run -p edgefilter-runtime --example custom_runtime
//! ```

use edgefilter_runtime::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    RuntimeBuilder::new()
        .transport(Arc::new(StdoutTransport::pretty()))
        .disable_metrics()
        .configure(|module| async move { Ok(module.heartbeat_output("liveness").threshold(30)) })
        .await
}
