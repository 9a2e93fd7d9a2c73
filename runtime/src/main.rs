//! edgefilter - temperature filter module driven from stdin
//!
//! Reads newline-delimited JSON events on stdin, writes forwarded messages
//! to stdout and logs to stderr. See `edgefilter_gateway::config` for the
//! environment variables.

#![deny(unsafe_code)]

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    edgefilter_runtime::run(|module| async move { Ok(module) }).await
}
