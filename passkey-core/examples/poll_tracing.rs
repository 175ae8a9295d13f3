//! Example showing the tracing output of a bounded inclusion poll.
//!
//! The probe stands in for a bundler receipt lookup and reports inclusion on
//! its fourth call.
//!
//! Run with: cargo run -p passkey-core --example poll_tracing

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use passkey_core::poll::{poll_bounded, Probe, TokioDelay};
use passkey_core::{PipelineConfig, PollPolicy, Result};

struct ReceiptLookup {
    calls: AtomicU32,
}

#[async_trait]
impl Probe for ReceiptLookup {
    type Output = String;

    async fn probe(&self) -> Result<Option<String>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok((call >= 4).then(|| format!("0x{}", "ab".repeat(32))))
    }
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("passkey_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Inclusion Poll Tracing Demo ===\n");

    let config = PipelineConfig::from_env();
    let policy = PollPolicy {
        interval: Duration::from_millis(200),
        ..config.poll
    };
    println!("Policy: {:?}\n", policy);

    let probe = ReceiptLookup {
        calls: AtomicU32::new(0),
    };

    match poll_bounded(&policy, &probe, &TokioDelay, &CancellationToken::new()).await {
        Ok(tx_hash) => {
            println!("\n✅ Included");
            println!("   Tx hash: {}", tx_hash);
        }
        Err(e) => {
            println!("\n❌ Failed: {}", e);
        }
    }
}
