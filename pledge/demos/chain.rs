//! Chains timers, recovers from a failure and joins the results.
//!
//! Run with `RUST_LOG=pledge=trace cargo run --example chain` to watch the
//! settlements go by.

use pledge::time::sleep;
use pledge::{Error, Promise, all};

use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn fetch(name: &'static str, millis: u64) -> Promise<String> {
    sleep(Duration::from_millis(millis)).then(move |_| {
        if name.is_empty() {
            return Err(Error::msg("empty name"));
        }

        Ok(format!("{name} after {millis}ms"))
    })
}

#[pledge::main(name = "demo")]
fn main() -> pledge::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let recovered = fetch("", 5).catch(|error| Ok(format!("recovered from: {error}")));

    all!(fetch("alpha", 20), fetch("beta", 10), recovered)
        .then(|(alpha, beta, recovered)| {
            println!("{alpha}");
            println!("{beta}");
            println!("{recovered}");
            Ok(())
        })
        .finally(|| {
            println!("done");
            Ok(())
        })
}
