//! Moves CPU-bound work to worker contexts and collects the results back
//! on the main context.

use pledge::{EventLoop, Promise, run_off_context};

use tracing_subscriber::EnvFilter;

fn count_primes(limit: u64) -> u64 {
    (2..limit)
        .filter(|n| (2..).take_while(|d| d * d <= *n).all(|d| n % d != 0))
        .count() as u64
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let event_loop = EventLoop::builder()
        .name("relay-demo")
        .worker_name_prefix("prime-worker")
        .build();

    let limits = [10_000, 20_000, 40_000, 80_000];

    let counts = event_loop.block_on(|| {
        Promise::all(limits.map(|limit| run_off_context(move || Ok(count_primes(limit)))))
            .then_off_context(|counts| {
                let total = counts.iter().sum::<u64>();
                Ok((counts, total))
            })
    });

    match counts {
        Ok((counts, total)) => {
            for (limit, count) in limits.iter().zip(&counts) {
                println!("primes below {limit}: {count}");
            }
            println!("total: {total}");
        }
        Err(error) => eprintln!("relay failed: {error}"),
    }
}
