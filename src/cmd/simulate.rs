use clap::Args;
use coalesce_tuner::{
    EventContext, ProfileStore, TunerConfig, TunerPlugin, TunerResult, POLICY_EVENT,
};
use rayon::prelude::*;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub config: TunerConfig,

    /// Read settings from COALESCE_* environment variables instead of flags.
    #[arg(long, default_value_t = false)]
    pub from_env: bool,

    #[arg(short = 'i', long, default_value_t = 10)]
    pub iterations: usize,

    /// Workers firing the trigger concurrently each iteration.
    #[arg(short = 't', long, default_value_t = 4)]
    pub threads: usize,

    #[arg(long, default_value_t = 0)]
    pub pause_ms: u64,
}

pub fn run(args: SimulateArgs) -> TunerResult<()> {
    let config = if args.from_env {
        TunerConfig::from_env()
    } else {
        args.config.clone()
    };
    let region = config.region.clone();

    let profiles = Arc::new(ProfileStore::new());
    let plugin =
        TunerPlugin::new(config, profiles.clone()).with_report_sink(Box::new(io::sink()));
    plugin.init()?;

    let workers = args.threads.max(1);
    let mut last = -1;

    for i in 0..args.iterations {
        // Each iteration runs a little faster than the one before.
        profiles.sample_value(&region, 1.0 - (i as f64 * 0.05));
        if args.pause_ms > 0 {
            thread::sleep(Duration::from_millis(args.pause_ms));
        }

        let values = (0..workers)
            .into_par_iter()
            .map(|_| {
                let mut slot = -1;
                plugin
                    .handle_event(POLICY_EVENT, EventContext::with_slot(&mut slot))
                    .map(|_| slot)
            })
            .collect::<TunerResult<Vec<i64>>>()?;

        if let Some(&v) = values.last() {
            last = v;
        }
        info!("Iteration {:3} | coalesced_parcels = {}", i, last);
    }

    let summary = plugin.finalize()?;

    println!("\n=== 🏁 FINAL SETTINGS ===");
    println!("{}", summary.to_table());
    println!("Final coalesced_parcels: {}", last);
    Ok(())
}
