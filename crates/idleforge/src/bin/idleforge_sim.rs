//! # IDLEFORGE Simulator
//!
//! Runs one AFK session against the balance data and prints a summary.
//!
//! ```bash
//! # 30 logical minutes of copper mining, instantly
//! idleforge_sim mining copper
//!
//! # Same, but on the wall clock for 20 seconds
//! idleforge_sim mining copper --realtime 20
//!
//! # Different data directory, debug logging
//! IDLEFORGE_DATA=./balance RUST_LOG=idleforge=debug idleforge_sim fishing
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use idleforge::core::{Millis, Skill};
use idleforge::runtime::{Session, SessionHandle};
use idleforge::simulate_afk;

struct Args {
    skill: Skill,
    target: Option<String>,
    realtime_secs: Option<u64>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let skill = args
        .next()
        .ok_or_else(|| "usage: idleforge_sim <skill> [target] [--realtime <secs>]".to_string())?
        .parse::<Skill>()
        .map_err(|e| e.to_string())?;

    let mut target = None;
    let mut realtime_secs = None;
    while let Some(arg) = args.next() {
        if arg == "--realtime" {
            let secs = args.next().ok_or("--realtime needs a number of seconds")?;
            realtime_secs = Some(secs.parse::<u64>().map_err(|e| format!("bad --realtime value: {e}"))?);
        } else {
            target = Some(arg);
        }
    }

    Ok(Args {
        skill,
        target,
        realtime_secs,
    })
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn data_dir() -> PathBuf {
    std::env::var_os("IDLEFORGE_DATA")
        .map_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"), PathBuf::from)
}

async fn run_realtime(session: Session, args: &Args, secs: u64) {
    let handle = SessionHandle::new(session);
    let events = handle.with(Session::subscribe);
    let driver = tokio::spawn(
        handle
            .driver()
            .run(tokio::time::sleep(Duration::from_secs(secs))),
    );

    let id = handle.with(|s| s.start_afk(args.skill, args.target.as_deref()));
    tracing::info!("Running session {} on the wall clock for {}s", id, secs);

    match driver.await {
        Ok(stats) => tracing::info!("Driver: {} wakeups, {} timers", stats.wakeups, stats.timers_popped),
        Err(e) => tracing::error!("Driver task failed: {}", e),
    }

    for event in events.drain() {
        println!("{event:?}");
    }
    handle.with(|s| {
        for (item, qty) in s.player.inventory.iter() {
            println!("  {item}: {qty}");
        }
    });
}

fn main() -> ExitCode {
    init_logging();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let dir = data_dir();
    let session = match Session::load(dir.join("catalog.toml"), dir.join("runtime.toml")) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to load data from {}: {}", dir.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(secs) = args.realtime_secs {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!("Failed to start tokio runtime: {}", e);
                return ExitCode::FAILURE;
            }
        };
        runtime.block_on(run_realtime(session, &args, secs));
        return ExitCode::SUCCESS;
    }

    let mut session = session;
    let report = simulate_afk(&mut session, args.skill, args.target.as_deref(), Millis::MAX);
    print!("{report}");
    ExitCode::SUCCESS
}
