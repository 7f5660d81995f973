use chrono::{DateTime, Utc};
use chrono_english::{Dialect, parse_date_string};
use chrono_tz::Tz;
use clap::Parser;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

mod cli;
mod output;

use cli::{Args, DepInfo};
use solar_twin::clock::TICK_INTERVAL;
use solar_twin::faults::FaultRegistry;
use solar_twin::layout::{FrameSpec, PanelSpec};
use solar_twin::sun::{EphemerisModel, SunCalculator, solar_noon};
use solar_twin::time::{parse_datetime_local, parse_time_ns, resolve_local, select_timezone};
use solar_twin::{Twin, TwinError, TwinParams};

// ===================== MAIN =====================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if args.show_build_info {
        println!("Built from Git commit: {}\n", env!("SOLAR_TWIN_GIT_HASH"));
        const DEP_INFO_RAW: &str = include_str!(env!("SOLAR_TWIN_DEPS_INFO"));
        let deps: Vec<DepInfo> = serde_json::from_str(DEP_INFO_RAW)?;

        println!("Found {} dependencies.", deps.len());
        for dep in deps {
            println!("- {} v{}", dep.name, dep.version);
            if let Some(sum) = dep.checksum {
                println!("    Checksum: {}", sum);
            }
            if let Some(src) = dep.source {
                println!("    Source:   {}", src);
            }
        }
        return Ok(());
    }

    let tz = if args.utc { Tz::UTC } else { select_timezone(&args.timezone, args.longitude, args.latitude) };
    let start = resolve_start(&args, tz)?;
    log::info!("session start {} in {}", start, tz);

    let params = TwinParams {
        frame: FrameSpec {
            length: args.frame_length,
            depth: args.frame_depth,
            height: args.frame_height,
            height_from_ground: args.height_from_ground,
        },
        panel: PanelSpec {
            length: args.panel_length,
            depth: args.panel_depth,
            height: args.panel_height,
        },
        sun_intensity: args.sun_intensity,
        latitude: args.latitude,
        longitude: args.longitude,
    };
    let model = EphemerisModel::from_name(&args.model).unwrap_or_default();
    let mut twin = Twin::new(params, FaultRegistry::default(), SunCalculator::new(model), start);
    twin.set_rate(args.rate);

    if args.ticks > 0 {
        if args.realtime {
            run_realtime(&mut twin, args.ticks);
        } else {
            run_instant(&mut twin, args.ticks);
        }
    }

    if args.json {
        output::print_scene_json(&twin.scene())?;
    } else {
        let elapsed = (twin.clock().time() - start).num_seconds();
        output::print_report(&twin, elapsed, args.panels);
    }
    Ok(())
}

// ===================== START TIME =====================

/// Work out the initial simulated time from `--datetime`, or `--date` plus
/// `--at`. A date without a time starts at that day's solar noon.
fn resolve_start(args: &Args, tz: Tz) -> Result<DateTime<Tz>, TwinError> {
    if let Some(dt) = args.datetime.as_deref() {
        return parse_datetime_local(dt, tz);
    }

    // Anchor 'today' to the target timezone
    let anchor_time = Utc::now().with_timezone(&tz);
    let date = match &args.date {
        Some(s) => parse_date_string(s, anchor_time, Dialect::Us)
            .map_err(|e| TwinError::InvalidDate(s.clone(), e.to_string()))?
            .with_timezone(&tz),
        None => anchor_time,
    };

    match args.at.as_deref() {
        Some("now") => Ok(anchor_time),
        Some(at) => {
            let (h, m, s, ns) = parse_time_ns(at)?;
            let naive = date
                .date_naive()
                .and_hms_nano_opt(h, m, s, ns)
                .ok_or_else(|| TwinError::InvalidTime(at.to_string()))?;
            resolve_local(tz, naive)
        }
        None if args.date.is_some() => Ok(solar_noon(date, args.latitude, args.longitude)),
        None => Ok(anchor_time),
    }
}

// ===================== SIMULATION DRIVERS =====================

fn wall_ms() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs_f64() * 1000.0).unwrap_or(0.0)
}

/// Ticks dispatched per `advance_to` call when running instantly
const INSTANT_CHUNK: u64 = 1_000;

/// Apply `ticks` simulation ticks without waiting, in bounded chunks.
fn run_instant(twin: &mut Twin, ticks: u64) {
    twin.start_simulation(Duration::ZERO);
    let (mut applied, mut pulses) = (0u64, 0u64);
    let mut done = 0u64;
    while done < ticks && twin.clock().is_running() {
        done = (done + INSTANT_CHUNK).min(ticks);
        let n = u32::try_from(done).unwrap_or(u32::MAX);
        let advance = twin.advance_to(TICK_INTERVAL.saturating_mul(n), wall_ms());
        applied += u64::from(advance.simulation_ticks);
        pulses += u64::from(advance.pulse_updates);
    }
    twin.pause_simulation();
    log::debug!("applied {} ticks, {} pulse updates", applied, pulses);
}

/// Apply `ticks` simulation ticks on the wall clock, sleeping between
/// deadlines and printing the status line once per simulated second.
fn run_realtime(twin: &mut Twin, ticks: u64) {
    let session = Instant::now();
    twin.start_simulation(Duration::ZERO);

    while twin.clock().ticks() < ticks && twin.clock().is_running() {
        let Some(deadline) = twin.next_deadline() else { break };
        let elapsed = session.elapsed();
        if deadline > elapsed {
            std::thread::sleep(deadline - elapsed);
        }

        let advance = twin.advance_to(deadline, wall_ms());
        if advance.simulation_ticks > 0 && twin.clock().ticks() % 10 == 0 {
            println!("{}", output::status_line(twin));
        }
    }
    twin.pause_simulation();
}
