//! Output Formatting Module
//!
//! Terminal rendering of the twin: a status bar, the parameter sidebar,
//! the panel layout, active alerts and the sky. `--json` prints the drawable
//! scene instead.

use solar_twin::faults::ArrayStatus;
use solar_twin::layout::Layout;
use solar_twin::scene::Scene;
use solar_twin::sky::Sky;
use solar_twin::time::{format_datetime_local, format_hms, format_status_time};
use solar_twin::{Param, Twin};

// ===================== STATUS BAR =====================

/// One-line status: fault state, sun coordinates and simulated time.
pub fn status_line(twin: &Twin) -> String {
    let status = twin.registry().status();
    let dot = match status {
        ArrayStatus::Operational => "🟢",
        ArrayStatus::IssuesDetected => "🔴",
    };
    let sun = twin.sun();
    format!(
        "{} Panel Status: {} | ☀ ({:.1}, {:.1}, {:.1}) | {}",
        dot,
        status.label(),
        sun.x,
        sun.y,
        sun.z,
        format_status_time(&twin.clock().time())
    )
}

// ===================== REPORT =====================

/// Print the full text report.
///
/// # Arguments
/// * `twin` - Session to describe
/// * `elapsed_sim_s` - Simulated seconds advanced during this run
/// * `list_panels` - Include one line per placed panel
pub fn print_report(twin: &Twin, elapsed_sim_s: i64, list_panels: bool) {
    println!("{}", status_line(twin));
    println!();

    print_time_simulation(twin, elapsed_sim_s);
    println!();
    print_parameters(twin);
    println!();
    print_layout(twin.layout(), list_panels);
    println!();
    print_sun(twin);
    print_alerts(twin);
}

fn print_time_simulation(twin: &Twin, elapsed_sim_s: i64) {
    let clock = twin.clock();
    println!("Time Simulation:");
    println!("  Date & Time   : {} ({})", format_datetime_local(&clock.time()), twin.timezone());
    println!("  Speed         : {} min/sec", clock.rate());
    println!("  State         : {}", if clock.is_running() { "running" } else { "paused" });
    if clock.ticks() > 0 {
        println!("  Advanced      : {} over {} ticks", format_hms(elapsed_sim_s), clock.ticks());
    }
}

fn print_parameters(twin: &Twin) {
    println!("Panel Parameters:");
    for param in Param::ALL {
        println!(
            "  {:<19}: {:>10}{}",
            param.label(),
            format_value(twin.params().get(param)),
            param.unit()
        );
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 { format!("{}", v as i64) } else { format!("{}", v) }
}

fn print_layout(layout: &Layout, list_panels: bool) {
    println!("Layout:");
    println!(
        "  Grid          : {} columns x {} rows ({} cells)",
        layout.columns,
        layout.rows,
        layout.capacity()
    );
    println!("  Panels placed : {}", layout.placements.len());
    if let Some(first) = layout.placements.first() {
        println!("  Panel size    : {:.2} x {:.2} x {:.2} m", first.size[0], first.size[2], first.size[1]);
    } else {
        println!("  Panel size    : - (panels do not fit the frame)");
    }

    if list_panels {
        for p in &layout.placements {
            let [x, y, z] = p.world_position(layout.height_from_ground);
            println!(
                "  #{:<3} r{} c{}  ({:8.2}, {:6.2}, {:8.2}){}",
                p.index + 1,
                p.row,
                p.column,
                x,
                y,
                z,
                if p.faulted { "  FAULT" } else { "" }
            );
        }
    }
}

fn print_sun(twin: &Twin) {
    let sun = twin.sun();
    let sky = Sky::from_sun_height(sun.y);
    println!("Sun ({} model):", twin.model_name());
    println!("  Altitude      : {:8.3}°", sun.altitude_deg);
    println!("  Azimuth (S=0) : {:8.3}°", sun.azimuth_deg);
    println!("  Position      : ({:.2}, {:.2}, {:.2})", sun.x, sun.y, sun.z);
    println!(
        "  Sky           : {} (height {:.3}, {} stars, ambient {:.2})",
        if sun.is_below_horizon() { "night" } else { "day" },
        sky.normalized_height,
        sky.star_count,
        sky.ambient_intensity
    );
}

fn print_alerts(twin: &Twin) {
    let alerts = twin.registry().alerts();
    if alerts.is_empty() {
        return;
    }
    println!();
    println!("SYSTEM ALERTS");
    for alert in alerts {
        println!("  ● {}", alert.title);
        println!("    {}", alert.detail);
    }
}

/// Print the drawable scene as pretty JSON.
pub fn print_scene_json(scene: &Scene) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(scene)?);
    Ok(())
}
