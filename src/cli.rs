//! Command-Line Interface Module
//!
//! Mirrors the twin's parameter sidebar. Numeric fields are coerced rather
//! than validated: text that is not a number becomes 0, just like the form
//! inputs.

use clap::Parser;
use serde::Deserialize;
use solar_twin::clock::DEFAULT_RATE;
use solar_twin::twin::coerce_number;

// ===================== CLI =====================

/// Upper bound for `--ticks` (about 11.5 days of wall-clock ticks)
pub const MAX_TICKS: u64 = 10_000_000;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Frame length in metres
    #[arg(long, default_value = "50", allow_hyphen_values = true, value_parser = parse_number, env = "SOLAR_TWIN_FRAME_LENGTH")]
    pub frame_length: f64,
    /// Frame depth (width) in metres
    #[arg(long, default_value = "50", allow_hyphen_values = true, value_parser = parse_number, env = "SOLAR_TWIN_FRAME_DEPTH")]
    pub frame_depth: f64,
    /// Frame height in metres
    #[arg(long, default_value = "10", allow_hyphen_values = true, value_parser = parse_number, env = "SOLAR_TWIN_FRAME_HEIGHT")]
    pub frame_height: f64,

    /// Nominal panel length in metres (panels are stretched to fill the frame)
    #[arg(long, default_value = "10", allow_hyphen_values = true, value_parser = parse_number, env = "SOLAR_TWIN_PANEL_LENGTH")]
    pub panel_length: f64,
    /// Nominal panel depth (width) in metres
    #[arg(long, default_value = "10", allow_hyphen_values = true, value_parser = parse_number, env = "SOLAR_TWIN_PANEL_DEPTH")]
    pub panel_depth: f64,
    /// Panel thickness in metres
    #[arg(long, default_value = "3", allow_hyphen_values = true, value_parser = parse_number, env = "SOLAR_TWIN_PANEL_HEIGHT")]
    pub panel_height: f64,

    /// Vertical offset of the frame above the ground in metres
    #[arg(long, default_value = "3", allow_hyphen_values = true, value_parser = parse_number, env = "SOLAR_TWIN_HEIGHT_FROM_GROUND")]
    pub height_from_ground: f64,
    /// Directional light intensity of the sun
    #[arg(long, default_value = "1", allow_hyphen_values = true, value_parser = parse_number, env = "SOLAR_TWIN_SUN_INTENSITY")]
    pub sun_intensity: f64,

    /// Site latitude in decimal degrees (not range checked)
    #[arg(long, default_value = "15.23", allow_hyphen_values = true, value_parser = parse_number, env = "SOLAR_TWIN_LATITUDE")]
    pub latitude: f64,
    /// Site longitude in decimal degrees (not range checked)
    #[arg(long, default_value = "73.52", allow_hyphen_values = true, value_parser = parse_number, env = "SOLAR_TWIN_LONGITUDE")]
    pub longitude: f64,

    /// Time zone to use ("system", "location", or IANA time zone name)
    #[arg(long, default_value = "system", env = "SOLAR_TWIN_TIMEZONE")]
    pub timezone: String,
    /// Use UTC time zone
    #[arg(long)]
    pub utc: bool,

    /// Sun position model
    #[arg(long, default_value = "suncalc", value_parser = ["suncalc", "spa"], env = "SOLAR_TWIN_MODEL")]
    pub model: String,

    /// Start date (e.g., "2024-12-25" or "today"); defaults to today
    #[arg(long, conflicts_with = "datetime")]
    pub date: Option<String>,
    /// Start time of day (HH:MM[:SS[.fffffffff]] or "now"); defaults to now
    #[arg(long, conflicts_with = "datetime")]
    pub at: Option<String>,
    /// Start date-time as YYYY-MM-DDTHH:MM
    #[arg(long)]
    pub datetime: Option<String>,

    /// Simulation speed in simulated minutes per real second (1-1440)
    #[arg(long, default_value_t = DEFAULT_RATE, value_parser = clap::value_parser!(u32).range(1..=1440), env = "SOLAR_TWIN_RATE")]
    pub rate: u32,
    /// Run the simulation for this many 100 ms ticks before reporting
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=MAX_TICKS))]
    pub ticks: u64,
    /// Run the ticks against the wall clock instead of instantly
    #[arg(long, requires = "ticks")]
    pub realtime: bool,

    /// Print the drawable scene as JSON instead of the text report
    #[arg(long)]
    pub json: bool,
    /// List every panel placement in the text report
    #[arg(long)]
    pub panels: bool,

    /// Show build info from Cargo.lock at time of building
    #[arg(long)]
    pub show_build_info: bool,
}

// Define the structure to match what we serialized in build.rs
#[derive(Debug, Deserialize)]
pub struct DepInfo {
    pub name: String,
    pub version: String,
    pub checksum: Option<String>,
    pub source: Option<String>,
}

// ===================== CLI VALUE PARSERS =====================

fn parse_number(s: &str) -> Result<f64, String> {
    Ok(coerce_number(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const ENV_VARS: [&str; 13] = [
        "SOLAR_TWIN_FRAME_LENGTH",
        "SOLAR_TWIN_FRAME_DEPTH",
        "SOLAR_TWIN_FRAME_HEIGHT",
        "SOLAR_TWIN_PANEL_LENGTH",
        "SOLAR_TWIN_PANEL_DEPTH",
        "SOLAR_TWIN_PANEL_HEIGHT",
        "SOLAR_TWIN_HEIGHT_FROM_GROUND",
        "SOLAR_TWIN_SUN_INTENSITY",
        "SOLAR_TWIN_LATITUDE",
        "SOLAR_TWIN_LONGITUDE",
        "SOLAR_TWIN_TIMEZONE",
        "SOLAR_TWIN_MODEL",
        "SOLAR_TWIN_RATE",
    ];

    /// Declared default of an argument, independent of the environment.
    fn declared_default(id: &str) -> String {
        let cmd = Args::command();
        let arg = cmd.get_arguments().find(|a| a.get_id() == id).unwrap();
        arg.get_default_values()[0].to_string_lossy().into_owned()
    }

    #[test]
    fn test_every_env_var_is_declared() {
        let cmd = Args::command();
        let declared: Vec<String> = cmd
            .get_arguments()
            .filter_map(|a| a.get_env())
            .map(|e| e.to_string_lossy().into_owned())
            .collect();
        for var in ENV_VARS {
            assert!(declared.iter().any(|d| d == var), "{}", var);
        }
    }

    #[test]
    fn test_defaults_match_twin_defaults() {
        let d = solar_twin::TwinParams::default();
        let num = |id: &str| coerce_number(&declared_default(id));
        assert_eq!(num("frame_length"), d.frame.length);
        assert_eq!(num("frame_depth"), d.frame.depth);
        assert_eq!(num("frame_height"), d.frame.height);
        assert_eq!(num("panel_length"), d.panel.length);
        assert_eq!(num("panel_depth"), d.panel.depth);
        assert_eq!(num("panel_height"), d.panel.height);
        assert_eq!(num("height_from_ground"), d.frame.height_from_ground);
        assert_eq!(num("sun_intensity"), d.sun_intensity);
        assert_eq!(num("latitude"), d.latitude);
        assert_eq!(num("longitude"), d.longitude);
        assert_eq!(declared_default("rate"), DEFAULT_RATE.to_string());
    }

    #[test]
    fn test_numeric_fields_coerced() {
        let args = Args::try_parse_from([
            "solar-twin",
            "--frame-length",
            "abc",
            "--latitude",
            "-95.5",
            "--panel-depth",
            "7m",
        ])
        .unwrap();
        assert_eq!(args.frame_length, 0.0);
        assert_eq!(args.latitude, -95.5);
        assert_eq!(args.panel_depth, 7.0);
    }

    #[test]
    fn test_ticks_bounded() {
        let max = MAX_TICKS.to_string();
        let over = (MAX_TICKS + 1).to_string();
        assert!(Args::try_parse_from(["solar-twin", "--ticks", max.as_str()]).is_ok());
        assert!(Args::try_parse_from(["solar-twin", "--ticks", over.as_str()]).is_err());
        assert!(Args::try_parse_from(["solar-twin", "--ticks", "4000000000"]).is_err());
    }

    #[test]
    fn test_rate_range_enforced() {
        assert!(Args::try_parse_from(["solar-twin", "--rate", "0"]).is_err());
        assert!(Args::try_parse_from(["solar-twin", "--rate", "1441"]).is_err());
        assert!(Args::try_parse_from(["solar-twin", "--rate", "1440"]).is_ok());
    }

    #[test]
    fn test_datetime_conflicts_with_date() {
        assert!(
            Args::try_parse_from(["solar-twin", "--datetime", "2024-01-01T10:00", "--date", "today"])
                .is_err()
        );
    }
}
