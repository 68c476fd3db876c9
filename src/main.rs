//! Command line front end: prints the full report of one birth as JSON.

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use saju_core::{BirthInfo, EngineConfig, EphemerisCalendar, Gender, Report, Result, SajuEngine, SajuError};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GenderArg {
    Male,
    Female,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
        }
    }
}

/// Four Pillars chart, classifications and event score
#[derive(Parser, Debug)]
#[command(name = "saju_core")]
#[command(about = "Calculate a Four Pillars chart report and print it as JSON")]
struct Args {
    /// Local birth date and time, "YYYY-MM-DD HH:MM"
    birth: String,

    /// UTC offset such as GMT+9 or UTC-05:30
    #[arg(long, short = 't', default_value = "GMT+9")]
    timezone: String,

    #[arg(long, short = 'g', value_enum, default_value = "male")]
    gender: GenderArg,

    /// Read the date as a lunar calendar date
    #[arg(long)]
    lunar: bool,

    /// The lunar month is the intercalary one (requires --lunar)
    #[arg(long, requires = "lunar")]
    leap_month: bool,

    /// Score the chart against this year's pillar
    #[arg(long)]
    target_year: Option<i32>,

    /// Engine policy file (TOML)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Number of luck-cycle periods to list
    #[arg(long)]
    luck_cycles: Option<usize>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

/// Splits "YYYY-MM-DD HH:MM" into numbers without checking the date against
/// any calendar, so lunar days such as 2/30 survive until the calendar sees them.
fn parse_birth(input: &str) -> Result<(i32, u32, u32, NaiveTime)> {
    let invalid = || SajuError::InvalidDate(format!("{:?} is not \"YYYY-MM-DD HH:MM\"", input));

    let (date, time) = input.trim().split_once(' ').ok_or_else(invalid)?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|_| invalid())?;

    let fields: Vec<&str> = date.split('-').collect();
    let [year, month, day] = fields[..] else {
        return Err(invalid());
    };
    let year = year.parse().map_err(|_| invalid())?;
    let month = month.parse().map_err(|_| invalid())?;
    let day = day.parse().map_err(|_| invalid())?;
    Ok((year, month, day, time))
}

fn birth_info(args: &Args) -> Result<BirthInfo> {
    let (year, month, day, time) = parse_birth(&args.birth)?;
    let gender = Gender::from(args.gender);

    if args.lunar {
        return Ok(BirthInfo::lunar(
            year,
            month,
            day,
            args.leap_month,
            time,
            &args.timezone,
            gender,
        ));
    }

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        SajuError::InvalidDate(format!("{} is not a calendar date", args.birth))
    })?;
    Ok(BirthInfo::solar(date.and_time(time), &args.timezone, gender))
}

fn run(args: &Args) -> Result<String> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    if let Some(count) = args.luck_cycles {
        config.luck_cycle_count = count;
        config.validate()?;
    }

    let engine = SajuEngine::new(EphemerisCalendar, config);
    let birth_info = birth_info(args)?;
    let report = Report::calculate(&birth_info, &engine, args.target_year)?;
    tracing::info!(chart = %report.chart, "report calculated");

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(json)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("saju_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
