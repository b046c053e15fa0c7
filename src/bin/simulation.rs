//! Synthetic Athlete Simulation
//!
//! Generates a daily training log for one runner with known, planted
//! relationships, for exercising the attribution engine end to end:
//! - Sleep hours drive next-day efficiency factor (lag 1)
//! - Training volume drives pace at fixed heart rate a week later (lag 7)
//! - Stress, temperature and humidity are noise with no downstream effect
//!
//! Each signal loses a random fraction of days, like a real athlete who
//! forgets the watch or skips the food log.
//!
//! # Usage
//! ```bash
//! ./athlete-simulation --days 180 --seed 7 > athlete.json
//! ./athlete-attribution analyze --series athlete.json --pretty
//! ```

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};

use athlete_attribution::types::SeriesPoint;
use athlete_attribution::{AthleteData, SignalKind, TimeSeries};

// ============================================================================
// Athlete Constants
// ============================================================================

/// Typical sleep (hours)
const BASE_SLEEP: f64 = 7.2;
/// Typical daily running volume (km)
const BASE_VOLUME: f64 = 9.0;
/// Efficiency factor at typical sleep
const BASE_EFFICIENCY: f64 = 1.45;
/// Pace at aerobic heart rate at typical volume (s/km)
const BASE_PACE: f64 = 330.0;
/// Efficiency gained per extra hour of sleep the night before
const SLEEP_EFFECT: f64 = 0.04;
/// Pace change (s/km) per extra km of daily volume one week earlier
const VOLUME_EFFECT: f64 = -2.5;
/// Pace response delay (days)
const VOLUME_LAG: usize = 7;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "athlete-simulation")]
#[command(about = "Synthetic athlete data for attribution engine testing")]
#[command(version = "1.0")]
struct Args {
    /// Days of history to generate
    #[arg(short, long, default_value = "180", value_parser = clap::value_parser!(u32).range(14..=3650))]
    days: u32,

    /// First day of the log
    #[arg(long, default_value = "2024-01-01")]
    start: NaiveDate,

    /// Athlete identifier written into the dataset
    #[arg(long, default_value = "sim-runner")]
    athlete_id: String,

    /// Fraction of days missing from each signal (0.0-0.5)
    #[arg(long, default_value = "0.05")]
    gap_rate: f64,

    /// Suppress the generation log (only output the dataset)
    #[arg(short, long)]
    quiet: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

// ============================================================================
// Generation
// ============================================================================

struct AthleteSimulation {
    rng: StdRng,
    days: usize,
    gap_rate: f64,
}

struct DailyLog {
    sleep: Vec<f64>,
    volume: Vec<f64>,
    stress: Vec<f64>,
    temperature: Vec<f64>,
    humidity: Vec<f64>,
    efficiency: Vec<f64>,
    pace: Vec<f64>,
}

impl AthleteSimulation {
    fn new(days: u32, gap_rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            days: days as usize,
            gap_rate: gap_rate.clamp(0.0, 0.5),
        }
    }

    fn noise(&mut self, sd: f64) -> f64 {
        // sd is a positive literal at every call site
        Normal::new(0.0, sd)
            .map(|n| n.sample(&mut self.rng))
            .unwrap_or(0.0)
    }

    fn generate(&mut self) -> DailyLog {
        let n = self.days;
        let mut log = DailyLog {
            sleep: Vec::with_capacity(n),
            volume: Vec::with_capacity(n),
            stress: Vec::with_capacity(n),
            temperature: Vec::with_capacity(n),
            humidity: Vec::with_capacity(n),
            efficiency: Vec::with_capacity(n),
            pace: Vec::with_capacity(n),
        };

        for day in 0..n {
            // Weekly structure: long run on day 6, rest on day 0
            let weekday = day % 7;
            let volume_shape = match weekday {
                0 => 0.3,
                6 => 2.0,
                _ => 1.0,
            };
            // Four-week build/recovery block
            let block = if (day / 7) % 4 == 3 { 0.7 } else { 1.0 + 0.05 * ((day / 7) % 4) as f64 };

            let sleep = (BASE_SLEEP + self.noise(0.8)).clamp(4.0, 10.5);
            let volume = (BASE_VOLUME * volume_shape * block + self.noise(1.5)).max(0.0);
            let stress = (40.0 + self.noise(12.0)).clamp(0.0, 100.0);
            let season = (2.0 * std::f64::consts::PI * day as f64 / 365.0).sin();
            let temperature = 14.0 + 8.0 * season + self.noise(3.0);
            let humidity = (65.0 + self.noise(10.0)).clamp(10.0, 100.0);

            let prior_sleep = if day >= 1 { log.sleep[day - 1] } else { BASE_SLEEP };
            let efficiency =
                BASE_EFFICIENCY + SLEEP_EFFECT * (prior_sleep - BASE_SLEEP) + self.noise(0.015);

            let prior_volume = if day >= VOLUME_LAG {
                log.volume[day - VOLUME_LAG]
            } else {
                BASE_VOLUME
            };
            let pace = BASE_PACE + VOLUME_EFFECT * (prior_volume - BASE_VOLUME) + self.noise(3.0);

            log.sleep.push(sleep);
            log.volume.push(volume);
            log.stress.push(stress);
            log.temperature.push(temperature);
            log.humidity.push(humidity);
            log.efficiency.push(efficiency);
            log.pace.push(pace);
        }
        log
    }

    /// Daily values as a series, dropping `gap_rate` of the days.
    fn series(
        &mut self,
        signal: SignalKind,
        start: NaiveDate,
        values: &[f64],
    ) -> Result<TimeSeries> {
        let mut points = Vec::with_capacity(values.len());
        for (day, &value) in values.iter().enumerate() {
            if self.rng.gen::<f64>() < self.gap_rate {
                continue;
            }
            points.push(SeriesPoint {
                date: start + Duration::days(day as i64),
                value: (value * 1000.0).round() / 1000.0,
            });
        }
        TimeSeries::new(signal, points)
            .with_context(|| format!("Failed to build {} series", signal.as_str()))
    }
}

// ============================================================================
// Generation Log
// ============================================================================

fn log_line(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[sim] {}", message);
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let mut sim = AthleteSimulation::new(args.days, args.gap_rate, args.seed);

    log_line(&"=".repeat(60), args.quiet);
    log_line("SYNTHETIC ATHLETE SIMULATION v1.0", args.quiet);
    log_line(&"=".repeat(60), args.quiet);
    log_line(&format!("  Athlete: {}", args.athlete_id), args.quiet);
    log_line(
        &format!("  Days: {} starting {}", args.days, args.start),
        args.quiet,
    );
    log_line(&format!("  Gap rate: {:.0}%", sim.gap_rate * 100.0), args.quiet);
    if let Some(seed) = args.seed {
        log_line(&format!("  Random seed: {}", seed), args.quiet);
    }
    log_line("", args.quiet);
    log_line("PLANTED RELATIONSHIPS:", args.quiet);
    log_line(
        &format!("  sleep_hours -> efficiency_factor, lag 1 ({:+.3}/h)", SLEEP_EFFECT),
        args.quiet,
    );
    log_line(
        &format!(
            "  training_volume_km -> pace_at_hr, lag {} ({:+.1} s/km per km)",
            VOLUME_LAG, VOLUME_EFFECT
        ),
        args.quiet,
    );
    log_line("  stress, temperature, humidity: unrelated noise", args.quiet);

    let log = sim.generate();
    let start = args.start;
    let series = vec![
        sim.series(SignalKind::SleepHours, start, &log.sleep)?,
        sim.series(SignalKind::TrainingVolume, start, &log.volume)?,
        sim.series(SignalKind::Stress, start, &log.stress)?,
        sim.series(SignalKind::Temperature, start, &log.temperature)?,
        sim.series(SignalKind::Humidity, start, &log.humidity)?,
        sim.series(SignalKind::EfficiencyFactor, start, &log.efficiency)?,
        sim.series(SignalKind::PaceAtHeartRate, start, &log.pace)?,
    ];

    for s in &series {
        log_line(
            &format!("  {:<20} {} of {} days", s.signal().as_str(), s.len(), args.days),
            args.quiet,
        );
    }

    let data = AthleteData::new(args.athlete_id.clone(), series)
        .with_context(|| format!("Failed to assemble dataset for {}", args.athlete_id))?;
    let json = serde_json::to_string(&data).context("Failed to serialize dataset")?;
    println!("{}", json);

    log_line("Done.", args.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = AthleteSimulation::new(60, 0.0, Some(7)).generate();
        let b = AthleteSimulation::new(60, 0.0, Some(7)).generate();
        assert_eq!(a.sleep.len(), 60);
        assert_eq!(a.pace.len(), 60);
        assert_eq!(a.sleep, b.sleep);
        assert_eq!(a.efficiency, b.efficiency);
    }

    #[test]
    fn zero_gap_rate_keeps_every_day() {
        let mut sim = AthleteSimulation::new(30, 0.0, Some(1));
        let log = sim.generate();
        let series = sim.series(SignalKind::SleepHours, start(), &log.sleep).unwrap();
        assert_eq!(series.len(), 30);
    }

    #[test]
    fn non_finite_values_fail_with_signal_context() {
        let mut sim = AthleteSimulation::new(14, 0.0, Some(1));
        let err = sim
            .series(SignalKind::Stress, start(), &[1.0, f64::NAN])
            .unwrap_err();
        assert!(err.to_string().contains("stress"), "{err}");
    }
}
