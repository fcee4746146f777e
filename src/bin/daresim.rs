//! DaRe coding simulator
//!
//! Sends a stream of random data units through the encoder, a Bernoulli
//! erasure channel, and the decoder, then prints a result row:
//!
//!   R  W  p_e  p_rr  rec  phase1..phase5  avg_delay  var_delay
//!
//! Usage:
//!   daresim [OPTIONS]
//!
//! Options:
//!   -r, --rate <2|3|4|5>      Code-rate denominator (default: 2)
//!   -w, --window <N>          Window size, one of 0,1,2,4,8,16,32,64 (default: 8)
//!   -e, --loss <percent>      Frame loss percentage (default: 10)
//!   -n, --frames <N>          Number of frames to send (default: 100000)
//!   -s, --size <bytes>        Data-unit size in bytes (default: 2)
//!       --seed <N>            Seed the channel RNG for a reproducible run
//!   -h, --help                Show this help message

use rustydare::params::{ALL_RATES, ALL_WINDOWS};
use rustydare::simulation::{run_simulation, SimulationConfig};
use rustydare::tracing_init::init_tracing;
use rustydare::{CodeRate, WindowLength};

struct SimArgs {
    rate: CodeRate,
    window: WindowLength,
    loss_percent: f64,
    frames: u32,
    unit_size: usize,
    seed: Option<u64>,
}

impl SimArgs {
    fn parse_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();

        let mut rate = CodeRate::R1_2;
        let mut window = WindowLength::W8;
        let mut loss_percent = 10.0;
        let mut frames = 100_000u32;
        let mut unit_size = 2usize;
        let mut seed = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-r" | "--rate" => {
                    i += 1;
                    let value = args.get(i).ok_or("Missing value for --rate")?;
                    let denominator: u8 =
                        value.parse().map_err(|_| format!("Invalid rate value: {}", value))?;
                    rate = ALL_RATES
                        .into_iter()
                        .find(|r| r.denominator() == denominator)
                        .ok_or(format!("Rate denominator must be 2..5, got {}", denominator))?;
                }
                "-w" | "--window" => {
                    i += 1;
                    let value = args.get(i).ok_or("Missing value for --window")?;
                    let size: u8 =
                        value.parse().map_err(|_| format!("Invalid window value: {}", value))?;
                    window = ALL_WINDOWS
                        .into_iter()
                        .find(|w| w.size() == size)
                        .ok_or(format!("Window must be one of 0,1,2,4,8,16,32,64, got {}", size))?;
                }
                "-e" | "--loss" => {
                    i += 1;
                    let value = args.get(i).ok_or("Missing value for --loss")?;
                    loss_percent =
                        value.parse().map_err(|_| format!("Invalid loss value: {}", value))?;
                    if !(0.0..=100.0).contains(&loss_percent) {
                        return Err(format!("Loss must be 0..100 percent, got {}", loss_percent));
                    }
                }
                "-n" | "--frames" => {
                    i += 1;
                    let value = args.get(i).ok_or("Missing value for --frames")?;
                    frames = value.parse().map_err(|_| format!("Invalid frame count: {}", value))?;
                }
                "-s" | "--size" => {
                    i += 1;
                    let value = args.get(i).ok_or("Missing value for --size")?;
                    unit_size = value.parse().map_err(|_| format!("Invalid unit size: {}", value))?;
                    if unit_size == 0 {
                        return Err("Unit size must be at least 1 byte".to_string());
                    }
                }
                "--seed" => {
                    i += 1;
                    let value = args.get(i).ok_or("Missing value for --seed")?;
                    seed = Some(value.parse().map_err(|_| format!("Invalid seed: {}", value))?);
                }
                "-h" | "--help" => {
                    print_help(&args[0]);
                    std::process::exit(0);
                }
                arg => return Err(format!("Unknown option: {}", arg)),
            }
            i += 1;
        }

        Ok(SimArgs { rate, window, loss_percent, frames, unit_size, seed })
    }
}

fn print_help(program: &str) {
    println!("DaRe coding simulator");
    println!();
    println!("Usage: {} [OPTIONS]", program);
    println!();
    println!("Options:");
    println!("  -r, --rate <2|3|4|5>    Code-rate denominator (default: 2)");
    println!("  -w, --window <N>        Window size 0,1,2,4,8,16,32,64 (default: 8)");
    println!("  -e, --loss <percent>    Frame loss percentage (default: 10)");
    println!("  -n, --frames <N>        Number of frames to send (default: 100000)");
    println!("  -s, --size <bytes>      Data-unit size in bytes (default: 2)");
    println!("      --seed <N>          Seed the channel RNG for a reproducible run");
    println!("  -h, --help              Show this help message");
}

fn main() {
    init_tracing();

    let args = match SimArgs::parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!("Try --help for usage.");
            std::process::exit(1);
        }
    };

    let config = SimulationConfig {
        rate: args.rate,
        window: args.window,
        unit_size: args.unit_size,
        frames: args.frames,
        loss_probability: args.loss_percent / 100.0,
        seed: args.seed,
    };

    println!("DaRe coding for LoRaWAN-class uplinks");
    println!("Data-unit size: {} bytes", config.unit_size);
    println!();
    println!("R\tW\tp_e\tp_rr\trec\tphase1\tphase2\tphase3\tphase4\tphase5\tavg_delay\tvar_delay");

    let report = match run_simulation(&config) {
        Ok(report) => report,
        Err(error) => {
            eprintln!("Decoding failed: {}", error);
            std::process::exit(1);
        }
    };

    let results = &report.results;
    println!(
        "{}\t{}\t{}\t{:.3}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.4}\t{:.4}",
        args.rate.denominator(),
        args.window.size(),
        args.loss_percent,
        report.recovery_ratio(config.frames),
        results.recovered,
        results.phase_counts[0],
        results.phase_counts[1],
        results.phase_counts[2],
        results.phase_counts[3],
        results.phase_counts[4],
        results.mean_delay,
        results.delay_variance,
    );

    if report.corrupt > 0 {
        eprintln!("{} recovered units disagree with the sent data", report.corrupt);
        std::process::exit(1);
    }
}
