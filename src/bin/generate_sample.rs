use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

/// Engine warm-up curve: first-order approach to `target`.
fn warm_up(t: f64, start: f64, target: f64, tau: f64) -> f64 {
    target - (target - start) * (-t / tau).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Run {
    folder: &'static str,
    name: &'static str,
    rpm: f64,
    comma_decimal: bool,
    time_header: &'static str,
}

fn number(v: f64, comma: bool) -> String {
    let s = format!("{v:.2}");
    if comma { s.replace('.', ",") } else { s }
}

fn render(run: &Run, rng: &mut SimpleRng, samples: usize) -> Result<String> {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .context("invalid start timestamp")?;

    let mut out = format!("{}\tRPM\tTorque [Nm]\tOil Temp [C]\tStatus\n", run.time_header);
    for i in 0..samples {
        let t = i as f64 * 0.5;
        let stamp = start + Duration::milliseconds((t * 1000.0) as i64);
        let rpm = run.rpm + rng.gauss(0.0, run.rpm * 0.01);
        let torque = 0.12 * rpm + rng.gauss(0.0, 2.0);
        let oil = warm_up(t, 25.0, 95.0, 120.0) + rng.gauss(0.0, 0.3);
        let status = if i % 50 == 0 { "MARK" } else { "" };
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{status}",
            stamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            number(rpm, run.comma_decimal),
            number(torque, run.comma_decimal),
            number(oil, run.comma_decimal),
        );
    }
    Ok(out)
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let root = Path::new("sample_logs");

    let runs = [
        Run { folder: "bench_1", name: "idle_1000", rpm: 1000.0, comma_decimal: false, time_header: "Date Time" },
        Run { folder: "bench_1", name: "cruise_2500", rpm: 2500.0, comma_decimal: false, time_header: "Date Time" },
        Run { folder: "bench_2", name: "full_load_4000", rpm: 4000.0, comma_decimal: false, time_header: "Date Time" },
        Run { folder: "bench_2/eu", name: "cruise_2500_eu", rpm: 2500.0, comma_decimal: true, time_header: "Zaman" },
    ];

    for run in &runs {
        let dir = root.join(run.folder);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(format!("{}.txt", run.name));
        std::fs::write(&path, render(run, &mut rng, 600)?).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote {}", path.display());
    }

    println!("Wrote {} engine-test logs under {}", runs.len(), root.display());
    Ok(())
}
