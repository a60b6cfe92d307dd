use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Thermal voltage at room temperature (V).
const THERMAL_VOLTAGE: f64 = 0.02585;

/// Ideal diode current with a small series-free leakage term.
fn diode_current(v: f64, saturation: f64, ideality: f64, shunt_ohms: f64) -> f64 {
    saturation * ((v / (ideality * THERMAL_VOLTAGE)).exp() - 1.0) + v / shunt_ohms
}

fn sweep(start: f64, stop: f64, steps: usize) -> Vec<f64> {
    (0..=steps)
        .map(|i| start + (stop - start) * i as f64 / steps as f64)
        .collect()
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

/// Relative multiplicative noise, like an instrument's gain error.
fn noisy(values: &[f64], rel: f64, rng: &mut SimpleRng) -> Vec<f64> {
    values.iter().map(|&i| i * (1.0 + rng.gauss(0.0, rel))).collect()
}

fn write_delimited(path: &Path, delimiter: u8, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_whitespace(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "{}", headers.join("    "))?;
    for row in rows {
        writeln!(file, "{}", row.join("    "))?;
    }
    Ok(())
}

fn rows(voltage: &[f64], current: &[f64]) -> Vec<Vec<String>> {
    voltage
        .iter()
        .zip(current)
        .map(|(v, i)| vec![format!("{v:.4}"), format!("{i:.6e}")])
        .collect()
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    // Forward sweep of a silicon-like diode, comma-delimited.
    let v = sweep(-1.0, 1.0, 80);
    let i: Vec<f64> = v.iter().map(|&v| diode_current(v, 1e-12, 1.6, 1e7)).collect();
    let i = noisy(&i, 0.02, &mut rng);
    write_delimited(&out_dir.join("forward_sweep.csv"), b',', &["Voltage (V)", "I (A)"], &rows(&v, &i))?;

    // Reverse-only sweep, tab-delimited with an extra temperature column.
    let v = sweep(-2.0, 0.0, 40);
    let i: Vec<f64> = v.iter().map(|&v| diode_current(v, 5e-9, 1.2, 5e5)).collect();
    let i = noisy(&i, 0.05, &mut rng);
    let table: Vec<Vec<String>> = rows(&v, &i)
        .into_iter()
        .map(|mut r| {
            r.push(format!("{:.2}", 295.0 + rng.gauss(0.0, 0.1)));
            r
        })
        .collect();
    write_delimited(&out_dir.join("reverse_leakage.txt"), b'\t', &["V", "I", "T (K)"], &table)?;

    // Whitespace export with unconventional headers and one glitched reading.
    let v = sweep(0.0, 0.8, 20);
    let i: Vec<f64> = v.iter().map(|&v| diode_current(v, 1e-10, 2.0, 1e8)).collect();
    let mut table = rows(&v, &noisy(&i, 0.02, &mut rng));
    table[7][1] = "OVERFLOW".to_string();
    write_whitespace(&out_dir.join("bias_amps.txt"), &["Bias", "Amps"], &table)?;

    println!("Wrote 3 sample sweeps to {}", out_dir.display());
    Ok(())
}
