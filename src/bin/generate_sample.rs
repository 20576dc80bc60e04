use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::json;

const SAMPLING_RATE_HZ: f64 = 10_000.0;

/// Slow drift, a low tone the low-pass keeps and a fast tone it removes.
fn generate_signal(
    n: usize,
    low_hz: f64,
    high_hz: f64,
    noise: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64 / SAMPLING_RATE_HZ;
            let tau = 2.0 * std::f64::consts::PI;
            0.2 * t
                + (tau * low_hz * t).sin()
                + 0.5 * (tau * high_hz * t).sin()
                + rng.gauss(0.0, noise)
        })
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

/// Text cell with a comma decimal separator, as the lab exports write them.
fn comma_decimal(v: f64) -> String {
    format!("{v:.6}").replace('.', ",")
}

fn write_tsv(path: &Path, value_column: &str, values: &[f64]) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "time\t{value_column}")?;
    for (i, v) in values.iter().enumerate() {
        let t = i as f64 / SAMPLING_RATE_HZ;
        writeln!(file, "{}\t{}", comma_decimal(t), comma_decimal(*v))?;
    }
    Ok(())
}

fn write_csv(path: &Path, values: &[f64]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["data", "channel"])?;
    for v in values {
        writer.write_record([v.to_string(), "A0".to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, values: Vec<f64>) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![Field::new("data", DataType::Float64, false)]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(Float64Array::from(values))],
    )
    .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "demo_data".into()));
    let mut rng = SimpleRng::new(42);

    for exp in ["experiment1", "experiment2", "experiment3", "experiment4"] {
        std::fs::create_dir_all(out_dir.join(exp))
            .with_context(|| format!("creating {}", out_dir.join(exp).display()))?;
    }

    let file = |exp: &str, name: &str| out_dir.join(exp).join(name);

    write_tsv(
        &file("experiment1", "measurement_1.tsv"),
        "data",
        &generate_signal(12_000, 5.0, 500.0, 0.05, &mut rng),
    )?;
    write_tsv(
        &file("experiment1", "measurement_2.tsv"),
        "data",
        &generate_signal(8_500, 12.0, 800.0, 0.05, &mut rng),
    )?;
    write_csv(
        &file("experiment2", "measurement_1.csv"),
        &generate_signal(10_000, 8.0, 450.0, 0.1, &mut rng),
    )?;
    write_parquet(
        &file("experiment3", "measurement_1.parquet"),
        generate_signal(15_000, 3.0, 650.0, 0.02, &mut rng),
    )?;
    write_tsv(
        &file("experiment4", "measurement_1.tsv"),
        "RawData",
        &generate_signal(9_000, 20.0, 1_200.0, 0.05, &mut rng),
    )?;

    let entry = |exp: &str, name: &str, kind: &str| {
        json!({ "path": file(exp, name).to_string_lossy(), "type": kind })
    };
    let manifest = json!({
        "experiments": {
            "experiment1": [
                entry("experiment1", "measurement_1.tsv", "tsv"),
                entry("experiment1", "measurement_2.tsv", "tsv")
            ],
            "experiment2": [entry("experiment2", "measurement_1.csv", "csv")],
            "experiment3": [entry("experiment3", "measurement_1.parquet", "parquet")],
            "experiment4": [entry("experiment4", "measurement_1.tsv", "tsv")]
        },
        "raw_column_experiment": "experiment4",
        "preprocessing": {
            "window_length_ms": 100,
            "sampling_rate_hz": 10000,
            "cutoff_hz": 150.0,
            "output_dir": out_dir.join("preprocessed").to_string_lossy()
        }
    });

    let manifest_path = out_dir.join("manifest.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("writing {}", manifest_path.display()))?;

    println!(
        "Wrote 5 recordings across 4 experiments and {}",
        manifest_path.display()
    );
    Ok(())
}
