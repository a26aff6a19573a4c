use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

use evalplot::pipeline::{suite_input, SUITE_FILE, SUITE_VARIANTS};

/// Write synthetic benchmark runs laid out the way `evalplot suite` expects.
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Cli {
    /// Data root; runs land in <root>/<gpu>/<volume>_eval_<grade>_<variant>/
    #[arg(default_value = "sample_data")]
    root: PathBuf,

    #[arg(long, default_value = "sample_gpu")]
    gpu: String,

    #[arg(long, default_value = "bonsai")]
    volume: String,

    #[arg(long, default_value = "1")]
    grade: String,

    /// Write eval.parquet instead of eval.csv; render it with
    /// `evalplot suite --input-name eval.parquet`
    #[arg(long)]
    parquet: bool,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const COLUMNS: [&str; 6] = [
    "Isovalue",
    "StepSizeLarge",
    "StepSizeSmall",
    "StepSizeRange",
    "FramesPerSecond",
    "TimePerFrame (ms)",
];

const ISOVALUES: [f64; 6] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
const STEP_LARGE: [f64; 4] = [1.0, 2.0, 4.0, 8.0];
const STEP_SMALL: [f64; 2] = [0.25, 0.5];
const REPEATS: usize = 3;

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

/// Empty-space skipping pays off more at high isovalues, where most of the
/// volume is transparent.
fn speedup(variant: &str, isovalue: f64) -> f64 {
    match variant {
        "ess_d1" => 1.0 + 0.8 * isovalue,
        "ess_d2" => 1.0 + 1.5 * isovalue,
        _ => 1.0,
    }
}

fn generate_runs(variant: &str, rng: &mut SimpleRng) -> Vec<[f64; 6]> {
    let mut rows = Vec::new();
    for &iso in &ISOVALUES {
        for &large in &STEP_LARGE {
            for &small in &STEP_SMALL {
                let base = 25.0 * large.sqrt() / (small * 4.0).sqrt() * speedup(variant, iso);
                for _ in 0..REPEATS {
                    let fps = rng.gauss(base, base * 0.03).max(1.0);
                    rows.push([iso, large, small, large - small, fps, 1000.0 / fps]);
                }
            }
        }
    }
    rows
}

fn write_csv(path: &Path, rows: &[[f64; 6]]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(row.iter().map(|v| format!("{v:.4}")))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[[f64; 6]]) -> Result<()> {
    let schema = Arc::new(Schema::new(
        COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = (0..COLUMNS.len())
        .map(|c| Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r[c]))) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let file = fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);

    let file_name = if cli.parquet { "eval.parquet" } else { SUITE_FILE };
    for (variant, label, _) in SUITE_VARIANTS {
        let path = suite_input(&cli.root, &cli.gpu, &cli.volume, &cli.grade, variant, file_name);
        let dir = path.parent().context("run directory")?;
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        let rows = generate_runs(variant, &mut rng);
        if cli.parquet {
            write_parquet(&path, &rows)
        } else {
            write_csv(&path, &rows)
        }
        .with_context(|| format!("writing {}", path.display()))?;

        log::info!("{label}: {} runs", rows.len());
        println!("Wrote {} runs to {}", rows.len(), path.display());
    }
    Ok(())
}
