use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use evalplot::config::{BatchConfig, InputSpec, PlotJob};
use evalplot::pipeline::{self, DatasetCache};
use evalplot::{
    AggregatedLine, Artifact, Comparison, Faceted, Heatmap, PlotKind, RenderConfig, Scatter,
    Scatter3d,
};

#[derive(Parser)]
#[command(name = "evalplot")]
#[command(about = "Plots for volume-rendering benchmark runs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Output and filtering options shared by every single-plot command.
#[derive(Args)]
struct OutputArgs {
    /// Output file (.png or .svg)
    #[arg(long, short)]
    output: PathBuf,

    /// Figure title; defaults to the output file name
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Keep only rows where Column is one of the values (Column=v1,v2)
    #[arg(long = "where", value_name = "FILTER")]
    filters: Vec<String>,
}

impl OutputArgs {
    fn render_config(&self) -> RenderConfig {
        let defaults = RenderConfig::default();
        RenderConfig {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            ..defaults
        }
    }

    fn title(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            self.output
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }
}

#[derive(Args)]
struct SingleInput {
    /// Benchmark table (.csv, .json or .parquet)
    #[arg(long, short)]
    input: PathBuf,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// One marker per run
    Scatter {
        #[command(flatten)]
        io: SingleInput,
        #[arg(long, default_value = "Isovalue")]
        x: String,
        #[arg(long, default_value = "FramesPerSecond")]
        y: String,
    },

    /// Mean of y per distinct x
    Line {
        #[command(flatten)]
        io: SingleInput,
        #[arg(long, default_value = "Isovalue")]
        x: String,
        #[arg(long, default_value = "FramesPerSecond")]
        y: String,
    },

    /// Mean metric per (row, col) cell
    Heatmap {
        #[command(flatten)]
        io: SingleInput,
        #[arg(long, default_value = "StepSizeLarge")]
        row: String,
        #[arg(long, default_value = "Isovalue")]
        col: String,
        #[arg(long, default_value = "FramesPerSecond")]
        metric: String,
    },

    /// One line per input file on shared axes
    Compare {
        /// Benchmark table; repeat once per series
        #[arg(long = "input", short, required = true)]
        inputs: Vec<PathBuf>,

        /// Legend label, paired with --input in order
        #[arg(long = "label")]
        labels: Vec<String>,

        #[arg(long, default_value = "Isovalue")]
        x: String,
        #[arg(long, default_value = "FramesPerSecond")]
        y: String,

        /// Draw raw rows instead of per-x means
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Stacked panels, one per facet value
    Facet {
        #[command(flatten)]
        io: SingleInput,
        #[arg(long, default_value = "StepSizeLarge")]
        facet: String,
        #[arg(long, default_value = "StepSizeSmall")]
        series: String,
        #[arg(long, default_value = "Isovalue")]
        x: String,
        #[arg(long, default_value = "FramesPerSecond")]
        y: String,
    },

    /// 3D scatter colored by a fourth column
    Cubic {
        #[command(flatten)]
        io: SingleInput,
        #[arg(long, default_value = "Isovalue")]
        x: String,
        #[arg(long, default_value = "StepSizeLarge")]
        y: String,
        #[arg(long, default_value = "FramesPerSecond")]
        z: String,
        #[arg(long, default_value = "StepSizeLarge")]
        color: String,
    },

    /// Render every plot listed in a JSON configuration file
    Batch {
        config: PathBuf,
    },

    /// Standard evaluation plots for one GPU / volume / grade
    Suite {
        /// Directory holding one sub-directory per GPU
        #[arg(long)]
        root: PathBuf,
        #[arg(long)]
        gpu: String,
        #[arg(long)]
        volume: String,
        #[arg(long)]
        grade: String,
        /// Results file inside each variant directory (eval.parquet for
        /// data written by `generate_sample --parquet`)
        #[arg(long, default_value = pipeline::SUITE_FILE)]
        input_name: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn single(io: SingleInput, kind: PlotKind) -> Result<Artifact> {
    let job = PlotJob {
        title: io.out.title(),
        kind,
        inputs: vec![InputSpec {
            path: io.input,
            label: None,
        }],
        output: io.out.output.clone(),
        filters: io.out.filters.clone(),
    };
    pipeline::run_job(&job, &mut DatasetCache::new(), &io.out.render_config())
}

fn run(command: Commands) -> Result<Vec<Artifact>> {
    let artifact = match command {
        Commands::Scatter { io, x, y } => single(io, PlotKind::Scatter(Scatter { x, y }))?,
        Commands::Line { io, x, y } => {
            single(io, PlotKind::AggregatedLine(AggregatedLine { x, y }))?
        }
        Commands::Heatmap { io, row, col, metric } => {
            single(io, PlotKind::Heatmap(Heatmap { row, col, metric }))?
        }
        Commands::Facet { io, facet, series, x, y } => single(
            io,
            PlotKind::Faceted(Faceted {
                facet,
                series,
                x,
                y,
            }),
        )?,
        Commands::Cubic { io, x, y, z, color } => {
            single(io, PlotKind::Scatter3d(Scatter3d { x, y, z, color }))?
        }
        Commands::Compare {
            inputs,
            labels,
            x,
            y,
            raw,
            out,
        } => {
            if !labels.is_empty() && labels.len() != inputs.len() {
                bail!(
                    "got {} --label values for {} --input files",
                    labels.len(),
                    inputs.len()
                );
            }
            let mut labels = labels.into_iter();
            let job = PlotJob {
                title: out.title(),
                kind: PlotKind::Comparison(Comparison {
                    x,
                    y,
                    aggregate: !raw,
                }),
                inputs: inputs
                    .into_iter()
                    .map(|path| InputSpec {
                        path,
                        label: labels.next(),
                    })
                    .collect(),
                output: out.output.clone(),
                filters: out.filters.clone(),
            };
            pipeline::run_job(&job, &mut DatasetCache::new(), &out.render_config())?
        }
        Commands::Batch { config } => {
            return pipeline::run_batch(&BatchConfig::load(&config)?);
        }
        Commands::Suite {
            root,
            gpu,
            volume,
            grade,
            input_name,
            out_dir,
        } => {
            let config = BatchConfig {
                render: RenderConfig::default(),
                plots: pipeline::suite_jobs(&root, &gpu, &volume, &grade, &input_name, &out_dir),
            };
            return pipeline::run_batch(&config);
        }
    };
    Ok(vec![artifact])
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    for artifact in run(cli.command)? {
        let warnings = artifact.warnings().len();
        if warnings > 0 {
            println!("{} ({warnings} warnings)", artifact.path.display());
        } else {
            println!("{}", artifact.path.display());
        }
    }
    Ok(())
}
