//! Job orchestration: load inputs, apply row filters, run the strategy and
//! write the artifact.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::config::{BatchConfig, InputSpec, PlotJob};
use crate::data::filter::{filtered_indices, parse_filter, RowFilter};
use crate::data::loader::load_file;
use crate::data::Dataset;
use crate::plot::{
    Artifact, Comparison, Heatmap, LabeledDataset, PlotKind, PlotRequest, Scatter3d,
};
use crate::render::RenderConfig;

// ---------------------------------------------------------------------------
// Input cache
// ---------------------------------------------------------------------------

/// Datasets keyed by path, so a file used by several jobs is read once.
#[derive(Debug, Default)]
pub struct DatasetCache {
    loaded: HashMap<PathBuf, Dataset>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, path: &Path) -> Result<&Dataset> {
        if !self.loaded.contains_key(path) {
            let dataset = load_file(path)?;
            self.loaded.insert(path.to_path_buf(), dataset);
        }
        self.loaded
            .get(path)
            .with_context(|| format!("{} missing from cache", path.display()))
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

/// Apply `Column=v1,v2` expressions to `dataset`.
pub fn apply_filters(dataset: &Dataset, exprs: &[String]) -> Result<Dataset> {
    if exprs.is_empty() {
        return Ok(dataset.clone());
    }
    let mut filter = RowFilter::new();
    for expr in exprs {
        parse_filter(dataset, expr, &mut filter)?;
    }
    let rows = filtered_indices(dataset, &filter)?;
    log::debug!("filters {:?} keep {} of {} rows", exprs, rows.len(), dataset.len());
    Ok(dataset.take(&rows))
}

// ---------------------------------------------------------------------------
// Running jobs
// ---------------------------------------------------------------------------

pub fn run_job(job: &PlotJob, cache: &mut DatasetCache, config: &RenderConfig) -> Result<Artifact> {
    let mut prepared = Vec::with_capacity(job.inputs.len());
    for input in &job.inputs {
        let dataset = apply_filters(cache.get(&input.path)?, &job.filters)
            .with_context(|| format!("filtering {}", input.path.display()))?;
        prepared.push((input.label(), dataset));
    }

    let request = PlotRequest {
        title: job.title.clone(),
        kind: job.kind.clone(),
        datasets: prepared
            .iter()
            .map(|(label, ds)| LabeledDataset::new(label, ds))
            .collect(),
        output: job.output.clone(),
    };
    request
        .render(config)
        .with_context(|| format!("rendering {}", job.output.display()))
}

/// Reject job lists where two jobs would write the same file.
pub fn check_outputs(jobs: &[PlotJob]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for job in jobs {
        if !seen.insert(&job.output) {
            bail!(
                "output {} is written by more than one plot",
                job.output.display()
            );
        }
    }
    Ok(())
}

/// Render every job in order. Stops at the first failure.
pub fn run_batch(config: &BatchConfig) -> Result<Vec<Artifact>> {
    check_outputs(&config.plots)?;
    let mut cache = DatasetCache::new();
    let artifacts = config
        .plots
        .iter()
        .map(|job| run_job(job, &mut cache, &config.render))
        .collect::<Result<Vec<_>>>()?;
    log::info!(
        "rendered {} plots from {} input files",
        artifacts.len(),
        cache.len()
    );
    Ok(artifacts)
}

// ---------------------------------------------------------------------------
// Benchmark suite
// ---------------------------------------------------------------------------

/// Acceleration variants of one evaluation run: directory suffix, legend
/// label and file-name tag.
pub const SUITE_VARIANTS: [(&str, &str, &str); 3] = [
    ("iso", "baseline", "baseline"),
    ("ess_d1", "octree depth 1", "octree_d1"),
    ("ess_d2", "octree depth 2", "octree_d2"),
];

/// Results file each variant directory holds unless told otherwise.
pub const SUITE_FILE: &str = "eval.csv";

/// Location of one variant's results under a data root. `file_name` picks
/// the table inside the run directory; its extension selects the loader.
pub fn suite_input(
    root: &Path,
    gpu: &str,
    volume: &str,
    grade: &str,
    variant: &str,
    file_name: &str,
) -> PathBuf {
    root.join(gpu)
        .join(format!("{volume}_eval_{grade}_{variant}"))
        .join(file_name)
}

/// The standard evaluation set for one GPU / volume / grade: a 3D scatter
/// and a heatmap per variant, plus one comparison across variants.
pub fn suite_jobs(
    root: &Path,
    gpu: &str,
    volume: &str,
    grade: &str,
    file_name: &str,
    out_dir: &Path,
) -> Vec<PlotJob> {
    let inputs: Vec<(InputSpec, &str)> = SUITE_VARIANTS
        .iter()
        .map(|&(variant, label, tag)| {
            let path = suite_input(root, gpu, volume, grade, variant, file_name);
            (InputSpec::new(path, label), tag)
        })
        .collect();
    let output = |name: String| out_dir.join(format!("{gpu}_{volume}_{name}.png"));

    let mut jobs = Vec::new();
    for (input, tag) in &inputs {
        jobs.push(PlotJob {
            title: format!("{volume} ({}), {gpu}", input.label()),
            kind: PlotKind::Scatter3d(Scatter3d {
                x: "Isovalue".into(),
                y: "StepSizeLarge".into(),
                z: "FramesPerSecond".into(),
                color: "StepSizeLarge".into(),
            }),
            inputs: vec![input.clone()],
            output: output(format!("cubic_{tag}")),
            filters: Vec::new(),
        });
    }
    for (input, tag) in &inputs {
        jobs.push(PlotJob {
            title: format!("{volume} ({}), {gpu}", input.label()),
            kind: PlotKind::Heatmap(Heatmap {
                row: "StepSizeLarge".into(),
                col: "Isovalue".into(),
                metric: "FramesPerSecond".into(),
            }),
            inputs: vec![input.clone()],
            output: output(format!("heatmap_{tag}")),
            filters: Vec::new(),
        });
    }
    jobs.push(PlotJob {
        title: format!("{volume}, {gpu}"),
        kind: PlotKind::Comparison(Comparison {
            x: "Isovalue".into(),
            y: "FramesPerSecond".into(),
            aggregate: true,
        }),
        inputs: inputs.into_iter().map(|(input, _)| input).collect(),
        output: output("compare".to_string()),
        filters: Vec::new(),
    });
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, Value};

    #[test]
    fn suite_covers_every_variant() {
        let jobs = suite_jobs(
            Path::new("data"),
            "rtx",
            "bonsai",
            "1",
            SUITE_FILE,
            Path::new("out"),
        );
        let outputs: Vec<String> = jobs
            .iter()
            .map(|j| j.output.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            outputs,
            vec![
                "rtx_bonsai_cubic_baseline.png",
                "rtx_bonsai_cubic_octree_d1.png",
                "rtx_bonsai_cubic_octree_d2.png",
                "rtx_bonsai_heatmap_baseline.png",
                "rtx_bonsai_heatmap_octree_d1.png",
                "rtx_bonsai_heatmap_octree_d2.png",
                "rtx_bonsai_compare.png",
            ]
        );

        let compare = jobs.last().unwrap();
        let labels: Vec<String> = compare.inputs.iter().map(InputSpec::label).collect();
        assert_eq!(labels, vec!["baseline", "octree depth 1", "octree depth 2"]);
        assert_eq!(
            compare.inputs[1].path,
            PathBuf::from("data/rtx/bonsai_eval_1_ess_d1/eval.csv")
        );
        check_outputs(&jobs).unwrap();
    }

    #[test]
    fn suite_reads_the_named_results_file() {
        let jobs = suite_jobs(
            Path::new("data"),
            "rtx",
            "bonsai",
            "1",
            "eval.parquet",
            Path::new("out"),
        );
        assert!(jobs
            .iter()
            .flat_map(|j| &j.inputs)
            .all(|input| input.path.file_name() == Some("eval.parquet".as_ref())));
        assert_eq!(
            jobs[0].inputs[0].path,
            PathBuf::from("data/rtx/bonsai_eval_1_iso/eval.parquet")
        );
    }

    #[test]
    fn duplicate_outputs_are_rejected() {
        let mut jobs = suite_jobs(Path::new("d"), "g", "v", "1", SUITE_FILE, Path::new("o"));
        jobs[1].output = jobs[0].output.clone();
        let err = check_outputs(&jobs).unwrap_err();
        assert!(err.to_string().contains("more than one plot"));
    }

    #[test]
    fn filters_narrow_the_dataset() {
        let ds = Dataset::new(vec![
            Column::numeric("StepSizeSmall", vec![0.1, 0.2, 0.1]),
            Column::numeric("FramesPerSecond", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let kept = apply_filters(&ds, &["StepSizeSmall=0.1".to_string()]).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.row(1)[1], Value::from(3.0));

        assert_eq!(apply_filters(&ds, &[]).unwrap(), ds);
        assert!(apply_filters(&ds, &["Missing=1".to_string()]).is_err());
    }
}
