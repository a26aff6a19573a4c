//! Batch configuration: a JSON file listing plots to render in one run.
//!
//! ```json
//! {
//!   "render": { "width": 1600, "height": 900 },
//!   "plots": [
//!     {
//!       "title": "Bonsai, baseline",
//!       "kind": "heatmap", "row": "StepSizeLarge", "col": "Isovalue",
//!       "inputs": [{ "path": "gpu/bonsai_eval_1_iso/eval.csv", "label": "baseline" }],
//!       "output": "out/bonsai_heatmap_baseline.png",
//!       "where": ["StepSizeSmall=0.1"]
//!     }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::plot::PlotKind;
use crate::render::RenderConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub render: RenderConfig,
    pub plots: Vec<PlotJob>,
}

/// One artifact: which strategy, over which files, written where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotJob {
    pub title: String,
    #[serde(flatten)]
    pub kind: PlotKind,
    pub inputs: Vec<InputSpec>,
    pub output: PathBuf,
    /// `Column=v1,v2` row filters applied to every input.
    #[serde(default, rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub path: PathBuf,
    /// Legend label; the file stem when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl InputSpec {
    pub fn new(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        InputSpec {
            path: path.into(),
            label: Some(label.into()),
        }
    }

    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }
}

impl BatchConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing batch configuration")
    }

    /// Read a configuration file. Relative input and output paths are
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut config =
            Self::from_json(&text).with_context(|| format!("in {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for job in &mut self.plots {
            resolve(&mut job.output);
            for input in &mut job.inputs {
                resolve(&mut input.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{Comparison, Heatmap};

    #[test]
    fn parses_jobs_with_flattened_kind() {
        let config = BatchConfig::from_json(
            r#"{
                "plots": [
                    {
                        "title": "Bonsai",
                        "kind": "heatmap", "row": "StepSizeLarge", "col": "Isovalue",
                        "inputs": [{"path": "a/eval.csv", "label": "baseline"}],
                        "output": "out/heat.png",
                        "where": ["StepSizeSmall=0.1"]
                    },
                    {
                        "title": "Bonsai",
                        "kind": "comparison", "x": "Isovalue", "y": "FramesPerSecond",
                        "inputs": [{"path": "a/eval.csv"}, {"path": "b/eval.csv"}],
                        "output": "out/cmp.svg"
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.render, RenderConfig::default());
        assert_eq!(config.plots.len(), 2);
        assert_eq!(
            config.plots[0].kind,
            PlotKind::Heatmap(Heatmap {
                row: "StepSizeLarge".into(),
                col: "Isovalue".into(),
                metric: "FramesPerSecond".into(),
            })
        );
        assert_eq!(config.plots[0].filters, vec!["StepSizeSmall=0.1"]);
        assert_eq!(
            config.plots[1].kind,
            PlotKind::Comparison(Comparison {
                x: "Isovalue".into(),
                y: "FramesPerSecond".into(),
                aggregate: true,
            })
        );
        assert!(config.plots[1].filters.is_empty());
        assert_eq!(config.plots[1].inputs[1].label(), "eval");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = BatchConfig::from_json(
            r#"{"plots": [{"title": "t", "kind": "pie", "inputs": [], "output": "a.png"}]}"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("pie"));
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let mut config = BatchConfig {
            render: RenderConfig::default(),
            plots: vec![PlotJob {
                title: "t".into(),
                kind: PlotKind::Scatter(crate::plot::Scatter {
                    x: "Isovalue".into(),
                    y: "FramesPerSecond".into(),
                }),
                inputs: vec![InputSpec::new("eval.csv", "a"), InputSpec::new("/abs/eval.csv", "b")],
                output: PathBuf::from("out/a.png"),
                filters: Vec::new(),
            }],
        };
        config.resolve_relative_to(Path::new("runs"));
        let job = &config.plots[0];
        assert_eq!(job.output, PathBuf::from("runs/out/a.png"));
        assert_eq!(job.inputs[0].path, PathBuf::from("runs/eval.csv"));
        assert_eq!(job.inputs[1].path, PathBuf::from("/abs/eval.csv"));
    }
}
