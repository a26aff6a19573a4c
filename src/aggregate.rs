//! Group-and-reduce over a [`Dataset`].
//!
//! ```text
//!   Dataset ──partition by group columns──▶ [rows per key] ──reduce metric──▶ AggregatedTable
//! ```
//!
//! Aggregation never looks across datasets: comparison plots call
//! [`aggregate`] once per input and line the series up by x value only.

use serde::{Deserialize, Serialize};

use crate::data::filter::partition;
use crate::data::{Dataset, Value};
use crate::error::{PlotError, Result};

/// How the metric values of one group collapse into a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// Sum divided by count. NaN inputs propagate into a NaN mean.
    #[default]
    Mean,
}

impl Reduction {
    pub fn reduce(self, values: impl IntoIterator<Item = f64>) -> f64 {
        match self {
            Reduction::Mean => {
                let (sum, count) = values
                    .into_iter()
                    .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                sum / count as f64
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Reduction::Mean => "Mean",
        }
    }
}

/// One group of the aggregated output.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub key: Vec<Value>,
    pub value: f64,
    /// Number of input rows in the group.
    pub count: usize,
}

/// Result of [`aggregate`]: unique keys, sorted ascending by key tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTable {
    pub group_columns: Vec<String>,
    pub metric_column: String,
    pub reduction: Reduction,
    pub rows: Vec<AggregatedRow>,
}

impl AggregatedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &[Value]) -> Option<f64> {
        self.rows
            .binary_search_by(|row| row.key.as_slice().cmp(key))
            .ok()
            .map(|i| self.rows[i].value)
    }
}

/// Partition `dataset` on `group_columns` and reduce `metric_column` per group.
///
/// Fails with a schema error when a column is missing or the metric is not
/// numeric. An empty dataset yields an empty table.
pub fn aggregate(
    dataset: &Dataset,
    group_columns: &[&str],
    metric_column: &str,
    reduction: Reduction,
) -> Result<AggregatedTable> {
    const OP: &str = "aggregate";

    if group_columns.is_empty() {
        return Err(PlotError::invalid(OP, "at least one group column is required"));
    }
    for name in group_columns {
        dataset.require(name, OP)?;
    }
    let metric = dataset.require_numeric(metric_column, OP)?;

    let mut rows: Vec<AggregatedRow> = partition(dataset, group_columns, OP)?
        .into_iter()
        .map(|p| AggregatedRow {
            value: reduction.reduce(p.rows.iter().map(|&i| metric[i])),
            count: p.rows.len(),
            key: p.key,
        })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    log::debug!(
        "aggregated {} rows into {} groups by {:?} ({} of {})",
        dataset.len(),
        rows.len(),
        group_columns,
        reduction.label(),
        metric_column
    );

    Ok(AggregatedTable {
        group_columns: group_columns.iter().map(|s| s.to_string()).collect(),
        metric_column: metric_column.to_string(),
        reduction,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::error::SchemaErrorKind;
    use proptest::prelude::*;

    fn runs(iso: Vec<f64>, fps: Vec<f64>) -> Dataset {
        Dataset::new(vec![
            Column::numeric("Isovalue", iso),
            Column::numeric("FramesPerSecond", fps),
        ])
        .unwrap()
    }

    #[test]
    fn mean_by_isovalue_in_ascending_order() {
        let ds = runs(vec![0.2, 0.1, 0.1], vec![50.0, 30.0, 40.0]);
        let table = aggregate(&ds, &["Isovalue"], "FramesPerSecond", Reduction::Mean).unwrap();

        let pairs: Vec<(Value, f64)> = table
            .rows
            .iter()
            .map(|r| (r.key[0].clone(), r.value))
            .collect();
        assert_eq!(
            pairs,
            vec![(Value::from(0.1), 35.0), (Value::from(0.2), 50.0)]
        );
        assert_eq!(table.rows[0].count, 2);
        assert_eq!(table.get(&[Value::from(0.2)]), Some(50.0));
        assert_eq!(table.get(&[Value::from(0.3)]), None);
    }

    #[test]
    fn nan_metric_propagates() {
        let ds = runs(vec![0.1, 0.1, 0.2], vec![f64::NAN, 10.0, 20.0]);
        let table = aggregate(&ds, &["Isovalue"], "FramesPerSecond", Reduction::Mean).unwrap();
        assert!(table.rows[0].value.is_nan());
        assert_eq!(table.rows[1].value, 20.0);
    }

    #[test]
    fn empty_dataset_gives_empty_table() {
        let ds = runs(vec![], vec![]);
        let table = aggregate(&ds, &["Isovalue"], "FramesPerSecond", Reduction::Mean).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn schema_errors() {
        let ds = Dataset::new(vec![
            Column::numeric("Isovalue", vec![0.1]),
            Column::categorical("Label", vec!["a".into()]),
        ])
        .unwrap();

        match aggregate(&ds, &["Isovalue"], "Label", Reduction::Mean) {
            Err(PlotError::Schema(e)) => {
                assert_eq!(e.kind, SchemaErrorKind::NotNumeric);
                assert_eq!(e.column, "Label");
            }
            other => panic!("unexpected {other:?}"),
        }

        match aggregate(&ds, &["StepSizeLarge"], "Isovalue", Reduction::Mean) {
            Err(PlotError::Schema(e)) => assert_eq!(e.kind, SchemaErrorKind::Missing),
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            aggregate(&ds, &[], "Isovalue", Reduction::Mean),
            Err(PlotError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn categorical_keys_sort_lexicographically() {
        let ds = Dataset::new(vec![
            Column::categorical("Variant", vec!["iso".into(), "ess_d2".into(), "ess_d1".into()]),
            Column::numeric("FramesPerSecond", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let table = aggregate(&ds, &["Variant"], "FramesPerSecond", Reduction::Mean).unwrap();
        let keys: Vec<String> = table.rows.iter().map(|r| r.key[0].to_string()).collect();
        assert_eq!(keys, vec!["ess_d1", "ess_d2", "iso"]);
    }

    proptest! {
        #[test]
        fn one_row_per_key_with_brute_force_mean(
            rows in prop::collection::vec((0u8..4, 0u8..3, -1000.0f64..1000.0), 0..60)
        ) {
            let ds = Dataset::new(vec![
                Column::numeric("a", rows.iter().map(|r| r.0 as f64).collect()),
                Column::numeric("b", rows.iter().map(|r| r.1 as f64).collect()),
                Column::numeric("m", rows.iter().map(|r| r.2).collect()),
            ]).unwrap();

            let table = aggregate(&ds, &["a", "b"], "m", Reduction::Mean).unwrap();

            let mut distinct: Vec<(u8, u8)> = rows.iter().map(|r| (r.0, r.1)).collect();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(table.len(), distinct.len());

            for (row, (a, b)) in table.rows.iter().zip(&distinct) {
                prop_assert_eq!(&row.key, &vec![Value::from(*a as f64), Value::from(*b as f64)]);
                let members: Vec<f64> = rows
                    .iter()
                    .filter(|r| r.0 == *a && r.1 == *b)
                    .map(|r| r.2)
                    .collect();
                let expected = members.iter().sum::<f64>() / members.len() as f64;
                prop_assert_eq!(row.count, members.len());
                prop_assert!((row.value - expected).abs() <= 1e-9 * expected.abs().max(1.0));
            }
        }
    }
}
