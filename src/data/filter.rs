use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::model::{Column, ColumnKind, Dataset, Value};
use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// Row filter: which values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
pub type RowFilter = BTreeMap<String, BTreeSet<Value>>;

/// Return indices of rows that pass all filters.
///
/// A row passes a column filter when its value for that column is in the
/// selected set. An empty selection therefore rejects every row.
pub fn filtered_indices(dataset: &Dataset, filters: &RowFilter) -> Result<Vec<usize>, SchemaError> {
    let columns: Vec<(&Column, &BTreeSet<Value>)> = filters
        .iter()
        .map(|(name, selected)| Ok((dataset.require(name, "filter")?, selected)))
        .collect::<Result<_, SchemaError>>()?;

    Ok((0..dataset.len())
        .filter(|&row| {
            columns
                .iter()
                .all(|(col, selected)| selected.contains(&col.get(row)))
        })
        .collect())
}

/// Parse a `Column=v1,v2` expression against the dataset's column kinds and
/// merge it into `filters`.
pub fn parse_filter(
    dataset: &Dataset,
    expr: &str,
    filters: &mut RowFilter,
) -> anyhow::Result<()> {
    let (name, raw_values) = expr
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("filter '{expr}' is not of the form Column=value[,value]"))?;
    let name = name.trim();
    let column = dataset.require(name, "filter")?;

    let selected = filters.entry(name.to_string()).or_default();
    for raw in raw_values.split(',') {
        let raw = raw.trim();
        let value = match column.kind() {
            ColumnKind::Numeric => Value::Numeric(raw.parse::<f64>().map_err(|_| {
                anyhow::anyhow!("filter on numeric column '{name}': '{raw}' is not a number")
            })?),
            ColumnKind::Categorical => Value::Categorical(raw.to_string()),
        };
        selected.insert(value);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Partitioning: group row indices by the values of one or more columns
// ---------------------------------------------------------------------------

/// Rows sharing one value tuple on the partitioning columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub key: Vec<Value>,
    pub rows: Vec<usize>,
}

/// Split the dataset's rows by equality on the full tuple of `columns`.
///
/// Partitions come back in first-seen order; row indices within a partition
/// keep the dataset order.
pub fn partition(
    dataset: &Dataset,
    columns: &[&str],
    operation: &str,
) -> Result<Vec<Partition>, SchemaError> {
    let cols: Vec<&Column> = columns
        .iter()
        .map(|name| dataset.require(name, operation))
        .collect::<Result<_, _>>()?;

    let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut partitions: Vec<Partition> = Vec::new();

    for row in 0..dataset.len() {
        let key: Vec<Value> = cols.iter().map(|c| c.get(row)).collect();
        match index.get(&key) {
            Some(&slot) => partitions[slot].rows.push(row),
            None => {
                index.insert(key.clone(), partitions.len());
                partitions.push(Partition {
                    key,
                    rows: vec![row],
                });
            }
        }
    }

    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::numeric("StepSizeLarge", vec![2.0, 1.0, 2.0, 1.0]),
            Column::numeric("Isovalue", vec![0.1, 0.1, 0.2, 0.1]),
            Column::categorical(
                "Variant",
                vec!["iso".into(), "ess".into(), "iso".into(), "iso".into()],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn partition_keeps_first_seen_order() {
        let parts = partition(&sample(), &["StepSizeLarge"], "test").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].key, vec![Value::from(2.0)]);
        assert_eq!(parts[0].rows, vec![0, 2]);
        assert_eq!(parts[1].key, vec![Value::from(1.0)]);
        assert_eq!(parts[1].rows, vec![1, 3]);
    }

    #[test]
    fn partition_on_tuple() {
        let parts = partition(&sample(), &["StepSizeLarge", "Isovalue"], "test").unwrap();
        let keys: Vec<_> = parts.iter().map(|p| p.key.clone()).collect();
        assert_eq!(
            keys,
            vec![
                vec![Value::from(2.0), Value::from(0.1)],
                vec![Value::from(1.0), Value::from(0.1)],
                vec![Value::from(2.0), Value::from(0.2)],
            ]
        );
        assert_eq!(parts[1].rows, vec![1, 3]);
    }

    #[test]
    fn partition_reports_missing_column() {
        let err = partition(&sample(), &["Nope"], "faceted").unwrap_err();
        assert_eq!(err.column, "Nope");
        assert_eq!(err.operation, "faceted");
    }

    #[test]
    fn filter_by_parsed_expressions() {
        let ds = sample();
        let mut filters = RowFilter::new();
        parse_filter(&ds, "StepSizeLarge=2", &mut filters).unwrap();
        parse_filter(&ds, "Variant=iso", &mut filters).unwrap();
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![0, 2]);
    }

    #[test]
    fn filter_with_multiple_values() {
        let ds = sample();
        let mut filters = RowFilter::new();
        parse_filter(&ds, "Isovalue=0.1, 0.2", &mut filters).unwrap();
        assert_eq!(filtered_indices(&ds, &filters).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_selection_rejects_everything() {
        let ds = sample();
        let mut filters = RowFilter::new();
        filters.insert("Variant".into(), BTreeSet::new());
        assert!(filtered_indices(&ds, &filters).unwrap().is_empty());
    }

    #[test]
    fn parse_filter_rejects_bad_input() {
        let ds = sample();
        let mut filters = RowFilter::new();
        assert!(parse_filter(&ds, "Isovalue", &mut filters).is_err());
        assert!(parse_filter(&ds, "Isovalue=abc", &mut filters).is_err());
        assert!(parse_filter(&ds, "Missing=1", &mut filters).is_err());
    }
}
