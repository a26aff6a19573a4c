use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{DatasetError, SchemaError};

// ---------------------------------------------------------------------------
// Value – a single cell of a benchmark table
// ---------------------------------------------------------------------------

/// A cell value. Columns are typed once at load time, so a column only ever
/// yields one of the two variants.
#[derive(Debug, Clone)]
pub enum Value {
    Numeric(f64),
    Categorical(String),
}

// -- Manual Eq/Ord so Value can be a grouping key in BTreeMap / HashMap --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        match (self, other) {
            // `==` first so that 0.0 and -0.0 land in the same group.
            (Numeric(a), Numeric(b)) if a == b => Ordering::Equal,
            (Numeric(a), Numeric(b)) => a.total_cmp(b),
            (Categorical(a), Categorical(b)) => a.cmp(b),
            (Numeric(_), Categorical(_)) => Ordering::Less,
            (Categorical(_), Numeric(_)) => Ordering::Greater,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Numeric(v) => {
                let v = if *v == 0.0 { 0.0 } else { *v };
                v.to_bits().hash(state)
            }
            Value::Categorical(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Numeric(v) => write!(f, "{v}"),
            Value::Categorical(s) => write!(f, "{s}"),
        }
    }
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric(v) => Some(*v),
            Value::Categorical(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Numeric(_))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Numeric(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Categorical(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Column – typed storage for one named column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<String>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }

    /// Build a column from raw text cells, deciding its kind once.
    ///
    /// The column is numeric when every non-empty cell parses as a float;
    /// empty cells then become NaN. Anything else keeps the text as-is.
    pub fn from_text(name: impl Into<String>, cells: Vec<String>) -> Self {
        let parsed: Option<Vec<f64>> = cells
            .iter()
            .map(|c| {
                let c = c.trim();
                if c.is_empty() {
                    Some(f64::NAN)
                } else {
                    c.parse::<f64>().ok()
                }
            })
            .collect();

        match parsed {
            Some(values) => Column::numeric(name, values),
            None => Column::categorical(name, cells),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        match self.data {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The numeric slice, if this is a numeric column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Categorical(_) => None,
        }
    }

    /// Value of row `i`. Panics when `i` is out of bounds, like slice indexing.
    pub fn get(&self, i: usize) -> Value {
        match &self.data {
            ColumnData::Numeric(v) => Value::Numeric(v[i]),
            ColumnData::Categorical(v) => Value::Categorical(v[i].clone()),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Sorted set of distinct values.
    pub fn unique_values(&self) -> BTreeSet<Value> {
        self.values().collect()
    }

    fn take(&self, indices: &[usize]) -> Column {
        let data = match &self.data {
            ColumnData::Numeric(v) => ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        };
        Column {
            name: self.name.clone(),
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// An immutable table of equally long, uniquely named columns in header order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.name()) {
                return Err(DatasetError::DuplicateColumn(col.name().to_string()));
            }
            if col.len() != n_rows {
                return Err(DatasetError::LengthMismatch {
                    column: col.name().to_string(),
                    expected: n_rows,
                    actual: col.len(),
                });
            }
        }
        Ok(Dataset { columns, n_rows })
    }

    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Look up a column that `operation` cannot do without.
    pub fn require(&self, name: &str, operation: &str) -> Result<&Column, SchemaError> {
        self.column(name)
            .ok_or_else(|| SchemaError::missing(name, operation))
    }

    /// Like [`Dataset::require`], additionally insisting on numeric values.
    pub fn require_numeric(&self, name: &str, operation: &str) -> Result<&[f64], SchemaError> {
        self.require(name, operation)?
            .as_numeric()
            .ok_or_else(|| SchemaError::not_numeric(name, operation))
    }

    /// All cells of row `i`, in column order.
    pub fn row(&self, i: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.get(i)).collect()
    }

    /// A new dataset holding only the given rows, in the given order.
    pub fn take(&self, indices: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            n_rows: indices.len(),
        }
    }
}
