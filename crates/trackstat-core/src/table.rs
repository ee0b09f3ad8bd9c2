//! Column-oriented in-memory table
//!
//! Every column has the same number of rows. Missing cells are `None`.

use crate::errors::{StatsError, StatsResult};

/// Categorical column: ordered levels plus one level index per row
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalColumn {
    /// Declared level order; the first level is the reference category
    pub levels: Vec<String>,
    /// Index into `levels` for each row
    pub codes: Vec<Option<usize>>,
}

impl CategoricalColumn {
    /// Label of row `i`, if present
    pub fn label(&self, i: usize) -> Option<&str> {
        self.codes[i].map(|c| self.levels[c].as_str())
    }
}

/// A single table column
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Categorical(CategoricalColumn),
}

/// A single cell, as returned by [`Table::row`]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Number(f64),
    Text(String),
}

/// Hashable identity of a cell, used for grouping
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Missing,
    Number(u64),
    Text(String),
    Level(usize),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Categorical(c) => c.codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Column::Numeric(_) => "numeric",
            Column::Text(_) => "text",
            Column::Categorical(_) => "categorical",
        }
    }

    /// Whether row `i` holds a usable value (present, and finite for numbers)
    pub fn is_present(&self, i: usize) -> bool {
        match self {
            Column::Numeric(v) => v[i].is_some_and(f64::is_finite),
            Column::Text(v) => v[i].is_some(),
            Column::Categorical(c) => c.codes[i].is_some(),
        }
    }

    pub fn value(&self, i: usize) -> Value {
        match self {
            Column::Numeric(v) => v[i].map_or(Value::Missing, Value::Number),
            Column::Text(v) => v[i].clone().map_or(Value::Missing, Value::Text),
            Column::Categorical(c) => c
                .label(i)
                .map_or(Value::Missing, |l| Value::Text(l.to_string())),
        }
    }

    pub fn key_part(&self, i: usize) -> KeyPart {
        match self {
            Column::Numeric(v) => match v[i] {
                // -0.0 and 0.0 group together
                Some(x) if x == 0.0 => KeyPart::Number(0.0f64.to_bits()),
                Some(x) => KeyPart::Number(x.to_bits()),
                None => KeyPart::Missing,
            },
            Column::Text(v) => v[i].clone().map_or(KeyPart::Missing, KeyPart::Text),
            Column::Categorical(c) => c.codes[i].map_or(KeyPart::Missing, KeyPart::Level),
        }
    }

    /// New column holding the given rows, in the given order
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&i| v[i].clone()).collect()),
            Column::Categorical(c) => Column::Categorical(CategoricalColumn {
                levels: c.levels.clone(),
                codes: rows.iter().map(|&i| c.codes[i]).collect(),
            }),
        }
    }
}

/// Ordered collection of equally long, uniquely named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Table::push_column`]
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> StatsResult<Self> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Append a column. Fails on a duplicate name or a row-count mismatch.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> StatsResult<()> {
        let name = name.into();
        if self.index_of(&name).is_some() {
            return Err(StatsError::DuplicateColumn(name));
        }
        self.check_length(&name, &column)?;
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Replace the column named `name` in place, or append it if absent
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> StatsResult<()> {
        let name = name.into();
        match self.index_of(&name) {
            Some(idx) => {
                let expected = self
                    .columns
                    .iter()
                    .enumerate()
                    .find(|(i, _)| *i != idx)
                    .map(|(_, c)| c.len());
                if let Some(expected) = expected.filter(|&e| e != column.len()) {
                    return Err(StatsError::LengthMismatch {
                        column: name,
                        expected,
                        actual: column.len(),
                    });
                }
                self.columns[idx] = column;
                Ok(())
            }
            None => self.push_column(name, column),
        }
    }

    /// Rename and replace column `from` in place
    pub fn replace_column(
        &mut self,
        from: &str,
        to: impl Into<String>,
        column: Column,
    ) -> StatsResult<()> {
        let to = to.into();
        let idx = self.index_of(from).ok_or_else(|| StatsError::SchemaMismatch {
            missing: vec![from.to_string()],
        })?;
        if to != from && self.index_of(&to).is_some() {
            return Err(StatsError::DuplicateColumn(to));
        }
        self.check_length(&to, &column)?;
        self.names[idx] = to;
        self.columns[idx] = column;
        Ok(())
    }

    fn check_length(&self, name: &str, column: &Column) -> StatsResult<()> {
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(StatsError::LengthMismatch {
                    column: name.to_string(),
                    expected: first.len(),
                    actual: column.len(),
                });
            }
        }
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index_of(name).map(|i| &self.columns[i])
    }

    /// Column lookup that reports the missing name as a schema mismatch
    pub fn require(&self, name: &str) -> StatsResult<&Column> {
        self.column(name).ok_or_else(|| StatsError::SchemaMismatch {
            missing: vec![name.to_string()],
        })
    }

    /// Numeric values of `name`; fails if the column is absent or not numeric
    pub fn numeric(&self, name: &str) -> StatsResult<&[Option<f64>]> {
        match self.require(name)? {
            Column::Numeric(v) => Ok(v),
            other => Err(StatsError::InvalidValue {
                field: "column",
                message: format!("'{}' is {}, expected numeric", name, other.kind()),
            }),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn row(&self, i: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.value(i)).collect()
    }

    /// New table holding the given rows, in the given order
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
        }
    }

    /// Keep the rows for which `keep(row_index)` is true
    pub fn filter_rows(&self, mut keep: impl FnMut(usize) -> bool) -> Table {
        let rows: Vec<usize> = (0..self.n_rows()).filter(|&i| keep(i)).collect();
        self.take_rows(&rows)
    }

    /// Remove the named columns. Every name must exist.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> StatsResult<Table> {
        let missing: Vec<String> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|n| self.index_of(n).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(StatsError::SchemaMismatch { missing });
        }

        let mut out = Table::new();
        for (name, column) in self.columns() {
            if !names.iter().any(|n| n.as_ref() == name) {
                out.names.push(name.to_string());
                out.columns.push(column.clone());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new()
            .with_column(
                "artist",
                Column::Text(vec![Some("a".into()), None, Some("c".into())]),
            )
            .unwrap()
            .with_column("score", Column::Numeric(vec![Some(1.0), Some(2.0), None]))
            .unwrap()
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = sample().with_column("short", Column::Numeric(vec![Some(1.0)]));
        assert!(matches!(result, Err(StatsError::LengthMismatch { .. })));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = sample().with_column("score", Column::Numeric(vec![None, None, None]));
        assert!(matches!(result, Err(StatsError::DuplicateColumn(_))));
    }

    #[test]
    fn test_take_rows_reorders() {
        let t = sample().take_rows(&[2, 0]);
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.row(0), vec![Value::Text("c".into()), Value::Missing]);
        assert_eq!(t.row(1), vec![Value::Text("a".into()), Value::Number(1.0)]);
    }

    #[test]
    fn test_drop_unknown_column() {
        let result = sample().drop_columns(&["nope"]);
        match result {
            Err(StatsError::SchemaMismatch { missing }) => assert_eq!(missing, vec!["nope"]),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_negative_zero_groups_with_zero() {
        let col = Column::Numeric(vec![Some(0.0), Some(-0.0)]);
        assert_eq!(col.key_part(0), col.key_part(1));
    }
}
