//! Deduplicating cleaner
//!
//! Restores the one-row-per-track invariant of the raw dataset, where the same
//! recording appears once per album and playlist it belongs to.

use std::collections::HashSet;

use crate::errors::{StatsError, StatsResult};
use crate::table::{CategoricalColumn, Column, KeyPart, Table};

/// Album and playlist columns that vary between copies of the same track
pub const ALBUM_PLAYLIST_COLUMNS: &[&str] = &[
    "track_album_id",
    "track_album_name",
    "track_album_release_date",
    "playlist_name",
    "playlist_id",
    "playlist_genre",
    "playlist_subgenre",
];

const KEY_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Ordered mapping from integer codes to category labels
#[derive(Debug, Clone, PartialEq)]
pub struct RecodeScheme {
    pairs: Vec<(i64, String)>,
}

impl RecodeScheme {
    /// Build a scheme; the first pair is the reference category
    pub fn new<S: Into<String>>(pairs: impl IntoIterator<Item = (i64, S)>) -> StatsResult<Self> {
        let pairs: Vec<(i64, String)> = pairs.into_iter().map(|(v, l)| (v, l.into())).collect();
        if pairs.is_empty() {
            return Err(StatsError::EmptyInput {
                field: "recode scheme",
            });
        }
        for (i, (value, label)) in pairs.iter().enumerate() {
            if pairs[..i].iter().any(|(v, l)| v == value || l == label) {
                return Err(StatsError::InvalidValue {
                    field: "recode scheme",
                    message: format!("duplicate entry ({}, {})", value, label),
                });
            }
        }
        Ok(Self { pairs })
    }

    /// Musical mode: 0 = minor, 1 = major
    pub fn mode() -> Self {
        Self {
            pairs: vec![(0, "minor".into()), (1, "major".into())],
        }
    }

    /// Pitch class: 0 = C through 11 = B
    pub fn key() -> Self {
        Self {
            pairs: KEY_NAMES
                .iter()
                .enumerate()
                .map(|(i, name)| (i as i64, name.to_string()))
                .collect(),
        }
    }

    pub fn levels(&self) -> Vec<String> {
        self.pairs.iter().map(|(_, l)| l.clone()).collect()
    }

    /// Level index for a raw value
    pub fn code_for(&self, raw: i64) -> Option<usize> {
        self.pairs.iter().position(|(v, _)| *v == raw)
    }

    /// Raw value for a label
    pub fn raw_for(&self, label: &str) -> Option<i64> {
        self.pairs.iter().find(|(_, l)| l == label).map(|(v, _)| *v)
    }

    /// Map recoded column `name` back to its raw integer values
    ///
    /// # Errors
    /// `UnmappedCategory` naming `name` for a label outside the scheme.
    pub fn decode(&self, name: &str, column: &CategoricalColumn) -> StatsResult<Vec<Option<i64>>> {
        column
            .codes
            .iter()
            .enumerate()
            .map(|(row, code)| match code {
                None => Ok(None),
                Some(c) => {
                    let label = column.levels.get(*c).map(String::as_str).unwrap_or("");
                    self.raw_for(label)
                        .map(Some)
                        .ok_or_else(|| StatsError::UnmappedCategory {
                            column: name.to_string(),
                            row,
                            value: label.to_string(),
                        })
                }
            })
            .collect()
    }

    fn encode(
        &self,
        column: &str,
        values: &[Option<f64>],
        rows: &[usize],
    ) -> StatsResult<CategoricalColumn> {
        let codes = values
            .iter()
            .zip(rows)
            .map(|(value, &row)| match value {
                None => Ok(None),
                Some(v) => {
                    let code = if v.fract() == 0.0 && v.is_finite() {
                        self.code_for(*v as i64)
                    } else {
                        None
                    };
                    code.map(Some).ok_or_else(|| StatsError::UnmappedCategory {
                        column: column.to_string(),
                        row,
                        value: v.to_string(),
                    })
                }
            })
            .collect::<StatsResult<Vec<_>>>()?;

        Ok(CategoricalColumn {
            levels: self.levels(),
            codes,
        })
    }
}

/// Convert integer column `source` into categorical column `target`
#[derive(Debug, Clone, PartialEq)]
pub struct Recode {
    pub source: String,
    /// Output name; the categorical takes the source column's position
    pub target: String,
    pub scheme: RecodeScheme,
}

impl Recode {
    /// Recode a column in place, keeping its name
    pub fn in_place(column: impl Into<String>, scheme: RecodeScheme) -> Self {
        let column = column.into();
        Self {
            target: column.clone(),
            source: column,
            scheme,
        }
    }
}

/// Rule for choosing one representative row per group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowSelector {
    /// First row of the group in original table order
    #[default]
    First,
}

/// Options for [`clean`]
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Columns whose joint value identifies a logical track
    pub group_keys: Vec<String>,
    pub row_selector: RowSelector,
    /// Columns removed after row selection
    pub drop_columns: Vec<String>,
    pub recodes: Vec<Recode>,
}

impl CleanOptions {
    /// Group on (artist, track name) and drop album/playlist columns
    pub fn by_artist_and_track() -> Self {
        Self::grouped_on(&["track_artist", "track_name"])
    }

    /// Group on the track identifier and drop album/playlist columns
    pub fn by_track_id() -> Self {
        Self::grouped_on(&["track_id"])
    }

    fn grouped_on(keys: &[&str]) -> Self {
        Self {
            group_keys: keys.iter().map(|k| k.to_string()).collect(),
            row_selector: RowSelector::First,
            drop_columns: ALBUM_PLAYLIST_COLUMNS.iter().map(|c| c.to_string()).collect(),
            recodes: Vec::new(),
        }
    }

    pub fn recode(mut self, recode: Recode) -> Self {
        self.recodes.push(recode);
        self
    }
}

/// Deduplicate, prune, and recode a raw track table
///
/// Returns exactly one row per distinct `group_keys` tuple, in order of first
/// appearance. Missing key cells compare equal to each other.
///
/// Cleaning an already cleaned table returns it unchanged: drop columns that
/// are already gone are skipped, and a recode whose output is already present
/// with the scheme's levels is a no-op.
///
/// # Errors
/// * `SchemaMismatch` if a group key is absent, or a recode has neither its
///   source nor its target column
/// * `UnmappedCategory` if a selected row holds a value outside a recode scheme
pub fn clean(raw: &Table, options: &CleanOptions) -> StatsResult<Table> {
    if options.group_keys.is_empty() {
        return Err(StatsError::EmptyInput { field: "group_keys" });
    }

    let missing: Vec<String> = options
        .group_keys
        .iter()
        .filter(|name| raw.column(name).is_none())
        .chain(
            options
                .recodes
                .iter()
                .filter(|r| raw.column(&r.source).is_none() && raw.column(&r.target).is_none())
                .map(|r| &r.source),
        )
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(StatsError::SchemaMismatch { missing });
    }

    let key_columns: Vec<&Column> = options
        .group_keys
        .iter()
        .map(|k| raw.require(k))
        .collect::<StatsResult<_>>()?;

    let selected = match options.row_selector {
        RowSelector::First => first_of_each_group(raw.n_rows(), &key_columns),
    };
    log::debug!(
        "clean: {} rows -> {} groups on [{}]",
        raw.n_rows(),
        selected.len(),
        options.group_keys.join(", ")
    );

    let present: Vec<&String> = options
        .drop_columns
        .iter()
        .filter(|name| raw.column(name).is_some())
        .collect();
    let mut table = raw.take_rows(&selected).drop_columns(&present)?;

    for recode in &options.recodes {
        if table.column(&recode.source).is_none() {
            log::debug!("recode of '{}' skipped: column not present", recode.source);
            continue;
        }
        table = apply_recode(&table, recode, &selected)?;
    }

    Ok(table)
}

/// Apply one recode to every row of `table`
///
/// # Errors
/// * `SchemaMismatch` if the source column is absent
/// * `UnmappedCategory` if a value falls outside the scheme
pub fn recode(table: &Table, recode: &Recode) -> StatsResult<Table> {
    let rows: Vec<usize> = (0..table.n_rows()).collect();
    apply_recode(table, recode, &rows)
}

/// `rows[i]` is the original row index of row `i`, for error reporting
fn apply_recode(table: &Table, recode: &Recode, rows: &[usize]) -> StatsResult<Table> {
    let categorical = match table.require(&recode.source)? {
        Column::Numeric(values) => recode.scheme.encode(&recode.source, values, rows)?,
        // recoded by an earlier pass
        Column::Categorical(c) if c.levels == recode.scheme.levels() => c.clone(),
        other => {
            return Err(StatsError::InvalidValue {
                field: "recode",
                message: format!(
                    "'{}' is {}, expected integer codes",
                    recode.source,
                    other.kind()
                ),
            })
        }
    };
    let mut out = table.clone();
    out.replace_column(
        &recode.source,
        recode.target.clone(),
        Column::Categorical(categorical),
    )?;
    Ok(out)
}

fn first_of_each_group(n_rows: usize, keys: &[&Column]) -> Vec<usize> {
    let mut seen: HashSet<Vec<KeyPart>> = HashSet::new();
    (0..n_rows)
        .filter(|&i| seen.insert(keys.iter().map(|c| c.key_part(i)).collect()))
        .collect()
}

/// Keep rows whose `column` value is present and satisfies `predicate`
pub fn filter_numeric(
    table: &Table,
    column: &str,
    predicate: impl Fn(f64) -> bool,
) -> StatsResult<Table> {
    let values = table.numeric(column)?;
    let before = table.n_rows();
    let out = table.filter_rows(|i| values[i].is_some_and(&predicate));
    log::debug!("filter on '{}': {} -> {} rows", column, before, out.n_rows());
    Ok(out)
}

/// Add (or replace) a 0/1 column `target` equal to `source > threshold`
pub fn threshold_indicator(
    table: &Table,
    source: &str,
    threshold: f64,
    target: &str,
) -> StatsResult<Table> {
    let values = table.numeric(source)?;
    let indicator = values
        .iter()
        .map(|v| v.map(|x| if x > threshold { 1.0 } else { 0.0 }))
        .collect();
    let mut out = table.clone();
    out.set_column(target, Column::Numeric(indicator))?;
    Ok(out)
}

/// Re-type a text column read back from a written table
///
/// A column whose present cells are all numbers becomes numeric again; one
/// holding `scheme` labels becomes categorical with the scheme's levels.
/// Numeric and categorical columns are returned unchanged.
///
/// # Errors
/// `UnmappedCategory` for a cell that is neither a number nor a scheme label.
pub fn restore_labels(table: &Table, column: &str, scheme: &RecodeScheme) -> StatsResult<Table> {
    let Column::Text(cells) = table.require(column)? else {
        return Ok(table.clone());
    };

    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(s) => s.parse::<f64>().ok().map(Some),
        })
        .collect();
    let restored = match parsed {
        Some(values) => Column::Numeric(values),
        None => {
            let levels = scheme.levels();
            let codes = cells
                .iter()
                .enumerate()
                .map(|(row, cell)| match cell {
                    None => Ok(None),
                    Some(s) => levels.iter().position(|l| l == s).map(Some).ok_or_else(|| {
                        StatsError::UnmappedCategory {
                            column: column.to_string(),
                            row,
                            value: s.clone(),
                        }
                    }),
                })
                .collect::<StatsResult<Vec<_>>>()?;
            Column::Categorical(CategoricalColumn { levels, codes })
        }
    };

    let mut out = table.clone();
    out.set_column(column, restored)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use proptest::prelude::*;

    fn text(values: &[&str]) -> Column {
        Column::Text(values.iter().map(|v| Some(v.to_string())).collect())
    }

    fn num(values: &[f64]) -> Column {
        Column::Numeric(values.iter().map(|&v| Some(v)).collect())
    }

    fn raw_tracks() -> Table {
        Table::new()
            .with_column("track_artist", text(&["Ed Sheeran", "Adele", "Ed Sheeran", "Adele"]))
            .unwrap()
            .with_column(
                "track_name",
                text(&["Thinking out Loud", "Hello", "Thinking out Loud", "Skyfall"]),
            )
            .unwrap()
            .with_column("playlist_name", text(&["Pop Hits", "Ballads", "Wedding", "Bond"]))
            .unwrap()
            .with_column("track_popularity", num(&[80.0, 75.0, 81.0, 70.0]))
            .unwrap()
            .with_column("mode", num(&[1.0, 0.0, 1.0, 0.0]))
            .unwrap()
            .with_column("key", num(&[2.0, 5.0, 2.0, 0.0]))
            .unwrap()
    }

    fn by_artist_track() -> CleanOptions {
        CleanOptions {
            group_keys: vec!["track_artist".into(), "track_name".into()],
            drop_columns: vec!["playlist_name".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_track_keeps_first_row() {
        let raw = raw_tracks();
        let cleaned = clean(&raw, &by_artist_track()).unwrap();

        assert_eq!(cleaned.n_rows(), 3);
        let sheeran: Vec<usize> = (0..cleaned.n_rows())
            .filter(|&i| cleaned.row(i)[0] == Value::Text("Ed Sheeran".into()))
            .collect();
        assert_eq!(sheeran, vec![0]);
        // first row in input order, minus the dropped playlist column
        assert_eq!(
            cleaned.row(0),
            vec![
                Value::Text("Ed Sheeran".into()),
                Value::Text("Thinking out Loud".into()),
                Value::Number(80.0),
                Value::Number(1.0),
                Value::Number(2.0),
            ]
        );
    }

    #[test]
    fn test_output_follows_first_appearance() {
        let cleaned = clean(&raw_tracks(), &by_artist_track()).unwrap();
        let names: Vec<Value> = (0..3).map(|i| cleaned.row(i)[1].clone()).collect();
        assert_eq!(
            names,
            vec![
                Value::Text("Thinking out Loud".into()),
                Value::Text("Hello".into()),
                Value::Text("Skyfall".into()),
            ]
        );
    }

    #[test]
    fn test_recode_mode_and_key() {
        let options = by_artist_track()
            .recode(Recode::in_place("mode", RecodeScheme::mode()))
            .recode(Recode::in_place("key", RecodeScheme::key()));
        let cleaned = clean(&raw_tracks(), &options).unwrap();

        assert_eq!(
            cleaned.column_names(),
            &["track_artist", "track_name", "track_popularity", "mode", "key"]
        );
        match cleaned.column("mode").unwrap() {
            Column::Categorical(c) => {
                assert_eq!(c.levels, vec!["minor", "major"]);
                assert_eq!(c.label(0), Some("major"));
                assert_eq!(c.label(1), Some("minor"));
            }
            other => panic!("expected categorical, got {:?}", other),
        }
        match cleaned.column("key").unwrap() {
            Column::Categorical(c) => {
                assert_eq!(c.levels.len(), 12);
                assert_eq!(c.label(0), Some("D"));
                assert_eq!(c.label(1), Some("F"));
                assert_eq!(c.label(2), Some("C"));
            }
            other => panic!("expected categorical, got {:?}", other),
        }
    }

    #[test]
    fn test_recode_to_new_name_keeps_position() {
        let options = by_artist_track().recode(Recode {
            source: "mode".into(),
            target: "mode_label".into(),
            scheme: RecodeScheme::mode(),
        });
        let cleaned = clean(&raw_tracks(), &options).unwrap();
        assert_eq!(cleaned.index_of("mode_label"), Some(3));
        assert!(cleaned.column("mode").is_none());
    }

    #[test]
    fn test_unmapped_category_reports_row() {
        let raw = raw_tracks()
            .with_column("modality", num(&[0.0, 1.0, 0.0, 7.0]))
            .unwrap();
        let options = by_artist_track().recode(Recode::in_place("modality", RecodeScheme::mode()));

        match clean(&raw, &options) {
            Err(StatsError::UnmappedCategory { column, row, value }) => {
                assert_eq!(column, "modality");
                assert_eq!(row, 3);
                assert_eq!(value, "7");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_recode_round_trip() {
        let options = by_artist_track().recode(Recode::in_place("key", RecodeScheme::key()));
        let cleaned = clean(&raw_tracks(), &options).unwrap();
        let Column::Categorical(column) = cleaned.column("key").unwrap() else {
            panic!("key not recoded");
        };
        let decoded = RecodeScheme::key().decode("key", column).unwrap();
        assert_eq!(decoded, vec![Some(2), Some(5), Some(0)]);
    }

    #[test]
    fn test_decode_error_names_column() {
        let column = CategoricalColumn {
            levels: vec!["minor".into(), "major".into(), "dorian".into()],
            codes: vec![Some(1), None, Some(2)],
        };
        match RecodeScheme::mode().decode("mode", &column) {
            Err(StatsError::UnmappedCategory { column, row, value }) => {
                assert_eq!(column, "mode");
                assert_eq!(row, 2);
                assert_eq!(value, "dorian");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_cleaning_twice_with_presets() {
        let options = CleanOptions::by_artist_and_track()
            .recode(Recode::in_place("mode", RecodeScheme::mode()))
            .recode(Recode {
                source: "key".into(),
                target: "key_name".into(),
                scheme: RecodeScheme::key(),
            });
        let once = clean(&raw_tracks(), &options).unwrap();
        assert_eq!(
            once.column_names(),
            &["track_artist", "track_name", "track_popularity", "mode", "key_name"]
        );
        assert_eq!(clean(&once, &options).unwrap(), once);
    }

    #[test]
    fn test_recode_with_other_levels_is_rejected() {
        let once = clean(
            &raw_tracks(),
            &by_artist_track().recode(Recode::in_place("mode", RecodeScheme::mode())),
        )
        .unwrap();
        let scheme = RecodeScheme::new([(0, "low"), (1, "high")]).unwrap();
        let options = by_artist_track().recode(Recode::in_place("mode", scheme));
        assert!(matches!(
            clean(&once, &options),
            Err(StatsError::InvalidValue { field: "recode", .. })
        ));
    }

    #[test]
    fn test_missing_recode_column_is_schema_mismatch() {
        let options = by_artist_track().recode(Recode::in_place("modality", RecodeScheme::mode()));
        match clean(&raw_tracks(), &options) {
            Err(StatsError::SchemaMismatch { missing }) => assert_eq!(missing, vec!["modality"]),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_empty_table_keeps_schema() {
        let empty = raw_tracks().take_rows(&[]);
        let cleaned = clean(&empty, &by_artist_track()).unwrap();
        assert_eq!(cleaned.n_rows(), 0);
        assert_eq!(cleaned.n_cols(), 5);
    }

    #[test]
    fn test_missing_group_key_is_schema_mismatch() {
        let options = CleanOptions {
            group_keys: vec!["track_id".into()],
            ..Default::default()
        };
        assert!(matches!(
            clean(&raw_tracks(), &options),
            Err(StatsError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_group_keys_rejected() {
        assert!(matches!(
            clean(&raw_tracks(), &CleanOptions::default()),
            Err(StatsError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_scheme_rejects_duplicates() {
        assert!(RecodeScheme::new([(0, "a"), (0, "b")]).is_err());
        assert!(RecodeScheme::new([(0, "a"), (1, "a")]).is_err());
        assert!(RecodeScheme::new(Vec::<(i64, String)>::new()).is_err());
    }

    #[test]
    fn test_filter_and_threshold() {
        let filtered = filter_numeric(&raw_tracks(), "track_popularity", |p| p > 72.0).unwrap();
        assert_eq!(filtered.n_rows(), 3);

        let flagged = threshold_indicator(&filtered, "track_popularity", 79.0, "popular").unwrap();
        assert_eq!(
            flagged.numeric("popular").unwrap(),
            &[Some(1.0), Some(0.0), Some(1.0)]
        );
    }

    fn arb_table() -> impl Strategy<Value = Table> {
        prop::collection::vec((0u8..4, 0u8..3, 0u8..2), 0..40).prop_map(|rows| {
            let artist = rows.iter().map(|r| Some(format!("artist{}", r.0))).collect();
            let track = rows.iter().map(|r| Some(format!("track{}", r.1))).collect();
            let mode = rows.iter().map(|r| Some(r.2 as f64)).collect();
            let playlist = rows.iter().map(|r| Some(format!("playlist{}", r.0 + r.1))).collect();
            Table::new()
                .with_column("track_artist", Column::Text(artist))
                .unwrap()
                .with_column("track_name", Column::Text(track))
                .unwrap()
                .with_column("mode", Column::Numeric(mode))
                .unwrap()
                .with_column("playlist_name", Column::Text(playlist))
                .unwrap()
        })
    }

    #[test]
    fn test_recode_without_dedup() {
        let table = Table::new()
            .with_column("mode", Column::Numeric(vec![Some(1.0), Some(1.0), None, Some(3.0)]))
            .unwrap();
        match recode(&table, &Recode::in_place("mode", RecodeScheme::mode())) {
            Err(StatsError::UnmappedCategory { row, value, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "3");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let ok = table.take_rows(&[0, 1, 2]);
        let recoded = recode(&ok, &Recode::in_place("mode", RecodeScheme::mode())).unwrap();
        assert_eq!(recoded.n_rows(), 3);
        assert_eq!(recoded.row(2), vec![Value::Missing]);
    }

    #[test]
    fn test_restore_labels() {
        let table = Table::new()
            .with_column("mode", text(&["major", "minor", "major"]))
            .unwrap()
            .with_column("key", text(&["0", "11", "4"]))
            .unwrap();

        let restored = restore_labels(&table, "mode", &RecodeScheme::mode()).unwrap();
        match restored.column("mode") {
            Some(Column::Categorical(c)) => {
                assert_eq!(c.levels, vec!["minor", "major"]);
                assert_eq!(c.codes, vec![Some(1), Some(0), Some(1)]);
            }
            other => panic!("unexpected: {:?}", other),
        }

        let restored = restore_labels(&table, "key", &RecodeScheme::key()).unwrap();
        assert_eq!(
            restored.numeric("key").unwrap(),
            &[Some(0.0), Some(11.0), Some(4.0)]
        );

        let bad = Table::new().with_column("mode", text(&["major", "dorian"])).unwrap();
        assert!(matches!(
            restore_labels(&bad, "mode", &RecodeScheme::mode()),
            Err(StatsError::UnmappedCategory { row: 1, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_one_row_per_group(table in arb_table()) {
            let options = CleanOptions {
                group_keys: vec!["track_artist".into(), "track_name".into()],
                ..Default::default()
            };
            let cleaned = clean(&table, &options).unwrap();

            let keys = |t: &Table, i: usize| (t.row(i)[0].clone(), t.row(i)[1].clone());
            let mut distinct_in = Vec::new();
            for i in 0..table.n_rows() {
                let k = keys(&table, i);
                if !distinct_in.contains(&k) {
                    distinct_in.push(k);
                }
            }
            let out: Vec<_> = (0..cleaned.n_rows()).map(|i| keys(&cleaned, i)).collect();
            prop_assert_eq!(out, distinct_in);
        }

        #[test]
        fn prop_clean_is_idempotent(table in arb_table()) {
            let options = CleanOptions {
                group_keys: vec!["track_artist".into(), "track_name".into()],
                ..Default::default()
            };
            let once = clean(&table, &options).unwrap();
            let twice = clean(&once, &options).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_preset_clean_is_idempotent(table in arb_table()) {
            let options = CleanOptions::by_artist_and_track()
                .recode(Recode::in_place("mode", RecodeScheme::mode()));
            let once = clean(&table, &options).unwrap();
            prop_assert!(once.column("playlist_name").is_none());
            let twice = clean(&once, &options).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
