use serde::{Deserialize, Serialize};

use crate::model::{DEFAULT_WORD_SIZE, Word};

/// One source row as delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub size: Option<f64>,
    /// `None` paints the word in the theme's text color.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
}

impl DataRow {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        size: Option<f64>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            size,
            color: Some(color.into()),
            tooltip: None,
        }
    }
}

/// Read-only view of the data feeding one render request.
pub trait DataSource {
    /// Problems reported by the host for this data view. Any entry aborts
    /// the pass.
    fn errors(&self) -> Vec<String>;
    /// `None` when reading was aborted and a newer request will follow.
    fn rows(&self) -> Option<Vec<DataRow>>;
    fn has_words_axis(&self) -> bool;
    fn has_size_axis(&self) -> bool;
    fn has_color_axis(&self) -> bool;
}

/// In-memory data source, deserializable from JSON or JSON5.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSet {
    pub rows: Vec<DataRow>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default = "default_true")]
    pub words_axis: bool,
    #[serde(default)]
    pub size_axis: Option<bool>,
    #[serde(default)]
    pub color_axis: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RowInput {
    Set(RowSet),
    Rows(Vec<DataRow>),
}

impl RowSet {
    pub fn new(rows: Vec<DataRow>) -> Self {
        Self {
            rows,
            errors: Vec::new(),
            words_axis: true,
            size_axis: None,
            color_axis: false,
        }
    }

    /// Parses either a `{ rows: [...] }` object or a bare row array. Rows
    /// without an id are numbered by position.
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let mut set = match json5::from_str::<RowInput>(input)? {
            RowInput::Set(set) => set,
            RowInput::Rows(rows) => RowSet::new(rows),
        };
        for (idx, row) in set.rows.iter_mut().enumerate() {
            if row.id.is_empty() {
                row.id = idx.to_string();
            }
        }
        Ok(set)
    }
}

impl DataSource for RowSet {
    fn errors(&self) -> Vec<String> {
        self.errors.clone()
    }

    fn rows(&self) -> Option<Vec<DataRow>> {
        Some(self.rows.clone())
    }

    fn has_words_axis(&self) -> bool {
        self.words_axis
    }

    fn has_size_axis(&self) -> bool {
        self.size_axis
            .unwrap_or_else(|| self.rows.iter().any(|row| row.size.is_some()))
    }

    fn has_color_axis(&self) -> bool {
        self.color_axis
    }
}

/// Builds the words of one pass. Sizes fall back to [`DEFAULT_WORD_SIZE`]
/// when no size axis is bound or the value is missing, and never go below 0.
/// Rows without a color take `default_color`.
pub fn words_from_rows(rows: &[DataRow], size_axis: bool, default_color: &str) -> Vec<Word> {
    rows.iter()
        .map(|row| {
            let size = match row.size {
                Some(size) if size_axis && size.is_finite() => size.max(0.0),
                _ => DEFAULT_WORD_SIZE,
            };
            Word {
                id: row.id.clone(),
                text: row.text.clone(),
                size,
                color: row.color.clone().unwrap_or_else(|| default_color.to_string()),
                tooltip: row.tooltip.clone().unwrap_or_else(|| row.text.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_row_array_with_json5() {
        let input = "[{text: 'alpha', size: 10}, {text: 'beta', size: 40, color: '#f00'},]";
        let set = RowSet::parse(input).unwrap();
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0].id, "0");
        assert_eq!(set.rows[0].color, None);
        assert_eq!(set.rows[1].color.as_deref(), Some("#f00"));
        assert!(set.has_size_axis());
        assert!(set.has_words_axis());
    }

    #[test]
    fn parses_row_set_object() {
        let input = r#"{
            "rows": [{"id": "r1", "text": "alpha"}],
            "sizeAxis": false,
            "colorAxis": true,
            "errors": ["column missing"]
        }"#;
        let set = RowSet::parse(input).unwrap();
        assert_eq!(set.rows[0].id, "r1");
        assert!(!set.has_size_axis());
        assert!(set.has_color_axis());
        assert_eq!(set.errors(), vec!["column missing".to_string()]);
    }

    #[test]
    fn words_default_and_clamp_sizes() {
        let rows = vec![
            DataRow::new("a", "alpha", Some(12.0), "#000"),
            DataRow::new("b", "beta", None, "#000"),
            DataRow::new("c", "gamma", Some(-4.0), "#000"),
            DataRow::new("d", "delta", Some(f64::NAN), "#000"),
        ];
        let sizes: Vec<f64> = words_from_rows(&rows, true, "#000").iter().map(|w| w.size).collect();
        assert_eq!(sizes, vec![12.0, DEFAULT_WORD_SIZE, 0.0, DEFAULT_WORD_SIZE]);
        let unsized_words = words_from_rows(&rows, false, "#000");
        assert!(unsized_words.iter().all(|w| w.size == DEFAULT_WORD_SIZE));
        assert_eq!(unsized_words[0].tooltip, "alpha");
    }

    #[test]
    fn uncolored_rows_take_default_color() {
        let set = RowSet::parse("[{text: 'alpha'}, {text: 'beta', color: '#f00'}]").unwrap();
        let words = words_from_rows(&set.rows, false, "#abcdef");
        assert_eq!(words[0].color, "#abcdef");
        assert_eq!(words[1].color, "#f00");
    }
}
