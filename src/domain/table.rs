// Tabular aggregation of a validated dataset
use super::dataset::Dataset;
use super::format::sprintf;
use super::time_scale::TimeScale;
use super::variables::VariableSet;
use serde::Serialize;
use std::fmt;

pub const TOTAL_LABEL: &str = "total";

/// Combine equal-length sequences position by position: element `i` of the
/// result folds element `i` of every input with `f`. Inputs are zipped to
/// the shortest length.
pub fn pointwise<T, F>(colls: &[Vec<T>], f: F) -> Vec<T>
where
    T: Clone,
    F: Fn(T, &T) -> T,
{
    let Some((first, rest)) = colls.split_first() else {
        return Vec::new();
    };

    let len = colls.iter().map(Vec::len).min().unwrap_or(0);
    (0..len)
        .map(|i| rest.iter().fold(first[i].clone(), |acc, coll| f(acc, &coll[i])))
        .collect()
}

fn add(a: f64, b: &f64) -> f64 {
    a + b
}

fn add_vectors(a: Vec<f64>, b: &Vec<f64>) -> Vec<f64> {
    pointwise(&[a, b.clone()], add)
}

/// Apply each binding's `_format` to its value; unformatted values stay numeric
fn format_values(variables: &VariableSet, values: &[f64]) -> TableItem {
    TableItem::Values(
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| match variables.get(i).and_then(|b| b.format()) {
                Some(format) => CellValue::Text(sprintf(format, v)),
                None => CellValue::Number(v),
            })
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// A grid entry: a plain label, or one value per variable binding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableItem {
    Label(String),
    Values(Vec<CellValue>),
}

impl TableItem {
    fn label(text: impl Into<String>) -> Self {
        TableItem::Label(text.into())
    }
}

pub type TableRow = Vec<TableItem>;

/// Row 0 is the time header; every other row starts with its label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TableGrid {
    rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    pub sum_rows: bool,
    pub sum_cols: bool,
    pub invert: bool,
}

impl TableGrid {
    #[cfg(test)]
    pub(crate) fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<TableRow> {
        self.rows
    }

    /// Build the grid for a dataset that has passed cardinality validation
    pub fn build(
        dataset: &Dataset,
        variables: &VariableSet,
        scale: &TimeScale,
        options: TableOptions,
    ) -> Self {
        let mut header = vec![TableItem::label("")];
        if let Some(first) = dataset.targets().first() {
            header.extend(
                first
                    .values
                    .iter()
                    .map(|p| TableItem::Label(scale.tick_format(p.x))),
            );
        }

        // per target: one vector of per-binding y values per time column
        let rows: Vec<Vec<Vec<f64>>> = dataset
            .targets()
            .iter()
            .map(|target| {
                let len = target.results.iter().map(Vec::len).min().unwrap_or(0);
                (0..len)
                    .map(|i| target.results.iter().map(|series| series[i].y).collect())
                    .collect()
            })
            .collect();

        let mut items: Vec<TableRow> = dataset
            .targets()
            .iter()
            .zip(&rows)
            .map(|(target, row)| {
                std::iter::once(TableItem::label(target.key.clone()))
                    .chain(row.iter().map(|values| format_values(variables, values)))
                    .collect()
            })
            .collect();

        let row_totals: Vec<Vec<f64>> = rows.iter().map(|row| pointwise(row, add)).collect();

        if options.sum_rows {
            for (item, total) in items.iter_mut().zip(&row_totals) {
                item.push(format_values(variables, total));
            }
            header.push(TableItem::label(TOTAL_LABEL));
        }

        if options.sum_cols {
            let totals = pointwise(&rows, add_vectors);
            let mut total_row: TableRow = std::iter::once(TableItem::label(TOTAL_LABEL))
                .chain(totals.iter().map(|values| format_values(variables, values)))
                .collect();

            if options.sum_rows {
                let grand_total = pointwise(&row_totals, add);
                total_row.push(format_values(variables, &grand_total));
            }
            items.push(total_row);
        }

        let mut grid = Self {
            rows: std::iter::once(header).chain(items).collect(),
        };

        if options.invert {
            grid = grid.transpose();
        }

        grid
    }

    /// Swap rows and columns, padding short rows with empty labels
    pub fn transpose(self) -> Self {
        let width = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = (0..width)
            .map(|j| {
                self.rows
                    .iter()
                    .map(|row| row.get(j).cloned().unwrap_or_else(|| TableItem::label("")))
                    .collect()
            })
            .collect();
        Self { rows }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Border {
    Double,
    Solid,
}

/// One rendered table cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col_span: Option<usize>,
}

/// Flatten one grid row into cells. Vector items expand to one cell per
/// binding; header labels span one column per binding.
pub fn table_cells(item: &[TableItem], row_index: usize, variables: &VariableSet) -> Vec<TableCell> {
    let col_span = variables.len();
    let length = item.len();

    item.iter()
        .enumerate()
        .flat_map(|(j, value)| {
            let border = match j {
                0 => None,
                j if j == 1 || j == length - 1 => Some(Border::Double),
                _ => Some(Border::Solid),
            };

            match value {
                TableItem::Values(values) => values
                    .iter()
                    .enumerate()
                    .map(|(k, v)| TableCell {
                        text: v.to_string(),
                        title: variables.get(k).map(|b| b.title()),
                        border: if k == 0 { border } else { None },
                        col_span: None,
                    })
                    .collect::<Vec<_>>(),
                TableItem::Label(text) => vec![TableCell {
                    text: text.clone(),
                    title: None,
                    border,
                    col_span: (row_index == 0 && j > 0 && col_span > 1).then_some(col_span),
                }],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::tests::{dataset, series};
    use chrono::FixedOffset;

    fn scale() -> TimeScale {
        TimeScale::new(0, 0, FixedOffset::east_opt(0).unwrap())
    }

    fn numbers(values: &[f64]) -> TableItem {
        TableItem::Values(values.iter().map(|&v| CellValue::Number(v)).collect())
    }

    fn options(sum_rows: bool, sum_cols: bool) -> TableOptions {
        TableOptions {
            sum_rows,
            sum_cols,
            invert: false,
        }
    }

    #[test]
    fn test_pointwise() {
        assert_eq!(pointwise(&[vec![1.0, 2.0], vec![3.0, 4.0]], add), vec![4.0, 6.0]);
        assert_eq!(pointwise(&[vec![5.0]], add), vec![5.0]);
        assert_eq!(pointwise(&[vec![1.0, 2.0, 3.0], vec![1.0]], add), vec![2.0]);
        assert!(pointwise::<f64, _>(&[], add).is_empty());
    }

    #[test]
    fn test_pointwise_vectors() {
        let rows = vec![vec![vec![1.0, 2.0]], vec![vec![10.0, 20.0]]];
        assert_eq!(pointwise(&rows, add_vectors), vec![vec![11.0, 22.0]]);
    }

    #[test]
    fn test_row_totals() {
        let data = dataset(&[("a", vec![series(&[0, 60, 120], &[10.0, 20.0, 30.0])])]);
        let grid = TableGrid::build(&data, &VariableSet::default(), &scale(), options(true, false));

        let rows = grid.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].last(), Some(&TableItem::label(TOTAL_LABEL)));
        assert_eq!(rows[1][0], TableItem::label("a"));
        assert_eq!(rows[1][1], numbers(&[10.0]));
        assert_eq!(rows[1].last(), Some(&numbers(&[60.0])));
    }

    #[test]
    fn test_column_and_grand_totals() {
        let data = dataset(&[
            ("a", vec![series(&[0, 60], &[10.0, 20.0])]),
            ("b", vec![series(&[0, 60], &[30.0, 40.0])]),
        ]);

        let grid = TableGrid::build(&data, &VariableSet::default(), &scale(), options(false, true));
        let total = grid.rows().last().unwrap();
        assert_eq!(total, &vec![TableItem::label(TOTAL_LABEL), numbers(&[40.0]), numbers(&[60.0])]);

        let grid = TableGrid::build(&data, &VariableSet::default(), &scale(), options(true, true));
        let total = grid.rows().last().unwrap();
        assert_eq!(total.len(), 4);
        assert_eq!(total[3], numbers(&[100.0]));
        assert_eq!(grid.rows()[1][3], numbers(&[30.0]));
    }

    #[test]
    fn test_header_times() {
        let data = dataset(&[("a", vec![series(&[3600, 7200], &[1.0, 2.0])])]);
        let grid = TableGrid::build(&data, &VariableSet::default(), &scale(), TableOptions::default());
        assert_eq!(
            grid.rows()[0],
            vec![TableItem::label(""), TableItem::label("01 AM"), TableItem::label("02 AM")]
        );
    }

    #[test]
    fn test_multiple_bindings_and_formats() {
        let vars = VariableSet::parse(Some(r#"[{"_format": "%.1f"}, {}]"#)).unwrap();
        let data = dataset(&[(
            "a",
            vec![series(&[0, 60], &[1.0, 2.0]), series(&[0, 60], &[3.0, 4.0])],
        )]);

        let grid = TableGrid::build(&data, &vars, &scale(), options(true, true));
        let rows = grid.rows();

        let expected = TableItem::Values(vec![CellValue::Text("1.0".to_string()), CellValue::Number(3.0)]);
        assert_eq!(rows[1][1], expected);

        let row_total = TableItem::Values(vec![CellValue::Text("3.0".to_string()), CellValue::Number(7.0)]);
        assert_eq!(rows[1][3], row_total);

        let grand = TableItem::Values(vec![CellValue::Text("3.0".to_string()), CellValue::Number(7.0)]);
        assert_eq!(rows[2][3], grand);
    }

    #[test]
    fn test_invert() {
        let data = dataset(&[("a", vec![series(&[0, 60], &[1.0, 2.0])])]);
        let opts = TableOptions {
            invert: true,
            ..Default::default()
        };
        let grid = TableGrid::build(&data, &VariableSet::default(), &scale(), opts);

        let rows = grid.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![TableItem::label(""), TableItem::label("a")]);
        assert_eq!(rows[2][1], numbers(&[2.0]));
    }

    #[test]
    fn test_transpose_pads() {
        let grid = TableGrid {
            rows: vec![vec![TableItem::label("a"), TableItem::label("b")], vec![TableItem::label("c")]],
        };
        let rows = grid.transpose().into_rows();
        assert_eq!(rows[1], vec![TableItem::label("b"), TableItem::label("")]);
    }

    #[test]
    fn test_table_cells() {
        let vars = VariableSet::parse(Some(r#"[{"_label": "first"}, {"host": "b"}]"#)).unwrap();

        let header = vec![TableItem::label(""), TableItem::label("01 AM"), TableItem::label("total")];
        let cells = table_cells(&header, 0, &vars);
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].border, None);
        assert_eq!(cells[0].col_span, None);
        assert_eq!(cells[1].col_span, Some(2));
        assert_eq!(cells[2].border, Some(Border::Double));

        let row = vec![
            TableItem::label("a"),
            numbers(&[1.0, 2.0]),
            numbers(&[3.0, 4.0]),
            numbers(&[4.0, 6.0]),
        ];
        let cells = table_cells(&row, 1, &vars);
        assert_eq!(cells.len(), 7);
        assert_eq!(cells[1].text, "1");
        assert_eq!(cells[1].title.as_deref(), Some("first"));
        assert_eq!(cells[1].border, Some(Border::Double));
        assert_eq!(cells[2].border, None);
        assert_eq!(cells[2].title.as_deref(), Some("{\n  \"host\": \"b\"\n}"));
        assert_eq!(cells[3].border, Some(Border::Solid));
        assert_eq!(cells[5].border, Some(Border::Double));
    }
}
