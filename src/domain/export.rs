// CSV export of one variable binding's series
use super::dataset::Dataset;
use super::variables::VariableSet;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLink {
    pub index: usize,
    pub name: String,
    pub file_name: String,
}

/// Header `time,<keys...>` then one record per time position with the
/// series' y values for binding `index`.
pub fn csv_data(dataset: &Dataset, index: usize) -> anyhow::Result<String> {
    let columns: Vec<_> = dataset
        .targets()
        .iter()
        .map(|t| t.results.get(index).map(Vec::as_slice).unwrap_or_default())
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(std::iter::once("time").chain(dataset.targets().iter().map(|t| t.key.as_str())))?;

    let len = columns.iter().map(|c| c.len()).min().unwrap_or(0);
    for i in 0..len {
        writer.write_record(
            std::iter::once(columns[0][i].x.to_string()).chain(columns.iter().map(|c| c[i].y.to_string())),
        )?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// One export per binding, named after the graph and the binding's label
pub fn export_links(graph_id: &str, variables: &VariableSet) -> Vec<ExportLink> {
    variables
        .iter()
        .enumerate()
        .map(|(i, binding)| {
            let suffix = match binding.label() {
                Some(label) if !label.is_empty() => label.to_string(),
                _ if i == 0 => String::new(),
                _ => (i + 1).to_string(),
            };

            let name = if suffix.is_empty() {
                graph_id.to_string()
            } else {
                format!("{} - {}", graph_id, suffix)
            };

            ExportLink {
                index: i,
                file_name: format!("{}.csv", name),
                name,
            }
        })
        .collect()
}
