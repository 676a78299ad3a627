use crate::client::PortalClient;
use crate::config::{PortalConfig, RequestHeaders};
use crate::error::StatError;
use crate::listing::DatasetDescriptor;

/// Largest value count a single variable may expand to in the export form.
pub const MAX_VALUES_PER_VARIABLE: u32 = 100_000;

/// Form values the export dialog always sends.
const FIXED_PARAMS: &[(&str, &str)] = &[
    ("elim", "NNNN"),
    ("numberstub", "2"),
    ("lang", "2"),
    ("sel", "Jätka"),
    ("pxkonv", "asc1"),
    ("classdir2", ""),
    ("description", ""),
    ("descriptiondefault", "0"),
    ("hasAggregno", "0"),
    ("headceller", "1"),
    ("mainlang", ""),
    ("mapname", ""),
    ("multilang", ""),
    ("stubceller", "4"),
    ("timevalvar", "Aasta"),
];

pub struct DatasetFetcher<'a, C: PortalClient> {
    client: &'a C,
    config: &'a PortalConfig,
}

impl<'a, C: PortalClient> DatasetFetcher<'a, C> {
    pub fn new(client: &'a C, config: &'a PortalConfig) -> Self {
        Self { client, config }
    }

    /// Downloads one table. The body is the portal's delimited text export.
    pub fn fetch(
        &self,
        descriptor: &DatasetDescriptor,
        headers: &RequestHeaders,
    ) -> Result<String, StatError> {
        let form = build_form_params(descriptor)?;
        tracing::debug!(name = %descriptor.name, fields = form.len(), "requesting table export");
        self.client
            .post_form(&self.config.download_url(), headers, &form)
    }
}

/// Rebuilds the export form of the variable-selection dialog, selecting
/// every value of every variable.
pub fn build_form_params(
    descriptor: &DatasetDescriptor,
) -> Result<Vec<(String, String)>, StatError> {
    let url = descriptor.url.as_str();
    for required in ["path=", "ti=", "?"] {
        if !url.contains(required) {
            return Err(StatError::Validation(format!(
                "url `{url}` has no `{required}`"
            )));
        }
    }
    let matrix = descriptor.table_id().ok_or_else(|| {
        StatError::Validation(format!(
            "name `{}` has no numeric table id before `:`",
            descriptor.name
        ))
    })?;
    let path = query_value(url, "path")
        .ok_or_else(|| StatError::Validation(format!("url `{url}` has no path parameter")))?;
    let ti = query_value(url, "ti")
        .ok_or_else(|| StatError::Validation(format!("url `{url}` has no ti parameter")))?;
    if let Some((idx, count)) = descriptor
        .var_counts
        .iter()
        .enumerate()
        .find(|(_, count)| **count > MAX_VALUES_PER_VARIABLE)
    {
        return Err(StatError::Validation(format!(
            "variable {} claims {count} values, more than {MAX_VALUES_PER_VARIABLE}",
            idx + 1
        )));
    }
    let varparm = url
        .split_once('?')
        .map(|(_, rest)| rest)
        .unwrap_or_default();

    let (head, tail) = matrix.split_at(matrix.len().min(2));
    let mut params = vec![
        param("matrix", matrix),
        param("infofile", &format!("{head}_{tail}.htm")),
        param("root", path),
        param("classdir", path),
        param("ti", ti),
        param("noofvar", &descriptor.var_counts.len().to_string()),
        param("varparm", varparm),
    ];
    params.extend(FIXED_PARAMS.iter().map(|(key, value)| param(key, value)));

    for (idx, count) in descriptor.var_counts.iter().enumerate() {
        let i = idx + 1;
        params.push(param(&format!("Valdavarden{i}"), &count.to_string()));
        for j in 1..=*count {
            params.push(param(&format!("values{i}"), &j.to_string()));
        }
    }
    for (idx, var) in descriptor.vars.iter().enumerate() {
        let i = idx + 1;
        params.push(param(&format!("var{i}"), var));
        params.push(param(&format!("context{i}"), ""));
    }

    Ok(params)
}

fn param(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

// Hrefs copied out of HTML may still carry `&amp;` separators.
fn query_value<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    url.split(['?', '&'])
        .map(|pair| pair.strip_prefix("amp;").unwrap_or(pair))
        .find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == key).then_some(value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_value_matches_whole_keys() {
        let url = "varval.asp?ma=1&noti=x&ti=Ehitus&amp;path=../I_Databas/";
        assert_eq!(query_value(url, "ti"), Some("Ehitus"));
        assert_eq!(query_value(url, "path"), Some("../I_Databas/"));
        assert_eq!(query_value(url, "lang"), None);
    }

    #[test]
    fn short_table_id_infofile() {
        let descriptor = DatasetDescriptor {
            name: "7: Lühike".to_string(),
            url: "x?path=A&ti=T".to_string(),
            ..DatasetDescriptor::default()
        };
        let params = build_form_params(&descriptor).unwrap();
        assert!(params.contains(&param("infofile", "7_.htm")));
        assert!(params.contains(&param("noofvar", "0")));
    }
}
