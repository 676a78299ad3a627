use crate::client::PortalClient;
use crate::config::PortalConfig;
use crate::error::StatError;

const PATH_RECORD_MARKER: &str = "insDoc(";
const PATH_RECORD_TRAILER_LEN: usize = 3;

/// Raw segments of one navigation route; the last one names a page, not a
/// category.
pub type CatalogPath = Vec<String>;

pub struct PathCatalog<'a, C: PortalClient> {
    client: &'a C,
    config: &'a PortalConfig,
}

impl<'a, C: PortalClient> PathCatalog<'a, C> {
    pub fn new(client: &'a C, config: &'a PortalConfig) -> Self {
        Self { client, config }
    }

    /// Fetches the navigation script of every root category in order. Slow:
    /// the scripts are large and fetched one at a time.
    pub fn load(&self) -> Result<Vec<CatalogPath>, StatError> {
        let mut paths = Vec::new();
        for category in &self.config.root_categories {
            let url = self.config.tree_script_url(category);
            let body = self.client.get_text(&url)?;
            let extracted = extract_paths(&body);
            tracing::debug!(%category, paths = extracted.len(), "loaded navigation script");
            paths.extend(extracted);
        }
        Ok(paths)
    }
}

pub fn extract_paths(body: &str) -> Vec<CatalogPath> {
    body.lines().filter_map(parse_path_record).collect()
}

fn parse_path_record(line: &str) -> Option<CatalogPath> {
    if !line.starts_with(PATH_RECORD_MARKER) {
        return None;
    }
    let cut = line
        .char_indices()
        .rev()
        .nth(PATH_RECORD_TRAILER_LEN - 1)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let path = line[..cut]
        .split('/')
        .skip(1)
        .map(str::to_string)
        .collect::<Vec<_>>();
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_only_marked_lines() {
        let body = "var foldersTree = gFld(\"Database\");\n\
                    insDoc(aux1, gLnk(\"\", \"/Majandus/10Ehitus/ehitus.asp\"))\n\
                    aux1 = insFld(foldersTree, gFld(\"x\"));\n\
                    insDoc(aux1, gLnk(\"\", \"/Majandus/20Energia/energia.asp\"))\n";
        let paths = extract_paths(body);
        assert_eq!(
            paths,
            vec![
                vec!["Majandus", "10Ehitus", "ehitus.asp"],
                vec!["Majandus", "20Energia", "energia.asp"],
            ]
        );
    }

    #[test]
    fn trailer_is_three_characters() {
        let paths = extract_paths("insDoc(a/B/c.asp)))\r\n");
        assert_eq!(paths, vec![vec!["B", "c.asp"]]);
    }

    #[test]
    fn short_marker_line_yields_empty_path() {
        let paths = extract_paths("insDoc(");
        assert_eq!(paths, vec![Vec::<String>::new()]);
    }
}
