use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::client::PortalClient;
use crate::config::PortalConfig;
use crate::error::StatError;

const ITEM_MARKER: &str = "varval.asp";
const HREF_OPEN: &str = "HREF=\"";
const HREF_CLOSE: &str = "\">";
const NAME_MARKER: &str = "lang=2\">";
const ANCHOR_CLOSE: &str = "</A>";
const UPDATED_MARKER: &str = "Uuendatud";
const VAR_OPEN: &str = "<LI><B>";
const VAR_CLOSE: &str = ":</B>";
const COUNT_OPEN: &str = "<I>(";
const COUNT_CLOSE: &str = ")</I>";

static UPDATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{2}\.[0-9]{2}\.[0-9]{4}").expect("valid date pattern"));

/// One downloadable table as advertised on a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetDescriptor {
    pub name: String,
    pub url: String,
    pub updated: Option<String>,
    pub var_counts: Vec<u32>,
    pub vars: Vec<String>,
}

impl DatasetDescriptor {
    /// Numeric table id in front of the `:` in the name.
    pub fn table_id(&self) -> Option<&str> {
        let (prefix, _) = self.name.split_once(':')?;
        let prefix = prefix.trim();
        if prefix.is_empty() || !prefix.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        Some(prefix)
    }

    pub fn title(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, title)) => title.trim(),
            None => self.name.trim(),
        }
    }

    pub fn updated_date(&self) -> Option<NaiveDate> {
        let updated = self.updated.as_deref()?;
        NaiveDate::parse_from_str(updated, "%d.%m.%Y").ok()
    }

    pub fn has_aligned_vars(&self) -> bool {
        self.vars.len() == self.var_counts.len()
    }
}

pub struct DatasetLister<'a, C: PortalClient> {
    client: &'a C,
    config: &'a PortalConfig,
}

impl<'a, C: PortalClient> DatasetLister<'a, C> {
    pub fn new(client: &'a C, config: &'a PortalConfig) -> Self {
        Self { client, config }
    }

    pub fn list(&self, locator: &str) -> Result<Vec<DatasetDescriptor>, StatError> {
        let url = self.config.listing_url(locator);
        let body = self.client.get_text(&url)?;
        let datasets = parse_listing(&body)?;
        tracing::debug!(%locator, datasets = datasets.len(), "parsed listing page");
        Ok(datasets)
    }
}

enum ListingState {
    AwaitingItem,
    InItem(DatasetDescriptor),
}

/// Scans a listing page line by line. A page without a single table link is
/// an error: an empty result would hide a changed page layout.
pub fn parse_listing(body: &str) -> Result<Vec<DatasetDescriptor>, StatError> {
    let mut datasets = Vec::new();
    let mut state = ListingState::AwaitingItem;

    for line in body.lines() {
        if line.contains(ITEM_MARKER) {
            if let Some(item) = parse_item_line(line) {
                let previous = std::mem::replace(&mut state, ListingState::InItem(item));
                if let ListingState::InItem(done) = previous {
                    finish(done, &mut datasets);
                }
                continue;
            }
            tracing::debug!(%line, "table link without HREF, skipping");
        }

        if let ListingState::InItem(item) = &mut state {
            collect_detail(line, item);
        }
    }

    if let ListingState::InItem(done) = state {
        finish(done, &mut datasets);
    }

    if datasets.is_empty() {
        return Err(StatError::Parse(format!(
            "no `{ITEM_MARKER}` table links found on listing page"
        )));
    }
    Ok(datasets)
}

fn parse_item_line(line: &str) -> Option<DatasetDescriptor> {
    let url = between(line, HREF_OPEN, HREF_CLOSE)?;
    let name = between(line, NAME_MARKER, ANCHOR_CLOSE).or_else(|| {
        let start = line.find(HREF_OPEN)? + HREF_OPEN.len();
        let rest = &line[start..];
        let after = rest.find(HREF_CLOSE)? + HREF_CLOSE.len();
        between(&rest[after..], "", ANCHOR_CLOSE)
    })?;
    Some(DatasetDescriptor {
        name: name.trim().to_string(),
        url: url.to_string(),
        ..DatasetDescriptor::default()
    })
}

fn collect_detail(line: &str, item: &mut DatasetDescriptor) {
    if line.contains(UPDATED_MARKER) {
        if let Some(found) = UPDATED_RE.find(line) {
            item.updated = Some(found.as_str().to_string());
        }
    }
    if let Some(var) = between(line, VAR_OPEN, VAR_CLOSE) {
        item.vars.push(var.trim().to_string());
    }
    if let Some(count) = between(line, COUNT_OPEN, COUNT_CLOSE) {
        match count.trim().parse::<u32>() {
            Ok(count) => item.var_counts.push(count),
            Err(_) => tracing::debug!(%count, "unreadable value count"),
        }
    }
}

fn finish(item: DatasetDescriptor, datasets: &mut Vec<DatasetDescriptor>) {
    if !item.has_aligned_vars() {
        tracing::warn!(
            name = %item.name,
            vars = item.vars.len(),
            counts = item.var_counts.len(),
            "variable names and value counts differ in length"
        );
    }
    datasets.push(item);
}

fn between<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let len = text[start..].find(close)?;
    Some(&text[start..start + len])
}
