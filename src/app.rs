use serde::Serialize;

use crate::catalog::PathCatalog;
use crate::client::PortalClient;
use crate::config::{PortalConfig, RequestHeaders};
use crate::error::StatError;
use crate::fetch::DatasetFetcher;
use crate::listing::{DatasetDescriptor, DatasetLister};
use crate::tree::{CategoryTree, LeafNode};

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub locator: String,
    pub datasets: Vec<DatasetDescriptor>,
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub table_id: String,
    pub name: String,
    pub body: String,
}

pub struct Portal<C: PortalClient> {
    client: C,
    config: PortalConfig,
}

impl<C: PortalClient> Portal<C> {
    pub fn new(client: C, config: PortalConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// One request per root category. Any failure aborts the whole build.
    pub fn load_tree(&self) -> Result<CategoryTree, StatError> {
        let paths = PathCatalog::new(&self.client, &self.config).load()?;
        CategoryTree::build(&paths)
    }

    pub fn lister(&self) -> DatasetLister<'_, C> {
        DatasetLister::new(&self.client, &self.config)
    }

    pub fn fetcher(&self) -> DatasetFetcher<'_, C> {
        DatasetFetcher::new(&self.client, &self.config)
    }

    pub fn datasets<'t>(
        &self,
        leaf: &'t LeafNode,
    ) -> Result<&'t [DatasetDescriptor], StatError> {
        leaf.ensure_loaded(&self.lister())
    }

    /// Lists a page directly by locator, bypassing the tree.
    pub fn list_locator(&self, locator: &str) -> Result<ListResult, StatError> {
        Ok(ListResult {
            locator: locator.to_string(),
            datasets: self.lister().list(locator)?,
        })
    }

    /// Downloads with the headers from the configuration.
    pub fn fetch(&self, descriptor: &DatasetDescriptor) -> Result<FetchResult, StatError> {
        self.fetch_with_headers(descriptor, &self.config.headers)
    }

    pub fn fetch_with_headers(
        &self,
        descriptor: &DatasetDescriptor,
        headers: &RequestHeaders,
    ) -> Result<FetchResult, StatError> {
        let body = self.fetcher().fetch(descriptor, headers)?;
        Ok(FetchResult {
            table_id: descriptor.table_id().unwrap_or_default().to_string(),
            name: descriptor.name.clone(),
            body,
        })
    }
}

/// Picks a table out of a listing by its numeric id.
pub fn find_table<'d>(
    datasets: &'d [DatasetDescriptor],
    table_id: &str,
) -> Result<&'d DatasetDescriptor, StatError> {
    datasets
        .iter()
        .find(|descriptor| descriptor.table_id() == Some(table_id.trim()))
        .ok_or_else(|| StatError::TableNotFound(table_id.to_string()))
}
