use crate::error::StoreError;
use crate::filter::ProductFilter;
use crate::results::{CatalogRecord, StoredProduct};
use crate::store::TableBackend;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;

/// Product table behind a PostgREST-compatible API (e.g. Supabase)
pub struct RestTable {
    client: Client,
    endpoint: String,
    service_key: String,
}

#[derive(Deserialize)]
struct CategoryRow {
    category: String,
}

impl RestTable {
    pub fn new(project_url: &str, service_key: &str, table: &str) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", project_url.trim_end_matches('/'), table),
            service_key: service_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn get(&self) -> RequestBuilder {
        self.request(self.client.get(&self.endpoint))
    }
}

/// Query parameters expressing `filter` as PostgREST predicates
pub fn filter_params(filter: &ProductFilter) -> Vec<(&'static str, String)> {
    let mut params = vec![("select", "*".to_string())];

    if let Some(title) = filter.title() {
        params.push(("title", contains_pattern(title)));
    }
    if let Some(category) = filter.category() {
        params.push(("category", contains_pattern(category)));
    }
    if let Some(min) = filter.min_price() {
        params.push(("price", format!("gte.{}", min)));
    }
    if let Some(max) = filter.max_price() {
        params.push(("price", format!("lte.{}", max)));
    }

    params.push(("order", "id.asc".to_string()));
    params
}

/// `ilike` operand matching `needle` literally anywhere in the column.
///
/// PostgREST reads `*` as `%` and offers no escape for it, so a literal `*`
/// widens to the single-character wildcard `_`; `select` narrows the rows
/// back down with the in-process filter.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 8);
    pattern.push_str("ilike.*");
    for c in needle.chars() {
        match c {
            '\\' | '%' | '_' => {
                pattern.push('\\');
                pattern.push(c);
            }
            '*' => pattern.push('_'),
            _ => pattern.push(c),
        }
    }
    pattern.push('*');
    pattern
}

/// Turns a non-success response into an error carrying its body
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TableBackend for RestTable {
    async fn contains_title(&self, title: &str) -> Result<bool, StoreError> {
        let response = self
            .get()
            .query(&[
                ("select", "id".to_string()),
                ("title", format!("eq.{}", title)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = check(response).await?.json().await?;
        Ok(!rows.is_empty())
    }

    async fn insert(&self, record: &CatalogRecord) -> Result<Option<StoredProduct>, StoreError> {
        let response = self
            .request(self.client.post(&self.endpoint))
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;
        let mut rows: Vec<StoredProduct> = check(response).await?.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn select(&self, filter: &ProductFilter) -> Result<Vec<StoredProduct>, StoreError> {
        let response = self.get().query(&filter_params(filter)).send().await?;
        let rows: Vec<StoredProduct> = check(response).await?.json().await?;
        Ok(rows.into_iter().filter(|row| filter.matches(row)).collect())
    }

    async fn categories(&self) -> Result<Vec<String>, StoreError> {
        let response = self.get().query(&[("select", "category")]).send().await?;
        let rows: Vec<CategoryRow> = check(response).await?.json().await?;
        Ok(rows.into_iter().map(|row| row.category).collect())
    }

    async fn health(&self) -> Result<(), StoreError> {
        let response = self
            .get()
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
