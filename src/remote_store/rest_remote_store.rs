//! Board store speaking the PostgREST dialect over HTTP.

use super::models::{NewSectionRow, NewSoundRow, SectionPatch, SectionRow, SoundPatch, SoundRow};
use super::RemoteStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub struct RestRemoteStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestRemoteStore {
    pub fn new(base_url: String, api_key: Option<String>, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn checked(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("{} failed with status {}: {}", what, status, body);
        }
        Ok(response)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        let response = self
            .authorized(self.client.get(self.table_url(table)).query(query))
            .send()
            .await
            .with_context(|| format!("Failed to select from {}", table))?;
        Self::checked(response, &format!("Select from {}", table))
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse {} rows", table))
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        rows: &B,
    ) -> Result<Vec<T>> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await
            .with_context(|| format!("Failed to insert into {}", table))?;
        Self::checked(response, &format!("Insert into {}", table))
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse inserted {} rows", table))
    }

    async fn update<B: Serialize>(&self, table: &str, id: &str, patch: &B) -> Result<()> {
        let id_filter = format!("eq.{}", id);
        let response = self
            .authorized(
                self.client
                    .patch(self.table_url(table))
                    .query(&[("id", id_filter.as_str())]),
            )
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .with_context(|| format!("Failed to update {} {}", table, id))?;
        let updated: Vec<serde_json::Value> =
            Self::checked(response, &format!("Update of {} {}", table, id))
                .await?
                .json()
                .await
                .with_context(|| format!("Failed to parse updated {} rows", table))?;
        if updated.is_empty() {
            bail!("No row with id {} in {}", id, table);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    async fn select_sections(&self) -> Result<Vec<SectionRow>> {
        self.select("sections", &[("select", "*"), ("order", "created_at.asc")])
            .await
    }

    async fn select_sounds(&self) -> Result<Vec<SoundRow>> {
        self.select("sounds", &[("select", "*"), ("order", "position.asc")])
            .await
    }

    async fn select_section_sounds(&self, section_id: &str) -> Result<Vec<SoundRow>> {
        let section_filter = format!("eq.{}", section_id);
        self.select(
            "sounds",
            &[
                ("select", "*"),
                ("section_id", section_filter.as_str()),
                ("order", "position.asc"),
            ],
        )
        .await
    }

    async fn insert_sections(&self, rows: Vec<NewSectionRow>) -> Result<Vec<SectionRow>> {
        self.insert("sections", &rows).await
    }

    async fn insert_sounds(&self, rows: Vec<NewSoundRow>) -> Result<Vec<SoundRow>> {
        self.insert("sounds", &rows).await
    }

    async fn update_section(&self, id: &str, patch: SectionPatch) -> Result<()> {
        self.update("sections", id, &patch).await
    }

    async fn update_sound(&self, id: &str, patch: SoundPatch) -> Result<()> {
        self.update("sounds", id, &patch).await
    }

    async fn delete_section(&self, id: &str) -> Result<()> {
        let id_filter = format!("eq.{}", id);
        let response = self
            .authorized(
                self.client
                    .delete(self.table_url("sections"))
                    .query(&[("id", id_filter.as_str())]),
            )
            .send()
            .await
            .with_context(|| format!("Failed to delete section {}", id))?;
        Self::checked(response, &format!("Delete of section {}", id)).await?;
        Ok(())
    }
}
