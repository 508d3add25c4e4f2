use std::future::Future;
use std::time::Duration;

use reqwest::{Certificate, Client, Identity, StatusCode};
use serde_json::{json, Value};

use crate::config::EsConnectionConfig;
use crate::constants::{BULK_CHUNK_SIZE, INDEX_STORE_MAX_RETRIES, INDEX_STORE_TIMEOUT_SECS, MAX_HITS_PER_SEARCH};
use crate::error::{Error, Result};

use super::types::{BulkOperation, BulkResponse, EsBulkResponse, EsSearchResponse, SearchHit};

/// REST client for an Elasticsearch-compatible index store (§4.4).
///
/// This talks to an external cluster over HTTPS; it does not embed a
/// search engine of its own — the inverted-index store itself is out of
/// scope for this crate.
pub struct IndexGateway {
    client: Client,
    base_url: String,
}

impl IndexGateway {
    pub fn new(config: &EsConnectionConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(INDEX_STORE_TIMEOUT_SECS));

        if config.turn_off_ssl_verification || !config.verify_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(ca_cert_path) = &config.ca_cert {
            let pem = std::fs::read(ca_cert_path)?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }
        if let (Some(cert_path), Some(key_path)) = (&config.client_cert, &config.client_key) {
            let mut pem = std::fs::read(cert_path)?;
            pem.extend(std::fs::read(key_path)?);
            builder = builder.identity(Identity::from_pem(&pem)?);
        }

        let scheme = if config.use_ssl { "https" } else { "http" };
        let base_url = if config.host.starts_with("http://") || config.host.starts_with("https://") {
            config.host.clone()
        } else {
            format!("{scheme}://{}", config.host)
        };

        Ok(Self { client: builder.build()?, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Retries `send` up to [`INDEX_STORE_MAX_RETRIES`] times on timeout,
    /// per the per-call contract in §4.4.
    async fn with_retries<F, Fut>(&self, mut send: F) -> reqwest::Result<reqwest::Response>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = reqwest::Result<reqwest::Response>>,
    {
        let mut last_err = None;
        for attempt in 0..=INDEX_STORE_MAX_RETRIES {
            match send().await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_timeout() && attempt < INDEX_STORE_MAX_RETRIES => {
                    last_err = Some(err);
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.expect("loop always runs at least once"))
    }

    /// Explicit existence probe (§9: replaces exception-for-control-flow).
    /// Transport errors are logged and swallowed, returning `false`.
    pub async fn index_exists(&self, index: &str) -> bool {
        match self.client.head(self.url(index)).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::warn!(index, error = %err, "index existence probe failed, assuming absent");
                false
            }
        }
    }

    /// Idempotent create: a no-op if `index` already exists.
    pub async fn create_index_if_not_exists(&self, index: &str, settings: Value) -> Result<()> {
        if self.index_exists(index).await {
            return Ok(());
        }
        match self.client.put(self.url(index)).json(&settings).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                Err(Error::IndexStore { status, body })
            }
            Err(err) => {
                tracing::warn!(index, error = %err, "create_index_if_not_exists failed");
                Err(Error::Http(err))
            }
        }
    }

    /// Deletes `index`. Transport errors and a 404 (already gone) are
    /// logged and swallowed — this is a maintenance call.
    pub async fn delete_index(&self, index: &str) {
        match self.client.delete(self.url(index)).send().await {
            Ok(response) if response.status().is_success() || response.status() == StatusCode::NOT_FOUND => {}
            Ok(response) => {
                tracing::warn!(index, status = %response.status(), "delete_index returned an error status");
            }
            Err(err) => {
                tracing::warn!(index, error = %err, "delete_index transport error");
            }
        }
    }

    /// Clears the read-only-after-disk-full block cluster-wide, used by
    /// the bulk retry-once recovery path.
    async fn clear_read_only_block(&self) {
        let body = json!({ "index.blocks.read_only_allow_delete": null });
        if let Err(err) = self.client.put(self.url("_all/_settings")).json(&body).send().await {
            tracing::warn!(error = %err, "failed to clear read-only-allow-delete block");
        }
    }

    async fn bulk_once(&self, index: &str, chunk: &[BulkOperation], refresh: bool) -> reqwest::Result<EsBulkResponse> {
        let mut body = String::new();
        for op in chunk {
            for line in op.to_ndjson_lines(index) {
                body.push_str(&line);
                body.push('\n');
            }
        }
        let mut request = self.client.post(self.url("_bulk")).header("Content-Type", "application/x-ndjson").body(body);
        if refresh {
            request = request.query(&[("refresh", "true")]);
        }
        let response = self.with_retries(|| {
            let request = request.try_clone().expect("bulk request body must be cloneable");
            async move { request.send().await }
        }).await?;
        response.json::<EsBulkResponse>().await
    }

    /// Executes `ops` against `index` in chunks of [`BULK_CHUNK_SIZE`].
    /// On a failed chunk, clears the read-only block and retries that
    /// chunk once; if it still fails the whole call degrades to
    /// `{took: 0, errors: true}` rather than propagating an error (§7).
    pub async fn bulk(&self, index: &str, ops: &[BulkOperation], refresh: bool) -> BulkResponse {
        let mut total_took = 0u64;
        let mut any_errors = false;

        for chunk in ops.chunks(BULK_CHUNK_SIZE) {
            match self.bulk_once(index, chunk, refresh).await {
                Ok(result) if !result.errors => {
                    total_took += result.took;
                }
                Ok(result) => {
                    tracing::warn!(index, "bulk chunk reported errors, clearing read-only block and retrying once");
                    self.clear_read_only_block().await;
                    match self.bulk_once(index, chunk, refresh).await {
                        Ok(retry_result) => {
                            total_took += retry_result.took;
                            any_errors |= retry_result.errors;
                        }
                        Err(err) => {
                            tracing::warn!(index, error = %err, "bulk retry failed");
                            any_errors = true;
                        }
                    }
                    let _ = result;
                }
                Err(err) => {
                    tracing::warn!(index, error = %err, "bulk chunk transport error, clearing read-only block and retrying once");
                    self.clear_read_only_block().await;
                    match self.bulk_once(index, chunk, refresh).await {
                        Ok(retry_result) => {
                            total_took += retry_result.took;
                            any_errors |= retry_result.errors;
                        }
                        Err(retry_err) => {
                            tracing::warn!(index, error = %retry_err, "bulk retry failed");
                            any_errors = true;
                        }
                    }
                }
            }
        }

        if any_errors {
            BulkResponse { took: 0, errors: true }
        } else {
            BulkResponse { took: total_took, errors: false }
        }
    }

    /// Single-page search. Returns the raw hits list; callers on the
    /// analysis path are expected to skip (not fail) a log whose search
    /// errors (§4.4, §7).
    pub async fn search(&self, index: &str, query: Value) -> Result<Vec<SearchHit>> {
        let mut body = query;
        if let Value::Object(ref mut map) = body {
            map.entry("size").or_insert(json!(MAX_HITS_PER_SEARCH));
        }
        let url = self.url(&format!("{index}/_search"));
        let response = self
            .with_retries(|| {
                let client = &self.client;
                let url = url.clone();
                let body = body.clone();
                async move { client.post(url).json(&body).send().await }
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::IndexStore { status, body });
        }

        let parsed: EsSearchResponse = response.json().await?;
        Ok(parsed.hits.hits)
    }

    /// Starts a scroll and returns a lazy, finite stream of hits across
    /// pages (§9: generators-over-scroll resolved as an explicit,
    /// cancellable iterator — dropping the stream stops paging).
    pub fn scroll<'a>(
        &'a self,
        index: &'a str,
        query: Value,
        scroll_ttl: &'a str,
    ) -> impl futures::Stream<Item = Result<SearchHit>> + 'a {
        async_stream::try_stream! {
            let init_url = self.url(&format!("{index}/_search?scroll={scroll_ttl}"));
            let response = self
                .with_retries(|| {
                    let client = &self.client;
                    let url = init_url.clone();
                    let query = query.clone();
                    async move { client.post(url).json(&query).send().await }
                })
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                Err(Error::IndexStore { status, body })?;
                return;
            }

            let mut page: EsSearchResponse = response.json().await?;
            let mut scroll_id = page.scroll_id.clone();

            loop {
                let hits = std::mem::take(&mut page.hits.hits);
                if hits.is_empty() {
                    break;
                }
                for hit in hits {
                    yield hit;
                }

                let Some(ref sid) = scroll_id else { break };
                let next_url = self.url("_search/scroll");
                let body = json!({ "scroll": scroll_ttl, "scroll_id": sid });
                let response = self
                    .with_retries(|| {
                        let client = &self.client;
                        let url = next_url.clone();
                        let body = body.clone();
                        async move { client.post(url).json(&body).send().await }
                    })
                    .await?;
                if !response.status().is_success() {
                    break;
                }
                page = response.json().await?;
                scroll_id = page.scroll_id.clone();
            }

            if let Some(sid) = scroll_id {
                let clear_url = self.url("_search/scroll");
                let _ = self.client.delete(clear_url).json(&json!({ "scroll_id": sid })).send().await;
            }
        }
    }
}
