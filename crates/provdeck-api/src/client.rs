// Hand-crafted async HTTP client for the provisioning service's v3 API.
//
// Base path: /api/v3/
// No authentication: the service trusts its management network.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{BootEnv, Iface, Machine, Subnet};

// ── Error response shape from the service ────────────────────────────

// The full envelope also carries Model/Key/Type; only Messages matters
// to callers, and absent Messages must not fail the parse.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default, rename = "Messages")]
    messages: Vec<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the provisioning service's v3 REST API.
///
/// Thin JSON-over-HTTP wrapper: resources live under `/api/v3/{kind}`,
/// keyed entries under `/api/v3/{kind}/{key}`. Create and update return
/// the canonical entity as stored by the server.
pub struct ProvisionClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ProvisionClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a server URL and transport config.
    ///
    /// `base_url` is the server root (e.g. `http://192.168.124.1:8092`);
    /// the `/api/v3/` prefix is appended here if not already present.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The resolved base URL, always ending in `/api/v3/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;

        // Strip trailing slash for uniform handling
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api/v3") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/v3/"));
        }

        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"subnets"`) onto the base URL.
    fn url(&self, path: &str) -> Url {
        // base_url always ends with `/api/v3/`, so joining `subnets/…` works.
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path);
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    // DELETE answers with the removed entity; nobody needs it.
    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let messages = serde_json::from_str::<ErrorResponse>(&raw)
            .map(|e| e.messages)
            .unwrap_or_default();

        Error::Api {
            status: status.as_u16(),
            messages,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Generic resource surface ─────────────────────────────────────
    //
    // Every kind follows the same four routes, so higher layers that are
    // generic over the resource kind go through these.

    pub async fn list<T: DeserializeOwned>(&self, kind: &str) -> Result<Vec<T>, Error> {
        self.get(kind).await
    }

    pub async fn create<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        kind: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.post(kind, body).await
    }

    pub async fn update<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        kind: &str,
        key: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.put(&format!("{kind}/{key}"), body).await
    }

    pub async fn remove(&self, kind: &str, key: &str) -> Result<(), Error> {
        self.delete(&format!("{kind}/{key}")).await
    }

    // ── Subnets ──────────────────────────────────────────────────────

    pub async fn list_subnets(&self) -> Result<Vec<Subnet>, Error> {
        self.list("subnets").await
    }

    pub async fn create_subnet(&self, body: &Subnet) -> Result<Subnet, Error> {
        self.create("subnets", body).await
    }

    pub async fn update_subnet(&self, name: &str, body: &Subnet) -> Result<Subnet, Error> {
        self.update("subnets", name, body).await
    }

    pub async fn delete_subnet(&self, name: &str) -> Result<(), Error> {
        self.remove("subnets", name).await
    }

    // ── Boot environments ────────────────────────────────────────────

    pub async fn list_bootenvs(&self) -> Result<Vec<BootEnv>, Error> {
        self.list("bootenvs").await
    }

    pub async fn create_bootenv(&self, body: &BootEnv) -> Result<BootEnv, Error> {
        self.create("bootenvs", body).await
    }

    pub async fn update_bootenv(&self, name: &str, body: &BootEnv) -> Result<BootEnv, Error> {
        self.update("bootenvs", name, body).await
    }

    pub async fn delete_bootenv(&self, name: &str) -> Result<(), Error> {
        self.remove("bootenvs", name).await
    }

    // ── Machines ─────────────────────────────────────────────────────
    //
    // Machines are keyed by server-assigned UUID, not name.

    pub async fn list_machines(&self) -> Result<Vec<Machine>, Error> {
        self.list("machines").await
    }

    pub async fn create_machine(&self, body: &Machine) -> Result<Machine, Error> {
        self.create("machines", body).await
    }

    pub async fn update_machine(&self, uuid: &Uuid, body: &Machine) -> Result<Machine, Error> {
        self.update("machines", &uuid.to_string(), body).await
    }

    pub async fn delete_machine(&self, uuid: &Uuid) -> Result<(), Error> {
        self.remove("machines", &uuid.to_string()).await
    }

    // ── Interfaces (read-only) ───────────────────────────────────────

    pub async fn list_interfaces(&self) -> Result<Vec<Iface>, Error> {
        self.list("interfaces").await
    }
}
