use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{resource_list_from_value, resources, user_tags_from_value, AdminApi, ResourceList, RoleEntry, RoleQuery, SeriesTheme, UserTag};
use crate::acl::{AccessUpdate, ManagedAcl, SeriesAccessEnvelope};
use crate::config::AdminConfig;
use crate::error::{AppError, AppResult};
use crate::feeds::FeedDescriptor;
use crate::identity::CurrentUser;
use crate::series::metadata::{Catalog, SeriesMetadata};

/// `reqwest`-backed client for the admin REST API. Cheap to clone; the
/// underlying connection pool and cookie jar are shared.
#[derive(Clone)]
pub struct HttpAdminApi {
    base: Url,
    client: reqwest::Client,
    user: Option<String>,
    password: Option<String>,
}

impl HttpAdminApi {
    pub fn new(cfg: &AdminConfig) -> AppResult<Self> {
        cfg.validate()?;
        let base = Url::parse(&cfg.base_url)
            .map_err(|e| AppError::user("invalid_url", format!("invalid base URL {}: {}", cfg.base_url, e)))?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(cfg.request_timeout())
            .build()?;
        Ok(Self { base, client, user: cfg.user.clone(), password: cfg.password.clone() })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> AppResult<Url> {
        self.base
            .join(path)
            .map_err(|e| AppError::user("invalid_url", format!("{}: {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        let url = self.url(path)?;
        debug!(target: "series_access", "{} {}", method, url);
        let mut rb = self.client.request(method, url);
        if let Some(user) = &self.user {
            rb = rb.basic_auth(user, self.password.as_ref());
        }
        Ok(rb)
    }

    async fn send(rb: RequestBuilder) -> AppResult<reqwest::Response> {
        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::from_status(status.as_u16(), &body));
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let resp = Self::send(self.request(Method::GET, path)?).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn seg(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

impl AdminApi for HttpAdminApi {
    async fn current_user(&self) -> AppResult<CurrentUser> {
        self.get_json("/info/me.json").await
    }

    async fn series_access(&self, series_id: &str) -> AppResult<SeriesAccessEnvelope> {
        self.get_json(&format!("/admin-ng/series/{}/access.json", seg(series_id))).await
    }

    async fn save_series_access(&self, series_id: &str, update: &AccessUpdate) -> AppResult<()> {
        let fields = update.form_fields()?;
        let rb = self.request(Method::POST, &format!("/admin-ng/series/{}/access", seg(series_id)))?.form(&fields);
        Self::send(rb).await?;
        Ok(())
    }

    async fn managed_acl(&self, acl_id: i64) -> AppResult<ManagedAcl> {
        self.get_json(&format!("/acl-manager/acl/{}", acl_id)).await
    }

    async fn list_roles(&self, query: &RoleQuery) -> AppResult<Vec<RoleEntry>> {
        let rb = self
            .request(Method::GET, &format!("/admin-ng/resources/{}.json", resources::ROLES))?
            .query(&query.params());
        let resp = Self::send(rb).await?;
        let v: Value = serde_json::from_slice(&resp.bytes().await?)?;
        match v {
            Value::Array(_) => Ok(serde_json::from_value(v)?),
            Value::Object(map) => Ok(map
                .into_iter()
                .filter(|(k, _)| !k.starts_with('$'))
                .map(|(name, value)| RoleEntry { name, value: value.as_str().map(str::to_string) })
                .collect()),
            other => Err(AppError::decode("invalid_roles", format!("unexpected roles payload: {}", other))),
        }
    }

    async fn resource_list(&self, name: &str) -> AppResult<ResourceList> {
        let v: Value = self.get_json(&format!("/admin-ng/resources/{}.json", seg(name))).await?;
        Ok(resource_list_from_value(v))
    }

    async fn switch_users(&self) -> AppResult<Vec<UserTag>> {
        let v: Value = self.get_json(&format!("/admin-ng/resources/{}.json", resources::SWITCH_USERS)).await?;
        Ok(user_tags_from_value(v))
    }

    async fn series_metadata(&self, series_id: &str) -> AppResult<SeriesMetadata> {
        let v: Value = self.get_json(&format!("/admin-ng/series/{}/metadata.json", seg(series_id))).await?;
        SeriesMetadata::from_value(v)
    }

    async fn save_series_metadata(&self, series_id: &str, catalog: &Catalog) -> AppResult<()> {
        let body = serde_json::to_string(&[catalog])?;
        let rb = self
            .request(Method::PUT, &format!("/admin-ng/series/{}/metadata", seg(series_id)))?
            .form(&[("metadata", body)]);
        Self::send(rb).await?;
        Ok(())
    }

    async fn series_theme(&self, series_id: &str) -> AppResult<SeriesTheme> {
        self.get_json(&format!("/admin-ng/series/{}/theme.json", seg(series_id))).await
    }

    async fn save_series_theme(&self, series_id: &str, theme_id: &str) -> AppResult<()> {
        let rb = self
            .request(Method::PUT, &format!("/admin-ng/series/{}/theme", seg(series_id)))?
            .form(&[("themeId", theme_id)]);
        Self::send(rb).await?;
        Ok(())
    }

    async fn delete_series_theme(&self, series_id: &str) -> AppResult<()> {
        Self::send(self.request(Method::DELETE, &format!("/admin-ng/series/{}/theme", seg(series_id)))?).await?;
        Ok(())
    }

    async fn feeds(&self) -> AppResult<Vec<FeedDescriptor>> {
        self.get_json("/admin-ng/feeds/feeds").await
    }
}
