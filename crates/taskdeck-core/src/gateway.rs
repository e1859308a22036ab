use anyhow::{Context, anyhow, bail};
use reqwest::Method;
use tracing::debug;

use crate::config::Config;
use crate::task::{Task, TaskDraft};

/// Route templates for the remote task API. Exact paths vary between
/// deployments, so every one of them is configurable; `{id}` is substituted
/// for the per-task operations.
#[derive(Debug, Clone)]
pub struct Routes {
    pub list: String,
    pub get: String,
    pub create: String,
    pub update: String,
    pub delete: String,
}

impl Routes {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let route = |key: &str| {
            cfg.get(key)
                .ok_or_else(|| anyhow!("{key} is not configured"))
        };
        Ok(Self {
            list: route("route.list")?,
            get: route("route.get")?,
            create: route("route.create")?,
            update: route("route.update")?,
            delete: route("route.delete")?,
        })
    }

    pub fn fill(template: &str, id: &str) -> String {
        template.replace("{id}", id)
    }
}

/// The remote task gateway. `update` is a whole-record replace, not a patch;
/// callers must submit the full record.
#[allow(async_fn_in_trait)]
pub trait TaskGateway {
    async fn list(&self) -> anyhow::Result<Vec<Task>>;
    async fn get(&self, id: &str) -> anyhow::Result<Task>;
    async fn create(&self, draft: &TaskDraft) -> anyhow::Result<Task>;
    async fn update(&self, id: &str, record: &Task) -> anyhow::Result<Task>;
    async fn delete(&self, id: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    routes: Routes,
    session_cookie: Option<String>,
}

impl HttpGateway {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let base_url = cfg
            .get("gateway.url")
            .ok_or_else(|| anyhow!("gateway.url is not configured"))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .build()
            .context("failed building HTTP client")?;

        Ok(Self {
            client,
            base_url,
            routes: Routes::from_config(cfg)?,
            session_cookie: cfg.get("gateway.session-cookie"),
        })
    }

    fn request(&self, method: Method, route: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, route);
        let mut request = self.client.request(method, url);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(reqwest::header::COOKIE, cookie.clone());
        }
        request
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        route: &str,
    ) -> anyhow::Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .with_context(|| format!("request to {route} failed"))?;

        // Non-2xx is a failure regardless of what the body says.
        let status = response.status();
        if !status.is_success() {
            bail!("gateway returned {status} for {route}");
        }
        Ok(response)
    }
}

impl TaskGateway for HttpGateway {
    async fn list(&self) -> anyhow::Result<Vec<Task>> {
        let route = self.routes.list.clone();
        let response = self.send(self.request(Method::GET, &route), &route).await?;
        let tasks: Vec<Task> = response
            .json()
            .await
            .with_context(|| format!("failed decoding task list from {route}"))?;
        debug!(count = tasks.len(), "fetched task list");
        Ok(tasks)
    }

    async fn get(&self, id: &str) -> anyhow::Result<Task> {
        let route = Routes::fill(&self.routes.get, id);
        let response = self.send(self.request(Method::GET, &route), &route).await?;
        response
            .json()
            .await
            .with_context(|| format!("failed decoding task from {route}"))
    }

    async fn create(&self, draft: &TaskDraft) -> anyhow::Result<Task> {
        let route = self.routes.create.clone();
        let response = self
            .send(self.request(Method::POST, &route).json(draft), &route)
            .await?;
        let created: Task = response
            .json()
            .await
            .with_context(|| format!("failed decoding created task from {route}"))?;
        debug!(id = %created.id, "created task");
        Ok(created)
    }

    async fn update(&self, id: &str, record: &Task) -> anyhow::Result<Task> {
        let route = Routes::fill(&self.routes.update, id);
        let response = self
            .send(self.request(Method::PUT, &route).json(record), &route)
            .await?;
        response
            .json()
            .await
            .with_context(|| format!("failed decoding updated task from {route}"))
    }

    async fn delete(&self, id: &str) -> anyhow::Result<()> {
        let route = Routes::fill(&self.routes.delete, id);
        // Success is the status code alone; the body is ignored.
        self.send(self.request(Method::DELETE, &route), &route)
            .await?;
        debug!(id, "deleted task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Routes;

    #[test]
    fn fill_substitutes_the_id_placeholder() {
        assert_eq!(
            Routes::fill("/director/update-task/{id}", "abc123"),
            "/director/update-task/abc123"
        );
        assert_eq!(Routes::fill("/director/get-task", "abc123"), "/director/get-task");
    }
}
