//! Index and alias administration.

use std::collections::BTreeSet;

use serde_json::{Map, Value, json};
use tideway_transport::{ApiResponse, StatusCode, Transport};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{IndexName, TypeName};

/// Index manager for creating and managing indices and aliases.
///
/// Obtained from [`Client::indices`](crate::Client::indices). Every method
/// is a single request against the engine's admin endpoints.
#[derive(Debug, Clone)]
pub struct Indices {
    transport: Transport,
}

impl Indices {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Create an index, optionally with initial settings.
    pub async fn create(&self, index: &IndexName, settings: Option<&IndexSettings>) -> Result<()> {
        info!("Creating index: {}", index);

        let request = self.transport.put([index.as_str()]);
        let request = match settings {
            Some(settings) => {
                request.json(&json!({ "settings": { "index": settings.to_json() } }))
            }
            None => request,
        };
        request.send().await?;
        Ok(())
    }

    /// Delete an index. Deleting an index that does not exist is a no-op.
    pub async fn delete(&self, index: &IndexName) -> Result<()> {
        info!("Deleting index: {}", index);

        match self.transport.delete([index.as_str()]).send().await {
            Ok(_) => Ok(()),
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
                debug!("Index {} was already absent", index);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether an index exists.
    pub async fn exists(&self, index: &IndexName) -> Result<bool> {
        debug!("Checking if index exists: {}", index);

        Ok(self.transport.head([index.as_str()]).exists().await?)
    }

    /// Fetch an index's settings.
    ///
    /// Returns the `settings.index` subtree as the engine reports it; note
    /// that the engine renders numeric settings as strings.
    pub async fn settings_get(&self, index: &IndexName) -> Result<Value> {
        debug!("Getting settings for index: {}", index);

        let response = self
            .transport
            .get([index.as_str(), "_settings"])
            .send()
            .await
            .map_err(|e| Error::from(e).map_not_found(|| format!("index {index}")))?;
        subtree(
            &response,
            &[index.as_str(), "settings", "index"],
            &format!("settings for index {index}"),
        )
    }

    /// Update an index's settings.
    ///
    /// Only dynamically updatable settings are accepted by the engine;
    /// shard count, notably, is fixed at creation.
    pub async fn settings_put(&self, index: &IndexName, settings: &IndexSettings) -> Result<()> {
        info!("Updating settings for index: {}", index);

        self.transport
            .put([index.as_str(), "_settings"])
            .json(&json!({ "index": settings.to_json() }))
            .send()
            .await
            .map_err(|e| Error::from(e).map_not_found(|| format!("index {index}")))?;
        Ok(())
    }

    /// Refresh an index, making recent writes visible to search.
    pub async fn refresh(&self, index: &IndexName) -> Result<()> {
        debug!("Refreshing index: {}", index);

        self.transport
            .post([index.as_str(), "_refresh"])
            .send()
            .await
            .map_err(|e| Error::from(e).map_not_found(|| format!("index {index}")))?;
        Ok(())
    }

    /// Fetch an index's mappings, optionally narrowed to one type.
    pub async fn mapping_get(
        &self,
        index: &IndexName,
        doc_type: Option<&TypeName>,
    ) -> Result<Value> {
        debug!("Getting mappings for index: {}", index);

        let mut segments = vec![index.as_str(), "_mapping"];
        if let Some(doc_type) = doc_type {
            segments.push(doc_type.as_str());
        }
        let response = self
            .transport
            .get(segments)
            .send()
            .await
            .map_err(|e| Error::from(e).map_not_found(|| format!("index {index}")))?;
        subtree(
            &response,
            &[index.as_str(), "mappings"],
            &format!("mappings for index {index}"),
        )
    }

    /// Put a mapping for one type of an index.
    pub async fn mapping_put(
        &self,
        index: &IndexName,
        doc_type: &TypeName,
        mapping: &Value,
    ) -> Result<()> {
        info!("Updating mapping for {}/{}", index, doc_type);

        self.transport
            .put([index.as_str(), "_mapping", doc_type.as_str()])
            .json(mapping)
            .send()
            .await
            .map_err(|e| Error::from(e).map_not_found(|| format!("index {index}")))?;
        Ok(())
    }

    /// Point `alias` at `index`, additionally to any indices it already
    /// covers.
    pub async fn alias_add(&self, index: &IndexName, alias: &str) -> Result<()> {
        self.alias_action("add", index, alias).await
    }

    /// Remove `index` from the indices `alias` covers.
    pub async fn alias_remove(&self, index: &IndexName, alias: &str) -> Result<()> {
        self.alias_action("remove", index, alias).await
    }

    async fn alias_action(&self, action: &str, index: &IndexName, alias: &str) -> Result<()> {
        require_alias(alias)?;
        info!("Alias {}: {} for index {}", action, alias, index);

        let body = json!({
            "actions": [{ action: { "index": index.as_str(), "alias": alias } }]
        });
        self.transport
            .post(["_aliases"])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::from(e).map_not_found(|| format!("index {index}")))?;
        Ok(())
    }

    /// Drop an alias from every index carrying it. Deleting an alias that
    /// does not exist is a no-op.
    pub async fn alias_delete(&self, alias: &str) -> Result<()> {
        require_alias(alias)?;
        info!("Deleting alias: {}", alias);

        match self
            .transport
            .delete(["_all", "_alias", alias])
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
                debug!("Alias {} was already absent", alias);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The set of indices an alias points at.
    pub async fn alias_get(&self, alias: &str) -> Result<BTreeSet<IndexName>> {
        require_alias(alias)?;
        debug!("Getting alias: {}", alias);

        let response = self
            .transport
            .get(["_alias", alias])
            .send()
            .await
            .map_err(|e| Error::from(e).map_not_found(|| format!("alias {alias}")))?;
        let Some(Value::Object(map)) = response.json() else {
            return Err(Error::UnexpectedResponse(format!(
                "alias {alias} response is not an object"
            )));
        };
        map.keys().map(|name| IndexName::new(name.as_str())).collect()
    }

    /// Check whether an alias exists on any index.
    pub async fn alias_exists(&self, alias: &str) -> Result<bool> {
        require_alias(alias)?;
        debug!("Checking if alias exists: {}", alias);

        Ok(self.transport.head(["_alias", alias]).exists().await?)
    }
}

fn require_alias(alias: &str) -> Result<()> {
    if alias.is_empty() {
        return Err(Error::Validation("alias name must not be empty".to_string()));
    }
    Ok(())
}

/// Walk `path` into the response body, cloning the subtree at its end.
fn subtree(response: &ApiResponse, path: &[&str], what: &str) -> Result<Value> {
    let mut node = response.json();
    for key in path {
        node = node.and_then(|value| value.get(key));
    }
    node.cloned()
        .ok_or_else(|| Error::UnexpectedResponse(format!("missing {what} in response")))
}

/// Index settings for index creation and settings updates.
///
/// Models the handful of settings this client manages; the engine accepts
/// many more.
#[derive(Debug, Clone, Default)]
pub struct IndexSettings {
    /// Number of primary shards.
    pub number_of_shards: Option<u32>,
    /// Number of replicas per shard.
    pub number_of_replicas: Option<u32>,
    /// Refresh interval, e.g. `"1s"` or `"-1"` to disable.
    pub refresh_interval: Option<String>,
}

impl IndexSettings {
    /// Create empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of primary shards.
    pub fn shards(mut self, shards: u32) -> Self {
        self.number_of_shards = Some(shards);
        self
    }

    /// Set the number of replicas per shard.
    pub fn replicas(mut self, replicas: u32) -> Self {
        self.number_of_replicas = Some(replicas);
        self
    }

    /// Set the refresh interval.
    pub fn refresh_interval(mut self, interval: impl Into<String>) -> Self {
        self.refresh_interval = Some(interval.into());
        self
    }

    pub(crate) fn to_json(&self) -> Value {
        let mut settings = Map::new();
        if let Some(shards) = self.number_of_shards {
            settings.insert("number_of_shards".to_string(), json!(shards));
        }
        if let Some(replicas) = self.number_of_replicas {
            settings.insert("number_of_replicas".to_string(), json!(replicas));
        }
        if let Some(interval) = &self.refresh_interval {
            settings.insert("refresh_interval".to_string(), json!(interval));
        }
        Value::Object(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_to_json() {
        let settings = IndexSettings::new().shards(6).replicas(3);
        assert_eq!(
            settings.to_json(),
            json!({"number_of_shards": 6, "number_of_replicas": 3})
        );

        let settings = IndexSettings::new().refresh_interval("-1");
        assert_eq!(settings.to_json(), json!({"refresh_interval": "-1"}));

        assert_eq!(IndexSettings::new().to_json(), json!({}));
    }

    #[test]
    fn test_empty_alias_rejected() {
        assert!(require_alias("").is_err());
        assert!(require_alias("live").is_ok());
    }
}
