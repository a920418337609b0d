//! Data handed to templates

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::Context;
use crate::issue::{CollectExt, Scope};
use crate::Result;

/// Local secret cache read from the project root.
pub const SECRETS_CACHE_FILE: &str = ".vaulty";

/// Values available to every template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateData {
    /// Remote data of every configured secret, by secret name.
    pub secrets: Map<String, Value>,
    /// Entries of the local secret cache.
    #[serde(rename = "SECRETS")]
    pub cache: BTreeMap<String, String>,
}

/// Read a dotenv file. A missing file is empty.
pub fn read_secrets_cache(path: &Path) -> std::result::Result<BTreeMap<String, String>, dotenvy::Error> {
    match dotenvy::from_path_iter(path) {
        Ok(entries) => entries.collect(),
        Err(e) if e.not_found() => Ok(BTreeMap::new()),
        Err(e) => Err(e),
    }
}

impl Context {
    /// Template data, built once per context.
    pub async fn template_data(&self) -> Result<TemplateData> {
        self.template_data
            .get_or_try_init(|| async {
                let config = self.config()?;
                let cache_path = config.project.join(SECRETS_CACHE_FILE);
                let issues = self
                    .issues()
                    .scoped(Scope::Secret, Some(cache_path.to_string_lossy()));

                let secrets = self.get_secrets().await?;
                let cache = read_secrets_cache(&cache_path).collect_into(&issues)?;
                tracing::debug!(
                    secrets = secrets.len(),
                    cached = cache.len(),
                    "template data ready"
                );

                Ok(TemplateData {
                    secrets: secrets
                        .into_iter()
                        .map(|secret| (secret.key, Value::Object(secret.data)))
                        .collect(),
                    cache,
                })
            })
            .await
            .cloned()
    }
}
