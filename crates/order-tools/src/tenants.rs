//! Tenant credential registry.
//!
//! Tenants are read once at start-up from `WOO_<TENANT>_URL`, `WOO_<TENANT>_KEY` and
//! `WOO_<TENANT>_SECRET`. The resulting registry is immutable and shared by reference.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

const VAR_PREFIX: &str = "WOO_";
const LEGACY_DEMO_TENANT: &str = "demo";

/// Upstream credentials for one store.
#[derive(Clone, PartialEq, Eq)]
pub struct TenantConfig {
    pub id: String,
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
}

// Keep secrets out of `{:?}` output (logs, panics in tests).
impl fmt::Debug for TenantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantConfig")
            .field("id", &self.id)
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TenantLookupError {
    #[error("unknown tenant")]
    Unknown,
    #[error("tenant is missing one of url/key/secret")]
    Incomplete,
}

impl TenantLookupError {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Unknown => "unknown_tenant",
            Self::Incomplete => "bad_tenant_config",
        }
    }
}

#[derive(Debug, Default)]
struct PartialTenant {
    url: Option<String>,
    key: Option<String>,
    secret: Option<String>,
}

impl PartialTenant {
    fn complete(self, id: &str) -> Option<TenantConfig> {
        Some(TenantConfig {
            id: id.to_string(),
            base_url: self.url?.trim_end_matches('/').to_string(),
            api_key: self.key?,
            api_secret: self.secret?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TenantRegistry {
    tenants: BTreeMap<String, TenantConfig>,
    incomplete: BTreeSet<String>,
}

impl TenantRegistry {
    /// Build a registry from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build a registry from arbitrary `(name, value)` pairs.
    ///
    /// Blank values count as missing. When no `WOO_*` tenant is complete, the legacy
    /// `DEMO_URL`/`DEMO_KEY`/`DEMO_SECRET` triple registers a `demo` tenant.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut partial: BTreeMap<String, PartialTenant> = BTreeMap::new();
        let mut legacy = PartialTenant::default();

        for (name, value) in vars {
            let name = name.as_ref();
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }

            match name {
                "DEMO_URL" => legacy.url = Some(value.to_string()),
                "DEMO_KEY" => legacy.key = Some(value.to_string()),
                "DEMO_SECRET" => legacy.secret = Some(value.to_string()),
                _ => {}
            }

            let Some((tenant, field)) = parse_var_name(name) else {
                continue;
            };
            let entry = partial.entry(tenant).or_default();
            match field {
                Field::Url => entry.url = Some(value.to_string()),
                Field::Key => entry.key = Some(value.to_string()),
                Field::Secret => entry.secret = Some(value.to_string()),
            }
        }

        let mut tenants = BTreeMap::new();
        let mut incomplete = BTreeSet::new();
        for (id, p) in partial {
            match p.complete(&id) {
                Some(cfg) => {
                    tenants.insert(id, cfg);
                }
                None => {
                    incomplete.insert(id);
                }
            }
        }

        if tenants.is_empty()
            && let Some(cfg) = legacy.complete(LEGACY_DEMO_TENANT)
        {
            incomplete.remove(LEGACY_DEMO_TENANT);
            tenants.insert(LEGACY_DEMO_TENANT.to_string(), cfg);
        }

        Self {
            tenants,
            incomplete,
        }
    }

    /// Look up a tenant by id (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`TenantLookupError::Incomplete`] for tenants with partial configuration and
    /// [`TenantLookupError::Unknown`] for everything else that is not configured.
    pub fn resolve(&self, tenant_id: &str) -> Result<&TenantConfig, TenantLookupError> {
        let id = normalize_tenant_id(tenant_id);
        if let Some(cfg) = self.tenants.get(&id) {
            return Ok(cfg);
        }
        if self.incomplete.contains(&id) {
            return Err(TenantLookupError::Incomplete);
        }
        Err(TenantLookupError::Unknown)
    }

    /// Configured (complete) tenant ids, sorted.
    #[must_use]
    pub fn tenant_ids(&self) -> Vec<String> {
        self.tenants.keys().cloned().collect()
    }

    /// Ids that were mentioned in the environment but lack url, key or secret.
    #[must_use]
    pub fn incomplete_ids(&self) -> Vec<String> {
        self.incomplete.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

impl FromIterator<TenantConfig> for TenantRegistry {
    fn from_iter<T: IntoIterator<Item = TenantConfig>>(iter: T) -> Self {
        let tenants = iter
            .into_iter()
            .map(|mut cfg| {
                cfg.id = normalize_tenant_id(&cfg.id);
                cfg.base_url = cfg.base_url.trim_end_matches('/').to_string();
                (cfg.id.clone(), cfg)
            })
            .collect();
        Self {
            tenants,
            incomplete: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Url,
    Key,
    Secret,
}

fn normalize_tenant_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// `WOO_SHOP_1_URL` => `("shop_1", Url)`.
fn parse_var_name(name: &str) -> Option<(String, Field)> {
    let upper = name.to_ascii_uppercase();
    let rest = upper.strip_prefix(VAR_PREFIX)?;
    let (tenant, field) = rest.rsplit_once('_')?;
    let field = match field {
        "URL" => Field::Url,
        "KEY" => Field::Key,
        "SECRET" => Field::Secret,
        _ => return None,
    };
    let valid = !tenant.is_empty()
        && tenant
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
    valid.then(|| (tenant.to_ascii_lowercase(), field))
}
