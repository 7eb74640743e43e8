use crate::EnrichmentError;

pub const POLYGON_API_KEY_VAR: &str = "POLYGON_API_KEY";
pub const BENZINGA_API_KEY_VAR: &str = "BENZINGA_API_KEY";
pub const BENZINGA_EDGE_API_KEY_VAR: &str = "BENZINGA_EDGE_API_KEY";

/// The three provider keys a batch needs. Read-only once built.
#[derive(Clone, Default)]
pub struct SourceCredentials {
    pub polygon_api_key: Option<String>,
    pub benzinga_api_key: Option<String>,
    pub benzinga_edge_api_key: Option<String>,
}

impl SourceCredentials {
    pub fn new(
        polygon_api_key: impl Into<String>,
        benzinga_api_key: impl Into<String>,
        benzinga_edge_api_key: impl Into<String>,
    ) -> Self {
        Self {
            polygon_api_key: Some(polygon_api_key.into()),
            benzinga_api_key: Some(benzinga_api_key.into()),
            benzinga_edge_api_key: Some(benzinga_edge_api_key.into()),
        }
    }

    /// Reads the keys from the process environment. Unset or blank keys stay `None`.
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            polygon_api_key: read(POLYGON_API_KEY_VAR),
            benzinga_api_key: read(BENZINGA_API_KEY_VAR),
            benzinga_edge_api_key: read(BENZINGA_EDGE_API_KEY_VAR),
        }
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.polygon_api_key) {
            missing.push(POLYGON_API_KEY_VAR);
        }
        if blank(&self.benzinga_api_key) {
            missing.push(BENZINGA_API_KEY_VAR);
        }
        if blank(&self.benzinga_edge_api_key) {
            missing.push(BENZINGA_EDGE_API_KEY_VAR);
        }
        missing
    }

    /// Checked once per batch, before any provider is contacted.
    pub fn validate(&self) -> Result<ValidatedCredentials, EnrichmentError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(EnrichmentError::MissingCredentials(missing));
        }
        Ok(ValidatedCredentials {
            polygon_api_key: self.polygon_api_key.clone().unwrap_or_default(),
            benzinga_api_key: self.benzinga_api_key.clone().unwrap_or_default(),
            benzinga_edge_api_key: self.benzinga_edge_api_key.clone().unwrap_or_default(),
        })
    }

    /// Presence summary safe to log.
    pub fn presence(&self) -> [(&'static str, &'static str); 3] {
        let state = |v: &Option<String>| if v.is_some() { "present" } else { "missing" };
        [
            (POLYGON_API_KEY_VAR, state(&self.polygon_api_key)),
            (BENZINGA_API_KEY_VAR, state(&self.benzinga_api_key)),
            (BENZINGA_EDGE_API_KEY_VAR, state(&self.benzinga_edge_api_key)),
        ]
    }
}

impl std::fmt::Debug for SourceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.presence();
        f.debug_struct("SourceCredentials")
            .field("polygon_api_key", &p[0].1)
            .field("benzinga_api_key", &p[1].1)
            .field("benzinga_edge_api_key", &p[2].1)
            .finish()
    }
}

/// Credentials that passed [`SourceCredentials::validate`]; every key is non-empty.
#[derive(Clone)]
pub struct ValidatedCredentials {
    pub polygon_api_key: String,
    pub benzinga_api_key: String,
    pub benzinga_edge_api_key: String,
}
