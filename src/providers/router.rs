//! Model router resolving providers by pipeline role and default settings.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Context;

use crate::config::{all_model_specs, ModelsConfig};
use crate::credentials::Credentials;

use super::openai::{OpenAiProvider, OPENAI_ENDPOINT, PERPLEXITY_ENDPOINT};
use super::LlmProvider;

/// Pipeline roles that can be routed to different models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    /// Drafting the six-section sequence.
    Draft,
    /// Suppression and structural rewrites of a draft.
    Rewrite,
    /// Prospect research brief.
    Research,
    /// Model-assisted asset selection.
    Assets,
    /// Rewriting email 4 when it repeats email 3.
    Redundancy,
}

impl ModelRole {
    /// Config key used in `[models.roles]`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Rewrite => "rewrite",
            Self::Research => "research",
            Self::Assets => "assets",
            Self::Redundancy => "redundancy",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider routing errors.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Model spec is not in `<provider>/<model>` format.
    #[error("invalid model spec '{spec}', expected '<provider>/<model>'")]
    InvalidModelSpec {
        /// Invalid raw spec.
        spec: String,
    },
    /// The requested provider spec is not available.
    #[error("provider not available for model spec '{spec}'")]
    UnavailableProvider {
        /// Unavailable spec.
        spec: String,
    },
    /// Default provider spec could not be created.
    #[error("default provider '{spec}' is unavailable")]
    DefaultUnavailable {
        /// Missing default spec.
        spec: String,
    },
    /// Unsupported provider type in spec prefix.
    #[error("unsupported provider '{provider}'")]
    UnsupportedProvider {
        /// Unsupported provider prefix.
        provider: String,
    },
    /// Required API credential missing for selected provider.
    #[error("missing credential for provider '{provider}': {key}")]
    MissingCredential {
        /// Provider name.
        provider: String,
        /// Missing credential key.
        key: String,
    },
    /// Configured endpoint could not be used.
    #[error("invalid endpoint for provider '{provider}': {reason}")]
    InvalidEndpoint {
        /// Provider name.
        provider: String,
        /// Why the endpoint was rejected.
        reason: String,
    },
}

/// Model router resolving `role -> default`.
#[derive(Clone)]
pub struct ModelRouter {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    default: String,
    role_overrides: HashMap<String, String>,
}

impl fmt::Debug for ModelRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRouter")
            .field("default", &self.default)
            .field("providers", &self.available_specs())
            .field("role_overrides", &self.role_overrides)
            .finish()
    }
}

impl ModelRouter {
    /// Build a router from model config and loaded credentials.
    ///
    /// Role overrides whose provider cannot be built are skipped with a
    /// warning and fall back to the default.
    ///
    /// # Errors
    ///
    /// Returns an error if a spec is malformed or the default provider cannot
    /// be instantiated.
    pub fn from_config(models: &ModelsConfig, credentials: &Credentials) -> anyhow::Result<Self> {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();

        for spec in all_model_specs(models) {
            let parsed = parse_model_spec(&spec)
                .with_context(|| format!("failed to parse model spec '{spec}'"))?;
            match instantiate_provider(&spec, &parsed, &models.endpoints, credentials) {
                Ok(provider) => {
                    providers.insert(spec.clone(), provider);
                }
                Err(err) if spec == models.default => {
                    return Err(anyhow::Error::new(err).context(RouterError::DefaultUnavailable {
                        spec: spec.clone(),
                    }));
                }
                Err(err) => {
                    tracing::warn!(spec = %spec, error = %err, "skipping unavailable model");
                }
            }
        }

        Ok(Self {
            providers,
            default: models.default.clone(),
            role_overrides: models.roles.clone(),
        })
    }

    /// Create a router backed by a single provider for integration tests.
    #[doc(hidden)]
    pub fn for_testing(default_spec: String, provider: Arc<dyn LlmProvider>) -> Self {
        let mut providers = HashMap::new();
        providers.insert(default_spec.clone(), provider);
        Self {
            providers,
            default: default_spec,
            role_overrides: HashMap::new(),
        }
    }

    /// Add a role-specific provider (tests only).
    #[doc(hidden)]
    #[must_use]
    pub fn with_role(mut self, role: ModelRole, spec: String, provider: Arc<dyn LlmProvider>) -> Self {
        self.providers.insert(spec.clone(), provider);
        self.role_overrides.insert(role.as_str().to_owned(), spec);
        self
    }

    /// Resolve the provider for a pipeline role.
    ///
    /// # Errors
    ///
    /// Returns an error if no provider can be resolved.
    pub fn resolve(&self, role: ModelRole) -> Result<Arc<dyn LlmProvider>, RouterError> {
        let selected = self.resolve_spec(role);
        self.providers
            .get(&selected)
            .cloned()
            .ok_or(RouterError::UnavailableProvider { spec: selected })
    }

    /// Resolve a model spec string for a role (override, then default).
    pub fn resolve_spec(&self, role: ModelRole) -> String {
        if let Some(spec) = self
            .role_overrides
            .get(role.as_str())
            .filter(|spec| self.providers.contains_key(*spec))
        {
            return spec.clone();
        }
        self.default.clone()
    }

    /// Returns true when a specific model spec is available.
    pub fn has_model(&self, spec: &str) -> bool {
        self.providers.contains_key(spec)
    }

    /// Returns all available provider specs in sorted order.
    pub fn available_specs(&self) -> Vec<String> {
        let mut values: Vec<String> = self.providers.keys().cloned().collect();
        values.sort();
        values
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedModelSpec {
    provider: String,
    model: String,
}

fn parse_model_spec(spec: &str) -> Result<ParsedModelSpec, RouterError> {
    let Some((provider, model)) = spec.split_once('/') else {
        return Err(RouterError::InvalidModelSpec {
            spec: spec.to_owned(),
        });
    };
    if provider.is_empty() || model.is_empty() {
        return Err(RouterError::InvalidModelSpec {
            spec: spec.to_owned(),
        });
    }
    Ok(ParsedModelSpec {
        provider: provider.to_owned(),
        model: model.to_owned(),
    })
}

fn instantiate_provider(
    model_spec: &str,
    parsed: &ParsedModelSpec,
    endpoints: &HashMap<String, String>,
    credentials: &Credentials,
) -> Result<Arc<dyn LlmProvider>, RouterError> {
    let (default_endpoint, key_name) = match parsed.provider.as_str() {
        "openai" => (OPENAI_ENDPOINT, "OPENAI_API_KEY"),
        "perplexity" => (PERPLEXITY_ENDPOINT, "PERPLEXITY_API_KEY"),
        other => {
            return Err(RouterError::UnsupportedProvider {
                provider: other.to_owned(),
            })
        }
    };

    let api_key = credentials
        .get(key_name)
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| RouterError::MissingCredential {
            provider: parsed.provider.clone(),
            key: key_name.to_owned(),
        })?;

    let endpoint = endpoints
        .get(&parsed.provider)
        .map_or(default_endpoint, String::as_str);

    let provider = OpenAiProvider::new(
        model_spec.to_owned(),
        parsed.model.clone(),
        api_key.to_owned(),
        endpoint,
    )
    .map_err(|err| RouterError::InvalidEndpoint {
        provider: parsed.provider.clone(),
        reason: err.to_string(),
    })?;

    Ok(Arc::new(provider))
}
