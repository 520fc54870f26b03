//! Validated provider connection settings.

// self
use crate::{_prelude::*, auth::Secret};

/// Errors raised while constructing or validating provider configuration.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderConfigError {
	/// Authorize endpoint is required for the handshake.
	#[error("Missing authorize endpoint.")]
	MissingAuthorizeEndpoint,
	/// Token endpoint is mandatory for code exchange and refresh.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Graph endpoint is mandatory for profile and media calls.
	#[error("Missing graph endpoint.")]
	MissingGraphEndpoint,
	/// Client id must be present and non-empty.
	#[error("Missing client id.")]
	MissingClientId,
	/// Client secret must be present and non-empty.
	#[error("Missing client secret.")]
	MissingClientSecret,
	/// Redirect URI is required; providers echo the user back to it.
	#[error("Missing redirect URI.")]
	MissingRedirectUri,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// Endpoint triple a provider serves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// User-facing authorization page.
	pub authorize: Url,
	/// Code-exchange and refresh endpoint.
	pub token: Url,
	/// Graph API base for profile and media reads.
	pub graph: Url,
}

/// Validated settings for one provider application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
	/// Application id registered with the provider.
	pub client_id: String,
	/// Application secret registered with the provider.
	pub client_secret: Secret,
	/// Callback the provider redirects the user to after consent.
	pub redirect_uri: Url,
	/// Endpoints the provider serves.
	pub endpoints: ProviderEndpoints,
	/// Character joining scopes in the authorize URL.
	pub scope_delimiter: char,
}
impl ProviderConfig {
	/// Returns a builder for assembling a validated config.
	pub fn builder() -> ProviderConfigBuilder {
		ProviderConfigBuilder::default()
	}
}

/// Builder for [`ProviderConfig`] values.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
	/// Application id registered with the provider.
	pub client_id: Option<String>,
	/// Application secret registered with the provider.
	pub client_secret: Option<Secret>,
	/// Callback the provider redirects the user to after consent.
	pub redirect_uri: Option<Url>,
	/// User-facing authorization page.
	pub authorize_endpoint: Option<Url>,
	/// Code-exchange and refresh endpoint.
	pub token_endpoint: Option<Url>,
	/// Graph API base for profile and media reads.
	pub graph_endpoint: Option<Url>,
	/// Character joining scopes in the authorize URL.
	pub scope_delimiter: char,
}
impl ProviderConfigBuilder {
	/// Sets the application id.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the application secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = Some(Secret::new(client_secret));

		self
	}

	/// Sets the post-consent callback.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Sets the authorize endpoint.
	pub fn authorize_endpoint(mut self, url: Url) -> Self {
		self.authorize_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the graph API base.
	pub fn graph_endpoint(mut self, url: Url) -> Self {
		self.graph_endpoint = Some(url);

		self
	}

	/// Overrides the scope delimiter.
	pub fn scope_delimiter(mut self, delimiter: char) -> Self {
		self.scope_delimiter = delimiter;

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<ProviderConfig, ProviderConfigError> {
		let client_id = self
			.client_id
			.filter(|id| !id.is_empty())
			.ok_or(ProviderConfigError::MissingClientId)?;
		let client_secret = self
			.client_secret
			.filter(|secret| !secret.is_empty())
			.ok_or(ProviderConfigError::MissingClientSecret)?;
		let redirect_uri = self.redirect_uri.ok_or(ProviderConfigError::MissingRedirectUri)?;
		let authorize =
			self.authorize_endpoint.ok_or(ProviderConfigError::MissingAuthorizeEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderConfigError::MissingTokenEndpoint)?;
		let graph = self.graph_endpoint.ok_or(ProviderConfigError::MissingGraphEndpoint)?;
		let config = ProviderConfig {
			client_id,
			client_secret,
			redirect_uri,
			endpoints: ProviderEndpoints { authorize, token, graph },
			scope_delimiter: self.scope_delimiter,
		};

		config.validate()?;

		Ok(config)
	}
}
impl Default for ProviderConfigBuilder {
	fn default() -> Self {
		Self {
			client_id: None,
			client_secret: None,
			redirect_uri: None,
			authorize_endpoint: None,
			token_endpoint: None,
			graph_endpoint: None,
			scope_delimiter: ',',
		}
	}
}

impl ProviderConfig {
	/// Validates invariants for the config.
	fn validate(&self) -> Result<(), ProviderConfigError> {
		validate_endpoint("authorize", &self.endpoints.authorize)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("graph", &self.endpoints.graph)?;
		validate_scope_delimiter(self.scope_delimiter)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderConfigError> {
	if url.scheme() != "https" {
		Err(ProviderConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ProviderConfigError> {
	if delimiter.is_control() {
		Err(ProviderConfigError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}
