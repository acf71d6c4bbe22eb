//! Config for the LDAP connection and the reconciliation policy.
use std::{path::PathBuf, sync::Arc, time::Duration};

use ldap3::LdapConnSettings;
use rustls::{Certificate, ClientConfig, PrivateKey, RootCertStore};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// Default timeout to establish a connection, in seconds
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 5;
/// Default timeout of a single LDAP operation, in seconds
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// LDAP configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
	/// The URL to connect to the server with. Supports ldap, ldaps, and ldapi
	/// schemes
	pub url: Url,
	/// Connection settings.
	#[serde(default)]
	pub connection: ConnectionConfig,
	/// DN of the user to bind as
	pub bind_dn: String,
	/// The password of the bind user
	pub bind_password: String,
	/// Attribute values that must never be written, e.g. placeholders like
	/// `N/A`. Compared case-insensitively.
	#[serde(default)]
	pub invalid_attribute_values: Vec<String>,
}

/// Configuration for how to connect to the LDAP server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
	/// Timeout to establish a connection in seconds.
	pub timeout: u64,

	/// LDAP operation timeout.
	pub operation_timeout: Duration,

	/// TLS config
	#[serde(default)]
	pub tls: TLSConfig,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self {
			timeout: DEFAULT_CONNECTION_TIMEOUT_SECS,
			operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
			tls: TLSConfig::default(),
		}
	}
}

/// TLS Configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TLSConfig {
	/// Use StartTLS extended operation for establishing a secure connection,
	/// rather than TLS on a dedicated port.
	pub starttls: bool,

	/// Disable verification of TLS certificates
	pub no_tls_verify: bool,

	/// TLS root certificates path
	pub root_certificates_path: Option<PathBuf>,

	/// Path of the TLS client key to use for the connection
	pub client_key_path: Option<PathBuf>,

	/// Path of the TLS client certificate to use for the connection
	pub client_certificate_path: Option<PathBuf>,
}

impl ConnectionConfig {
	/// Create a [`LdapConnSettings`] based on this [`ConnectionConfig`]
	pub(crate) async fn to_settings(&self) -> Result<LdapConnSettings, Error> {
		let mut settings = LdapConnSettings::new();

		settings = settings.set_conn_timeout(Duration::from_secs(self.timeout));
		settings = settings.set_starttls(self.tls.starttls);
		settings = settings.set_no_tls_verify(self.tls.no_tls_verify);

		if let Some(path) = &self.tls.root_certificates_path {
			let mut roots = RootCertStore::empty();
			for certificate in rustls_pemfile::certs(&mut tokio::fs::read(path).await?.as_slice())? {
				roots
					.add(&Certificate(certificate))
					.map_err(|_| Error::Invalid("Could not read root certificate".to_owned()))?;
			}
			if roots.is_empty() {
				return Err(Error::Invalid("No root certificate found".to_owned()));
			}

			let builder = ClientConfig::builder().with_safe_defaults().with_root_certificates(roots);
			let client_config = match (&self.tls.client_key_path, &self.tls.client_certificate_path) {
				(Some(key_path), Some(cert_path)) => {
					let chain =
						rustls_pemfile::certs(&mut tokio::fs::read(cert_path).await?.as_slice())?
							.into_iter()
							.map(Certificate)
							.collect();
					let key = rustls_pemfile::pkcs8_private_keys(
						&mut tokio::fs::read(key_path).await?.as_slice(),
					)?
					.into_iter()
					.next()
					.ok_or_else(|| Error::Invalid("No PKCS8 client key found".to_owned()))?;
					builder
						.with_client_auth_cert(chain, PrivateKey(key))
						.map_err(|_| Error::Invalid("Could not read client certificates".to_owned()))?
				}
				(None, None) => builder.with_no_client_auth(),
				_ => Err(Error::Invalid(
					"Both a client certificate and key file in PKCS8 format must be specified"
						.to_owned(),
				))?,
			};
			settings = settings.set_config(Arc::new(client_config));
		}
		Ok(settings)
	}
}
