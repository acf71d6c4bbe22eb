//! The connection capability used by the reconciler, and its LDAP
//! implementation.

use std::{collections::HashSet, fmt, time::Duration};

use async_trait::async_trait;
use ldap3::{LdapConnAsync, Mod, Scope, SearchEntry};
use tracing::{debug, warn};

use crate::{
	config::Config,
	entry::DirectoryEntry,
	error::{Error, NO_SUCH_OBJECT},
	request::Modification,
};

/// The directory operations reconciliation needs.
///
/// Implementations must tolerate concurrent calls for independent entries,
/// either by serializing requests internally or by being safe for concurrent
/// use; the reconciler itself does no locking. Protocol failures are returned
/// as they are, without retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Directory: Send + Sync {
	/// Create the entry `dn` with the given attributes.
	async fn add(&self, dn: &str, attributes: &[(String, Vec<String>)]) -> Result<(), Error>;

	/// Apply `modifications` to the entry `dn`, in order, as one request.
	async fn modify(&self, dn: &str, modifications: &[Modification]) -> Result<(), Error>;

	/// Delete the entry `dn`.
	async fn delete(&self, dn: &str) -> Result<(), Error>;

	/// Base-scope search of `dn` with the filter `(objectclass=*)`. Returns
	/// `None` if there is no such entry.
	async fn search_base(
		&self,
		dn: &str,
		attributes: &[&'static str],
	) -> Result<Option<DirectoryEntry>, Error>;
}

/// A bound connection to an LDAP server.
#[derive(Clone)]
pub struct LdapDirectory {
	/// Handle of the connection, cloned for each operation
	ldap: ldap3::Ldap,
	/// Timeout applied to every operation
	operation_timeout: Duration,
}

impl fmt::Debug for LdapDirectory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LdapDirectory")
			.field("operation_timeout", &self.operation_timeout)
			.finish_non_exhaustive()
	}
}

impl LdapDirectory {
	/// Connect to the server configured in `config` and bind with the
	/// configured credentials. The connection is driven by a background task
	/// on the current tokio runtime.
	pub async fn connect(config: &Config) -> Result<Self, Error> {
		let settings = config.connection.to_settings().await?;
		let (conn, mut ldap) = LdapConnAsync::from_url_with_settings(settings, &config.url).await?;
		tokio::spawn(async move {
			if let Err(err) = conn.drive().await {
				warn!("Ldap connection error {err}");
			}
		});

		ldap.with_timeout(config.connection.operation_timeout)
			.simple_bind(&config.bind_dn, &config.bind_password)
			.await?
			.success()?;
		debug!(url = %config.url, bind_dn = %config.bind_dn, "Bound to LDAP server");

		Ok(Self { ldap, operation_timeout: config.connection.operation_timeout })
	}

	/// Close the connection.
	pub async fn unbind(self) -> Result<(), Error> {
		let mut ldap = self.ldap;
		ldap.unbind().await?;
		Ok(())
	}

	/// A handle for a single operation, with the timeout applied.
	fn handle(&self) -> ldap3::Ldap {
		let mut ldap = self.ldap.clone();
		ldap.with_timeout(self.operation_timeout);
		ldap
	}
}

/// Convert a modification to the form `ldap3` sends.
fn to_mod(modification: &Modification) -> Mod<&str> {
	let values = modification.values().iter().map(String::as_str).collect::<HashSet<_>>();
	match modification {
		Modification::Add { attribute, .. } => Mod::Add(attribute.as_str(), values),
		Modification::Delete { attribute, .. } => Mod::Delete(attribute.as_str(), values),
		Modification::Replace { attribute, .. } => Mod::Replace(attribute.as_str(), values),
	}
}

#[async_trait]
impl Directory for LdapDirectory {
	async fn add(&self, dn: &str, attributes: &[(String, Vec<String>)]) -> Result<(), Error> {
		let attributes = attributes
			.iter()
			.map(|(name, values)| {
				(name.as_str(), values.iter().map(String::as_str).collect::<HashSet<_>>())
			})
			.collect::<Vec<_>>();
		let mut ldap = self.handle();
		ldap.add(dn, attributes).await?.success()?;
		Ok(())
	}

	async fn modify(&self, dn: &str, modifications: &[Modification]) -> Result<(), Error> {
		let mods = modifications.iter().map(to_mod).collect::<Vec<_>>();
		let mut ldap = self.handle();
		ldap.modify(dn, mods).await?.success()?;
		Ok(())
	}

	async fn delete(&self, dn: &str) -> Result<(), Error> {
		let mut ldap = self.handle();
		ldap.delete(dn).await?.success()?;
		Ok(())
	}

	async fn search_base(
		&self,
		dn: &str,
		attributes: &[&'static str],
	) -> Result<Option<DirectoryEntry>, Error> {
		let mut ldap = self.handle();
		let result = ldap.search(dn, Scope::Base, "(objectclass=*)", attributes.to_vec()).await?;
		if result.1.rc == NO_SUCH_OBJECT {
			return Ok(None);
		}
		let (entries, _) = result.success()?;
		Ok(entries.into_iter().next().map(|entry| SearchEntry::construct(entry).into()))
	}
}
