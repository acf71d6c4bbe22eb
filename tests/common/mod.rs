#![allow(dead_code, clippy::missing_docs_in_private_items, clippy::unwrap_used)]

use std::{collections::HashMap, error::Error as StdError, sync::Mutex};

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapError, LdapResult};
use ldap_reconciler::{Directory, DirectoryEntry, Error, Modification};

/// An in-memory directory applying requests the way an LDAP server would.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
	entries: Mutex<HashMap<String, Vec<(String, Vec<String>)>>>,
	calls: Mutex<Vec<&'static str>>,
}

fn ldap_error(rc: u32, text: &str) -> Error {
	Error::Ldap(LdapError::LdapResult {
		result: LdapResult {
			rc,
			matched: String::new(),
			text: text.to_owned(),
			refs: Vec::new(),
			ctrls: Vec::new(),
		},
	})
}

fn find<'a>(
	attrs: &'a mut Vec<(String, Vec<String>)>,
	name: &str,
) -> Option<&'a mut Vec<String>> {
	attrs
		.iter_mut()
		.find(|(attr, _)| attr.eq_ignore_ascii_case(name))
		.map(|(_, values)| values)
}

fn apply(attrs: &mut Vec<(String, Vec<String>)>, modification: &Modification) -> Result<(), Error> {
	match modification {
		Modification::Add { attribute, values } => {
			if let Some(existing) = find(attrs, attribute) {
				for value in values {
					if existing.contains(value) {
						return Err(ldap_error(20, "attribute or value exists"));
					}
					existing.push(value.clone());
				}
			} else {
				attrs.push((attribute.clone(), values.clone()));
			}
		}
		Modification::Delete { attribute, values } => {
			let Some(existing) = find(attrs, attribute) else {
				return Err(ldap_error(16, "no such attribute"));
			};
			if values.is_empty() {
				existing.clear();
			}
			for value in values {
				let Some(position) = existing.iter().position(|v| v == value) else {
					return Err(ldap_error(16, "no such attribute"));
				};
				existing.remove(position);
			}
		}
		Modification::Replace { attribute, values } => {
			if let Some(existing) = find(attrs, attribute) {
				existing.clone_from(values);
			} else if !values.is_empty() {
				attrs.push((attribute.clone(), values.clone()));
			}
		}
	}
	attrs.retain(|(_, values)| !values.is_empty());
	Ok(())
}

impl MemoryDirectory {
	/// Store an entry directly, bypassing the request log.
	pub fn seed(&self, dn: &str, attrs: &[(&str, &[&str])]) {
		let attrs = attrs
			.iter()
			.map(|(name, values)| {
				((*name).to_owned(), values.iter().map(|value| (*value).to_owned()).collect())
			})
			.collect();
		self.entries.lock().unwrap().insert(dn.to_owned(), attrs);
	}

	/// Values of one attribute of a stored entry, sorted.
	pub fn values(&self, dn: &str, name: &str) -> Vec<String> {
		let mut entries = self.entries.lock().unwrap();
		let mut values = entries
			.get_mut(dn)
			.and_then(|attrs| find(attrs, name).cloned())
			.unwrap_or_default();
		values.sort();
		values
	}

	pub fn contains(&self, dn: &str) -> bool {
		self.entries.lock().unwrap().contains_key(dn)
	}

	/// Protocol operations performed so far.
	pub fn calls(&self) -> Vec<&'static str> {
		self.calls.lock().unwrap().clone()
	}

	fn record(&self, call: &'static str) {
		self.calls.lock().unwrap().push(call);
	}
}

#[async_trait]
impl Directory for MemoryDirectory {
	async fn add(&self, dn: &str, attributes: &[(String, Vec<String>)]) -> Result<(), Error> {
		self.record("add");
		let mut entries = self.entries.lock().unwrap();
		if entries.contains_key(dn) {
			return Err(ldap_error(68, "already exists"));
		}
		entries.insert(dn.to_owned(), attributes.to_vec());
		Ok(())
	}

	async fn modify(&self, dn: &str, modifications: &[Modification]) -> Result<(), Error> {
		self.record("modify");
		let mut entries = self.entries.lock().unwrap();
		let attrs = entries.get_mut(dn).ok_or_else(|| ldap_error(32, "no such object"))?;
		// a modify request is atomic
		let mut updated = attrs.clone();
		for modification in modifications {
			apply(&mut updated, modification)?;
		}
		*attrs = updated;
		Ok(())
	}

	async fn delete(&self, dn: &str) -> Result<(), Error> {
		self.record("delete");
		self.entries
			.lock()
			.unwrap()
			.remove(dn)
			.map(|_| ())
			.ok_or_else(|| ldap_error(32, "no such object"))
	}

	async fn search_base(
		&self,
		dn: &str,
		_attributes: &[&'static str],
	) -> Result<Option<DirectoryEntry>, Error> {
		self.record("search");
		let entries = self.entries.lock().unwrap();
		Ok(entries.get(dn).map(|attrs| DirectoryEntry::new(dn, attrs.iter().cloned())))
	}
}

pub async fn ldap_connect() -> Result<ldap3::Ldap, Box<dyn StdError>> {
	let (conn, mut ldap) = LdapConnAsync::new("ldap://localhost:1389").await?;
	let _handle = tokio::spawn(async move {
		if let Err(err) = conn.drive().await {
			panic!("Ldap connection error {err}");
		}
	});
	ldap.simple_bind("cn=admin,dc=example,dc=org", "adminpassword").await?;
	Ok(ldap)
}

pub async fn ldap_add_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn StdError>> {
	ldap.add(
		&format!("ou={},dc=example,dc=org", ou),
		vec![("objectClass", ["organizationalUnit"].into())],
	)
	.await?
	.success()?;
	Ok(())
}

pub async fn ldap_delete_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn StdError>> {
	ldap.delete(&format!("ou={},dc=example,dc=org", ou)).await?.success()?;
	Ok(())
}

pub async fn ldap_delete_group(ldap: &mut ldap3::Ldap, cn: &str) -> Result<(), Box<dyn StdError>> {
	ldap.delete(&format!("cn={},ou=groups,dc=example,dc=org", cn)).await?.success()?;
	Ok(())
}

pub async fn ldap_group_add_attribute(
	ldap: &mut ldap3::Ldap,
	cn: &str,
	attribute: &str,
	value: &str,
) -> Result<(), Box<dyn StdError>> {
	ldap.modify(
		&format!("cn={},ou=groups,dc=example,dc=org", cn),
		vec![ldap3::Mod::Add(attribute, [value].into())],
	)
	.await?
	.success()?;
	Ok(())
}
