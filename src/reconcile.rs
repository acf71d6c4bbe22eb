//! Create, read, update and delete cycles for a single directory object.
use tracing::{debug, error, info, warn};

use crate::{
	codec::decode_entry,
	delta::compute_object_delta,
	directory::Directory,
	error::Error,
	object::{DirectoryObject, READ_ATTRIBUTES},
	request::{build_create, build_update, validate, Modification},
};

/// Drives an object towards its desired state over a [`Directory`].
///
/// Every cycle runs to completion before returning and nothing is cached
/// between cycles: the directory is the source of truth and the normalized
/// state is rebuilt from it each time. There are no retries and no rollback;
/// a failed modify request is left to the directory's own atomicity.
#[derive(Debug)]
pub struct Reconciler<D> {
	/// The connection capability
	directory: D,
	/// Generic attribute values rejected by validation
	invalid_values: Vec<String>,
}

impl<D: Directory> Reconciler<D> {
	/// Create a reconciler on top of `directory`.
	#[must_use]
	pub fn new(directory: D) -> Self {
		Self { directory, invalid_values: Vec::new() }
	}

	/// Reject generic attribute values equal (ignoring case) to any of
	/// `values`.
	#[must_use]
	pub fn with_invalid_values(mut self, values: Vec<String>) -> Self {
		self.invalid_values = values;
		self
	}

	/// The underlying directory.
	#[must_use]
	pub fn directory(&self) -> &D {
		&self.directory
	}

	/// Create the entry for `desired` and return its normalized state as read
	/// back from the directory.
	///
	/// Validation and DN errors are returned before anything is sent.
	pub async fn create(&self, desired: &DirectoryObject) -> Result<DirectoryObject, Error> {
		let dn = desired.dn.as_str();
		debug!(dn, "Creating entry");

		let request = build_create(desired, &self.invalid_values)?;
		for (attribute, values) in &request.attributes {
			debug!(dn, attribute = %attribute, ?values, "Attribute being added");
		}
		if let Err(err) = self.directory.add(&request.dn, &request.attributes).await {
			error!(dn, "Creating entry failed: {err}");
			return Err(err);
		}
		info!(dn, "Entry created");

		self.import(dn).await
	}

	/// Read the normalized state of the entry at `dn`. `None` means the entry
	/// doesn't exist (any more), which is not an error.
	pub async fn read(&self, dn: &str) -> Result<Option<DirectoryObject>, Error> {
		debug!(dn, "Reading entry");
		match self.directory.search_base(dn, READ_ATTRIBUTES).await {
			Ok(Some(entry)) => {
				let mut object = decode_entry(&entry)?;
				// identified by the DN asked for, whatever the server's spelling
				object.dn = dn.to_owned();
				Ok(Some(object))
			}
			Ok(None) => {
				warn!(dn, "Entry not found, it no longer exists in the directory");
				Ok(None)
			}
			Err(err) if err.is_no_such_object() => {
				warn!(dn, "Entry not found, it no longer exists in the directory");
				Ok(None)
			}
			Err(err) => {
				error!(dn, "Looking up entry failed: {err}");
				Err(err)
			}
		}
	}

	/// Compute the modifications that turn `previous` into `desired` without
	/// touching the directory.
	pub fn plan_update(
		&self,
		previous: &DirectoryObject,
		desired: &DirectoryObject,
	) -> Result<Vec<Modification>, Error> {
		if previous.dn != desired.dn {
			return Err(Error::DnChanged {
				previous: previous.dn.clone(),
				desired: desired.dn.clone(),
			});
		}
		validate(desired, &self.invalid_values)?;
		Ok(build_update(&compute_object_delta(previous, desired)))
	}

	/// Bring the entry from `previous` to `desired` and return its refreshed
	/// normalized state. No modify request is sent if nothing changed.
	pub async fn update(
		&self,
		previous: &DirectoryObject,
		desired: &DirectoryObject,
	) -> Result<DirectoryObject, Error> {
		let dn = desired.dn.as_str();
		let modifications = self.plan_update(previous, desired)?;

		if modifications.is_empty() {
			debug!(dn, "Entry is up to date");
		} else {
			for modification in &modifications {
				debug!(
					dn,
					operation = modification.operation(),
					attribute = modification.attribute(),
					values = ?modification.values(),
					"Modify request change"
				);
			}
			if let Err(err) = self.directory.modify(dn, &modifications).await {
				error!(dn, "Updating entry failed: {err}");
				return Err(err);
			}
			info!(dn, changes = modifications.len(), "Entry updated");
		}

		self.import(dn).await
	}

	/// Delete the entry at `dn`.
	pub async fn delete(&self, dn: &str) -> Result<(), Error> {
		debug!(dn, "Removing entry");
		if let Err(err) = self.directory.delete(dn).await {
			error!(dn, "Removing entry failed: {err}");
			return Err(err);
		}
		info!(dn, "Entry removed");
		Ok(())
	}

	/// Reconstruct the full normalized state of an existing entry from its DN
	/// alone.
	pub async fn import(&self, dn: &str) -> Result<DirectoryObject, Error> {
		self.read(dn).await?.ok_or_else(|| Error::NotFound(dn.to_owned()))
	}
}
