//! Error codes

/// Errors that can occur when using this library
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// The desired state violates the object class or attribute value policy.
	/// Nothing was sent to the directory.
	#[error(
		"validation failed for DN {dn:?}: {}",
		.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
	)]
	Validation {
		/// DN of the object that failed validation
		dn: String,
		/// Every violation found, not just the first one
		errors: Vec<ValidationError>,
	},
	/// The DN has no usable leading component.
	#[error("malformed DN {dn:?}: {reason}")]
	MalformedDn {
		/// The offending DN
		dn: String,
		/// What was wrong with it
		reason: String,
	},
	/// A read that was expected to find an entry found none.
	#[error("no entry found at {0:?}")]
	NotFound(String),
	/// The DN is the identity of an object and can't be changed by an update.
	#[error("DN cannot change from {previous:?} to {desired:?}, the entry must be recreated")]
	DnChanged {
		/// DN of the existing entry
		previous: String,
		/// DN that was requested
		desired: String,
	},
	/// The contents of an attribute or a config value did not conform to the
	/// expected syntax.
	#[error("Malformed data: {0}")]
	Invalid(String),
	/// Reading TLS material from disk failed.
	#[error(transparent)]
	Io(#[from] std::io::Error),
	/// An underlying protocol error or similar occurred, or the LDAP library
	/// was used incorrectly.
	#[error(transparent)]
	Ldap(#[from] ldap3::LdapError),
}

/// A single policy violation in a desired state.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
	/// An object class requires an attribute that was not supplied.
	#[error("missing required attribute '{attribute}' for objectClass '{object_class}'")]
	MissingAttribute {
		/// The object class imposing the requirement
		object_class: String,
		/// Declarative name of the missing attribute
		attribute: String,
	},
	/// No object class was given at all.
	#[error("at least one objectClass is required")]
	NoObjectClass,
	/// An attribute carries a value that is configured as invalid.
	#[error("attribute {attribute:?} has invalid value {value:?}")]
	InvalidValue {
		/// Attribute name
		attribute: String,
		/// The rejected value
		value: String,
	},
}

impl Error {
	/// Whether this is the protocol's "no such object" result (code 32).
	#[must_use]
	pub fn is_no_such_object(&self) -> bool {
		matches!(
			self,
			Error::Ldap(ldap3::LdapError::LdapResult { result }) if result.rc == NO_SUCH_OBJECT
		)
	}
}

/// LDAP result code `noSuchObject`, RFC4511 section 4.1.9
pub(crate) const NO_SUCH_OBJECT: u32 = 32;
