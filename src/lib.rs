//! Declarative, idempotent management of LDAP groups and objects.
//!
//! Given the desired state of a directory entry, the library computes the
//! smallest set of add, replace and delete modifications that bring the entry
//! into that state, and normalizes what the server returns back into the same
//! declarative model, so that running the same desired state twice sends
//! nothing the second time.
//!
//! The model has three kinds of attributes:
//! * scalar well-known attributes (`description`, `gidNumber`), written as a
//!   whole-value replace,
//! * multi-valued well-known attributes (`member`, `memberUid`,
//!   `uniqueMember`, `memberURL`), written as set differences,
//! * a generic bag of `(name, value)` entries for everything else, where a
//!   multi-valued attribute is several entries sharing a name.
//!
//! The attribute named by the DN's leading component (the RDN) is implied by
//! the DN and never appears in the generic bag.
//!
//! For a general primer on LDAP, the [introduction] in the `ldap3` crate which
//! is used here for interfacing with LDAP is an excellent resource.
//!
//! [introduction]: https://github.com/inejge/ldap3/blob/master/LDAP-primer.md
//!
//! # Getting started
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use url::Url;
//! use ldap_reconciler::{
//!     AttributeEntry, Config, ConnectionConfig, DirectoryObject, LdapDirectory, Reconciler,
//! };
//!
//! // Configuration can also be deserialized with serde. It's hand-constructed
//! // here for demonstration purposes.
//! let config = Config {
//!     url: Url::parse("ldap://localhost")?,
//!     connection: ConnectionConfig::default(),
//!     bind_dn: "cn=admin,dc=example,dc=com".to_owned(),
//!     bind_password: "verysecret".to_owned(),
//!     invalid_attribute_values: vec!["N/A".to_owned()],
//! };
//!
//! let directory = LdapDirectory::connect(&config).await?;
//! let reconciler =
//!     Reconciler::new(directory).with_invalid_values(config.invalid_attribute_values.clone());
//!
//! let mut desired = DirectoryObject::new("cn=ops,ou=groups,dc=example,dc=com", ["posixGroup"]);
//! desired.gid_number = Some(1000);
//! desired.member_uid.insert("alice".to_owned());
//! desired.attributes.insert(AttributeEntry::new("mail", "ops@example.com"));
//!
//! let state = match reconciler.read(&desired.dn).await? {
//!     Some(previous) => reconciler.update(&previous, &desired).await?,
//!     None => reconciler.create(&desired).await?,
//! };
//! println!("Reconciled: {state:#?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations
//! * Concurrent modifications by other clients are not detected, the last
//!   writer wins.
//! * A modify request is not rolled back if the server rejects it halfway;
//!   the directory's per-request semantics apply.
//! * Only `posixGroup` has its required attributes checked before writing.

pub mod attribute;
pub mod codec;
pub mod config;
pub mod delta;
pub mod directory;
pub mod dn;
pub mod entry;
pub mod error;
pub mod object;
pub mod reconcile;
pub mod request;

pub use ldap3;

pub use crate::{
	attribute::{AttributeBag, AttributeEntry},
	config::{Config, ConnectionConfig, TLSConfig},
	delta::{BagDelta, ObjectDelta, SetDelta},
	directory::{Directory, LdapDirectory},
	entry::DirectoryEntry,
	error::{Error, ValidationError},
	object::{DirectoryObject, MultiValuedAttribute, ScalarAttribute},
	reconcile::Reconciler,
	request::{AddRequest, Modification},
};
