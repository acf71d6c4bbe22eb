//! Rendering of desired states and deltas into protocol requests, and the
//! policy checks that gate them.
use std::collections::BTreeMap;

use tracing::warn;

use crate::{
	attribute::AttributeEntry,
	codec::encode_bag,
	delta::ObjectDelta,
	dn::derive_cn,
	error::{Error, ValidationError},
	object::{
		is_reserved, DirectoryObject, MultiValuedAttribute, ScalarAttribute, CN, OBJECT_CLASS,
	},
};

/// Attributes that an object class can't do without.
const REQUIRED_ATTRIBUTES: &[(&str, ScalarAttribute)] = &[("posixGroup", ScalarAttribute::GidNumber)];

/// A single change inside a modify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
	/// Add attribute values.
	Add {
		/// Attribute to modify.
		attribute: String,
		/// Values to add.
		values: Vec<String>,
	},
	/// Delete attribute values.
	Delete {
		/// Attribute to modify.
		attribute: String,
		/// Values to delete (empty removes the attribute).
		values: Vec<String>,
	},
	/// Replace attribute values.
	Replace {
		/// Attribute to modify.
		attribute: String,
		/// Replacement values (empty removes the attribute).
		values: Vec<String>,
	},
}

impl Modification {
	/// Name of the attribute this change touches
	#[must_use]
	pub fn attribute(&self) -> &str {
		match self {
			Self::Add { attribute, .. }
			| Self::Delete { attribute, .. }
			| Self::Replace { attribute, .. } => attribute,
		}
	}

	/// Values carried by this change
	#[must_use]
	pub fn values(&self) -> &[String] {
		match self {
			Self::Add { values, .. } | Self::Delete { values, .. } | Self::Replace { values, .. } => {
				values
			}
		}
	}

	/// Short name of the operation, for logging
	#[must_use]
	pub fn operation(&self) -> &'static str {
		match self {
			Self::Add { .. } => "add",
			Self::Delete { .. } => "delete",
			Self::Replace { .. } => "replace",
		}
	}
}

/// An add request for a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
	/// DN of the new entry
	pub dn: String,
	/// Attributes of the new entry, in rendering order
	pub attributes: Vec<(String, Vec<String>)>,
}

/// Check the object class policy: every object needs a class, and every
/// recognized class needs its mandatory attributes. All violations are
/// returned, not just the first.
#[must_use]
pub fn validate_required_attributes(desired: &DirectoryObject) -> Vec<ValidationError> {
	if desired.object_classes.is_empty() {
		return vec![ValidationError::NoObjectClass];
	}
	REQUIRED_ATTRIBUTES
		.iter()
		.filter(|(object_class, attribute)| {
			desired.has_object_class(object_class) && desired.scalar(*attribute).is_none()
		})
		.map(|(object_class, attribute)| ValidationError::MissingAttribute {
			object_class: (*object_class).to_owned(),
			attribute: attribute.field_name().to_owned(),
		})
		.collect()
}

/// Check generic attribute values against values configured as invalid
/// (compared ASCII case-insensitively).
#[must_use]
pub fn validate_attribute_values(
	desired: &DirectoryObject,
	invalid_values: &[String],
) -> Vec<ValidationError> {
	desired
		.attributes
		.sorted()
		.into_iter()
		.filter(|entry| invalid_values.iter().any(|invalid| invalid.eq_ignore_ascii_case(&entry.value)))
		.map(|entry| ValidationError::InvalidValue {
			attribute: entry.name.clone(),
			value: entry.value.clone(),
		})
		.collect()
}

/// Run every policy check, failing with all violations at once.
pub fn validate(desired: &DirectoryObject, invalid_values: &[String]) -> Result<(), Error> {
	let mut errors = validate_required_attributes(desired);
	errors.extend(validate_attribute_values(desired, invalid_values));
	if errors.is_empty() {
		Ok(())
	} else {
		Err(Error::Validation { dn: desired.dn.clone(), errors })
	}
}

/// Build the add request creating `desired`.
///
/// The `cn` is derived from the DN, which therefore has to start with a `cn=`
/// component. Generic attributes whose names have a dedicated path are
/// dropped.
pub fn build_create(desired: &DirectoryObject, invalid_values: &[String]) -> Result<AddRequest, Error> {
	validate(desired, invalid_values)?;
	let cn = derive_cn(&desired.dn)?;

	let mut attributes = vec![
		(OBJECT_CLASS.to_owned(), desired.object_classes.iter().cloned().collect()),
		(CN.to_owned(), vec![cn]),
	];
	for attribute in ScalarAttribute::ALL {
		if let Some(value) = desired.scalar(attribute) {
			attributes.push((attribute.ldap_name().to_owned(), vec![value]));
		}
	}
	for attribute in MultiValuedAttribute::ALL {
		let values = desired.values(attribute);
		if !values.is_empty() {
			attributes.push((attribute.ldap_name().to_owned(), values.iter().cloned().collect()));
		}
	}

	let mut generic = desired.attributes.clone();
	generic.retain(|entry| {
		let keep = !is_reserved(&entry.name);
		if !keep {
			warn!(dn = %desired.dn, attribute = %entry.name, "Ignoring generic attribute with a dedicated path");
		}
		keep
	});
	attributes.extend(encode_bag(&generic));

	Ok(AddRequest { dn: desired.dn.clone(), attributes })
}

/// Group sorted entries by name, keeping value order.
fn group_by_name(entries: &[AttributeEntry]) -> BTreeMap<&str, Vec<String>> {
	let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
	for entry in entries {
		grouped.entry(&entry.name).or_default().push(entry.value.clone());
	}
	grouped
}

/// Render a delta as an ordered list of modifications.
///
/// Order: scalar replaces, object class additions, multi-valued well-known
/// attributes (removals before additions), generic removals, generic
/// additions, object class removals. Removing before adding lets a
/// single-valued attribute change its value within one request, and new
/// object classes are in place before attributes that depend on them.
#[must_use]
pub fn build_update(delta: &ObjectDelta) -> Vec<Modification> {
	let mut modifications = Vec::new();

	for change in &delta.changed {
		modifications.push(Modification::Replace {
			attribute: change.attribute.ldap_name().to_owned(),
			values: change.value.iter().cloned().collect(),
		});
	}

	if !delta.object_classes.to_add.is_empty() {
		modifications.push(Modification::Add {
			attribute: OBJECT_CLASS.to_owned(),
			values: delta.object_classes.to_add.clone(),
		});
	}

	for (attribute, set) in &delta.sets {
		if !set.to_remove.is_empty() {
			modifications.push(Modification::Delete {
				attribute: attribute.ldap_name().to_owned(),
				values: set.to_remove.clone(),
			});
		}
		if !set.to_add.is_empty() {
			modifications.push(Modification::Add {
				attribute: attribute.ldap_name().to_owned(),
				values: set.to_add.clone(),
			});
		}
	}

	for (name, values) in group_by_name(&delta.bag.removed) {
		let values = if delta.cleared.contains(name) { Vec::new() } else { values };
		modifications.push(Modification::Delete { attribute: name.to_owned(), values });
	}
	for (name, values) in group_by_name(&delta.bag.added) {
		modifications.push(Modification::Add { attribute: name.to_owned(), values });
	}

	if !delta.object_classes.to_remove.is_empty() {
		modifications.push(Modification::Delete {
			attribute: OBJECT_CLASS.to_owned(),
			values: delta.object_classes.to_remove.clone(),
		});
	}

	modifications
}

#[cfg(test)]
mod tests {
	#![allow(clippy::unwrap_used)]

	use std::collections::BTreeSet;

	use super::{build_create, build_update, validate, validate_required_attributes, Modification};
	use crate::{
		attribute::{AttributeBag, AttributeEntry},
		delta::compute_object_delta,
		error::{Error, ValidationError},
		object::DirectoryObject,
	};

	const DN: &str = "cn=mygroup,ou=groups,dc=example,dc=com";

	fn bag(entries: &[(&str, &str)]) -> AttributeBag {
		entries.iter().map(|(name, value)| AttributeEntry::new(*name, *value)).collect()
	}

	fn set(values: &[&str]) -> BTreeSet<String> {
		values.iter().map(|value| (*value).to_owned()).collect()
	}

	fn strings(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| (*value).to_owned()).collect()
	}

	#[test]
	fn posix_group_requires_gid() {
		let mut desired = DirectoryObject::new(DN, ["posixGroup"]);
		let errors = validate_required_attributes(&desired);
		assert_eq!(errors.len(), 1);
		let message = errors[0].to_string();
		assert!(message.contains("gid_number"), "{message}");
		assert!(message.contains("posixGroup"), "{message}");

		desired.gid_number = Some(1000);
		assert!(validate_required_attributes(&desired).is_empty());
	}

	#[test]
	fn object_class_is_required() {
		let desired = DirectoryObject::new(DN, Vec::<String>::new());
		assert_eq!(validate_required_attributes(&desired), [ValidationError::NoObjectClass]);
	}

	#[test]
	fn all_violations_are_reported() {
		let mut desired = DirectoryObject::new(DN, ["posixGroup"]);
		desired.attributes = bag(&[("l", "N/A"), ("ou", "none"), ("mail", "a@x.com")]);
		let invalid = strings(&["n/a", "NONE"]);

		let Err(Error::Validation { errors, .. }) = validate(&desired, &invalid) else {
			panic!("validation should fail");
		};
		assert_eq!(errors.len(), 3);
		assert!(errors.contains(&ValidationError::InvalidValue {
			attribute: "ou".to_owned(),
			value: "none".to_owned()
		}));
	}

	#[test]
	fn create_request() {
		let mut desired = DirectoryObject::new(DN, ["posixGroup", "groupOfNames"]);
		desired.gid_number = Some(1000);
		desired.description = Some("My group".to_owned());
		desired.member = set(&["uid=alice,dc=example,dc=com"]);
		desired.member_uid = set(&["bob", "alice"]);
		desired.attributes =
			bag(&[("mail", "b@x.com"), ("mail", "a@x.com"), ("gidNumber", "1"), ("l", "Berlin")]);

		let request = build_create(&desired, &[]).unwrap();
		assert_eq!(request.dn, DN);
		let names: Vec<_> = request.attributes.iter().map(|(name, _)| name.as_str()).collect();
		assert_eq!(
			names,
			["objectClass", "cn", "description", "gidNumber", "member", "memberUid", "l", "mail"]
		);
		assert_eq!(request.attributes[0].1, strings(&["groupOfNames", "posixGroup"]));
		assert_eq!(request.attributes[1].1, strings(&["mygroup"]));
		assert_eq!(request.attributes[3].1, strings(&["1000"]), "gidNumber comes from its field");
		assert_eq!(request.attributes[7].1, strings(&["a@x.com", "b@x.com"]));
	}

	#[test]
	fn create_requires_cn_rdn() {
		let mut desired = DirectoryObject::new("ou=users,dc=example,dc=com", ["groupOfNames"]);
		desired.member = set(&["uid=alice,dc=example,dc=com"]);
		assert!(matches!(build_create(&desired, &[]), Err(Error::MalformedDn { .. })));
	}

	#[test]
	fn validation_precedes_dn_checks() {
		let desired = DirectoryObject::new("ou=users,dc=example,dc=com", ["posixGroup"]);
		assert!(matches!(build_create(&desired, &[]), Err(Error::Validation { .. })));
	}

	#[test]
	fn update_rendering_order() {
		let mut previous = DirectoryObject::new(DN, ["posixGroup"]);
		previous.gid_number = Some(1000);
		previous.member_uid = set(&["alice", "bob"]);
		previous.attributes = bag(&[("l", "Berlin"), ("mail", "a@x.com"), ("mail", "old@x.com")]);

		let mut desired = DirectoryObject::new(DN, ["posixGroup", "extensibleObject"]);
		desired.gid_number = Some(2000);
		desired.member_uid = set(&["bob", "carol"]);
		desired.attributes = bag(&[("mail", "a@x.com"), ("mail", "b@x.com")]);

		let modifications = build_update(&compute_object_delta(&previous, &desired));
		assert_eq!(
			modifications,
			vec![
				Modification::Replace {
					attribute: "gidNumber".to_owned(),
					values: strings(&["2000"])
				},
				Modification::Add {
					attribute: "objectClass".to_owned(),
					values: strings(&["extensibleObject"])
				},
				Modification::Delete {
					attribute: "memberUid".to_owned(),
					values: strings(&["alice"])
				},
				Modification::Add { attribute: "memberUid".to_owned(), values: strings(&["carol"]) },
				Modification::Delete { attribute: "l".to_owned(), values: Vec::new() },
				Modification::Delete {
					attribute: "mail".to_owned(),
					values: strings(&["old@x.com"])
				},
				Modification::Add { attribute: "mail".to_owned(), values: strings(&["b@x.com"]) },
			]
		);
	}

	#[test]
	fn cleared_scalar_is_empty_replace() {
		let mut previous = DirectoryObject::new(DN, ["groupOfNames"]);
		previous.description = Some("gone soon".to_owned());
		let desired = DirectoryObject::new(DN, ["groupOfNames"]);

		let modifications = build_update(&compute_object_delta(&previous, &desired));
		assert_eq!(
			modifications,
			[Modification::Replace { attribute: "description".to_owned(), values: Vec::new() }]
		);
	}

	#[test]
	fn removed_object_class_goes_last() {
		let mut previous = DirectoryObject::new(DN, ["groupOfNames", "extensibleObject"]);
		previous.attributes = bag(&[("l", "Berlin")]);
		let desired = DirectoryObject::new(DN, ["groupOfNames"]);

		let modifications = build_update(&compute_object_delta(&previous, &desired));
		assert_eq!(modifications.len(), 2);
		assert_eq!(modifications[0].attribute(), "l");
		assert_eq!(modifications[1].attribute(), "objectClass");
		assert_eq!(modifications[1].operation(), "delete");
		assert_eq!(modifications[1].values(), ["extensibleObject"]);
	}
}
