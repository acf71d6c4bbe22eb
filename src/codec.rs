//! Conversion between wire attributes and the declarative model.
use std::collections::BTreeMap;

use tracing::debug;

use crate::{
	attribute::{AttributeBag, AttributeEntry},
	dn::Rdn,
	entry::DirectoryEntry,
	error::Error,
	object::{is_reserved, DirectoryObject, MultiValuedAttribute, ScalarAttribute, OBJECT_CLASS},
};

/// Decode the generic attributes of the entry at `dn`.
///
/// Attributes with a dedicated path are skipped, as is a single-valued
/// attribute equal to the DN's leading component: the RDN is implied by the
/// DN and not managed as a generic attribute. Every other value becomes its
/// own entry.
pub fn decode_bag<'a, I>(dn: &str, attrs: I) -> AttributeBag
where
	I: IntoIterator<Item = (&'a str, &'a [String])>,
{
	let rdn = Rdn::leading(dn);
	let mut bag = AttributeBag::new();
	for (name, values) in attrs {
		if is_reserved(name) {
			debug!(dn, attribute = name, "Skipping attribute with a dedicated path");
			continue;
		}
		if let (Some(rdn), [value]) = (&rdn, values) {
			if rdn.matches(name, value) {
				debug!(dn, attribute = name, "Skipping RDN");
				continue;
			}
		}
		for value in values {
			let entry = AttributeEntry::new(name, value.as_str());
			debug!(dn, attribute = name, %value, identity = entry.identity(), "Adding attribute");
			bag.insert(entry);
		}
	}
	bag
}

/// Group a bag by attribute name, as needed for an add request. Names are
/// ordered lexicographically, values follow the bag's ordering.
#[must_use]
pub fn encode_bag(bag: &AttributeBag) -> Vec<(String, Vec<String>)> {
	let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
	for entry in bag.sorted() {
		grouped.entry(&entry.name).or_default().push(entry.value.clone());
	}
	grouped.into_iter().map(|(name, values)| (name.to_owned(), values)).collect()
}

/// Reconstruct the normalized state of an object from a search result.
pub fn decode_entry(entry: &DirectoryEntry) -> Result<DirectoryObject, Error> {
	let mut object = DirectoryObject::new(entry.dn.as_str(), entry.attr_values(OBJECT_CLASS));

	object.description =
		entry.attr_first(ScalarAttribute::Description.ldap_name()).map(ToOwned::to_owned);
	object.gid_number = entry
		.attr_first(ScalarAttribute::GidNumber.ldap_name())
		.map(|gid| {
			gid.parse::<u32>()
				.map_err(|_| Error::Invalid(format!("gidNumber {gid:?} is not numeric")))
		})
		.transpose()?;

	for attribute in MultiValuedAttribute::ALL {
		object
			.values_mut(attribute)
			.extend(entry.attr_values(attribute.ldap_name()).iter().cloned());
	}

	let attrs = entry.attrs.iter().map(|(name, values)| (name.as_str(), values.as_slice()));
	object.attributes = decode_bag(&entry.dn, attrs);
	Ok(object)
}
