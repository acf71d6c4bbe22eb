//! The declarative model of a directory object.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeBag;

/// Object class attribute name
pub const OBJECT_CLASS: &str = "objectClass";
/// Common name attribute name
pub const CN: &str = "cn";

/// Desired or normalized state of a directory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryObject {
	/// Distinguished name. The identity of the object, never updated in place.
	pub dn: String,
	/// Object classes of the entry
	#[serde(default = "default_object_classes")]
	pub object_classes: BTreeSet<String>,
	/// Free form description
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Numeric group id, required by `posixGroup`
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gid_number: Option<u32>,
	/// DNs of `groupOfNames` members
	#[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
	pub member: BTreeSet<String>,
	/// User ids of `posixGroup` members
	#[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
	pub member_uid: BTreeSet<String>,
	/// DNs of `groupOfUniqueNames` members
	#[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
	pub unique_member: BTreeSet<String>,
	/// LDAP URLs generating the members of a `groupOfURLs`
	#[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
	pub member_url: BTreeSet<String>,
	/// Every other attribute
	#[serde(default)]
	pub attributes: AttributeBag,
}

/// Object classes assumed when none are configured.
fn default_object_classes() -> BTreeSet<String> {
	BTreeSet::from(["posixGroup".to_owned()])
}

impl DirectoryObject {
	/// An object at `dn` with the given object classes and nothing else.
	pub fn new<I, S>(dn: impl Into<String>, object_classes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			dn: dn.into(),
			object_classes: object_classes.into_iter().map(Into::into).collect(),
			..Self::default()
		}
	}

	/// Current value of a scalar well-known attribute in wire form.
	#[must_use]
	pub fn scalar(&self, attribute: ScalarAttribute) -> Option<String> {
		match attribute {
			ScalarAttribute::Description => self.description.clone(),
			ScalarAttribute::GidNumber => self.gid_number.map(|gid| gid.to_string()),
		}
	}

	/// Values of a multi-valued well-known attribute.
	#[must_use]
	pub fn values(&self, attribute: MultiValuedAttribute) -> &BTreeSet<String> {
		match attribute {
			MultiValuedAttribute::Member => &self.member,
			MultiValuedAttribute::MemberUid => &self.member_uid,
			MultiValuedAttribute::UniqueMember => &self.unique_member,
			MultiValuedAttribute::MemberUrl => &self.member_url,
		}
	}

	/// Mutable access to the values of a multi-valued well-known attribute.
	pub fn values_mut(&mut self, attribute: MultiValuedAttribute) -> &mut BTreeSet<String> {
		match attribute {
			MultiValuedAttribute::Member => &mut self.member,
			MultiValuedAttribute::MemberUid => &mut self.member_uid,
			MultiValuedAttribute::UniqueMember => &mut self.unique_member,
			MultiValuedAttribute::MemberUrl => &mut self.member_url,
		}
	}

	/// Whether the object has the given object class (case-insensitive).
	#[must_use]
	pub fn has_object_class(&self, object_class: &str) -> bool {
		self.object_classes.iter().any(|oc| oc.eq_ignore_ascii_case(object_class))
	}
}

/// Single-valued attributes with dedicated handling. Changes are written as a
/// whole-value replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarAttribute {
	/// `description`
	Description,
	/// `gidNumber`
	GidNumber,
}

impl ScalarAttribute {
	/// All scalar attributes, in the order their changes are rendered.
	pub const ALL: [Self; 2] = [Self::Description, Self::GidNumber];

	/// Attribute name on the wire
	#[must_use]
	pub const fn ldap_name(self) -> &'static str {
		match self {
			Self::Description => "description",
			Self::GidNumber => "gidNumber",
		}
	}

	/// Field name in the declarative model
	#[must_use]
	pub fn field_name(self) -> &'static str {
		match self {
			Self::Description => "description",
			Self::GidNumber => "gid_number",
		}
	}
}

/// Multi-valued attributes with dedicated handling. Changes are written as
/// set differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MultiValuedAttribute {
	/// `member`
	Member,
	/// `memberUid`
	MemberUid,
	/// `uniqueMember`
	UniqueMember,
	/// `memberURL`
	MemberUrl,
}

impl MultiValuedAttribute {
	/// All multi-valued attributes, in the order their changes are rendered.
	pub const ALL: [Self; 4] = [Self::Member, Self::MemberUid, Self::UniqueMember, Self::MemberUrl];

	/// Attribute name on the wire
	#[must_use]
	pub const fn ldap_name(self) -> &'static str {
		match self {
			Self::Member => "member",
			Self::MemberUid => "memberUid",
			Self::UniqueMember => "uniqueMember",
			Self::MemberUrl => "memberURL",
		}
	}
}

/// Whether `name` has a dedicated path and must stay out of the generic bag:
/// `objectClass`, `cn` and every well-known attribute.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
	[OBJECT_CLASS, CN]
		.into_iter()
		.chain(ScalarAttribute::ALL.map(ScalarAttribute::ldap_name))
		.chain(MultiValuedAttribute::ALL.map(MultiValuedAttribute::ldap_name))
		.any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// Attribute names requested when reading an entry back.
pub const READ_ATTRIBUTES: &[&str] = &[
	"*",
	CN,
	ScalarAttribute::Description.ldap_name(),
	ScalarAttribute::GidNumber.ldap_name(),
	MultiValuedAttribute::Member.ldap_name(),
	MultiValuedAttribute::MemberUid.ldap_name(),
	MultiValuedAttribute::UniqueMember.ldap_name(),
	MultiValuedAttribute::MemberUrl.ldap_name(),
];
