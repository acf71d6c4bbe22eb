//! The generic attribute bag.
//!
//! Generic attributes are kept as a set of singleton `(name, value)` entries
//! rather than a map of names to value lists: a multi-valued attribute is
//! simply several entries sharing a name. At the declarative boundary every
//! entry is a single-key map `{name: value}`.

use std::{
	collections::{hash_map::DefaultHasher, hash_set, BTreeMap, HashSet},
	fmt,
	hash::{Hash, Hasher},
};

use serde::{
	de::Error as _, ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer,
};

/// A single value of a generic attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttributeEntry {
	/// Attribute name as given by the user or returned by the server
	pub name: String,
	/// One value of that attribute
	pub value: String,
}

impl AttributeEntry {
	/// Create a new entry.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: value.into() }
	}

	/// Structural identity of the entry. Stable within a process and
	/// independent of where the entry sits in a collection; not meant to be
	/// persisted.
	#[must_use]
	pub fn identity(&self) -> u64 {
		let mut hasher = DefaultHasher::new();
		self.hash(&mut hasher);
		hasher.finish()
	}
}

impl Hash for AttributeEntry {
	fn hash<H: Hasher>(&self, state: &mut H) {
		// 0xff never occurs in UTF-8, so the split between name and value is
		// unambiguous.
		state.write(self.name.as_bytes());
		state.write_u8(0xff);
		state.write(self.value.as_bytes());
	}
}

impl fmt::Display for AttributeEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}={}", self.name, self.value)
	}
}

impl Serialize for AttributeEntry {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(1))?;
		map.serialize_entry(&self.name, &self.value)?;
		map.end()
	}
}

impl<'de> Deserialize<'de> for AttributeEntry {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let map = BTreeMap::<String, String>::deserialize(deserializer)?;
		let len = map.len();
		let mut pairs = map.into_iter();
		match (pairs.next(), pairs.next()) {
			(Some((name, value)), None) => Ok(Self { name, value }),
			_ => Err(D::Error::invalid_length(len, &"a map with exactly one attribute")),
		}
	}
}

/// Set of generic attribute entries. Identical `(name, value)` pairs collapse,
/// the same name with different values does not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeBag {
	/// The entries, keyed by their structural hash
	entries: HashSet<AttributeEntry>,
}

impl AttributeBag {
	/// Create an empty bag.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an entry. Returns `false` if an identical entry was already present.
	pub fn insert(&mut self, entry: AttributeEntry) -> bool {
		self.entries.insert(entry)
	}

	/// Whether an identical entry is present.
	#[must_use]
	pub fn contains(&self, entry: &AttributeEntry) -> bool {
		self.entries.contains(entry)
	}

	/// Number of entries.
	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the bag is empty.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterate in no particular order.
	pub fn iter(&self) -> hash_set::Iter<'_, AttributeEntry> {
		self.entries.iter()
	}

	/// Entries ordered by name, then value.
	#[must_use]
	pub fn sorted(&self) -> Vec<&AttributeEntry> {
		let mut entries: Vec<_> = self.entries.iter().collect();
		entries.sort();
		entries
	}

	/// Entries in `self` but not in `other`, ordered by name, then value.
	#[must_use]
	pub fn difference(&self, other: &Self) -> Vec<AttributeEntry> {
		let mut entries: Vec<_> = self.entries.difference(&other.entries).cloned().collect();
		entries.sort();
		entries
	}

	/// Whether any entry carries the attribute `name` (ASCII case-insensitive).
	#[must_use]
	pub fn has_name(&self, name: &str) -> bool {
		self.entries.iter().any(|entry| entry.name.eq_ignore_ascii_case(name))
	}

	/// Keep only entries for which `keep` returns true.
	pub fn retain(&mut self, keep: impl FnMut(&AttributeEntry) -> bool) {
		self.entries.retain(keep);
	}
}

impl FromIterator<AttributeEntry> for AttributeBag {
	fn from_iter<T: IntoIterator<Item = AttributeEntry>>(iter: T) -> Self {
		Self { entries: iter.into_iter().collect() }
	}
}

impl Extend<AttributeEntry> for AttributeBag {
	fn extend<T: IntoIterator<Item = AttributeEntry>>(&mut self, iter: T) {
		self.entries.extend(iter);
	}
}

impl IntoIterator for AttributeBag {
	type Item = AttributeEntry;
	type IntoIter = hash_set::IntoIter<AttributeEntry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}

impl<'a> IntoIterator for &'a AttributeBag {
	type Item = &'a AttributeEntry;
	type IntoIter = hash_set::Iter<'a, AttributeEntry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

impl Serialize for AttributeBag {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_seq(self.sorted())
	}
}

impl<'de> Deserialize<'de> for AttributeBag {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Ok(Vec::<AttributeEntry>::deserialize(deserializer)?.into_iter().collect())
	}
}
