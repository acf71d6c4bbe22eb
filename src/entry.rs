//! Search results in a connection-neutral shape.
use std::collections::HashMap;

use ldap3::SearchEntry;

/// A single entry returned by a base search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
	/// Distinguished name of the entry
	pub dn: String,
	/// Attribute names and their values. Values keep the order the server
	/// sent them in, names are unordered.
	pub attrs: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
	/// Create an entry from `(name, values)` pairs.
	pub fn new<I, N, V>(dn: impl Into<String>, attrs: I) -> Self
	where
		I: IntoIterator<Item = (N, Vec<V>)>,
		N: Into<String>,
		V: Into<String>,
	{
		let attrs = attrs
			.into_iter()
			.map(|(name, values)| (name.into(), values.into_iter().map(Into::into).collect()))
			.collect();
		Self { dn: dn.into(), attrs }
	}

	/// All values of an attribute. Attribute names are matched ASCII
	/// case-insensitively, since servers may return a different spelling than
	/// the one requested.
	#[must_use]
	pub fn attr_values(&self, attr: &str) -> &[String] {
		if let Some(values) = self.attrs.get(attr) {
			return values;
		}
		self.attrs
			.iter()
			.find(|(name, _)| name.eq_ignore_ascii_case(attr))
			.map(|(_, values)| values.as_slice())
			.unwrap_or_default()
	}

	/// Get the first value of an attribute.
	#[must_use]
	pub fn attr_first(&self, attr: &str) -> Option<&str> {
		self.attr_values(attr).first().map(String::as_str)
	}
}

impl From<SearchEntry> for DirectoryEntry {
	/// Binary-only attributes are dropped, the reconciliation model is textual.
	fn from(entry: SearchEntry) -> Self {
		Self { dn: entry.dn, attrs: entry.attrs }
	}
}
