//! Helpers for the leading component of a distinguished name.
//!
//! Only the leading relative distinguished name matters to reconciliation: it
//! supplies the `cn` of newly created groups, and it is the one attribute
//! value that is implied by the DN rather than managed in the attribute bag.

use crate::error::Error;

/// The leading `name=value` component of a DN, with escapes resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
	/// Attribute type, e.g. `cn`
	pub attribute: String,
	/// Unescaped attribute value
	pub value: String,
}

impl Rdn {
	/// Parse the leading component of `dn`. Returns `None` if the DN is empty
	/// or its first component isn't an `attribute=value` pair.
	#[must_use]
	pub fn leading(dn: &str) -> Option<Self> {
		let component = first_component(dn.trim());
		let (attribute, value) = component.split_once('=')?;
		let attribute = attribute.trim();
		if attribute.is_empty() {
			return None;
		}
		let value = unescape(value.trim())?;
		Some(Self { attribute: attribute.to_owned(), value })
	}

	/// Whether `(name, value)` is this RDN. Attribute types compare
	/// case-insensitively, values exactly.
	#[must_use]
	pub fn matches(&self, name: &str, value: &str) -> bool {
		self.attribute.eq_ignore_ascii_case(name) && self.value == value
	}
}

/// Derive the common name from a DN of the form `cn=<name>,...`.
pub fn derive_cn(dn: &str) -> Result<String, Error> {
	let rdn = Rdn::leading(dn).ok_or_else(|| Error::MalformedDn {
		dn: dn.to_owned(),
		reason: "no leading name=value component".to_owned(),
	})?;
	if !rdn.attribute.eq_ignore_ascii_case("cn") {
		return Err(Error::MalformedDn {
			dn: dn.to_owned(),
			reason: format!("leading component is {:?}, not cn", rdn.attribute),
		});
	}
	Ok(rdn.value)
}

/// Everything up to the first unescaped `,` or `+`.
fn first_component(dn: &str) -> &str {
	let mut escaped = false;
	for (index, ch) in dn.char_indices() {
		match ch {
			_ if escaped => escaped = false,
			'\\' => escaped = true,
			',' | '+' => return &dn[..index],
			_ => {}
		}
	}
	dn
}

/// Resolve RFC4514 escapes: `\<special>` and `\<hex><hex>`. Returns `None` on
/// a dangling backslash or if the hex escapes don't form valid UTF-8.
fn unescape(value: &str) -> Option<String> {
	let bytes = value.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut index = 0;
	while index < bytes.len() {
		if bytes[index] != b'\\' {
			out.push(bytes[index]);
			index += 1;
			continue;
		}
		let next = *bytes.get(index + 1)?;
		let hex = bytes
			.get(index + 1..index + 3)
			.filter(|pair| pair.iter().all(u8::is_ascii_hexdigit))
			.and_then(|pair| std::str::from_utf8(pair).ok())
			.and_then(|pair| u8::from_str_radix(pair, 16).ok());
		if let Some(byte) = hex {
			out.push(byte);
			index += 3;
		} else {
			out.push(next);
			index += 2;
		}
	}
	String::from_utf8(out).ok()
}
