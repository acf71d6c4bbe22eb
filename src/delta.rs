//! Differences between a previous and a desired state.
//!
//! The generic bag is compared as a set of `(name, value)` entries, so there
//! is no "changed" category for it: a new value for an existing name shows up
//! as one added and one removed entry. Multi-valued well-known attributes are
//! compared as plain string sets, scalars by value.
//!
//! Attribute names and object classes match ASCII case-insensitively, as they
//! do on the server. Where both sides spell one differently, the previous
//! (server) spelling wins.
use std::collections::{BTreeSet, HashMap};

use crate::{
	attribute::{AttributeBag, AttributeEntry},
	object::{is_reserved, DirectoryObject, MultiValuedAttribute, ScalarAttribute},
};

/// Difference between two generic attribute bags. Both lists are ordered by
/// name, then value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BagDelta {
	/// Entries present in the desired bag only
	pub added: Vec<AttributeEntry>,
	/// Entries present in the previous bag only
	pub removed: Vec<AttributeEntry>,
}

impl BagDelta {
	/// Whether the bags were equal.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty()
	}
}

/// Difference between two value sets, both lists sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetDelta {
	/// Values to add
	pub to_add: Vec<String>,
	/// Values to remove
	pub to_remove: Vec<String>,
}

impl SetDelta {
	/// Whether the sets were equal.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.to_add.is_empty() && self.to_remove.is_empty()
	}
}

/// A scalar attribute whose value differs. `None` clears the attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarChange {
	/// Which attribute changed
	pub attribute: ScalarAttribute,
	/// New value in wire form
	pub value: Option<String>,
}

/// Everything that differs between two states of one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectDelta {
	/// Scalars to replace
	pub changed: Vec<ScalarChange>,
	/// Object class changes
	pub object_classes: SetDelta,
	/// Non-empty set deltas of multi-valued well-known attributes, in
	/// [`MultiValuedAttribute::ALL`] order
	pub sets: Vec<(MultiValuedAttribute, SetDelta)>,
	/// Generic attribute changes
	pub bag: BagDelta,
	/// Names left with no value at all in the desired bag, sorted. Removals for
	/// these can drop the whole attribute.
	pub cleared: BTreeSet<String>,
}

impl ObjectDelta {
	/// Whether the states are equivalent.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.changed.is_empty()
			&& self.object_classes.is_empty()
			&& self.sets.is_empty()
			&& self.bag.is_empty()
	}
}

/// Compute which entries to add and which to remove to turn `previous` into
/// `desired`. Names are compared ignoring case.
#[must_use]
pub fn compute_bag_delta(previous: &AttributeBag, desired: &AttributeBag) -> BagDelta {
	let desired = with_previous_spelling(previous, desired);
	BagDelta { added: desired.difference(previous), removed: previous.difference(&desired) }
}

/// `desired` with every name that `previous` also carries respelled the way
/// `previous` spells it.
fn with_previous_spelling(previous: &AttributeBag, desired: &AttributeBag) -> AttributeBag {
	let spellings: HashMap<String, &str> = previous
		.iter()
		.map(|entry| (entry.name.to_ascii_lowercase(), entry.name.as_str()))
		.collect();
	desired
		.iter()
		.map(|entry| match spellings.get(&entry.name.to_ascii_lowercase()) {
			Some(name) if *name != entry.name => AttributeEntry::new(*name, entry.value.as_str()),
			_ => entry.clone(),
		})
		.collect()
}

/// Two-way set difference. Values present in both sets are left alone.
#[must_use]
pub fn compute_set_delta(previous: &BTreeSet<String>, desired: &BTreeSet<String>) -> SetDelta {
	SetDelta {
		to_add: desired.difference(previous).cloned().collect(),
		to_remove: previous.difference(desired).cloned().collect(),
	}
}

/// Object class difference. Classes match ignoring case; removals carry the
/// previous spelling, and a class listed twice in different case is added
/// once.
#[must_use]
pub fn compute_object_class_delta(
	previous: &BTreeSet<String>,
	desired: &BTreeSet<String>,
) -> SetDelta {
	let lowered = |classes: &BTreeSet<String>| -> BTreeSet<String> {
		classes.iter().map(|class| class.to_ascii_lowercase()).collect()
	};
	let (previous_keys, desired_keys) = (lowered(previous), lowered(desired));

	let mut seen = BTreeSet::new();
	SetDelta {
		to_add: desired
			.iter()
			.filter(|class| {
				let key = class.to_ascii_lowercase();
				!previous_keys.contains(&key) && seen.insert(key)
			})
			.cloned()
			.collect(),
		to_remove: previous
			.iter()
			.filter(|class| !desired_keys.contains(&class.to_ascii_lowercase()))
			.cloned()
			.collect(),
	}
}

/// Generic entries that may be managed through the bag.
fn generic_only(bag: &AttributeBag) -> AttributeBag {
	bag.iter().filter(|entry| !is_reserved(&entry.name)).cloned().collect()
}

/// Compute the full difference between two states of the same object.
/// Entries of the generic bags whose names have a dedicated path are ignored.
#[must_use]
pub fn compute_object_delta(previous: &DirectoryObject, desired: &DirectoryObject) -> ObjectDelta {
	let changed = ScalarAttribute::ALL
		.into_iter()
		.filter_map(|attribute| {
			let value = desired.scalar(attribute);
			(previous.scalar(attribute) != value).then_some(ScalarChange { attribute, value })
		})
		.collect();

	let sets = MultiValuedAttribute::ALL
		.into_iter()
		.map(|attribute| {
			(attribute, compute_set_delta(previous.values(attribute), desired.values(attribute)))
		})
		.filter(|(_, delta)| !delta.is_empty())
		.collect();

	let previous_bag = generic_only(&previous.attributes);
	let desired_bag = generic_only(&desired.attributes);
	let bag = compute_bag_delta(&previous_bag, &desired_bag);
	let cleared = bag
		.removed
		.iter()
		.filter(|entry| !desired_bag.has_name(&entry.name))
		.map(|entry| entry.name.clone())
		.collect();

	let object_classes =
		compute_object_class_delta(&previous.object_classes, &desired.object_classes);

	ObjectDelta {
		changed,
		object_classes,
		sets,
		bag,
		cleared,
	}
}
