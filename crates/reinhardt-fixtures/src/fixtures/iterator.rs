//! Single-pass iteration over resolved fixtures.

use super::ResolvedFixture;

/// Lazy, ordered, single-pass sequence of resolved fixtures.
///
/// The iterator owns the resolver output and yields each fixture exactly
/// once, in resolver order.
#[derive(Debug)]
pub struct FixtureIter {
	inner: std::vec::IntoIter<ResolvedFixture>,
}

impl Iterator for FixtureIter {
	type Item = ResolvedFixture;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next()
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.inner.size_hint()
	}
}

impl ExactSizeIterator for FixtureIter {}

impl std::iter::FusedIterator for FixtureIter {}

/// Wraps resolver output into a [`FixtureIter`].
pub fn fixtures_iter(fixtures: Vec<ResolvedFixture>) -> FixtureIter {
	FixtureIter {
		inner: fixtures.into_iter(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use indexmap::IndexMap;
	use rstest::rstest;

	fn fixture(name: &str) -> ResolvedFixture {
		ResolvedFixture {
			name: name.to_string(),
			entity: "User".to_string(),
			fields: IndexMap::new(),
			dependencies: Vec::new(),
		}
	}

	#[rstest]
	fn test_preserves_order() {
		let iter = fixtures_iter(vec![fixture("b"), fixture("a"), fixture("c")]);
		let names: Vec<String> = iter.map(|f| f.name).collect();
		assert_eq!(names, vec!["b", "a", "c"]);
	}

	#[rstest]
	fn test_single_pass() {
		let mut iter = fixtures_iter(vec![fixture("a"), fixture("b")]);
		assert_eq!(iter.len(), 2);

		assert_eq!(iter.next().map(|f| f.name), Some("a".to_string()));
		assert_eq!(iter.len(), 1);
		assert_eq!(iter.next().map(|f| f.name), Some("b".to_string()));
		assert!(iter.next().is_none());
		assert!(iter.next().is_none());
	}

	#[rstest]
	fn test_empty() {
		let mut iter = fixtures_iter(Vec::new());
		assert_eq!(iter.len(), 0);
		assert!(iter.next().is_none());
	}
}
