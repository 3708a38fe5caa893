//! Namespaced identifiers (`namespace:path`).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::IdentifierError;

/// Namespace assumed when a string carries no `namespace:` prefix.
pub const DEFAULT_NAMESPACE: &str = "quill";

/// A validated `namespace:path` name.
///
/// Namespaces allow `[a-z0-9_.-]`; paths additionally allow `/`. Both parts
/// are reference counted so clones are cheap.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
	namespace: Arc<str>,
	path: Arc<str>,
}

impl Identifier {
	/// Builds an identifier from separate parts.
	pub fn new(namespace: &str, path: &str) -> Result<Self, IdentifierError> {
		if namespace.is_empty() || !namespace.chars().all(is_namespace_char) {
			return Err(IdentifierError::InvalidNamespace {
				input: format!("{namespace}:{path}"),
			});
		}
		if path.is_empty() || !path.chars().all(is_path_char) {
			return Err(IdentifierError::InvalidPath {
				input: format!("{namespace}:{path}"),
			});
		}
		Ok(Self {
			namespace: namespace.into(),
			path: path.into(),
		})
	}

	/// Parses `namespace:path`, or a bare `path` in [`DEFAULT_NAMESPACE`].
	pub fn parse(input: &str) -> Result<Self, IdentifierError> {
		match input.split_once(':') {
			Some((namespace, path)) => Self::new(namespace, path),
			None => Self::new(DEFAULT_NAMESPACE, input),
		}
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	/// Returns `path` for the default namespace and `namespace/path` otherwise.
	///
	/// Used to derive resource directories from registry names.
	pub fn to_dir_segment(&self) -> String {
		if &*self.namespace == DEFAULT_NAMESPACE {
			self.path.to_string()
		} else {
			format!("{}/{}", self.namespace, self.path)
		}
	}
}

fn is_namespace_char(c: char) -> bool {
	matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn is_path_char(c: char) -> bool {
	is_namespace_char(c) || c == '/'
}

impl FromStr for Identifier {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Display for Identifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.namespace, self.path)
	}
}

impl fmt::Debug for Identifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Identifier({self})")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bare_path_gets_default_namespace() {
		let id = Identifier::parse("logs/oak").unwrap();
		assert_eq!(id.namespace(), DEFAULT_NAMESPACE);
		assert_eq!(id.to_string(), "quill:logs/oak");
		assert_eq!(id.to_dir_segment(), "logs/oak");
	}

	#[test]
	fn foreign_namespace_keeps_prefix_in_dir_segment() {
		let id: Identifier = "extra:fluid".parse().unwrap();
		assert_eq!(id.to_dir_segment(), "extra/fluid");
	}

	#[test]
	fn rejects_bad_characters() {
		assert!(matches!(Identifier::parse("Bad:thing"), Err(IdentifierError::InvalidNamespace { .. })));
		assert!(matches!(Identifier::parse("ok:Thing"), Err(IdentifierError::InvalidPath { .. })));
		assert!(matches!(Identifier::parse("ok:"), Err(IdentifierError::InvalidPath { .. })));
		assert!(Identifier::parse("a/b:c").is_err());
	}
}
