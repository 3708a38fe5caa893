/// Identifier validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
	#[error("invalid namespace in identifier {input:?}")]
	InvalidNamespace { input: String },

	#[error("invalid path in identifier {input:?}")]
	InvalidPath { input: String },
}
