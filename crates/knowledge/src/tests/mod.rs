//! Cross-module tests: facade scenarios and retrieval quality.
