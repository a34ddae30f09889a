//! Signature fragment matching over deployed bytecode.
//!
//! Compiled contracts embed their 4-byte selectors (in the dispatcher) and
//! 32-byte event topics (as `PUSH32` operands) verbatim, so an interface is
//! "implemented" when every one of its fragments occurs in the code. Each
//! fragment consumes one occurrence: a fragment listed twice needs two
//! distinct occurrences.

use chainabi_registry::InterfaceDefinition;

/// Strip `0x` and lowercase.
pub fn normalize_hex(hex: &str) -> String {
    hex.strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex)
        .to_ascii_lowercase()
}

/// `true` iff every fragment can be found in `bytecode`, removing one
/// occurrence per fragment as it goes. Fragments are tried shortest first.
pub fn matches_all<S: AsRef<str>>(bytecode: &str, fragments: &[S]) -> bool {
    let mut working = normalize_hex(bytecode);
    let mut ordered: Vec<String> = fragments.iter().map(|f| normalize_hex(f.as_ref())).collect();
    ordered.sort_by_key(|f| f.len());

    for fragment in &ordered {
        if !working.contains(fragment.as_str()) {
            return false;
        }
        working = working.replacen(fragment.as_str(), "", 1);
    }
    true
}

/// A reusable set of fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentSet {
    fragments: Vec<String>,
}

impl FragmentSet {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            fragments: fragments
                .into_iter()
                .map(|f| normalize_hex(f.as_ref()))
                .collect(),
        }
    }

    /// Every selector and event topic of `def`.
    pub fn from_interface(def: &InterfaceDefinition) -> Self {
        Self::new(def.fragments())
    }

    /// A new set holding `self`'s fragments followed by `more`.
    pub fn extend<I, S>(&self, more: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fragments = self.fragments.clone();
        fragments.extend(more.into_iter().map(|f| normalize_hex(f.as_ref())));
        Self { fragments }
    }

    pub fn matches(&self, bytecode: &str) -> bool {
        matches_all(bytecode, &self.fragments)
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
