//! Set of format names the loaded library reports.

use alloc::collections::BTreeSet;
use alloc::string::String;
use core::fmt;

/// Upper-case, duplicate-free, sorted set of native format names.
///
/// Built from `MagickQueryFormats`. Lookups are case-insensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatRegistry {
    names: BTreeSet<String>,
}

impl FormatRegistry {
    /// Normalize and collect names. Blank entries are skipped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_ascii_uppercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    /// Whether `name` is known, ignoring case.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_ascii_uppercase())
    }

    /// Names in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'a> IntoIterator for &'a FormatRegistry {
    type Item = &'a str;
    type IntoIter = core::iter::Map<
        alloc::collections::btree_set::Iter<'a, String>,
        fn(&'a String) -> &'a str,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter().map(String::as_str as fn(&'a String) -> &'a str)
    }
}

impl fmt::Display for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}
