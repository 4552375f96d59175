use crate::rewriter_utils::{ID_KEY, PARENT_KEY};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// The attribute column of a feature row, parsed into ordered `key=value` pairs.
///
/// The column is split on `;`, and each piece is split on its first `=`. Empty pieces
/// (a trailing `;`, or `;;`) are skipped. A piece without `=` is stored as a bare tag
/// with no value, which is not the same as `key=` with an empty value: both are written
/// back the way they were read. Keys are not validated and duplicates are kept; lookups
/// return the first match. The raw column text is kept alongside the pairs so that
/// records that are passed through keep their attributes byte for byte.
pub struct Attributes {
    raw: String,
    pairs: Vec<(String, Option<String>)>,
}

impl Attributes {
    /// Parses the raw attribute column.
    pub fn parse<T: Into<String>>(raw: T) -> Attributes {
        let raw = raw.into();
        let pairs = raw
            .split(';')
            .filter(|piece| !piece.is_empty())
            .map(|piece| match piece.split_once('=') {
                Some((k, v)) => (k.to_string(), Some(v.to_string())),
                None => (piece.to_string(), None),
            })
            .collect();
        Attributes { raw, pairs }
    }

    /// Builds an attribute column from `key=value` pairs, in order. An empty value is
    /// written as `key=`.
    pub fn from_pairs<K, V, I>(pairs: I) -> Attributes
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Attributes::from_entries(pairs.into_iter().map(|(k, v)| (k.into(), Some(v.into()))))
    }

    /// Builds an attribute column from entries as returned by [Attributes::pairs]. An
    /// entry without a value is written as a bare tag. The raw text is the canonical
    /// `k=v;k=v` rendering of the entries.
    pub fn from_entries<I>(entries: I) -> Attributes
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        let pairs: Vec<(String, Option<String>)> = entries.into_iter().collect();
        let raw = pairs
            .iter()
            .map(|(k, v)| match v {
                Some(v) => format!("{}={}", k, v),
                None => k.clone(),
            })
            .collect::<Vec<String>>()
            .join(";");
        Attributes { raw, pairs }
    }

    /// Returns the value of the first pair with key `key`. A bare tag has the empty
    /// value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref().unwrap_or_default())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// The `ID` attribute, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.get(ID_KEY).filter(|v| !v.is_empty())
    }

    /// The `Parent` attribute, if present.
    pub fn parent(&self) -> Option<&str> {
        self.get(PARENT_KEY)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn pairs(&self) -> &[(String, Option<String>)] {
        &self.pairs
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl std::fmt::Display for Attributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
