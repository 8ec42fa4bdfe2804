use reqwest::Url;

/// Value of a single query parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryValue {
    /// Emitted once as `key=value`.
    One(String),
    /// Emitted as `key=v1&key=v2…`, one pair per element.
    Many(Vec<String>),
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_owned())
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for QueryValue {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.iter().map(|value| (*value).to_owned()).collect())
    }
}

/// Ordered query parameters.
///
/// Keys are encoded in insertion order. Inserting an existing key replaces the
/// value but keeps its position.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Flattens into `(key, value)` pairs, repeating keys for list values.
    pub fn flatten(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().flat_map(|(key, value)| {
            let values: Vec<&str> = match value {
                QueryValue::One(single) => vec![single.as_str()],
                QueryValue::Many(many) => many.iter().map(String::as_str).collect(),
            };
            values.into_iter().map(move |value| (key.as_str(), value))
        })
    }

    /// Appends the parameters to `url` as an `application/x-www-form-urlencoded`
    /// query string. Leaves `url` untouched when there are no pairs.
    pub fn append_to(&self, url: &mut Url) {
        let mut pairs = self.flatten().peekable();
        if pairs.peek().is_none() {
            return;
        }
        url.query_pairs_mut().extend_pairs(pairs);
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
