use serde::ser::{Serialize, SerializeMap, Serializer};

/// Fields that feed the skill matcher, in the order they are joined.
const HAYSTACK_FIELDS: [&str; 3] = ["skills", "description", "title"];

/// One scraped job posting.
///
/// Every configured field is present as a key; a selector that matched nothing
/// leaves the value `None`. Fields keep the order they were first inserted in,
/// so summary fields come before detail fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRecord {
    fields: Vec<(String, Option<String>)>,
}

impl JobRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites an existing field in place, otherwise appends it.
    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Text value of a field, `None` when the field is missing or null.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| value.as_deref())
    }

    /// The listing link, ignoring empty strings.
    pub fn link(&self) -> Option<&str> {
        self.get("link").filter(|l| !l.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    /// Merges `detail` into this record. Detail values win on key collision.
    pub fn merge(&mut self, detail: JobRecord) {
        for (field, value) in detail.fields {
            self.insert(field, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Lowercased `skills`, `description` and `title`, space-joined, nulls skipped.
    pub fn haystack(&self) -> String {
        HAYSTACK_FIELDS
            .iter()
            .filter_map(|field| self.get(field))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

impl Serialize for JobRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for JobRecord {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}
