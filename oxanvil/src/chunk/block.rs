use indexmap::IndexMap;

/// A distinct block state: a namespaced name (eg `minecraft:iron_ore`)
/// plus its properties. Legacy chunks produce numeric names instead.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockState {
    name: String,
    properties: IndexMap<String, String>,
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: IndexMap::new(),
        }
    }

    pub(crate) fn with_properties(name: String, properties: IndexMap<String, String>) -> Self {
        Self { name, properties }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
