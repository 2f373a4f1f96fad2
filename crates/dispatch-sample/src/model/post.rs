use async_trait::async_trait;
use resource_dispatch::memory::Record;
use resource_dispatch::{Action, FieldErrors};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: Option<u64>,
    /// Archived posts are hidden from every action.
    #[serde(default)]
    pub archived: bool,
}

impl Post {
    pub fn new(title: impl Into<String>, author_id: u64) -> Self {
        Self {
            title: title.into(),
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| tag.to_string()).collect();
        self
    }
}

#[async_trait]
impl Record for Post {
    type Context = ();

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn validate(&self, _action: Action) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", "can't be blank");
        }
        if self.author_id.is_none() {
            errors.add("author_id", "must be given");
        }
        errors.into_result()
    }
}
