use super::post::Post;
use async_trait::async_trait;
use resource_dispatch::memory::{MemoryQuery, MemoryStore, Record};
use resource_dispatch::{Action, FieldErrors};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<u64>,
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
        }
    }
}

#[async_trait]
impl Record for Author {
    /// The post store, for the dependent-posts check.
    type Context = MemoryStore<Post>;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn validate(&self, _action: Action) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }
        if !self.email.contains('@') {
            errors.add("email", "is not an email address");
        }
        errors.into_result()
    }

    async fn on_delete(&self, posts: &MemoryStore<Post>) -> Result<(), FieldErrors> {
        let query = MemoryQuery::new().where_eq("author_id", self.id);
        let written = posts
            .total(query)
            .await
            .map_err(|e| FieldErrors::single("base", e.to_string()))?;
        debug!(author_id = ?self.id, written, "Checked dependent posts");
        if written > 0 {
            return Err(FieldErrors::single("base", "still has posts"));
        }
        Ok(())
    }
}
