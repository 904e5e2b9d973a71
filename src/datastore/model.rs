use serde::Serialize;
use uuid::Uuid;

use super::{Meta, Model, StoreError};

/// A fresh 32 character hex identifier.
pub fn make_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A record with a generated primary key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BasicModel {
    #[serde(flatten)]
    pub meta: Meta,
    pub body: String,
}

impl BasicModel {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            meta: Meta::default(),
            body: body.into(),
        }
    }
}

impl Model for BasicModel {
    type Key = String;

    const NAME: &'static str = "BasicModel";

    fn key(&self) -> String {
        self.meta.id.clone()
    }

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

/// A parent record with a composite primary key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: Meta,
    pub post_id: String,
    pub title: String,
}

impl Post {
    pub fn new(post_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            meta: Meta::default(),
            post_id: post_id.into(),
            title: title.into(),
        }
    }
}

impl Model for Post {
    /// `(post_id, title)`
    type Key = (String, String);

    const NAME: &'static str = "Post";

    fn key(&self) -> Self::Key {
        (self.post_id.clone(), self.title.clone())
    }

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), StoreError> {
        match self.post_id.is_empty() {
            true => Err(StoreError::MissingField {
                model: Self::NAME,
                field: "post_id",
            }),
            false => Ok(()),
        }
    }
}

/// A child record, optionally belonging to a [`Post`] through `(post_id, post_title)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comment {
    #[serde(flatten)]
    pub meta: Meta,
    pub comment_id: String,
    pub content: String,
    pub post_id: Option<String>,
    pub post_title: Option<String>,
}

impl Comment {
    pub fn new(comment_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            meta: Meta::default(),
            comment_id: comment_id.into(),
            content: content.into(),
            post_id: None,
            post_title: None,
        }
    }

    pub fn with_post(mut self, post: &Post) -> Self {
        self.set_post(post);
        self
    }

    pub fn set_post(&mut self, post: &Post) {
        self.post_id = Some(post.post_id.clone());
        self.post_title = Some(post.title.clone());
    }

    pub fn belongs_to(&self, post: &Post) -> bool {
        self.post_id.as_deref() == Some(post.post_id.as_str())
            && self.post_title.as_deref() == Some(post.title.as_str())
    }
}

impl Model for Comment {
    /// `(comment_id, content)`
    type Key = (String, String);

    const NAME: &'static str = "Comment";

    fn key(&self) -> Self::Key {
        (self.comment_id.clone(), self.content.clone())
    }

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), StoreError> {
        match self.comment_id.is_empty() {
            true => Err(StoreError::MissingField {
                model: Self::NAME,
                field: "comment_id",
            }),
            false => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ids_are_hex() {
        let id = make_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, make_id());
    }

    #[test]
    fn meta_is_flattened() {
        let value = serde_json::to_value(BasicModel::new("b")).unwrap();
        assert_eq!(
            value,
            json!({"id": "", "created_at": null, "updated_at": null, "body": "b"})
        );
    }

    #[test]
    fn keys_must_be_present() {
        assert_eq!(
            Post::new("", "t").validate().unwrap_err().to_string(),
            "post_id is required"
        );
        assert!(Comment::new("", "c").validate().is_err());
        assert!(Comment::new("c1", "c").validate().is_ok());
    }

    #[test]
    fn comments_link_to_posts() {
        let post = Post::new("p1", "title");
        let comment = Comment::new("c1", "content").with_post(&post);
        assert!(comment.belongs_to(&post));
        assert!(!comment.belongs_to(&Post::new("p2", "title")));
    }
}
