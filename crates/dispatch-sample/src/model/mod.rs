//! Records served by the blog: authors and their posts.

pub mod author;
pub mod post;

pub use author::Author;
pub use post::Post;
