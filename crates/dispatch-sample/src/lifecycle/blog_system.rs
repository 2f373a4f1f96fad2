use crate::controllers::{AuthorController, PostController};
use crate::error::BlogError;
use crate::model::{Author, Post};
use crate::router::{Request, Router};
use crate::settings::BlogSettings;
use resource_dispatch::memory::{MemoryStore, StoreActor};
use resource_dispatch::{Dispatcher, ResourceDescriptor, Response};
use tokio::task::JoinHandle;
use tracing::info;

pub struct BlogSystem {
    pub router: Router,
    pub posts: MemoryStore<Post>,
    pub authors: MemoryStore<Author>,
    handles: Vec<JoinHandle<()>>,
}

impl BlogSystem {
    pub fn start(settings: &BlogSettings) -> Self {
        let (post_actor, posts) = StoreActor::<Post>::new(settings.channel_buffer);
        let (author_actor, authors) = StoreActor::<Author>::new(settings.channel_buffer);

        let post_handle = tokio::spawn(post_actor.run(()));
        let author_handle = tokio::spawn(author_actor.run(posts.clone()));

        let router = Router::new(
            Dispatcher::new(
                PostController,
                ResourceDescriptor::new("posts", posts.clone()),
                settings.dispatch_config(&settings.posts),
            ),
            Dispatcher::new(
                AuthorController,
                ResourceDescriptor::new("authors", authors.clone()),
                settings.dispatch_config(&settings.authors),
            ),
        );
        info!(buffer = settings.channel_buffer, "Blog started");

        Self {
            router,
            posts,
            authors,
            handles: vec![post_handle, author_handle],
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        self.router.handle(request).await
    }

    pub async fn shutdown(self) -> Result<(), BlogError> {
        let Self {
            router,
            posts,
            authors,
            handles,
        } = self;
        drop(router);
        drop(posts);
        drop(authors);

        for handle in handles {
            handle.await?;
        }
        info!("Blog stopped");
        Ok(())
    }
}
