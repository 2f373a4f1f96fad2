use crate::model::Author;
use async_trait::async_trait;
use resource_dispatch::memory::MemoryStore;
use resource_dispatch::{
    permit, Action, ActionOutcome, FlatAttributes, RequestContext, ResourceController,
    ResourceDescriptor, StepResult,
};

pub struct AuthorController;

#[async_trait]
impl ResourceController for AuthorController {
    type Repo = MemoryStore<Author>;

    async fn sanitize(
        &self,
        _resource: &ResourceDescriptor<MemoryStore<Author>>,
        _ctx: &RequestContext,
        _action: Action,
        attributes: FlatAttributes,
    ) -> StepResult<FlatAttributes> {
        Ok(ActionOutcome::Continue(permit(attributes, &["name", "email"])))
    }
}
