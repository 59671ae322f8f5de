//! Link service handler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tonic::{Request, Response};
use tracing::debug;

use super::{with_deadline, LinkService, RpcResult};
use crate::db::{CreateLink, Link, LinkRepository};
use crate::ids::{parse_link_id, IdKind};
use crate::proto;

#[derive(Clone)]
pub struct LinkHandler {
    repository: Arc<dyn LinkRepository>,
    timeout: Duration,
}

impl LinkHandler {
    pub fn new(repository: Arc<dyn LinkRepository>, timeout: Duration) -> Self {
        Self {
            repository,
            timeout,
        }
    }

    /// Shared write path for create and update.
    ///
    /// Update is deliberately the same upsert as create: it goes through
    /// `LinkRepository::create` with the full set of fields.
    async fn write_link(&self, op: &'static str, id: &str, fields: LinkFields) -> RpcResult<proto::Empty> {
        let id = parse_link_id(id)?;

        let input = CreateLink {
            id,
            title: fields.title,
            url: fields.url,
            images: fields.images,
            tags: fields.tags,
            user_id: fields.user_id,
        };
        with_deadline(self.timeout, IdKind::Link, op, self.repository.create(input)).await?;

        Ok(Response::new(proto::Empty {}))
    }
}

/// Business fields shared by the create and update requests.
struct LinkFields {
    title: String,
    url: String,
    images: Vec<String>,
    tags: Vec<String>,
    user_id: String,
}

fn to_list_response(links: Vec<Link>) -> proto::ListLinkResponse {
    proto::ListLinkResponse {
        links: links.into_iter().map(proto::Link::from).collect(),
    }
}

#[async_trait]
impl LinkService for LinkHandler {
    async fn create_link(&self, request: Request<proto::CreateLinkRequest>) -> RpcResult<proto::Empty> {
        let request = request.into_inner();
        debug!(id = %request.id, user_id = %request.user_id, "create link");

        let fields = LinkFields {
            title: request.title,
            url: request.url,
            images: request.images,
            tags: request.tags,
            user_id: request.user_id,
        };
        self.write_link("create_link", &request.id, fields).await
    }

    async fn get_link(&self, request: Request<proto::GetLinkRequest>) -> RpcResult<proto::Link> {
        let id = parse_link_id(&request.get_ref().id)?;

        let link = with_deadline(self.timeout, IdKind::Link, "get_link", self.repository.find_by_id(id)).await?;

        Ok(Response::new(proto::Link::from(link)))
    }

    async fn update_link(&self, request: Request<proto::UpdateLinkRequest>) -> RpcResult<proto::Empty> {
        let request = request.into_inner();
        debug!(id = %request.id, user_id = %request.user_id, "update link");

        let fields = LinkFields {
            title: request.title,
            url: request.url,
            images: request.images,
            tags: request.tags,
            user_id: request.user_id,
        };
        self.write_link("update_link", &request.id, fields).await
    }

    /// Removes through `LinkRepository::delete`, keyed by the link's own id.
    async fn delete_link(&self, request: Request<proto::DeleteLinkRequest>) -> RpcResult<proto::Empty> {
        let id = parse_link_id(&request.get_ref().id)?;

        with_deadline(self.timeout, IdKind::Link, "delete_link", self.repository.delete(id)).await?;

        Ok(Response::new(proto::Empty {}))
    }

    async fn list_links(&self, _request: Request<proto::Empty>) -> RpcResult<proto::ListLinkResponse> {
        let links = with_deadline(self.timeout, IdKind::Link, "list_links", self.repository.find_all()).await?;

        Ok(Response::new(to_list_response(links)))
    }

    /// `user_id` is an opaque reference at this tier and is passed through
    /// unparsed.
    async fn get_link_by_user_id(
        &self,
        request: Request<proto::GetLinksByUserId>,
    ) -> RpcResult<proto::ListLinkResponse> {
        let user_id = request.into_inner().user_id;

        let links = with_deadline(
            self.timeout,
            IdKind::Link,
            "get_link_by_user_id",
            self.repository.find_by_user_id(&user_id),
        )
        .await?;

        Ok(Response::new(to_list_response(links)))
    }
}
