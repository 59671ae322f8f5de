//! Service layer for umanager.
//!
//! One handler per entity implements the service contract on top of a
//! repository port:
//! - Users (`UserHandler`, keyed by UUID)
//! - Links (`LinkHandler`, keyed by ObjectID)
//!
//! Every call runs under a fixed deadline, validates the identifiers it is
//! given, makes exactly one repository call and reports failures as
//! `InvalidArgument` (bad identifier) or `Internal` (everything else).

mod links;
mod users;

pub use links::LinkHandler;
pub use users::UserHandler;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tonic::{Request, Response, Status};
use tracing::warn;

use crate::ids::IdKind;
use crate::proto;

pub type RpcResult<T> = std::result::Result<Response<T>, Status>;

#[async_trait]
pub trait UserService: Send + Sync + 'static {
    async fn create_user(&self, request: Request<proto::CreateUserRequest>) -> RpcResult<proto::Empty>;

    async fn get_user(&self, request: Request<proto::GetUserRequest>) -> RpcResult<proto::User>;

    async fn update_user(&self, request: Request<proto::UpdateUserRequest>) -> RpcResult<proto::Empty>;

    async fn delete_user(&self, request: Request<proto::DeleteUserRequest>) -> RpcResult<proto::Empty>;

    async fn list_users(&self, request: Request<proto::Empty>) -> RpcResult<proto::ListUsersResponse>;
}

#[async_trait]
pub trait LinkService: Send + Sync + 'static {
    async fn create_link(&self, request: Request<proto::CreateLinkRequest>) -> RpcResult<proto::Empty>;

    async fn get_link(&self, request: Request<proto::GetLinkRequest>) -> RpcResult<proto::Link>;

    async fn update_link(&self, request: Request<proto::UpdateLinkRequest>) -> RpcResult<proto::Empty>;

    async fn delete_link(&self, request: Request<proto::DeleteLinkRequest>) -> RpcResult<proto::Empty>;

    async fn list_links(&self, request: Request<proto::Empty>) -> RpcResult<proto::ListLinkResponse>;

    async fn get_link_by_user_id(
        &self,
        request: Request<proto::GetLinksByUserId>,
    ) -> RpcResult<proto::ListLinkResponse>;
}

/// Run one repository call under `timeout`.
///
/// The call is dropped as soon as this returns, whether it finished, failed or
/// ran out of time. An outer deadline still applies, so the shorter one wins.
/// Repository errors and timeouts both become `Internal`, carrying the
/// repository's message, and are logged with the entity and operation.
pub(crate) async fn with_deadline<T, F>(
    timeout: Duration,
    entity: IdKind,
    op: &'static str,
    call: F,
) -> std::result::Result<T, Status>
where
    F: Future<Output = crate::Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            warn!(%entity, op, error = %err, "Repository call failed");
            Err(Status::internal(err.to_string()))
        }
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            warn!(%entity, op, timeout_ms, "Repository call timed out");
            Err(Status::internal(format!("deadline exceeded after {}ms", timeout_ms)))
        }
    }
}
