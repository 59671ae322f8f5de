//! User service handler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tonic::{Request, Response};
use tracing::debug;

use super::{with_deadline, RpcResult, UserService};
use crate::db::{CreateUser, UserRepository};
use crate::ids::{parse_user_id, IdKind};
use crate::proto;

#[derive(Clone)]
pub struct UserHandler {
    repository: Arc<dyn UserRepository>,
    timeout: Duration,
}

impl UserHandler {
    pub fn new(repository: Arc<dyn UserRepository>, timeout: Duration) -> Self {
        Self {
            repository,
            timeout,
        }
    }

    /// Shared write path for create and update.
    ///
    /// Update is deliberately the same upsert as create: it goes through
    /// `UserRepository::create` with the full set of fields.
    async fn write_user(
        &self,
        op: &'static str,
        id: &str,
        username: String,
        password: String,
    ) -> RpcResult<proto::Empty> {
        let id = parse_user_id(id)?;

        let input = CreateUser {
            id,
            username,
            password,
        };
        with_deadline(self.timeout, IdKind::User, op, self.repository.create(input)).await?;

        Ok(Response::new(proto::Empty {}))
    }
}

#[async_trait]
impl UserService for UserHandler {
    async fn create_user(&self, request: Request<proto::CreateUserRequest>) -> RpcResult<proto::Empty> {
        let request = request.into_inner();
        debug!(id = %request.id, "create user");
        self.write_user("create_user", &request.id, request.username, request.password)
            .await
    }

    async fn get_user(&self, request: Request<proto::GetUserRequest>) -> RpcResult<proto::User> {
        let id = parse_user_id(&request.get_ref().id)?;

        let user = with_deadline(self.timeout, IdKind::User, "get_user", self.repository.find_by_id(id)).await?;

        Ok(Response::new(proto::User::from(user)))
    }

    async fn update_user(&self, request: Request<proto::UpdateUserRequest>) -> RpcResult<proto::Empty> {
        let request = request.into_inner();
        debug!(id = %request.id, "update user");
        self.write_user("update_user", &request.id, request.username, request.password)
            .await
    }

    /// Removes through `UserRepository::delete_by_user_id`.
    async fn delete_user(&self, request: Request<proto::DeleteUserRequest>) -> RpcResult<proto::Empty> {
        let id = parse_user_id(&request.get_ref().id)?;

        with_deadline(self.timeout, IdKind::User, "delete_user", self.repository.delete_by_user_id(id)).await?;

        Ok(Response::new(proto::Empty {}))
    }

    async fn list_users(&self, _request: Request<proto::Empty>) -> RpcResult<proto::ListUsersResponse> {
        let users = with_deadline(self.timeout, IdKind::User, "list_users", self.repository.find_all()).await?;

        Ok(Response::new(proto::ListUsersResponse {
            users: users.into_iter().map(proto::User::from).collect(),
        }))
    }
}
