use serde::Serialize;

use crate::auth::{AuthPrincipal, SystemRole};
use crate::database::connection::DbConnection;
use crate::database::models::user::{SystemUserRecord, UserCreateRequest, UserStanding};
use crate::database::repository::user::UserRepository;
use crate::error::{ApiError, ApiResult};

/// What `GET /user/self` reports about the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SelfView {
    pub id: Option<i32>,
    pub user_identifier: String,
    pub identity_source: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub record_end_date: Option<chrono::NaiveDate>,
    pub role_names: Vec<String>,
}

pub struct UserService<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> UserService<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    /// Registered callers are read from the database; others are described
    /// from their token with a null id.
    pub async fn current(&mut self, principal: &AuthPrincipal) -> ApiResult<SelfView> {
        let record = match principal.system_user_id {
            Some(id) => UserRepository::new(self.conn).get(id).await?,
            None => None,
        };
        Ok(match record {
            Some(user) => SelfView {
                id: Some(user.system_user_id),
                user_identifier: user.user_identifier,
                identity_source: user.identity_source,
                email: user.email,
                display_name: user.display_name,
                record_end_date: user.record_end_date,
                role_names: user.role_names,
            },
            None => SelfView {
                id: None,
                user_identifier: principal.user_identifier.clone(),
                identity_source: principal.identity_source.clone(),
                email: principal.email.clone(),
                display_name: principal.display_name.clone(),
                record_end_date: None,
                role_names: vec![],
            },
        })
    }

    pub async fn standing(&mut self, principal: &AuthPrincipal) -> ApiResult<UserStanding> {
        match principal.system_user_id {
            Some(id) => Ok(UserRepository::new(self.conn).standing(id).await?),
            None => Ok(UserStanding {
                has_pending_access_request: false,
                has_one_or_more_project_roles: false,
            }),
        }
    }

    pub async fn list(&mut self) -> ApiResult<Vec<SystemUserRecord>> {
        Ok(UserRepository::new(self.conn).list().await?)
    }

    pub async fn get(&mut self, system_user_id: i32) -> ApiResult<SystemUserRecord> {
        UserRepository::new(self.conn)
            .get(system_user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("System user {} not found", system_user_id)))
    }

    pub async fn add(&mut self, request: &UserCreateRequest) -> ApiResult<SystemUserRecord> {
        if request.user_identifier.trim().is_empty() {
            return Err(ApiError::invalid_field("user_identifier", "is required"));
        }
        validate_roles(&request.roles)?;

        let mut users = UserRepository::new(self.conn);
        let id = users
            .add(&request.user_identifier, &request.identity_source, request.email.as_deref(), None)
            .await?;
        users.add_roles(id, &request.roles).await?;
        self.get(id).await
    }

    /// Soft delete.
    pub async fn end_date(&mut self, system_user_id: i32) -> ApiResult<()> {
        self.get(system_user_id).await?;
        UserRepository::new(self.conn).end_date(system_user_id).await?;
        Ok(())
    }

    pub async fn add_roles(&mut self, system_user_id: i32, roles: &[String]) -> ApiResult<SystemUserRecord> {
        validate_roles(roles)?;
        self.get(system_user_id).await?;
        UserRepository::new(self.conn).add_roles(system_user_id, roles).await?;
        self.get(system_user_id).await
    }

    pub async fn remove_role(&mut self, system_user_id: i32, system_role_id: i32) -> ApiResult<()> {
        let removed = UserRepository::new(self.conn)
            .remove_role(system_user_id, system_role_id)
            .await?;
        if removed == 0 {
            return Err(ApiError::not_found(format!(
                "System user {} does not hold role {}",
                system_user_id, system_role_id
            )));
        }
        Ok(())
    }
}

fn validate_roles(roles: &[String]) -> ApiResult<()> {
    match roles.iter().find(|name| SystemRole::from_name(name).is_none()) {
        Some(unknown) => Err(ApiError::invalid_field("roles", format!("unknown system role '{}'", unknown))),
        None => Ok(()),
    }
}
