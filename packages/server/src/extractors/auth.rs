use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use sea_orm::EntityTrait;

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user decoded from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

/// The identity behind a request, or its absence.
///
/// A missing header yields `Anonymous`; a header that is present but does not
/// carry a valid token for an existing, active user is rejected with
/// `TokenInvalid`. Whether an anonymous actor may proceed is decided by
/// [`crate::policy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(AuthUser),
}

impl Actor {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User(_))
    }

    pub fn user_id(&self) -> Option<i32> {
        match self {
            Actor::User(user) => Some(user.user_id),
            Actor::Anonymous => None,
        }
    }

    /// Returns the user, or `TokenMissing` for an anonymous actor.
    pub fn require_user(self) -> Result<AuthUser, AppError> {
        match self {
            Actor::User(user) => Ok(user),
            Actor::Anonymous => Err(AppError::TokenMissing),
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get("Authorization") else {
            return Ok(Actor::Anonymous);
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::TokenInvalid)?;

        let state = AppState::from_ref(state);
        let claims =
            jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        // Tokens outlive their accounts; a deleted or deactivated user is rejected.
        let user = user::Entity::find_by_id(claims.uid)
            .one(&state.db)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::TokenInvalid)?;

        Ok(Actor::User(AuthUser {
            user_id: user.id,
            email: user.email,
        }))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Actor::from_request_parts(parts, state).await?.require_user()
    }
}
