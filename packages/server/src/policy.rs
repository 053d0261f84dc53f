//! Request authorization.
//!
//! Every resource handler checks its [`Policy`] twice: once against the
//! request as a whole (before the target is loaded) and once against the
//! loaded object. The first check can only fail with `TokenMissing`, the
//! second only with `PermissionDenied`, so an anonymous caller and a
//! non-owner always see different outcomes.

use axum::http::Method;

use crate::error::AppError;
use crate::extractors::auth::Actor;

/// The operation a handler performs, independent of the HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

/// A single access rule. A [`Policy`] passes only if all of its rules pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Any authenticated actor.
    Authenticated,
    /// Authenticated actors, plus anonymous read-only `list` requests.
    AuthenticatedOrListOnly,
    /// Read-only methods for anyone; mutations only for the object's author.
    OwnerOrReadOnly,
}

/// Returns true for methods that never modify state.
pub fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

impl Rule {
    fn check_request(self, actor: &Actor, method: &Method, action: Action) -> Result<(), AppError> {
        let allowed = match self {
            Rule::Authenticated => actor.is_authenticated(),
            Rule::AuthenticatedOrListOnly => {
                actor.is_authenticated() || (is_read_only(method) && action == Action::List)
            }
            Rule::OwnerOrReadOnly => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(AppError::TokenMissing)
        }
    }

    fn check_object(self, actor: &Actor, method: &Method, owner_id: i32) -> Result<(), AppError> {
        let allowed = match self {
            Rule::Authenticated | Rule::AuthenticatedOrListOnly => true,
            Rule::OwnerOrReadOnly => is_read_only(method) || actor.user_id() == Some(owner_id),
        };
        if allowed {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

/// The set of rules guarding one resource collection.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    rules: &'static [Rule],
}

pub const BLOG: Policy = Policy::new(&[Rule::AuthenticatedOrListOnly, Rule::OwnerOrReadOnly]);
pub const TAG: Policy = Policy::new(&[Rule::Authenticated]);
pub const COMMENT: Policy = Policy::new(&[Rule::Authenticated]);

impl Policy {
    pub const fn new(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    /// Collection-level check, run before the target is looked up.
    pub fn check_request(
        &self,
        actor: &Actor,
        method: &Method,
        action: Action,
    ) -> Result<(), AppError> {
        self.rules
            .iter()
            .try_for_each(|rule| rule.check_request(actor, method, action))
    }

    /// Object-level check against the author of the loaded target.
    ///
    /// Assumes [`Policy::check_request`] already passed.
    pub fn check_object(
        &self,
        actor: &Actor,
        method: &Method,
        owner_id: i32,
    ) -> Result<(), AppError> {
        self.rules
            .iter()
            .try_for_each(|rule| rule.check_object(actor, method, owner_id))
    }

    /// Both checks in pipeline order. `owner_id` is `None` for collection
    /// targets.
    pub fn authorize(
        &self,
        actor: &Actor,
        method: &Method,
        action: Action,
        owner_id: Option<i32>,
    ) -> Result<(), AppError> {
        self.check_request(actor, method, action)?;
        match owner_id {
            Some(owner_id) => self.check_object(actor, method, owner_id),
            None => Ok(()),
        }
    }
}
