//! Invocation store port: append-only history of recipe runs.

use std::future::Future;
use std::sync::Arc;

use switchyard_domain::error::SwitchyardError;
use switchyard_domain::id::RecipeId;
use switchyard_domain::invocation::RecipeInvocation;

/// Persists [`RecipeInvocation`] records.
pub trait InvocationStore: Send + Sync {
    /// Append one record.
    fn append(
        &self,
        invocation: RecipeInvocation,
    ) -> impl Future<Output = Result<RecipeInvocation, SwitchyardError>> + Send;

    /// Most recent runs of one recipe, newest first.
    fn find_by_recipe(
        &self,
        recipe_id: RecipeId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RecipeInvocation>, SwitchyardError>> + Send;
}

impl<T: InvocationStore> InvocationStore for Arc<T> {
    fn append(
        &self,
        invocation: RecipeInvocation,
    ) -> impl Future<Output = Result<RecipeInvocation, SwitchyardError>> + Send {
        (**self).append(invocation)
    }

    fn find_by_recipe(
        &self,
        recipe_id: RecipeId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RecipeInvocation>, SwitchyardError>> + Send {
        (**self).find_by_recipe(recipe_id, limit)
    }
}
