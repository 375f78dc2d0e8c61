use std::sync::Arc;

use jobwatch_core::ApiError;
use jobwatch_logging::{watch_debug, watch_info, watch_warn};

use crate::operations::GraphQlOperation;
use crate::store::BoundedStateStore;
use crate::token::{token_fingerprint, TokenSource};
use crate::transport::GraphQlTransport;
use crate::types::Rotated;

/// Runs GraphQL operations with the endpoint's sticky token first, then
/// every candidate token in priority order.
#[derive(Clone)]
pub struct TokenRotationExecutor {
    tokens: TokenSource,
    transport: Arc<dyn GraphQlTransport>,
    store: BoundedStateStore,
}

impl TokenRotationExecutor {
    pub fn new(
        tokens: TokenSource,
        transport: Arc<dyn GraphQlTransport>,
        store: BoundedStateStore,
    ) -> Self {
        Self {
            tokens,
            transport,
            store,
        }
    }

    /// On total failure returns the error of the last token tried, so callers
    /// can still tell an auth failure from a transient one.
    pub async fn call_with_rotation<Op: GraphQlOperation>(
        &self,
        op: &Op,
    ) -> Result<Rotated<Op::Output>, ApiError> {
        let endpoint = op.endpoint();
        let mut last_error = None;

        let failed_sticky = match self.store.sticky_token(endpoint) {
            Some(sticky) => match self.attempt(op, &sticky).await {
                Ok(result) => {
                    watch_debug!("Sticky token {} served {}", token_fingerprint(&sticky), endpoint);
                    return Ok(Rotated {
                        result,
                        token: sticky,
                    });
                }
                Err(err) => {
                    watch_info!(
                        "Sticky token {} failed for {} ({}); rotating",
                        token_fingerprint(&sticky),
                        endpoint,
                        err.kind()
                    );
                    if let Err(store_err) = self.store.clear_sticky_token(endpoint) {
                        watch_warn!("Could not clear sticky token for {}: {}", endpoint, store_err);
                    }
                    last_error = Some(err);
                    Some(sticky)
                }
            },
            None => None,
        };

        let candidates = self.tokens.list_candidates().await;
        if candidates.is_empty() {
            return Err(ApiError::auth("no candidate tokens in the cookie store"));
        }

        for (index, token) in candidates.iter().enumerate() {
            if failed_sticky.as_deref() == Some(token.as_str()) {
                continue;
            }
            match self.attempt(op, token).await {
                Ok(result) => {
                    watch_info!(
                        "Token #{} ({}) succeeded for {}",
                        index + 1,
                        token_fingerprint(token),
                        endpoint
                    );
                    if let Err(err) = self.store.set_sticky_token(endpoint, token) {
                        watch_warn!("Could not persist sticky token for {}: {}", endpoint, err);
                    }
                    return Ok(Rotated {
                        result,
                        token: token.clone(),
                    });
                }
                Err(err) => {
                    watch_debug!(
                        "Token #{} ({}) failed for {}: {}",
                        index + 1,
                        token_fingerprint(token),
                        endpoint,
                        err
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::auth("every candidate token failed")))
    }

    async fn attempt<Op: GraphQlOperation>(
        &self,
        op: &Op,
        token: &str,
    ) -> Result<Op::Output, ApiError> {
        let data = self
            .transport
            .execute(token, op.alias(), op.query(), &op.variables())
            .await?;
        op.decode(data)
    }
}
