use crate::{ProjectUpdate, Result};
use async_trait::async_trait;

/// Downstream processor that performs the actual recomputation for a settled
/// project update. The detector only decides when and for which targets this
/// runs; it does not interpret the result beyond surfacing failures.
#[async_trait]
pub trait ChangeProcessor: Send + Sync {
    async fn on_update(&self, update: ProjectUpdate) -> Result<()>;
}
