//! Frame source trait definitions

use async_trait::async_trait;

use crate::domain::{DataFrame, DomainResult};

/// Where a resource reads its table from and writes changes back to
#[async_trait]
pub trait DataFrameSource: Send + Sync {
    /// Current table
    async fn get_dataframe(&self) -> DomainResult<DataFrame>;

    /// Store a changed table and return it.
    ///
    /// The default keeps nothing, so changes do not stick; sources that
    /// persist override this.
    async fn update_dataframe(&self, frame: DataFrame) -> DomainResult<DataFrame> {
        Ok(frame)
    }

    /// Whether `update_dataframe` keeps what it is given
    fn persists_changes(&self) -> bool {
        false
    }
}
