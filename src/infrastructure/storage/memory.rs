//! In-memory frame sources

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::DataFrameSource;
use crate::domain::{DataFrame, DomainResult};

/// Table held in memory; changes replace the stored table
pub struct InMemoryFrameStore {
    frame: RwLock<DataFrame>,
}

impl InMemoryFrameStore {
    pub fn new(frame: DataFrame) -> Self {
        Self {
            frame: RwLock::new(frame),
        }
    }
}

impl Default for InMemoryFrameStore {
    fn default() -> Self {
        Self::new(DataFrame::default())
    }
}

#[async_trait]
impl DataFrameSource for InMemoryFrameStore {
    async fn get_dataframe(&self) -> DomainResult<DataFrame> {
        Ok(self.frame.read().await.clone())
    }

    async fn update_dataframe(&self, frame: DataFrame) -> DomainResult<DataFrame> {
        *self.frame.write().await = frame.clone();
        Ok(frame)
    }

    fn persists_changes(&self) -> bool {
        true
    }
}

/// Fixed table; writes are computed and returned but never kept
pub struct StaticFrame {
    frame: DataFrame,
}

impl StaticFrame {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }
}

#[async_trait]
impl DataFrameSource for StaticFrame {
    async fn get_dataframe(&self) -> DomainResult<DataFrame> {
        Ok(self.frame.clone())
    }
}
