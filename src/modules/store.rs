//! Core module owning the store connection's lifetime.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use carzone_db::Database;
use carzone_kernel::{InitCtx, Module};

pub struct StoreModule {
    db: Database,
}

impl StoreModule {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Module for StoreModule {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.db
            .ping()
            .await
            .with_context(|| format!("store '{}' did not answer ping", ctx.settings.database.name))?;
        tracing::info!(
            module = self.name(),
            backend = self.db.backend(),
            database = %ctx.settings.database.name,
            "store connection verified"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.db.shutdown().await.context("failed to close store")?;
        tracing::info!(module = self.name(), "store connection closed");
        Ok(())
    }
}

pub fn create_module(db: Database) -> Arc<dyn Module> {
    Arc::new(StoreModule::new(db))
}
