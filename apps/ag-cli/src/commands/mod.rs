// mod.rs - Shared command context.

pub mod agent;
pub mod anomalies;
pub mod generate;
pub mod overview;
pub mod policies;
pub mod presets;
pub mod simulate;
pub mod tools;
pub mod watch;

use ag_client::ApiClient;
use ag_dashboard::{refresh, refresh_all, AppState, DashboardConfig, Resource};

/// Config plus a ready client, built once in `main`.
pub struct Context {
    pub config: DashboardConfig,
    pub client: ApiClient,
}

impl Context {
    pub fn new(config: DashboardConfig) -> anyhow::Result<Self> {
        let client = config.client()?;
        Ok(Self { config, client })
    }

    pub fn new_state(&self) -> AppState {
        AppState::new(self.config.pipeline())
    }

    /// Fresh state with only `resources` loaded.
    pub async fn load(&self, resources: &[Resource]) -> AppState {
        let mut state = self.new_state();
        refresh(&self.client, &mut state, resources).await;
        state
    }

    /// Fresh state with every resource loaded.
    pub async fn load_all(&self) -> AppState {
        let mut state = self.new_state();
        refresh_all(&self.client, &mut state).await;
        state
    }
}
