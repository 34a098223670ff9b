use std::sync::Arc;

use crate::config::{AppConfig, JwtConfig};
use crate::friends::store::SocialGraph;
use crate::groups::store::GroupStore;
use crate::messages::store::ConversationStore;
use crate::users::store::UserStore;

/// Shared handles to the in-memory stores. Cheap to clone; every
/// request handler gets its own copy of the `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub friends: Arc<SocialGraph>,
    pub groups: Arc<GroupStore>,
    pub conversations: Arc<ConversationStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Arc<AppConfig>) -> Self {
        Self {
            users: Arc::new(UserStore::default()),
            friends: Arc::new(SocialGraph::default()),
            groups: Arc::new(GroupStore::default()),
            conversations: Arc::new(ConversationStore::default()),
            config,
        }
    }

    /// State with a fixed test configuration; no environment needed.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            poll_timeout_secs: 1,
        });
        Self::from_config(config)
    }
}
