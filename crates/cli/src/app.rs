use std::sync::Arc;

use anyhow::{Context, Result};

use {
    ztool_accounts::{AccountRegistry, LinkedAccount},
    ztool_config::ZtoolConfig,
    ztool_member::MemberClient,
    ztool_store::{FileStore, RecordStore, records},
    ztool_zalo::ZaloClient,
};

/// Shared wiring for every subcommand: config, persistent record store,
/// account registry, and the two HTTP clients.
pub struct App {
    pub config: ZtoolConfig,
    pub store: Arc<FileStore>,
    pub registry: Arc<AccountRegistry>,
    pub member: MemberClient,
    pub zalo: ZaloClient,
}

impl App {
    pub fn bootstrap(config: ZtoolConfig) -> Result<Self> {
        let data_dir = config.resolve_data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;

        let store = Arc::new(FileStore::new(data_dir));
        let registry = Arc::new(AccountRegistry::load(
            store.clone() as Arc<dyn RecordStore>
        ));
        let member = MemberClient::new(config.member_api_base.clone());
        let zalo = ZaloClient::new(config.zalo_api_base.clone());

        Ok(Self {
            config,
            store,
            registry,
            member,
            zalo,
        })
    }

    /// Stored auth token, or a friendly error if the operator never logged in.
    pub fn auth_token(&self) -> Result<String> {
        records::load_auth_token(self.store.as_ref() as &dyn RecordStore)
            .context("not logged in — run `ztool login` first")
    }

    /// Currently selected Zalo account, or a friendly error if none is linked.
    pub fn selected_account(&self) -> Result<LinkedAccount> {
        self.registry
            .selected()
            .context("no Zalo account linked — run `ztool link` first")
    }
}
