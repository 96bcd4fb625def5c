use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountMode {
    Offline,
    Microsoft,
}

/// The identity handed to the game on its command line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub mode: AccountMode,
    pub username: String,
    /// Dashed UUID string.
    pub uuid: String,
    pub access_token: String,
}

impl Account {
    /// Offline profile with the conventional name-derived UUID.
    pub fn offline(username: &str) -> Self {
        let username = match username.trim() {
            "" => "Player",
            trimmed => trimmed,
        };
        Self {
            mode: AccountMode::Offline,
            username: username.to_string(),
            uuid: offline_uuid(username).to_string(),
            access_token: "offline_access_token".into(),
        }
    }

    pub fn microsoft(username: &str, uuid: &str, access_token: &str) -> Self {
        Self {
            mode: AccountMode::Microsoft,
            username: username.trim().to_string(),
            uuid: uuid.trim().to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// `${user_type}` value.
    pub fn user_type(&self) -> &'static str {
        match self.mode {
            AccountMode::Offline => "legacy",
            AccountMode::Microsoft => "msa",
        }
    }
}

/// Name-based (version 3) UUID of `OfflinePlayer:<name>`, matching what
/// the game server computes for unauthenticated players.
pub fn offline_uuid(username: &str) -> Uuid {
    let digest = Md5::digest(format!("OfflinePlayer:{username}").as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    bytes[6] = (bytes[6] & 0x0f) | 0x30;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}

/// Supplies the account selected by the user. Credential acquisition lives
/// behind this trait; the launcher never stores tokens itself.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn selected_account(&self) -> Option<Account>;
}

/// Provider with a fixed (possibly empty) selection.
#[derive(Debug, Clone, Default)]
pub struct StaticAccountProvider {
    account: Option<Account>,
}

impl StaticAccountProvider {
    pub fn new(account: Option<Account>) -> Self {
        Self { account }
    }

    pub fn offline(username: &str) -> Self {
        Self::new(Some(Account::offline(username)))
    }
}

#[async_trait]
impl AccountProvider for StaticAccountProvider {
    async fn selected_account(&self) -> Option<Account> {
        self.account.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_uuid_is_name_based_version_three() {
        let uuid = offline_uuid("Notch");
        assert_eq!(uuid.get_version_num(), 3);
        assert_eq!(uuid, offline_uuid("Notch"));
        assert_ne!(uuid, offline_uuid("notch"));
    }

    #[test]
    fn blank_offline_name_falls_back_to_player() {
        let account = Account::offline("   ");
        assert_eq!(account.username, "Player");
        assert_eq!(account.user_type(), "legacy");
    }

    #[tokio::test]
    async fn empty_provider_has_no_selection() {
        assert!(StaticAccountProvider::default().selected_account().await.is_none());
        let provider = StaticAccountProvider::offline("Alex");
        assert_eq!(provider.selected_account().await.unwrap().username, "Alex");
    }
}
