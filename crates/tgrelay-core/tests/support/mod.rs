// Shared fixtures for the integration tests.

pub mod mock_messenger;

#[allow(unused_imports)]
pub use mock_messenger::{MockMessenger, SentHtml, SentMessage};

use tgrelay_core::{
    domain::{ChatId, RelayRoute, UserId},
    state::{ForwardConfig, RelayState, SharedState},
};

pub const SOURCE: ChatId = ChatId(-100_111);
pub const DESTINATION: ChatId = ChatId(-100_222);
pub const ADMIN: UserId = UserId(42);
pub const BOT_ID: UserId = UserId(9_000);

pub fn route() -> RelayRoute {
    RelayRoute {
        source: SOURCE,
        destination: DESTINATION,
        admin: ADMIN,
    }
}

pub fn shared(forwarding: bool) -> SharedState {
    RelayState::new(ForwardConfig::default(), forwarding).into_shared()
}
