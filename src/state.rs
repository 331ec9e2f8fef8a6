use crate::config::{CaptionSettings, ChatSettings};

// app's shared state, read-only once the server starts
pub struct AppState {
    pub client: reqwest::Client,
    pub chat: ChatSettings,
    pub caption: CaptionSettings,
}

impl AppState {
    pub fn new(client: reqwest::Client, chat: ChatSettings, caption: CaptionSettings) -> Self {
        Self {
            client,
            chat,
            caption,
        }
    }
}
