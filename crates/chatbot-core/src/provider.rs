use std::fmt;

/// Chat-completion models the widget may be configured to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatModel {
    #[default]
    Gpt35Turbo,
    Gpt4,
    Gpt4Turbo,
    Gpt4o,
}

impl ChatModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatModel::Gpt35Turbo => "gpt-3.5-turbo",
            ChatModel::Gpt4 => "gpt-4",
            ChatModel::Gpt4Turbo => "gpt-4-turbo",
            ChatModel::Gpt4o => "gpt-4o",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "gpt-3.5-turbo" => Some(ChatModel::Gpt35Turbo),
            "gpt-4" => Some(ChatModel::Gpt4),
            "gpt-4-turbo" => Some(ChatModel::Gpt4Turbo),
            "gpt-4o" => Some(ChatModel::Gpt4o),
            _ => None,
        }
    }

    pub fn all() -> Vec<ChatModel> {
        vec![
            ChatModel::Gpt35Turbo,
            ChatModel::Gpt4,
            ChatModel::Gpt4Turbo,
            ChatModel::Gpt4o,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ChatModel::Gpt35Turbo => "GPT-3.5 Turbo",
            ChatModel::Gpt4 => "GPT-4",
            ChatModel::Gpt4Turbo => "GPT-4 Turbo",
            ChatModel::Gpt4o => "GPT-4o",
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
