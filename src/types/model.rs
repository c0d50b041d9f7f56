use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents a backend model identifier.
///
/// This can be a predefined model the service is known to route, or a
/// custom string value for models added later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions.
    Known(KnownModel),

    /// Custom model identifier.
    Custom(String),
}

/// Models the chat service is known to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KnownModel {
    /// The general chat model.
    DeepseekChat,

    /// The reasoning model.
    DeepseekReasoner,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{}", known_model),
            Model::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnownModel::DeepseekChat => write!(f, "deepseek-chat"),
            KnownModel::DeepseekReasoner => write!(f, "deepseek-reasoner"),
        }
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::Custom(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::Custom(model.to_string())
    }
}
