use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

macro_rules! token_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

token_newtype!(CollaboratorId);
token_newtype!(Sector);
token_newtype!(ElementKey);

impl ElementKey {
    /// Display element holding the overall score of one collaborator.
    pub fn overall_display(collaborator_id: &CollaboratorId) -> Self {
        Self(format!("overall-{collaborator_id}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleProperty {
    Opacity,
    Color,
}

impl StyleProperty {
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Opacity => "opacity",
            Self::Color => "color",
        }
    }
}

pub const OPACITY_UPDATING: &str = "0.5";
pub const OPACITY_NORMAL: &str = "1";

pub const COLOR_SUCCESS: &str = "#28a745";
pub const COLOR_FAILURE: &str = "#dc3545";

pub const OVERALL_ERROR_TEXT: &str = "Erro";
pub const SAVING_TEXT: &str = "Salvando...";
pub const SAVE_FAILED_TEXT: &str = "Erro ao salvar!";

pub const STATUS_CLEAR_DELAY: Duration = Duration::from_millis(3000);
