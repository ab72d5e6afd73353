//! Modal forms shown to a client and the answers that come back.
//!
//! Forms serialize to the JSON shape Bedrock clients render
//! (`{"type":"form",...}` for button lists, `{"type":"custom_form",...}` for
//! input forms).

use serde::{Deserialize, Serialize};

use crate::emote::EmoteSignal;

pub type FormId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Form {
    #[serde(rename = "form")]
    Simple {
        title: String,
        content: String,
        buttons: Vec<FormButton>,
    },
    #[serde(rename = "custom_form")]
    Custom {
        title: String,
        content: Vec<FormElement>,
    },
}

impl Form {
    pub fn simple<I, S>(title: impl Into<String>, buttons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Simple {
            title: title.into(),
            content: String::new(),
            buttons: buttons
                .into_iter()
                .map(|text| FormButton { text: text.into() })
                .collect(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Simple { title, .. } | Self::Custom { title, .. } => title,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormButton {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FormElement {
    Input {
        text: String,
        placeholder: String,
        default: String,
    },
}

/// The client's answer to a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FormResponse {
    /// Dismissed without an answer.
    Closed,
    /// Index of the clicked button of a simple form.
    Button(usize),
    /// Values of a custom form's elements, in order.
    Inputs(Vec<String>),
}

/// A form awaiting its answer, with what the answer should act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingForm {
    EmoteMenu(EmoteSignal),
    CommandEntry(EmoteSignal),
}
