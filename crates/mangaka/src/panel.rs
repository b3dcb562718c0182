//! Panel records: the parsed script entries and their hydrated counterparts.

use serde::{Deserialize, Serialize};

/// One panel of a parsed script. Immutable once produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelScript {
    /// 1-based panel number as declared in the script. Always greater than zero.
    pub panel: u32,
    /// Scene description. Never empty.
    pub description: String,
    /// Spoken or thought content, possibly empty.
    pub dialogue: String,
    /// Sound-effect text. `None` when the script declared none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sfx: Option<String>,
}

/// Outcome of hydrating a single panel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum PanelStatus {
    /// No image request has completed for this panel yet.
    #[default]
    Pending,
    /// An image arrived and was attached.
    Drawn,
    /// The request succeeded but the response carried no image.
    ImageAbsent,
    /// The request failed and the run continued past it.
    Failed(String),
}

impl PanelStatus {
    /// Whether hydration for this panel has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        !matches!(self, PanelStatus::Pending)
    }
}

/// A [`PanelScript`] together with its (possibly still missing) artwork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaPanelData {
    #[serde(flatten)]
    pub script: PanelScript,
    /// `data:` URL of the rendered panel, set at most once.
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: PanelStatus,
}

impl MangaPanelData {
    /// Creates a placeholder for `script` with no image attached.
    pub fn placeholder(script: PanelScript) -> Self {
        Self {
            script,
            image_url: None,
            status: PanelStatus::Pending,
        }
    }

    pub fn panel(&self) -> u32 {
        self.script.panel
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}

impl From<PanelScript> for MangaPanelData {
    fn from(script: PanelScript) -> Self {
        Self::placeholder(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> PanelScript {
        PanelScript {
            panel: 1,
            description: "A quiet street.".to_string(),
            dialogue: String::new(),
            sfx: None,
        }
    }

    #[test]
    fn test_placeholder_has_no_image() {
        let data = MangaPanelData::placeholder(script());
        assert_eq!(data.panel(), 1);
        assert!(!data.has_image());
        assert_eq!(data.status, PanelStatus::Pending);
        assert!(!data.status.is_settled());
    }

    #[test]
    fn test_serialization_flattens_script() {
        let mut data = MangaPanelData::from(script());
        data.image_url = Some("data:image/png;base64,AAAA".to_string());
        data.status = PanelStatus::Drawn;

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["panel"], 1);
        assert_eq!(json["description"], "A quiet street.");
        assert_eq!(json["imageUrl"], "data:image/png;base64,AAAA");
        assert!(json.get("sfx").is_none());
        assert_eq!(json["status"]["state"], "drawn");
    }
}
