use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How raw event counts are turned into expected yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeType {
    /// Raw (weighted) event counts, no luminosity scaling.
    None,
    /// Scaled to the integrated luminosity, ignoring the dataset weight.
    Lumi,
    /// Scaled to the integrated luminosity and multiplied by the dataset weight.
    #[default]
    LumiWeight,
}

impl fmt::Display for NormalizeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            NormalizeType::None => "none",
            NormalizeType::Lumi => "lumi",
            NormalizeType::LumiWeight => "lumi_weight",
        };
        f.write_str(word)
    }
}

impl FromStr for NormalizeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(NormalizeType::None),
            "lumi" => Ok(NormalizeType::Lumi),
            "lumi_weight" => Ok(NormalizeType::LumiWeight),
            other => Err(CoreError::UnknownNormalization(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutKind {
    Select,
    Reject,
}

impl CutKind {
    /// The three-letter tag used in cut-flow labels.
    pub fn tag(&self) -> &'static str {
        match self {
            CutKind::Select => "SEL",
            CutKind::Reject => "REJ",
        }
    }
}

/// One entry of the user's selection, in declaration order.
///
/// The report is built by walking these items; each variant carries exactly
/// what its report section needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionItem {
    /// A histogram of one observable, summarised by a statistics table.
    Histogram { observable: String },
    /// An event-level cut, summarised by an efficiency table per region.
    /// `index` is the cut's position in the session-wide cut sequence.
    Cut { index: usize },
    /// An object-definition selection: it changes objects, not events, so it
    /// carries no counts.
    ObjectDefinition { description: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_type_round_trips_through_text() {
        for mode in [NormalizeType::None, NormalizeType::Lumi, NormalizeType::LumiWeight] {
            let parsed: NormalizeType = mode.to_string().parse().unwrap();
            assert_eq!(parsed, mode);
        }
        assert!("lumiweight".parse::<NormalizeType>().is_err());
    }

    #[test]
    fn selection_items_deserialize_from_tagged_json() {
        let json = r#"[
            {"kind": "histogram", "observable": "PT(j[1])"},
            {"kind": "cut", "index": 0},
            {"kind": "object_definition", "description": "select j PT > 20"}
        ]"#;
        let items: Vec<SelectionItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1], SelectionItem::Cut { index: 0 });
    }
}
