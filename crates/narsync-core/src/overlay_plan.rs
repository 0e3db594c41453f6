//! Overlay plans in the shape produced by lesson authoring tools.
//!
//! A plan groups overlays by kind instead of listing annotations. It converts
//! to annotations in a fixed order: captions, then highlights, then emphasis.

use serde::{Deserialize, Serialize};

use crate::types::{OverlayAnnotation, OverlayCategory};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayPlan {
    /// Words to highlight when spoken; each keyword is its own trigger.
    #[serde(default)]
    pub highlight_keywords: Vec<String>,
    #[serde(default)]
    pub caption_phrases: Vec<CaptionPhrase>,
    #[serde(default)]
    pub emphasis_points: Vec<EmphasisPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionPhrase {
    pub trigger: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmphasisPoint {
    /// Free-form kind, e.g. "definition" or "key_term".
    #[serde(rename = "type", default)]
    pub kind: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl EmphasisPoint {
    /// The explicit trigger, else the term before a `:`, else the whole text.
    pub fn effective_trigger(&self) -> &str {
        if let Some(trigger) = self.trigger.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return trigger;
        }
        match self.text.split_once(':') {
            Some((term, _)) if !term.trim().is_empty() => term.trim(),
            _ => self.text.trim(),
        }
    }
}

impl OverlayPlan {
    pub fn is_empty(&self) -> bool {
        self.highlight_keywords.is_empty()
            && self.caption_phrases.is_empty()
            && self.emphasis_points.is_empty()
    }

    pub fn to_annotations(&self) -> Vec<OverlayAnnotation> {
        let captions = self
            .caption_phrases
            .iter()
            .map(|c| OverlayAnnotation::new(OverlayCategory::Caption, c.trigger.clone(), c.text.clone()));
        let highlights = self
            .highlight_keywords
            .iter()
            .map(|k| OverlayAnnotation::new(OverlayCategory::Highlight, k.clone(), k.clone()));
        let emphasis = self.emphasis_points.iter().map(|e| {
            OverlayAnnotation::new(
                OverlayCategory::Emphasis,
                e.effective_trigger().to_string(),
                e.text.clone(),
            )
        });

        captions.chain(highlights).chain(emphasis).collect()
    }
}
