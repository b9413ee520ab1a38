//! Default presentation sink: a resource the dialogue box renders from.
use bevy::prelude::Resource;

use super::{classifier::SpeakerClass, providers::PresentationSink, types::LineKind};

/// Portrait the UI should show next to a character line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortraitRequest {
    pub character: String,
    pub expression: String,
}

impl PortraitRequest {
    /// Asset key in the `Name_Expression` form portraits are stored under.
    pub fn asset_key(&self) -> String {
        format!("{}_{}", self.character, self.expression)
    }
}

/// Current visible state of the dialogue box.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct DialogueView {
    pub visible: bool,
    pub speaker: String,
    pub body: String,
    pub annotation: Option<String>,
    pub kind: LineKind,
    pub class: Option<SpeakerClass>,
    pub portrait: Option<PortraitRequest>,
}

impl DialogueView {
    pub fn is_narration(&self) -> bool {
        self.class.is_some_and(SpeakerClass::is_narration)
    }
}

impl PresentationSink for DialogueView {
    fn show_speaker(&mut self, name: &str) {
        self.visible = true;
        self.speaker = name.to_string();
        self.body.clear();
    }

    fn show_body(&mut self, visible: &str) {
        self.body.clear();
        self.body.push_str(visible);
    }

    fn show_annotation(&mut self, annotation: Option<&str>) {
        self.annotation = annotation.map(str::to_string);
    }

    fn show_role(&mut self, kind: LineKind, class: SpeakerClass) {
        self.kind = kind;
        self.class = Some(class);
    }

    fn show_portrait(&mut self, portrait: Option<(&str, &str)>) {
        self.portrait = portrait.map(|(character, expression)| PortraitRequest {
            character: character.to_string(),
            expression: expression.to_string(),
        });
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}
