//! Payload shapes of every block kind.
//!
//! Field names are camelCase on the wire. Each payload derives its display
//! template, found under `templates/blocks/`.

use askama::Template;
use serde::{Deserialize, Serialize};

use super::list::{Blank, EditableList, ListEdit};
use super::schema::{BlockContent, Field, FieldKind};

mod filters {
    /// Neutralizes urls that would execute in the browser.
    pub fn href<T: std::fmt::Display>(s: T) -> ::askama::Result<String> {
        Ok(crate::render::safe_url(&s.to_string()))
    }
}

const HEADING: Field = Field::new("heading", "Heading", FieldKind::Line);
const TITLE: Field = Field::new("title", "Title", FieldKind::Line);
const DESCRIPTION: Field = Field::new("description", "Description", FieldKind::Multiline);
const IMAGE: Field = Field::new("image", "Image", FieldKind::Image);

fn blank(fields: &[&String]) -> bool {
    fields.iter().all(|f| f.is_blank())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/text.html")]
pub struct TextBlock {
    pub heading: String,
    pub text: String,
}

impl TextBlock {
    /// Paragraphs of the text, split on blank lines.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

impl BlockContent for TextBlock {
    const FIELDS: &'static [Field] = &[
        HEADING,
        Field::new("text", "Text", FieldKind::Multiline),
    ];

    fn is_blank(&self) -> bool {
        blank(&[&self.heading, &self.text])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/image.html")]
pub struct ImageBlock {
    pub src: String,
    pub alt: String,
    pub caption: String,
}

impl BlockContent for ImageBlock {
    const FIELDS: &'static [Field] = &[
        Field::new("src", "Image", FieldKind::Image),
        Field::new("alt", "Alternative text", FieldKind::Line),
        Field::new("caption", "Caption", FieldKind::Line),
    ];

    fn is_blank(&self) -> bool {
        self.src.is_blank()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/list.html")]
pub struct ListBlock {
    pub title: String,
    pub items: EditableList<String>,
}

impl Default for ListBlock {
    fn default() -> Self {
        Self {
            title: String::new(),
            items: EditableList::with_blank(),
        }
    }
}

impl BlockContent for ListBlock {
    const FIELDS: &'static [Field] = &[TITLE, Field::new("items", "Items", FieldKind::Strings)];

    fn is_blank(&self) -> bool {
        !self.items.has_content()
    }

    fn list_mut(&mut self, field: &str) -> Option<&mut dyn ListEdit> {
        match field {
            "items" => Some(&mut self.items),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/quote.html")]
pub struct QuoteBlock {
    pub text: String,
    pub author: String,
}

impl BlockContent for QuoteBlock {
    const FIELDS: &'static [Field] = &[
        Field::new("text", "Quote", FieldKind::Multiline),
        Field::new("author", "Author", FieldKind::Line),
    ];

    fn is_blank(&self) -> bool {
        self.text.is_blank()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryImage {
    pub src: String,
    pub alt: String,
    pub caption: String,
}

impl Blank for GalleryImage {
    fn is_blank(&self) -> bool {
        self.src.is_blank()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/gallery.html")]
pub struct GalleryBlock {
    pub title: String,
    pub images: EditableList<GalleryImage>,
}

impl Default for GalleryBlock {
    fn default() -> Self {
        Self {
            title: String::new(),
            images: EditableList::with_blank(),
        }
    }
}

impl BlockContent for GalleryBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        Field::new(
            "images",
            "Images",
            FieldKind::Records(&[
                Field::new("src", "Image", FieldKind::Image),
                Field::new("alt", "Alternative text", FieldKind::Line),
                Field::new("caption", "Caption", FieldKind::Line),
            ]),
        ),
    ];

    fn is_blank(&self) -> bool {
        !self.images.has_content()
    }

    fn list_mut(&mut self, field: &str) -> Option<&mut dyn ListEdit> {
        match field {
            "images" => Some(&mut self.images),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/video.html")]
pub struct VideoBlock {
    pub title: String,
    pub url: String,
    pub caption: String,
}

impl VideoBlock {
    /// Embeddable player url for known hosts.
    pub fn embed_url(&self) -> Option<String> {
        let url = url::Url::parse(self.url.trim()).ok()?;
        let host = url.host_str()?.trim_start_matches("www.");
        match host {
            "youtube.com" | "m.youtube.com" => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, id)| format!("https://www.youtube.com/embed/{id}"))
                .or_else(|| {
                    url.path()
                        .strip_prefix("/embed/")
                        .map(|id| format!("https://www.youtube.com/embed/{id}"))
                }),
            "youtu.be" => url
                .path_segments()?
                .next()
                .filter(|id| !id.is_empty())
                .map(|id| format!("https://www.youtube.com/embed/{id}")),
            "vimeo.com" => url
                .path_segments()?
                .find(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
                .map(|id| format!("https://player.vimeo.com/video/{id}")),
            _ => None,
        }
    }
}

impl BlockContent for VideoBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        Field::new("url", "Video url", FieldKind::Url),
        Field::new("caption", "Caption", FieldKind::Line),
    ];

    fn is_blank(&self) -> bool {
        self.url.is_blank()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/testimonial.html")]
pub struct TestimonialBlock {
    pub name: String,
    pub role: String,
    pub content: String,
    pub image: String,
}

impl BlockContent for TestimonialBlock {
    const FIELDS: &'static [Field] = &[
        Field::new("name", "Name", FieldKind::Line),
        Field::new("role", "Role", FieldKind::Line),
        Field::new("content", "Testimonial", FieldKind::Multiline),
        Field::new("image", "Photo", FieldKind::Image),
    ];

    fn is_blank(&self) -> bool {
        self.content.is_blank()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stat {
    pub label: String,
    pub value: String,
}

impl Blank for Stat {
    fn is_blank(&self) -> bool {
        blank(&[&self.label, &self.value])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/stats.html")]
pub struct StatsBlock {
    pub title: String,
    pub stats: EditableList<Stat>,
}

impl Default for StatsBlock {
    fn default() -> Self {
        Self {
            title: String::new(),
            stats: EditableList::with_blank(),
        }
    }
}

impl BlockContent for StatsBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        Field::new(
            "stats",
            "Figures",
            FieldKind::Records(&[
                Field::new("label", "Label", FieldKind::Line),
                Field::new("value", "Value", FieldKind::Line),
            ]),
        ),
    ];

    fn is_blank(&self) -> bool {
        !self.stats.has_content()
    }

    fn list_mut(&mut self, field: &str) -> Option<&mut dyn ListEdit> {
        match field {
            "stats" => Some(&mut self.stats),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineEvent {
    pub year: String,
    pub title: String,
    pub description: String,
}

impl Blank for TimelineEvent {
    fn is_blank(&self) -> bool {
        blank(&[&self.year, &self.title, &self.description])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/timeline.html")]
pub struct TimelineBlock {
    pub title: String,
    pub events: EditableList<TimelineEvent>,
}

impl Default for TimelineBlock {
    fn default() -> Self {
        Self {
            title: String::new(),
            events: EditableList::with_blank(),
        }
    }
}

impl BlockContent for TimelineBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        Field::new(
            "events",
            "Events",
            FieldKind::Records(&[
                Field::new("year", "Year", FieldKind::Line),
                TITLE,
                DESCRIPTION,
            ]),
        ),
    ];

    fn is_blank(&self) -> bool {
        !self.events.has_content()
    }

    fn list_mut(&mut self, field: &str) -> Option<&mut dyn ListEdit> {
        match field {
            "events" => Some(&mut self.events),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Question {
    pub question: String,
    pub answer: String,
}

impl Blank for Question {
    fn is_blank(&self) -> bool {
        blank(&[&self.question, &self.answer])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/faq.html")]
pub struct FaqBlock {
    pub title: String,
    pub questions: EditableList<Question>,
}

impl Default for FaqBlock {
    fn default() -> Self {
        Self {
            title: String::new(),
            questions: EditableList::with_blank(),
        }
    }
}

impl BlockContent for FaqBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        Field::new(
            "questions",
            "Questions",
            FieldKind::Records(&[
                Field::new("question", "Question", FieldKind::Line),
                Field::new("answer", "Answer", FieldKind::Multiline),
            ]),
        ),
    ];

    fn is_blank(&self) -> bool {
        !self.questions.has_content()
    }

    fn list_mut(&mut self, field: &str) -> Option<&mut dyn ListEdit> {
        match field {
            "questions" => Some(&mut self.questions),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Template)]
#[serde(default, rename_all = "camelCase")]
#[template(path = "blocks/cta.html")]
pub struct CtaBlock {
    pub title: String,
    pub description: String,
    pub button_text: String,
    pub button_url: String,
}

impl BlockContent for CtaBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        DESCRIPTION,
        Field::new("buttonText", "Button text", FieldKind::Line),
        Field::new("buttonUrl", "Button link", FieldKind::Url),
    ];

    fn is_blank(&self) -> bool {
        blank(&[&self.title, &self.description, &self.button_text])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/file.html")]
pub struct FileBlock {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl BlockContent for FileBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        Field::new("url", "File link", FieldKind::Url),
        DESCRIPTION,
    ];

    fn is_blank(&self) -> bool {
        self.url.is_blank()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Template)]
#[serde(default, rename_all = "camelCase")]
#[template(path = "blocks/map.html")]
pub struct MapBlock {
    pub title: String,
    pub address: String,
    pub embed_url: String,
}

impl BlockContent for MapBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        Field::new("address", "Address", FieldKind::Line),
        Field::new("embedUrl", "Map embed link", FieldKind::Url),
    ];

    fn is_blank(&self) -> bool {
        blank(&[&self.address, &self.embed_url])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/award.html")]
pub struct AwardBlock {
    pub title: String,
    pub issuer: String,
    pub year: String,
    pub description: String,
    pub image: String,
}

impl BlockContent for AwardBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        Field::new("issuer", "Awarded by", FieldKind::Line),
        Field::new("year", "Year", FieldKind::Line),
        DESCRIPTION,
        IMAGE,
    ];

    fn is_blank(&self) -> bool {
        self.title.is_blank()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgrammeModule {
    pub title: String,
    pub description: String,
    pub duration: String,
}

impl Blank for ProgrammeModule {
    fn is_blank(&self) -> bool {
        blank(&[&self.title, &self.description, &self.duration])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/programme.html")]
pub struct ProgrammeBlock {
    pub title: String,
    pub description: String,
    pub modules: EditableList<ProgrammeModule>,
}

impl Default for ProgrammeBlock {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            modules: EditableList::with_blank(),
        }
    }
}

impl BlockContent for ProgrammeBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        DESCRIPTION,
        Field::new(
            "modules",
            "Modules",
            FieldKind::Records(&[
                TITLE,
                DESCRIPTION,
                Field::new("duration", "Duration", FieldKind::Line),
            ]),
        ),
    ];

    fn is_blank(&self) -> bool {
        blank(&[&self.title, &self.description]) && !self.modules.has_content()
    }

    fn list_mut(&mut self, field: &str) -> Option<&mut dyn ListEdit> {
        match field {
            "modules" => Some(&mut self.modules),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub title: String,
    pub description: String,
    pub icon: String,
}

impl Blank for Service {
    fn is_blank(&self) -> bool {
        blank(&[&self.title, &self.description])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/services.html")]
pub struct ServicesBlock {
    pub title: String,
    pub services: EditableList<Service>,
}

impl Default for ServicesBlock {
    fn default() -> Self {
        Self {
            title: String::new(),
            services: EditableList::with_blank(),
        }
    }
}

impl BlockContent for ServicesBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        Field::new(
            "services",
            "Services",
            FieldKind::Records(&[
                TITLE,
                DESCRIPTION,
                Field::new("icon", "Icon", FieldKind::Line),
            ]),
        ),
    ];

    fn is_blank(&self) -> bool {
        !self.services.has_content()
    }

    fn list_mut(&mut self, field: &str) -> Option<&mut dyn ListEdit> {
        match field {
            "services" => Some(&mut self.services),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Formula {
    pub name: String,
    pub amount: String,
    pub benefits: String,
}

impl Formula {
    /// Benefits, one per line.
    pub fn benefit_lines(&self) -> Vec<&str> {
        self.benefits
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }
}

impl Blank for Formula {
    fn is_blank(&self) -> bool {
        blank(&[&self.name, &self.amount, &self.benefits])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/sponsorship.html")]
pub struct SponsorshipBlock {
    pub title: String,
    pub description: String,
    pub formulas: EditableList<Formula>,
}

impl Default for SponsorshipBlock {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            formulas: EditableList::with_blank(),
        }
    }
}

impl BlockContent for SponsorshipBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        DESCRIPTION,
        Field::new(
            "formulas",
            "Formulas",
            FieldKind::Records(&[
                Field::new("name", "Name", FieldKind::Line),
                Field::new("amount", "Amount", FieldKind::Line),
                Field::new("benefits", "Benefits (one per line)", FieldKind::Multiline),
            ]),
        ),
    ];

    fn is_blank(&self) -> bool {
        self.description.is_blank() && !self.formulas.has_content()
    }

    fn list_mut(&mut self, field: &str) -> Option<&mut dyn ListEdit> {
        match field {
            "formulas" => Some(&mut self.formulas),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Template)]
#[serde(default, rename_all = "camelCase")]
#[template(path = "blocks/impact.html")]
pub struct ImpactBlock {
    pub title: String,
    pub description: String,
    pub figure: String,
    pub figure_label: String,
    pub image: String,
}

impl BlockContent for ImpactBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        DESCRIPTION,
        Field::new("figure", "Key figure", FieldKind::Line),
        Field::new("figureLabel", "Key figure label", FieldKind::Line),
        IMAGE,
    ];

    fn is_blank(&self) -> bool {
        blank(&[&self.title, &self.description, &self.figure])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub name: String,
    pub role: String,
    pub bio: String,
    pub image: String,
}

impl Blank for Member {
    fn is_blank(&self) -> bool {
        self.name.is_blank()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Template)]
#[serde(default)]
#[template(path = "blocks/team.html")]
pub struct TeamBlock {
    pub title: String,
    pub members: EditableList<Member>,
}

impl Default for TeamBlock {
    fn default() -> Self {
        Self {
            title: String::new(),
            members: EditableList::with_blank(),
        }
    }
}

impl BlockContent for TeamBlock {
    const FIELDS: &'static [Field] = &[
        TITLE,
        Field::new(
            "members",
            "Members",
            FieldKind::Records(&[
                Field::new("name", "Name", FieldKind::Line),
                Field::new("role", "Role", FieldKind::Line),
                Field::new("bio", "Biography", FieldKind::Multiline),
                IMAGE,
            ]),
        ),
    ];

    fn is_blank(&self) -> bool {
        !self.members.has_content()
    }

    fn list_mut(&mut self, field: &str) -> Option<&mut dyn ListEdit> {
        match field {
            "members" => Some(&mut self.members),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_embed_urls() {
        let video = |url: &str| VideoBlock {
            url: url.to_string(),
            ..Default::default()
        };
        assert_eq!(
            video("https://www.youtube.com/watch?v=abc123").embed_url(),
            Some("https://www.youtube.com/embed/abc123".to_string())
        );
        assert_eq!(
            video("https://youtu.be/abc123").embed_url(),
            Some("https://www.youtube.com/embed/abc123".to_string())
        );
        assert_eq!(
            video("https://vimeo.com/76979871").embed_url(),
            Some("https://player.vimeo.com/video/76979871".to_string())
        );
        assert_eq!(video("https://example.org/clip.mp4").embed_url(), None);
        assert_eq!(video("not a url").embed_url(), None);
    }

    #[test]
    fn href_filter_neutralizes_scripts() {
        assert_eq!(filters::href("javascript:alert(1)").unwrap(), "#");
        assert_eq!(filters::href(" JavaScript:alert(1)").unwrap(), "#");
        assert_eq!(filters::href("java\tscript:alert(1)").unwrap(), "#");
        assert_eq!(filters::href("java\nscript:alert(1)").unwrap(), "#");
        assert_eq!(filters::href("\u{1}javascript:alert(1)").unwrap(), "#");
        assert_eq!(filters::href("data:text/html,<b>x</b>").unwrap(), "#");
        assert_eq!(
            filters::href("mailto:hello@example.org").unwrap(),
            "mailto:hello@example.org"
        );
        assert_eq!(
            filters::href("https://example.org/donate").unwrap(),
            "https://example.org/donate"
        );
        assert_eq!(filters::href("/contact").unwrap(), "/contact");
    }

    #[test]
    fn cta_uses_camel_case_on_the_wire() {
        let cta = CtaBlock {
            button_text: "Donate".to_string(),
            button_url: "/donate".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&cta).unwrap();
        assert_eq!(json["buttonText"], "Donate");
        assert_eq!(json["buttonUrl"], "/donate");
    }

    #[test]
    fn every_field_name_exists_on_the_wire() {
        use strum::IntoEnumIterator;

        for kind in super::super::BlockKind::iter() {
            let value = kind.default_payload().to_value().unwrap();
            for field in kind.fields() {
                assert!(
                    value.get(field.name).is_some(),
                    "{kind}: field {} missing from payload",
                    field.name
                );
            }
        }
    }

    #[test]
    fn formula_benefits_split_on_lines() {
        let formula = Formula {
            benefits: "Logo on site\n\n Newsletter mention ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            formula.benefit_lines(),
            vec!["Logo on site", "Newsletter mention"]
        );
    }
}
