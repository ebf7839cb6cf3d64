use cq_state::DocumentId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Text,
    Email,
    Image,
    Schematic,
    Report,
    #[serde(other)]
    Other,
}

impl DocumentKind {
    pub fn icon(self) -> &'static str {
        match self {
            DocumentKind::Text | DocumentKind::Other => "📄",
            DocumentKind::Email => "✉️",
            DocumentKind::Image => "🖼️",
            DocumentKind::Schematic => "📐",
            DocumentKind::Report => "📊",
        }
    }

    fn is_paged(self) -> bool {
        matches!(self, DocumentKind::Text | DocumentKind::Report)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    pub from: String,
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub date: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchematicContent {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentContent {
    Pages(Vec<String>),
    Email(EmailContent),
    Schematic(SchematicContent),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceDocument {
    pub id: DocumentId,
    #[serde(rename = "type", default)]
    pub kind: DocumentKind,
    pub title: String,
    pub content: DocumentContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EvidenceDocument {
    pub fn text(id: impl Into<DocumentId>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(id, DocumentKind::Text, title, DocumentContent::Text(body.into()))
    }

    pub fn new(
        id: impl Into<DocumentId>,
        kind: DocumentKind,
        title: impl Into<String>,
        content: DocumentContent,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            content,
            author: None,
            date: None,
        }
    }

    pub fn by(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn dated(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Only text and report documents with a page list paginate.
    pub fn total_pages(&self) -> usize {
        match (&self.content, self.kind.is_paged()) {
            (DocumentContent::Pages(pages), true) => pages.len().max(1),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub lines: Vec<String>,
}

/// Splits text into paragraphs on blank lines and paragraphs into lines.
pub fn paragraphs(text: &str) -> Vec<Paragraph> {
    text.split("\n\n")
        .map(|para| Paragraph {
            lines: para.split('\n').map(str::to_string).collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum DocumentBody {
    Paragraphs {
        paragraphs: Vec<Paragraph>,
    },
    Email {
        from: String,
        to: String,
        subject: String,
        date: String,
        paragraphs: Vec<Paragraph>,
    },
    Image {
        src: String,
        alt: String,
    },
    Schematic {
        classification: String,
        image: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
    Raw {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFooter {
    pub page: usize,
    pub total: usize,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedDocument {
    pub id: DocumentId,
    pub icon: &'static str,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    pub body: DocumentBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<PageFooter>,
}

const DEFAULT_CLASSIFICATION: &str = "CONFIDENTIAL";

fn content_text(content: &DocumentContent, page: usize) -> String {
    match content {
        DocumentContent::Pages(pages) => pages.get(page - 1).cloned().unwrap_or_default(),
        DocumentContent::Text(text) => text.clone(),
        DocumentContent::Email(email) => email.body.clone(),
        DocumentContent::Schematic(schematic) => schematic.image.clone(),
    }
}

/// Builds the view model for `page` (1-based) of a document.
pub fn render(document: &EvidenceDocument, page: usize) -> RenderedDocument {
    let total = document.total_pages();
    let page = page.clamp(1, total);
    let body = match (document.kind, &document.content) {
        (DocumentKind::Email, DocumentContent::Email(email)) => DocumentBody::Email {
            from: email.from.clone(),
            to: email.to.clone(),
            subject: email.subject.clone(),
            date: email.date.clone(),
            paragraphs: paragraphs(&email.body),
        },
        (DocumentKind::Schematic, DocumentContent::Schematic(schematic)) => {
            DocumentBody::Schematic {
                classification: schematic
                    .classification
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CLASSIFICATION.to_string()),
                image: schematic.image.clone(),
                notes: schematic.notes.clone(),
                warning: schematic.warning.clone(),
            }
        }
        (DocumentKind::Image, content) => DocumentBody::Image {
            src: content_text(content, page),
            alt: document.title.clone(),
        },
        (DocumentKind::Text | DocumentKind::Report, content) => DocumentBody::Paragraphs {
            paragraphs: paragraphs(&content_text(content, page)),
        },
        (_, content) => DocumentBody::Raw {
            text: content_text(content, page),
        },
    };

    let meta = match (&document.author, &document.date) {
        (None, None) => None,
        (author, date) => {
            let mut parts = Vec::new();
            if let Some(author) = author {
                parts.push(format!("Author: {author}"));
            }
            if let Some(date) = date {
                parts.push(format!("Date: {date}"));
            }
            Some(parts.join(" | "))
        }
    };

    let footer = (total > 1).then(|| PageFooter {
        page,
        total,
        previous_enabled: page > 1,
        next_enabled: page < total,
    });

    RenderedDocument {
        id: document.id.clone(),
        icon: document.kind.icon(),
        title: document.title.clone(),
        meta,
        body,
        footer,
    }
}

/// Document overlay: the open document, its page and the viewing history.
#[derive(Debug, Default)]
pub struct EvidenceViewer {
    current: Option<EvidenceDocument>,
    page: usize,
    history: Vec<DocumentId>,
}

impl EvidenceViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a document at page 1. Returns the rendered view and whether this
    /// was the first time the document was ever shown.
    pub fn show(&mut self, document: EvidenceDocument) -> (RenderedDocument, bool) {
        let first_view = !self.has_viewed(document.id.as_str());
        if first_view {
            self.history.push(document.id.clone());
        }
        self.page = 1;
        let rendered = render(&document, self.page);
        self.current = Some(document);
        (rendered, first_view)
    }

    pub fn next_page(&mut self) -> Option<RenderedDocument> {
        let document = self.current.as_ref()?;
        if self.page >= document.total_pages() {
            return None;
        }
        self.page += 1;
        Some(render(document, self.page))
    }

    pub fn previous_page(&mut self) -> Option<RenderedDocument> {
        let document = self.current.as_ref()?;
        if self.page <= 1 {
            return None;
        }
        self.page -= 1;
        Some(render(document, self.page))
    }

    pub fn close(&mut self) -> Option<DocumentId> {
        let document = self.current.take()?;
        self.page = 1;
        Some(document.id)
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&EvidenceDocument> {
        self.current.as_ref()
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.current
            .as_ref()
            .map(EvidenceDocument::total_pages)
            .unwrap_or(1)
    }

    pub fn has_viewed(&self, id: &str) -> bool {
        self.history.iter().any(|seen| seen.as_str() == id)
    }

    pub fn viewed_documents(&self) -> &[DocumentId] {
        &self.history
    }
}
