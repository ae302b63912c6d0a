//! Chat messages and the attachments the core may export

use crate::domain::shared::value_objects::RoomId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One content part of a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub name: String,
    pub is_file: bool,
    pub file_path: Option<PathBuf>,
    /// Already handed to the media store once
    pub exported: bool,
}

impl Content {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            is_file: true,
            file_path: Some(path.into()),
            exported: false,
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            name: body.into(),
            is_file: false,
            file_path: None,
            exported: false,
        }
    }

    /// File content that still has to be exported
    pub fn is_exportable(&self) -> bool {
        self.is_file && self.file_path.is_some() && !self.exported
    }
}

/// Engine chat message projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub is_ephemeral: bool,
    pub contents: Vec<Content>,
}

impl ChatMessage {
    pub fn new(id: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            id: id.into(),
            is_ephemeral: false,
            contents,
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.is_ephemeral = true;
        self
    }

    pub fn has_file(&self) -> bool {
        self.contents.iter().any(|c| c.is_file)
    }
}

/// A received file queued for export to the public media store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub room: RoomId,
    pub message_id: String,
    pub name: String,
    pub path: PathBuf,
}

impl Attachment {
    pub fn from_content(room: &RoomId, message: &ChatMessage, content: &Content) -> Option<Self> {
        let path = content.file_path.clone()?;
        Some(Self {
            room: room.clone(),
            message_id: message.id.clone(),
            name: content.name.clone(),
            path,
        })
    }

    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_path(&self.path)
    }
}

/// Media store collection a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Other,
}

impl MediaKind {
    /// Classify by file extension
    pub fn from_path(path: &Path) -> Self {
        match mime_guess::from_path(path).first() {
            Some(mime) if mime.type_() == mime_guess::mime::IMAGE => MediaKind::Image,
            Some(mime) if mime.type_() == mime_guess::mime::VIDEO => MediaKind::Video,
            Some(mime) if mime.type_() == mime_guess::mime::AUDIO => MediaKind::Audio,
            _ => MediaKind::Other,
        }
    }
}
