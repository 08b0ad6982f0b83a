//! Tagged draw commands recorded in retained mode

use lumen_core::{Color, Handle, Path, PathCommand, Point, Rect};

/// One recorded draw operation.
///
/// Coordinates are in frame space: the frame's transform has already been applied,
/// and radii/thickness are scaled by its isotropic factor. Resources are held by
/// handle and re-resolved at replay.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Clear {
        rect: Rect,
        color: Color,
    },
    Rect {
        rect: Rect,
        color: Color,
        radius: f32,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        thickness: f32,
    },
    PushClip {
        rect: Rect,
    },
    PopClip,
    Texture {
        texture: Handle,
        src: Rect,
        dst: Rect,
        opacity: f32,
    },
    /// Owns a copy of the glyph-run text
    Text {
        font: Handle,
        text: String,
        origin: Point,
        color: Color,
    },
    /// Owns a copy of the path commands
    Path {
        path: Path,
        bounds: Rect,
        color: Color,
    },
}

/// Discriminant of a [`Command`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Clear,
    Rect,
    Line,
    PushClip,
    PopClip,
    Texture,
    Text,
    Path,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Clear { .. } => CommandKind::Clear,
            Command::Rect { .. } => CommandKind::Rect,
            Command::Line { .. } => CommandKind::Line,
            Command::PushClip { .. } => CommandKind::PushClip,
            Command::PopClip => CommandKind::PopClip,
            Command::Texture { .. } => CommandKind::Texture,
            Command::Text { .. } => CommandKind::Text,
            Command::Path { .. } => CommandKind::Path,
        }
    }

    /// Heap bytes owned by this command, if it carries a payload
    pub fn payload_bytes(&self) -> Option<usize> {
        match self {
            Command::Text { text, .. } => Some(text_payload_bytes(text)),
            Command::Path { path, .. } => Some(path_payload_bytes(path)),
            _ => None,
        }
    }
}

/// Bytes accounted for a copied glyph run (text plus terminator)
pub fn text_payload_bytes(text: &str) -> usize {
    text.len() + 1
}

pub fn path_payload_bytes(path: &Path) -> usize {
    path.len() * std::mem::size_of::<PathCommand>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_bytes() {
        let text = Command::Text {
            font: Handle::new(1, 1),
            text: "abc".into(),
            origin: Point::ZERO,
            color: Color::BLACK,
        };
        assert_eq!(text.payload_bytes(), Some(4));
        assert_eq!(Command::PopClip.payload_bytes(), None);
        assert_eq!(text.kind(), CommandKind::Text);
    }
}
