//! Segment identifiers and on-disk lookup
//!
//! A segment is a logical clip name such as `numbers/34` or
//! `phrases/raqam_egasi`. The library maps it to `<base>/<id>.<ext>`, trying
//! each supported format in preference order.

use crate::audio::types::{ClipFormat, FORMAT_PREFERENCE};
use crate::error::PlaybackError;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Phrase spoken after the ticket number ("ticket holder")
pub const PHRASE_TICKET_OWNER: &str = "raqam_egasi";

/// Phrase closing every announcement ("please come to the room")
pub const PHRASE_PLEASE_COME: &str = "honaga_kelishin";

/// Logical identifier of a pre-recorded clip, relative to the sounds directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentId(String);

impl SegmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Regular number clip: `numbers/<n>`
    pub fn number(n: u32) -> Self {
        Self(format!("numbers/{}", n))
    }

    /// Irregular number clip: `numbers/<n>a` (10 and the exact tens)
    pub fn irregular(n: u32) -> Self {
        Self(format!("numbers/{}a", n))
    }

    /// Dedicated room clip: `numbers/<room>-xona`
    pub fn room(room: &str) -> Self {
        Self(format!("numbers/{}-xona", room.trim()))
    }

    /// Fixed phrase clip: `phrases/<name>`
    pub fn phrase(name: &str) -> Self {
        Self(format!("phrases/{}", name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A segment mapped to an existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSegment {
    pub path: PathBuf,
    pub format: ClipFormat,
}

/// Directory of pre-recorded clips.
#[derive(Debug, Clone)]
pub struct SegmentLibrary {
    base_dir: PathBuf,
}

impl SegmentLibrary {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Find the file for `segment`, first match in [`FORMAT_PREFERENCE`] wins.
    ///
    /// # Errors
    /// [`PlaybackError::SegmentNotFound`] when no candidate exists, or when the
    /// id would point outside the library.
    pub fn resolve(&self, segment: &SegmentId) -> Result<ResolvedSegment, PlaybackError> {
        let tried = FORMAT_PREFERENCE
            .iter()
            .map(|f| f.extension())
            .collect::<Vec<_>>()
            .join(", ");
        let not_found = || PlaybackError::SegmentNotFound {
            segment: segment.to_string(),
            tried: tried.clone(),
        };

        if !is_safe_id(segment.as_str()) {
            return Err(not_found());
        }

        FORMAT_PREFERENCE
            .into_iter()
            .map(|format| ResolvedSegment {
                path: self
                    .base_dir
                    .join(format!("{}.{}", segment.as_str(), format.extension())),
                format,
            })
            .find(|candidate| candidate.path.is_file())
            .ok_or_else(not_found)
    }
}

/// Relative path made only of plain components.
fn is_safe_id(id: &str) -> bool {
    if id.is_empty() || id.contains('\\') {
        return false;
    }
    Path::new(id)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_segment_id_constructors() {
        assert_eq!(SegmentId::number(7).as_str(), "numbers/7");
        assert_eq!(SegmentId::irregular(30).as_str(), "numbers/30a");
        assert_eq!(SegmentId::room(" 5 ").as_str(), "numbers/5-xona");
        assert_eq!(SegmentId::phrase(PHRASE_TICKET_OWNER).as_str(), "phrases/raqam_egasi");
    }

    #[test]
    fn test_resolve_prefers_mp3() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("numbers")).unwrap();
        fs::write(dir.path().join("numbers/7.wav"), b"wav").unwrap();
        fs::write(dir.path().join("numbers/7.mp3"), b"mp3").unwrap();

        let library = SegmentLibrary::new(dir.path());
        let resolved = library.resolve(&SegmentId::number(7)).unwrap();
        assert_eq!(resolved.format, ClipFormat::Mp3);
        assert_eq!(resolved.path, dir.path().join("numbers/7.mp3"));
    }

    #[test]
    fn test_resolve_falls_back_to_wav() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("phrases")).unwrap();
        fs::write(dir.path().join("phrases/raqam_egasi.wav"), b"wav").unwrap();

        let library = SegmentLibrary::new(dir.path());
        let resolved = library.resolve(&SegmentId::phrase(PHRASE_TICKET_OWNER)).unwrap();
        assert_eq!(resolved.format, ClipFormat::Wav);
    }

    #[test]
    fn test_resolve_missing() {
        let dir = TempDir::new().unwrap();
        let library = SegmentLibrary::new(dir.path());
        let err = library.resolve(&SegmentId::number(3)).unwrap_err();
        assert!(matches!(err, PlaybackError::SegmentNotFound { ref segment, .. } if segment == "numbers/3"));
    }

    #[test]
    fn test_unsafe_ids_never_resolve() {
        let dir = TempDir::new().unwrap();
        let sounds = dir.path().join("sounds");
        fs::create_dir(&sounds).unwrap();
        fs::write(dir.path().join("secret.wav"), b"wav").unwrap();

        let library = SegmentLibrary::new(&sounds);
        for id in ["../secret", "/etc/passwd", "numbers\\..\\..\\secret", "", "numbers/../../secret"] {
            assert!(
                matches!(library.resolve(&SegmentId::new(id)), Err(PlaybackError::SegmentNotFound { .. })),
                "{} should not resolve",
                id
            );
        }
    }
}
