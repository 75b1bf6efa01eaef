//! Clipboard collaborator.

/// Get/set text clipboard used by copy, cut, and paste.
pub trait Clipboard {
    /// Returns the clipboard text, or None when empty or unavailable.
    fn get_text(&mut self) -> Option<String>;

    fn set_text(&mut self, text: &str);
}

/// System clipboard backed by arboard. Clipboard failures are logged and
/// treated as an empty clipboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Option<Self> {
        match arboard::Clipboard::new() {
            Ok(inner) => Some(Self { inner }),
            Err(err) => {
                log::warn!("system clipboard unavailable: {err}");
                None
            }
        }
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&mut self) -> Option<String> {
        match self.inner.get_text() {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(err) => {
                log::debug!("clipboard read failed: {err}");
                None
            }
        }
    }

    fn set_text(&mut self, text: &str) {
        if let Err(err) = self.inner.set_text(text.to_string()) {
            log::warn!("clipboard write failed: {err}");
        }
    }
}

/// In-memory clipboard for tests and headless sessions.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.contents.clone().filter(|s| !s.is_empty())
    }

    fn set_text(&mut self, text: &str) {
        self.contents = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clipboard_round_trip() {
        let mut clipboard = MemoryClipboard::default();
        assert_eq!(clipboard.get_text(), None);
        clipboard.set_text("hello");
        assert_eq!(clipboard.get_text(), Some("hello".to_string()));
        clipboard.set_text("");
        assert_eq!(clipboard.get_text(), None);
    }
}
