/// Where `Effect::ExportTranscript` puts the text.
pub trait TranscriptClipboard {
    fn copy(&mut self, text: &str) -> Result<(), String>;
}

/// System clipboard, opened on first use and kept open so the contents
/// outlive the copy call on X11/Wayland.
#[cfg(not(target_os = "android"))]
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

#[cfg(not(target_os = "android"))]
impl TranscriptClipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<(), String> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().map_err(|err| err.to_string())?);
        }
        match self.inner.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_owned())
                .map_err(|err| err.to_string()),
            None => Err("clipboard unavailable".to_string()),
        }
    }
}

#[cfg(target_os = "android")]
#[derive(Default)]
pub struct SystemClipboard;

#[cfg(target_os = "android")]
impl TranscriptClipboard for SystemClipboard {
    fn copy(&mut self, _text: &str) -> Result<(), String> {
        Err("clipboard is not supported on this platform".to_string())
    }
}
