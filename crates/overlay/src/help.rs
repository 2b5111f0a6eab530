//! Hotkey help and per-frame debug text.

use parking_lot::Mutex;

/// Accumulates text shown by the overlay.
///
/// Help lines describe hotkeys and persist for the life of the board. Debug
/// lines are per-frame: collaborators write them every frame and
/// [`begin_frame`](Self::begin_frame) discards the previous frame's lines.
#[derive(Debug, Default)]
pub struct HelpBoard {
    text: Mutex<BoardText>,
}

#[derive(Debug, Default)]
struct BoardText {
    help: String,
    debug: String,
}

impl HelpBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one help line.
    pub fn help(&self, text: &str) {
        push_line(&mut self.text.lock().help, text);
    }

    /// Append one debug line for the current frame.
    pub fn debug(&self, text: &str) {
        push_line(&mut self.text.lock().debug, text);
    }

    /// Drop the previous frame's debug lines. Help text is kept.
    pub fn begin_frame(&self) {
        self.text.lock().debug.clear();
    }

    /// Accumulated help text.
    pub fn help_text(&self) -> String {
        self.text.lock().help.clone()
    }

    /// Debug text written since the last [`begin_frame`](Self::begin_frame).
    pub fn debug_text(&self) -> String {
        self.text.lock().debug.clone()
    }

    /// Help followed by debug text, separated by a blank line when both exist.
    pub fn render_text(&self) -> String {
        let text = self.text.lock();
        match (text.help.is_empty(), text.debug.is_empty()) {
            (true, _) => text.debug.clone(),
            (false, true) => text.help.clone(),
            (false, false) => format!("{}\n{}", text.help, text.debug),
        }
    }
}

fn push_line(buffer: &mut String, text: &str) {
    buffer.push_str(text);
    if !text.ends_with('\n') {
        buffer.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_appends_given_text() {
        let board = HelpBoard::new();
        board.help("F1: toggle HUD");
        board.help("F2: screenshot");

        assert_eq!(board.help_text(), "F1: toggle HUD\nF2: screenshot\n");
    }

    #[test]
    fn test_help_does_not_duplicate_existing_text() {
        let board = HelpBoard::new();
        board.help("a");
        board.help("b");
        board.help("c");

        assert_eq!(board.help_text().matches('a').count(), 1);
        assert_eq!(board.help_text().lines().count(), 3);
    }

    #[test]
    fn test_trailing_newline_not_doubled() {
        let board = HelpBoard::new();
        board.debug("Rotator (0.000, 0.707, 0.000, 0.707)\n");

        assert_eq!(board.debug_text(), "Rotator (0.000, 0.707, 0.000, 0.707)\n");
    }

    #[test]
    fn test_begin_frame_clears_debug_only() {
        let board = HelpBoard::new();
        board.help("Rotator has no hotkeys.");
        board.debug("frame 1");

        board.begin_frame();
        assert_eq!(board.debug_text(), "");
        assert_eq!(board.help_text(), "Rotator has no hotkeys.\n");

        board.debug("frame 2");
        assert_eq!(board.debug_text(), "frame 2\n");
    }

    #[test]
    fn test_render_text() {
        let board = HelpBoard::new();
        assert_eq!(board.render_text(), "");

        board.debug("fps 60");
        assert_eq!(board.render_text(), "fps 60\n");

        board.help("F1: toggle");
        assert_eq!(board.render_text(), "F1: toggle\n\nfps 60\n");

        board.begin_frame();
        assert_eq!(board.render_text(), "F1: toggle\n");
    }
}
