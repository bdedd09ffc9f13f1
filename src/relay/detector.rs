/// Backspace control code.
pub const BACKSPACE: char = '\u{8}';

/// Delete control code, sent by most terminals for the backspace key.
pub const DELETE: char = '\u{7f}';

const LINE_END: char = '\n';

/// Text patterns marking the start and end of a shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMarkers {
    header: String,
    footer_template: String,
}

impl SessionMarkers {
    /// `footer_template` must contain `{id}` where the session number goes.
    pub fn new(header: impl Into<String>, footer_template: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            footer_template: footer_template.into(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Footer line for session `id`.
    pub fn footer(&self, id: u32) -> String {
        self.footer_template.replace("{id}", &id.to_string())
    }

    /// Session number of a header line: its last char read as a digit.
    fn session_id(&self, line: &str) -> Option<u32> {
        if !line.starts_with(&self.header) {
            return None;
        }
        line.chars().last().and_then(|c| c.to_digit(10))
    }
}

impl Default for SessionMarkers {
    fn default() -> Self {
        Self::new("New Shell process ", "Process {id} ending")
    }
}

/// What the relay has to do after one channel char.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Step {
    /// Mirror the char to the local terminal.
    pub echo: bool,
    /// Show this already completed first line (terminator excluded).
    pub reveal: Option<String>,
    /// The footer matched; the session is over.
    pub ended: bool,
}

/// Line-buffered detector for the session header and footer.
///
/// The footer is compared against the buffer after every char, so the
/// session ends as soon as the footer text is complete even if no line
/// terminator follows.
#[derive(Debug)]
pub struct SessionDetector {
    markers: SessionMarkers,
    line: String,
    saw_first_line: bool,
    mirror_from_start: bool,
    mirroring: bool,
    session_id: Option<u32>,
    footer: Option<String>,
}

impl SessionDetector {
    pub fn new(markers: SessionMarkers, mirror_from_start: bool) -> Self {
        Self {
            markers,
            line: String::new(),
            saw_first_line: false,
            mirror_from_start,
            mirroring: mirror_from_start,
            session_id: None,
            footer: None,
        }
    }

    /// Forget everything seen so far, as for a new session.
    pub fn reset(&mut self) {
        self.line.clear();
        self.saw_first_line = false;
        self.mirroring = self.mirror_from_start;
        self.session_id = None;
        self.footer = None;
    }

    pub fn session_id(&self) -> Option<u32> {
        self.session_id
    }

    pub fn is_mirroring(&self) -> bool {
        self.mirroring
    }

    /// Text received since the last line terminator.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Process one char read from the channel.
    ///
    /// `first_line` runs once, at the first line terminator, and returns
    /// whether that line should be revealed to the operator.
    pub fn feed(&mut self, c: char, first_line: &mut dyn FnMut() -> bool) -> Step {
        let mut step = Step {
            echo: self.mirroring,
            ..Step::default()
        };

        let code = u32::from(c);
        if (code & 0x7f) >= 0x20 && c != DELETE {
            self.line.push(c);
        } else if c == BACKSPACE {
            self.line.pop();
        }

        if c == LINE_END {
            let reveal = if !self.saw_first_line {
                self.saw_first_line = true;
                first_line()
            } else {
                false
            };
            if self.session_id.is_none() {
                if let Some(id) = self.markers.session_id(&self.line) {
                    self.session_id = Some(id);
                    self.footer = Some(self.markers.footer(id));
                    self.mirroring = true;
                }
            }
            let completed = std::mem::take(&mut self.line);
            // A mirrored line is already on screen.
            if reveal && !step.echo {
                step.reveal = Some(completed);
            }
        }

        step.ended = self
            .footer
            .as_deref()
            .is_some_and(|footer| footer == self.line);
        step
    }
}
