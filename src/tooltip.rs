/// Popup showing details of the hovered entity.
pub trait Tooltip {
    fn show(&mut self);
    fn hide(&mut self);
    /// Anchor position in surface pixels
    fn set_position(&mut self, x: f64, y: f64);
    fn set_content(&mut self, lines: Vec<String>);
}

/// Tooltip state painted by the terminal UI.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerminalTooltip {
    pub visible: bool,
    pub position: (f64, f64),
    pub lines: Vec<String>,
}

impl Tooltip for TerminalTooltip {
    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn set_position(&mut self, x: f64, y: f64) {
        self.position = (x, y);
    }

    fn set_content(&mut self, lines: Vec<String>) {
        self.lines = lines;
    }
}
