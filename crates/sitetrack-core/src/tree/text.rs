//! Text rendering of flattened tree windows for CLI display

use super::flatten::FlatItem;
use super::view::{RenderWindow, TreeRenderer};
use crate::domain::lifecycle::TaskStatus;

/// Style configuration for tree rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStyle {
    /// ASCII characters only (works everywhere)
    Ascii,
    /// Unicode markers and icons
    #[default]
    Unicode,
}

/// Icons for task states and expand markers
#[derive(Debug, Clone, Copy)]
pub struct StatusIcon;

impl StatusIcon {
    pub fn for_status(status: TaskStatus, style: NodeStyle) -> &'static str {
        match style {
            NodeStyle::Ascii => match status {
                TaskStatus::Draft => "[ ]",
                TaskStatus::InProgress => "[>]",
                TaskStatus::Submitted => "[?]",
                TaskStatus::Approved => "[+]",
                TaskStatus::Rejected => "[X]",
            },
            NodeStyle::Unicode => match status {
                TaskStatus::Draft => "○",
                TaskStatus::InProgress => "◐",
                TaskStatus::Submitted => "◎",
                TaskStatus::Approved => "✓",
                TaskStatus::Rejected => "✗",
            },
        }
    }

    /// Marker in front of a row: open, closed, or blank for leaves
    pub fn for_expansion(has_children: bool, is_expanded: bool, style: NodeStyle) -> &'static str {
        match (has_children, is_expanded, style) {
            (false, _, _) => " ",
            (true, true, NodeStyle::Ascii) => "-",
            (true, false, NodeStyle::Ascii) => "+",
            (true, true, NodeStyle::Unicode) => "▾",
            (true, false, NodeStyle::Unicode) => "▸",
        }
    }
}

/// Options for rendering the tree
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Visual style for markers and icons
    pub style: NodeStyle,
    /// Show node ids
    pub show_ids: bool,
    /// Show `completed/total` next to the name
    pub show_quantities: bool,
    /// Show progress percentages
    pub show_progress: bool,
    /// Show task status icons
    pub show_status: bool,
    /// Indentation width per level
    pub indent_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            style: NodeStyle::Unicode,
            show_ids: false,
            show_quantities: true,
            show_progress: true,
            show_status: true,
            indent_width: 2,
        }
    }
}

impl RenderOptions {
    /// ASCII-only options for basic terminals
    pub fn ascii() -> Self {
        Self {
            style: NodeStyle::Ascii,
            ..Default::default()
        }
    }

    /// Names and markers only
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_quantities: false,
            show_progress: false,
            show_status: false,
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_ids(mut self, show_ids: bool) -> Self {
        self.show_ids = show_ids;
        self
    }

    pub fn with_indent(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width;
        self
    }
}

/// Renders windows as indented text lines
#[derive(Debug, Clone, Default)]
pub struct TextTreeRenderer {
    options: RenderOptions,
    lines: Vec<String>,
}

impl TextTreeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Lines rendered so far
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Take the rendered lines, leaving the renderer empty
    pub fn take_output(&mut self) -> String {
        let mut output = self.lines.join("\n");
        if !output.is_empty() {
            output.push('\n');
        }
        self.lines.clear();
        output
    }

    pub fn render_item(&self, item: &FlatItem<'_>) -> String {
        let style = self.options.style;
        let mut line = " ".repeat(usize::from(item.level) * self.options.indent_width);

        line.push_str(StatusIcon::for_expansion(item.has_children, item.is_expanded, style));
        line.push(' ');

        if self.options.show_status {
            if let Some(task) = item.data.as_task() {
                line.push_str(StatusIcon::for_status(task.status, style));
                line.push(' ');
            }
        }

        line.push_str(item.name());

        let (completed, total, progress) = item.data.quantities();
        if self.options.show_quantities {
            line.push_str(&format!(" {}/{}", completed, total));
        }
        if self.options.show_progress {
            line.push_str(&format!(" ({}%)", progress));
        }
        if self.options.show_ids {
            line.push_str(&format!(" [{}]", item.id));
        }

        line
    }

    /// Footer line describing where the window sits
    pub fn render_footer(window: &RenderWindow<'_>) -> String {
        if window.is_empty() {
            return format!("(no rows, {} total)", window.total);
        }
        format!(
            "rows {}-{} of {}",
            window.offset + 1,
            window.offset + window.items.len(),
            window.total
        )
    }
}

impl TreeRenderer for TextTreeRenderer {
    fn render(&mut self, window: &RenderWindow<'_>) {
        let lines: Vec<String> = window.items.iter().map(|item| self.render_item(item)).collect();
        self.lines.extend(lines);
    }
}
