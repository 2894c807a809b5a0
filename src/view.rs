use crate::config::PageConfig;
use crate::controls::Command;
use crate::error::Result;
use crate::filter::Filter;
use crate::post::Post;
use crate::render;

/// State behind the wall: the last pushed snapshot plus the two user toggles.
#[derive(Debug, Default)]
pub struct ViewController {
    snapshot: Vec<Post>,
    filter: Filter,
    panel_open: bool,
}

impl ViewController {
    pub fn new(filter: Filter, panel_open: bool) -> Self {
        Self {
            snapshot: Vec::new(),
            filter,
            panel_open,
        }
    }

    /// Replaces the snapshot wholesale. Nothing of the previous one survives.
    pub fn receive(&mut self, snapshot: Vec<Post>) {
        self.snapshot = snapshot;
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn toggle_panel(&mut self) {
        self.panel_open = !self.panel_open;
    }

    /// Applies a user command. Returns `false` when the wall should stop.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::SetFilter(filter) => self.set_filter(filter),
            Command::TogglePanel => self.toggle_panel(),
            Command::Quit => return false,
        }
        true
    }

    pub fn snapshot(&self) -> &[Post] {
        &self.snapshot
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn visible(&self) -> Vec<&Post> {
        self.filter.apply(&self.snapshot)
    }

    pub fn render(&self, page: &PageConfig) -> Result<String> {
        render::page(&self.visible(), self.filter, self.panel_open, page)
    }
}
