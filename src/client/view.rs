//! The page as the controllers see it: a set of addressable nodes and the
//! handful of operations performed on them.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::client::api::GroupData;
use crate::client::context::{ModalKind, Placement};
use crate::client::notify::{Flash, NotificationKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    // Session footer
    SessionMicd(i64),
    SessionAvailable(i64),
    SessionShared(i64),
    DayStats(i64),
    Day(i64),

    // Assignment row
    Row(i64),
    PresenterDisplay(i64),
    ShareCount(i64),
    ActiveSlotChip(i64),
    DmicCheckbox(i64),
    MicdCheckbox(i64),
    GroupDot(i64),

    // Presenter slots
    SlotPlaceholder(i64),
    SlotThumbnail(i64),
    SlotPreview(i64),

    Modal(ModalKind),
    ModalError(ModalKind),
    UpdateBanner,
    SharedList,
    PresenterSuggestions,
}

/// Rendering seam. Implementations must treat writes to nodes that are not
/// on the page as no-ops.
pub trait TrackerView: Send {
    fn set_text(&mut self, node: &Node, text: &str);
    fn set_visible(&mut self, node: &Node, visible: bool);
    fn set_checked(&mut self, node: &Node, checked: bool);
    fn set_image(&mut self, node: &Node, src: &str);
    fn add_class(&mut self, node: &Node, class: &str);
    fn remove_class(&mut self, node: &Node, class: &str);
    fn set_title(&mut self, node: &Node, title: &str);
    fn set_attr(&mut self, node: &Node, name: &str, value: Option<&str>);

    fn flash(&mut self, node: &Node, flash: Flash);
    fn notify(&mut self, kind: NotificationKind, message: &str);
    fn confirm(&mut self, prompt: &str) -> bool;
    fn reload(&mut self);

    fn render_list(&mut self, node: &Node, items: &[String]);
    fn render_picker(&mut self, assignment_id: i64, groups: &[GroupData], placement: Placement);
    fn close_picker(&mut self, assignment_id: i64);

    /// Assignment ids whose rows currently carry `group_id`.
    fn rows_in_group(&self, group_id: i64) -> Vec<i64>;
}

/// In-memory view that records every write. Used by tests and by headless
/// tooling that drives the API without a page.
#[derive(Debug, Default)]
pub struct HeadlessView {
    pub texts: HashMap<Node, String>,
    pub visibility: HashMap<Node, bool>,
    pub checked: HashMap<Node, bool>,
    pub images: HashMap<Node, String>,
    pub classes: HashMap<Node, BTreeSet<String>>,
    pub titles: HashMap<Node, String>,
    pub attrs: HashMap<(Node, String), String>,
    pub flashes: Vec<(Node, Flash)>,
    pub notifications: Vec<(NotificationKind, String)>,
    pub prompts: Vec<String>,
    pub reloads: usize,
    pub lists: HashMap<Node, Vec<String>>,
    pub open_pickers: HashMap<i64, (Vec<GroupData>, Placement)>,
    /// Nodes that are not on the page.
    pub missing: HashSet<Node>,
    confirm_answers: VecDeque<bool>,
    default_confirm: bool,
}

impl HeadlessView {
    pub fn new() -> Self {
        Self {
            default_confirm: true,
            ..Default::default()
        }
    }

    /// Queue answers for upcoming confirmation prompts.
    pub fn answer_confirms(&mut self, answers: &[bool]) {
        self.confirm_answers.extend(answers);
    }

    pub fn text(&self, node: &Node) -> Option<&str> {
        self.texts.get(node).map(String::as_str)
    }

    pub fn visible(&self, node: &Node) -> Option<bool> {
        self.visibility.get(node).copied()
    }

    pub fn is_checked(&self, node: &Node) -> Option<bool> {
        self.checked.get(node).copied()
    }

    pub fn has_class(&self, node: &Node, class: &str) -> bool {
        self.classes
            .get(node)
            .map(|set| set.contains(class))
            .unwrap_or(false)
    }

    pub fn attr(&self, node: &Node, name: &str) -> Option<&str> {
        self.attrs
            .get(&(node.clone(), name.to_string()))
            .map(String::as_str)
    }

    pub fn last_notification(&self) -> Option<&(NotificationKind, String)> {
        self.notifications.last()
    }

    fn present(&self, node: &Node) -> bool {
        !self.missing.contains(node)
    }
}

impl TrackerView for HeadlessView {
    fn set_text(&mut self, node: &Node, text: &str) {
        if self.present(node) {
            self.texts.insert(node.clone(), text.to_string());
        }
    }

    fn set_visible(&mut self, node: &Node, visible: bool) {
        if self.present(node) {
            self.visibility.insert(node.clone(), visible);
        }
    }

    fn set_checked(&mut self, node: &Node, checked: bool) {
        if self.present(node) {
            self.checked.insert(node.clone(), checked);
        }
    }

    fn set_image(&mut self, node: &Node, src: &str) {
        if self.present(node) {
            self.images.insert(node.clone(), src.to_string());
        }
    }

    fn add_class(&mut self, node: &Node, class: &str) {
        if self.present(node) {
            self.classes
                .entry(node.clone())
                .or_default()
                .insert(class.to_string());
        }
    }

    fn remove_class(&mut self, node: &Node, class: &str) {
        if let Some(set) = self.classes.get_mut(node) {
            set.remove(class);
        }
    }

    fn set_title(&mut self, node: &Node, title: &str) {
        if self.present(node) {
            self.titles.insert(node.clone(), title.to_string());
        }
    }

    fn set_attr(&mut self, node: &Node, name: &str, value: Option<&str>) {
        if !self.present(node) {
            return;
        }
        let key = (node.clone(), name.to_string());
        match value {
            Some(value) => {
                self.attrs.insert(key, value.to_string());
            }
            None => {
                self.attrs.remove(&key);
            }
        }
    }

    fn flash(&mut self, node: &Node, flash: Flash) {
        if self.present(node) {
            self.flashes.push((node.clone(), flash));
        }
    }

    fn notify(&mut self, kind: NotificationKind, message: &str) {
        self.notifications.push((kind, message.to_string()));
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.confirm_answers
            .pop_front()
            .unwrap_or(self.default_confirm)
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }

    fn render_list(&mut self, node: &Node, items: &[String]) {
        if self.present(node) {
            self.lists.insert(node.clone(), items.to_vec());
        }
    }

    fn render_picker(&mut self, assignment_id: i64, groups: &[GroupData], placement: Placement) {
        self.open_pickers
            .insert(assignment_id, (groups.to_vec(), placement));
    }

    fn close_picker(&mut self, assignment_id: i64) {
        self.open_pickers.remove(&assignment_id);
    }

    fn rows_in_group(&self, group_id: i64) -> Vec<i64> {
        let wanted = group_id.to_string();
        let mut rows: Vec<i64> = self
            .attrs
            .iter()
            .filter_map(|((node, name), value)| match node {
                Node::Row(id) if name == "data-group-id" && *value == wanted => Some(*id),
                _ => None,
            })
            .collect();
        rows.sort_unstable();
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_to_missing_nodes_are_ignored() {
        let mut view = HeadlessView::new();
        view.missing.insert(Node::SessionShared(1));

        view.set_text(&Node::SessionShared(1), "Shared: 2");
        view.add_class(&Node::SessionShared(1), "x");
        view.remove_class(&Node::Row(9), "group-red");

        assert_eq!(view.text(&Node::SessionShared(1)), None);
        assert!(!view.has_class(&Node::SessionShared(1), "x"));
    }

    #[test]
    fn confirm_answers_are_consumed_in_order() {
        let mut view = HeadlessView::new();
        view.answer_confirms(&[false, true]);

        assert!(!view.confirm("first"));
        assert!(view.confirm("second"));
        assert!(view.confirm("defaults to yes"));
        assert_eq!(view.prompts.len(), 3);
    }

    #[test]
    fn rows_in_group_reads_data_attribute() {
        let mut view = HeadlessView::new();
        view.set_attr(&Node::Row(3), "data-group-id", Some("7"));
        view.set_attr(&Node::Row(1), "data-group-id", Some("7"));
        view.set_attr(&Node::Row(2), "data-group-id", Some("8"));

        assert_eq!(view.rows_in_group(7), vec![1, 3]);

        view.set_attr(&Node::Row(3), "data-group-id", None);
        assert_eq!(view.rows_in_group(7), vec![1]);
    }
}
