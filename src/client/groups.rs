use crate::client::api::{GroupData, TrackerApi};
use crate::client::context::{OpenPicker, Placement};
use crate::client::error::{ClientError, ClientResult};
use crate::client::notify::NotificationKind;
use crate::client::view::{Node, TrackerView};
use crate::client::Tracker;
use crate::db::GroupColor;

const MAX_GROUP_NAME: usize = 60;
const GROUP_ATTR: &str = "data-group-id";

impl<A: TrackerApi, V: TrackerView> Tracker<A, V> {
    /// Groups of a session, served from the cache after the first load.
    pub async fn list_groups(&mut self, session_id: i64) -> ClientResult<Vec<GroupData>> {
        if let Some(groups) = self.ui.group_cache.get(&session_id) {
            return Ok(groups.clone());
        }

        match self.api.list_groups(session_id).await {
            Ok(groups) => {
                self.ui.group_cache.insert(session_id, groups.clone());
                Ok(groups)
            }
            Err(e) => {
                self.report("Loading groups failed", &e);
                Err(e)
            }
        }
    }

    pub async fn create_group(
        &mut self,
        session_id: i64,
        name: &str,
        color: &str,
    ) -> ClientResult<GroupData> {
        let name = name.trim();
        let invalid = if name.is_empty() {
            Some("Group name is required".to_string())
        } else if name.chars().count() > MAX_GROUP_NAME {
            Some(format!("Group name cannot exceed {} characters", MAX_GROUP_NAME))
        } else if GroupColor::from_str(color).is_none() {
            Some(format!("Invalid color: {}", color))
        } else {
            None
        };
        if let Some(message) = invalid {
            self.view.notify(NotificationKind::Warning, &message);
            return Err(ClientError::Validation(message));
        }

        match self.api.create_group(session_id, name, color).await {
            Ok(group) => {
                self.ui.group_cache.remove(&session_id);
                self.view
                    .notify(NotificationKind::Success, &format!("Group \"{}\" created", group.name));
                Ok(group)
            }
            Err(e) => {
                self.report("Creating group failed", &e);
                Err(e)
            }
        }
    }

    /// Delete a group and strip its colour from every row that carried it.
    /// Returns how many rows were cleared.
    pub async fn delete_group(&mut self, session_id: i64, group_id: i64) -> ClientResult<usize> {
        if !self
            .view
            .confirm("Delete this group? Mics in it will become ungrouped.")
        {
            return Err(ClientError::Cancelled);
        }

        if let Err(e) = self.api.delete_group(session_id, group_id).await {
            self.report("Deleting group failed", &e);
            return Err(e);
        }

        self.ui.group_cache.remove(&session_id);

        let rows = self.view.rows_in_group(group_id);
        for &assignment_id in &rows {
            self.apply_group_markers(assignment_id, None);
        }
        self.view.notify(NotificationKind::Success, "Group deleted");
        Ok(rows.len())
    }

    /// Put an assignment in a group, or take it out with `None`.
    pub async fn assign_group(
        &mut self,
        assignment_id: i64,
        group_id: Option<i64>,
    ) -> ClientResult<Option<GroupData>> {
        let result = self.api.assign_group(assignment_id, group_id).await;
        self.close_picker();

        match result {
            Ok(group) => {
                self.apply_group_markers(assignment_id, group.as_ref());
                Ok(group)
            }
            Err(e) => {
                self.report("Assigning group failed", &e);
                Err(e)
            }
        }
    }

    /// Show the picker for one row. Any other open picker is closed first.
    pub async fn open_picker(
        &mut self,
        session_id: i64,
        assignment_id: i64,
        trigger_bottom: f64,
        viewport_height: f64,
    ) -> ClientResult<Placement> {
        self.close_picker();

        let groups = self.list_groups(session_id).await?;
        let placement = Placement::for_trigger(trigger_bottom, viewport_height);

        self.view.render_picker(assignment_id, &groups, placement);
        self.ui.open_picker = Some(OpenPicker {
            session_id,
            assignment_id,
            placement,
        });
        Ok(placement)
    }

    pub fn close_picker(&mut self) {
        if let Some(open) = self.ui.open_picker.take() {
            self.view.close_picker(open.assignment_id);
        }
    }

    /// Clicks outside the open picker close it.
    pub fn handle_document_click(&mut self, inside_picker: bool) {
        if !inside_picker {
            self.close_picker();
        }
    }

    fn apply_group_markers(&mut self, assignment_id: i64, group: Option<&GroupData>) {
        let row = Node::Row(assignment_id);
        let dot = Node::GroupDot(assignment_id);

        for color in GroupColor::ALL {
            let class = color.row_class();
            self.view.remove_class(&row, &class);
            self.view.remove_class(&dot, &class);
        }

        match group {
            Some(group) => {
                if let Some(color) = GroupColor::from_str(&group.color) {
                    let class = color.row_class();
                    self.view.add_class(&row, &class);
                    self.view.add_class(&dot, &class);
                }
                self.view.remove_class(&dot, "empty");
                self.view.set_title(&dot, &group.name);
                self.view
                    .set_attr(&row, GROUP_ATTR, Some(&group.id.to_string()));
            }
            None => {
                self.view.add_class(&dot, "empty");
                self.view.set_title(&dot, "No group");
                self.view.set_attr(&row, GROUP_ATTR, None);
            }
        }
    }
}
