use crate::client::api::TrackerApi;
use crate::client::error::ClientResult;
use crate::client::notify::{Flash, NotificationKind};
use crate::client::view::{Node, TrackerView};
use crate::client::Tracker;

impl<A: TrackerApi, V: TrackerView> Tracker<A, V> {
    /// Upload a slot photo and swap the placeholder for the thumbnail.
    pub async fn upload_photo(
        &mut self,
        slot_id: i64,
        assignment_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<String> {
        let size = bytes.len();
        let url = match self.api.upload_photo(slot_id, file_name, bytes).await {
            Ok(url) => url,
            Err(e) => {
                self.report("Photo upload failed", &e);
                return Err(e);
            }
        };

        tracing::debug!("Uploaded {} bytes for slot {}: {}", size, slot_id, url);

        self.view.set_visible(&Node::SlotPlaceholder(slot_id), false);
        for node in [Node::SlotThumbnail(slot_id), Node::SlotPreview(slot_id)] {
            self.view.set_image(&node, &url);
            self.view.set_visible(&node, true);
        }
        self.view.flash(&Node::Row(assignment_id), Flash::Success);
        self.view.notify(NotificationKind::Success, "Photo saved");
        Ok(url)
    }
}
