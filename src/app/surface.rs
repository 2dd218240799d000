//! Recycled list rows that thumbnails are shown on.

use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

use crate::images::{DisplaySurface, TargetId, Thumbnail};

/// One on-screen row. Rows are reused as the list scrolls.
#[derive(Default)]
pub struct RowSlot {
    /// List position currently shown
    pub index: Option<usize>,
    /// Thumbnail key currently shown
    pub key: Option<String>,
    /// Thumbnail applied to this row
    pub thumbnail: Option<Thumbnail>,
    /// Terminal graphics state for the thumbnail
    pub protocol: Option<StatefulProtocol>,
}

impl RowSlot {
    fn reset(&mut self, index: Option<usize>, key: Option<String>) {
        self.index = index;
        self.key = key;
        self.thumbnail = None;
        self.protocol = None;
    }
}

/// The visible rows of the list.
pub struct RowSurface {
    slots: Vec<RowSlot>,
    picker: Option<Picker>,
}

impl RowSurface {
    /// Create an empty surface; thumbnails are drawn with `picker` if given.
    pub fn new(picker: Option<Picker>) -> Self {
        Self {
            slots: Vec::new(),
            picker,
        }
    }

    /// Grow or shrink to `rows` slots.
    pub fn resize(&mut self, rows: usize) {
        self.slots.resize_with(rows, RowSlot::default);
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot `slot`.
    pub fn slot(&self, slot: usize) -> Option<&RowSlot> {
        self.slots.get(slot)
    }

    /// Mutable access for rendering.
    pub fn slots_mut(&mut self) -> &mut [RowSlot] {
        &mut self.slots
    }

    /// Point `slot` at list position `index`, dropping whatever it showed.
    ///
    /// Returns `false` if the slot already showed that position.
    pub fn assign(&mut self, slot: usize, index: usize, key: &str) -> bool {
        let Some(row) = self.slots.get_mut(slot) else {
            return false;
        };
        if row.index == Some(index) && row.key.as_deref() == Some(key) {
            return false;
        }
        row.reset(Some(index), Some(key.to_string()));
        true
    }

    /// Empty `slot` (past the end of the list).
    pub fn clear(&mut self, slot: usize) {
        if let Some(row) = self.slots.get_mut(slot) {
            row.reset(None, None);
        }
    }
}

impl DisplaySurface for RowSurface {
    fn find_target_for_key(&self, key: &str) -> Option<TargetId> {
        self.slots
            .iter()
            .position(|row| row.key.as_deref() == Some(key))
            .map(TargetId)
    }

    fn set_image(&mut self, target: TargetId, thumbnail: &Thumbnail) {
        let protocol = self
            .picker
            .as_ref()
            .map(|picker| picker.new_resize_protocol(thumbnail.image().clone()));

        if let Some(row) = self.slots.get_mut(target.0) {
            row.thumbnail = Some(thumbnail.clone());
            row.protocol = protocol;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    #[test]
    fn test_assign_and_find() {
        let mut rows = RowSurface::new(None);
        rows.resize(3);
        assert!(rows.assign(0, 10, "a"));
        assert!(rows.assign(1, 11, "b"));
        assert!(!rows.assign(1, 11, "b"));

        assert_eq!(rows.find_target_for_key("b"), Some(TargetId(1)));
        assert_eq!(rows.find_target_for_key("c"), None);
    }

    #[test]
    fn test_reassign_drops_thumbnail() {
        let mut rows = RowSurface::new(None);
        rows.resize(1);
        rows.assign(0, 0, "a");
        rows.set_image(TargetId(0), &Thumbnail::new(DynamicImage::new_luma8(2, 2)));
        assert!(rows.slot(0).unwrap().thumbnail.is_some());

        rows.assign(0, 7, "h");
        let slot = rows.slot(0).unwrap();
        assert!(slot.thumbnail.is_none());
        assert_eq!(slot.index, Some(7));
    }

    #[test]
    fn test_clear_and_shrink() {
        let mut rows = RowSurface::new(None);
        rows.resize(2);
        rows.assign(1, 1, "b");
        rows.clear(1);
        assert_eq!(rows.find_target_for_key("b"), None);

        rows.resize(1);
        assert_eq!(rows.len(), 1);
        rows.set_image(TargetId(5), &Thumbnail::new(DynamicImage::new_luma8(1, 1)));
    }
}
