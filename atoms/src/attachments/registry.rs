use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::slot::AttachmentSlot;

/// Uploaded URLs per slot, as produced by the batch uploader.
pub type UploadedUrls = BTreeMap<AttachmentSlot, Vec<String>>;

/// Persisted attachment URLs of one doctor, stored as `fileUrls`.
///
/// URLs keep upload order within a slot. Every operation returns a new
/// registry and leaves `self` untouched, so callers can diff old and new.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentRegistry {
    slots: BTreeMap<AttachmentSlot, Vec<String>>,
}

impl AttachmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `uploaded` after the existing URLs of each slot. Never replaces;
    /// slots missing from `uploaded` carry over unchanged.
    pub fn merge(&self, uploaded: &UploadedUrls) -> AttachmentRegistry {
        let mut slots = self.slots.clone();
        for (slot, urls) in uploaded {
            slots.entry(*slot).or_default().extend(urls.iter().cloned());
        }
        AttachmentRegistry { slots }
    }

    /// Remove the URL at `index` in `slot`. Out-of-range removals return an
    /// equal registry.
    pub fn remove_at(&self, slot: AttachmentSlot, index: usize) -> AttachmentRegistry {
        let mut slots = self.slots.clone();
        if let Some(urls) = slots.get_mut(&slot) {
            if index < urls.len() {
                urls.remove(index);
            }
        }
        AttachmentRegistry { slots }
    }

    /// Drop the photos of clinic `index` and shift later clinics down.
    pub fn remove_clinic(&self, index: usize) -> AttachmentRegistry {
        let slots = self
            .slots
            .iter()
            .filter_map(|(slot, urls)| {
                slot.after_clinic_removed(index)
                    .map(|slot| (slot, urls.clone()))
            })
            .collect();
        AttachmentRegistry { slots }
    }

    pub fn urls(&self, slot: AttachmentSlot) -> &[String] {
        self.slots.get(&slot).map(|u| u.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttachmentSlot, &Vec<String>)> {
        self.slots.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.values().all(|urls| urls.is_empty())
    }

    pub fn url_count(&self) -> usize {
        self.slots.values().map(|u| u.len()).sum()
    }
}

impl From<UploadedUrls> for AttachmentRegistry {
    fn from(slots: UploadedUrls) -> Self {
        Self { slots }
    }
}
