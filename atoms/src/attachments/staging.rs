use std::collections::BTreeMap;
use std::fmt;

use super::slot::AttachmentSlot;

/// A file chosen in the form but not uploaded yet.
#[derive(Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Staged files keyed by slot, as handed to the batch uploader.
pub type StagedFiles = BTreeMap<AttachmentSlot, Vec<StagedFile>>;

/// Files waiting for upload, per slot. Pure in-memory state owned by one form
/// session.
///
/// A slot is present only while it holds at least one file, so a map whose
/// files were all unstaged is empty again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingMap {
    slots: StagedFiles,
}

impl StagingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `files` to `slot`, keeping arrival order.
    pub fn stage(&mut self, slot: AttachmentSlot, files: impl IntoIterator<Item = StagedFile>) {
        let mut files = files.into_iter().peekable();
        if files.peek().is_none() {
            return;
        }
        self.slots.entry(slot).or_default().extend(files);
    }

    /// Remove the file at `index` in `slot`; later files shift down by one.
    pub fn unstage(&mut self, slot: AttachmentSlot, index: usize) -> Option<StagedFile> {
        let files = self.slots.get_mut(&slot)?;
        if index >= files.len() {
            return None;
        }
        let removed = files.remove(index);
        if files.is_empty() {
            self.slots.remove(&slot);
        }
        Some(removed)
    }

    /// Take every staged file, leaving the map empty.
    pub fn drain(&mut self) -> StagedFiles {
        std::mem::take(&mut self.slots)
    }

    /// Drop the staged photos of clinic `index` and shift later clinics down.
    pub fn remove_clinic(&mut self, index: usize) {
        let slots = std::mem::take(&mut self.slots);
        self.slots = slots
            .into_iter()
            .filter_map(|(slot, files)| slot.after_clinic_removed(index).map(|slot| (slot, files)))
            .collect();
    }

    pub fn files(&self, slot: AttachmentSlot) -> &[StagedFile] {
        self.slots.get(&slot).map(|f| f.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttachmentSlot, &Vec<StagedFile>)> {
        self.slots.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total number of staged files across all slots.
    pub fn file_count(&self) -> usize {
        self.slots.values().map(|f| f.len()).sum()
    }
}

impl From<StagedFiles> for StagingMap {
    fn from(mut slots: StagedFiles) -> Self {
        slots.retain(|_, files| !files.is_empty());
        Self { slots }
    }
}
