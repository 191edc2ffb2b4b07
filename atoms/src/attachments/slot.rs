use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const CLINIC_PHOTOS_PREFIX: &str = "clinicPhotos_";

/// A named category of attachment on a doctor record.
///
/// The wire keys (`tenthMarksheet`, `clinicPhotos_0`, ...) are what existing
/// records store under `fileUrls`, so they must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttachmentSlot {
    TenthMarksheet,
    TwelfthMarksheet,
    DegreeCertificate,
    Photograph,
    MciRegistration,
    ClinicPhotos(usize),
}

impl AttachmentSlot {
    /// The fixed, per-doctor document slots in form order.
    pub const DOCUMENTS: [AttachmentSlot; 5] = [
        AttachmentSlot::TenthMarksheet,
        AttachmentSlot::TwelfthMarksheet,
        AttachmentSlot::DegreeCertificate,
        AttachmentSlot::Photograph,
        AttachmentSlot::MciRegistration,
    ];

    pub fn key(&self) -> String {
        match self {
            AttachmentSlot::TenthMarksheet => "tenthMarksheet".to_string(),
            AttachmentSlot::TwelfthMarksheet => "twelfthMarksheet".to_string(),
            AttachmentSlot::DegreeCertificate => "degreeCertificate".to_string(),
            AttachmentSlot::Photograph => "photograph".to_string(),
            AttachmentSlot::MciRegistration => "mciRegistration".to_string(),
            AttachmentSlot::ClinicPhotos(index) => format!("{}{}", CLINIC_PHOTOS_PREFIX, index),
        }
    }

    /// Slots that only accept images.
    pub fn images_only(&self) -> bool {
        matches!(self, AttachmentSlot::Photograph | AttachmentSlot::ClinicPhotos(_))
    }

    pub fn clinic_index(&self) -> Option<usize> {
        match self {
            AttachmentSlot::ClinicPhotos(index) => Some(*index),
            _ => None,
        }
    }

    /// Slot key after clinic `removed` is deleted from the clinic list.
    /// `None` when this slot belonged to the removed clinic.
    pub(crate) fn after_clinic_removed(self, removed: usize) -> Option<AttachmentSlot> {
        match self {
            AttachmentSlot::ClinicPhotos(i) if i == removed => None,
            AttachmentSlot::ClinicPhotos(i) if i > removed => {
                Some(AttachmentSlot::ClinicPhotos(i - 1))
            }
            other => Some(other),
        }
    }
}

impl fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSlot(pub String);

impl fmt::Display for UnknownSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown attachment slot '{}'", self.0)
    }
}

impl std::error::Error for UnknownSlot {}

impl FromStr for AttachmentSlot {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tenthMarksheet" => Ok(AttachmentSlot::TenthMarksheet),
            "twelfthMarksheet" => Ok(AttachmentSlot::TwelfthMarksheet),
            "degreeCertificate" => Ok(AttachmentSlot::DegreeCertificate),
            "photograph" => Ok(AttachmentSlot::Photograph),
            "mciRegistration" => Ok(AttachmentSlot::MciRegistration),
            other => other
                .strip_prefix(CLINIC_PHOTOS_PREFIX)
                // reject "+1", "01" and friends so keys stay canonical
                .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                .filter(|digits| digits.len() == 1 || !digits.starts_with('0'))
                .and_then(|digits| digits.parse().ok())
                .map(AttachmentSlot::ClinicPhotos)
                .ok_or_else(|| UnknownSlot(other.to_string())),
        }
    }
}

impl Serialize for AttachmentSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for AttachmentSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}
