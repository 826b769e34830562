use serde::{Deserialize, Serialize};

/// Expected character class of a field, used by the post-processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Alphabetic text with spaces (names).
    Name,
    /// Digit-only fields (ID numbers).
    Number,
}

/// A named rectangular region of the canonical card frame.
///
/// Row and column ranges are half-open pixel spans in canonical
/// coordinates, i.e. after the aligned crop has been resized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneDef {
    pub label: String,
    pub kind: FieldKind,
    pub rows: (u32, u32),
    pub cols: (u32, u32),
}

impl ZoneDef {
    /// Cut this zone out of the canonical frame, clamping to its bounds.
    pub fn crop(&self, canonical: &image::GrayImage) -> image::GrayImage {
        let (r0, r1) = self.rows;
        let (c0, c1) = self.cols;
        let r0 = r0.min(canonical.height());
        let r1 = r1.clamp(r0, canonical.height());
        let c0 = c0.min(canonical.width());
        let c1 = c1.clamp(c0, canonical.width());
        image::imageops::crop_imm(canonical, c0, r0, c1 - c0, r1 - r0).to_image()
    }
}

/// The zone layout of one card design, expressed in its canonical frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneSet {
    pub canonical_width: u32,
    pub canonical_height: u32,
    pub zones: Vec<ZoneDef>,
}

impl ZoneSet {
    /// The student ID card layout this pipeline was built around: an
    /// 800x500 canonical frame with a name line and an ID number box.
    pub fn student_card() -> Self {
        Self {
            canonical_width: 800,
            canonical_height: 500,
            zones: vec![
                ZoneDef {
                    label: "Student Name".to_string(),
                    kind: FieldKind::Name,
                    rows: (140, 280),
                    cols: (10, 640),
                },
                ZoneDef {
                    label: "ID Number".to_string(),
                    kind: FieldKind::Number,
                    rows: (330, 400),
                    cols: (175, 380),
                },
            ],
        }
    }
}

impl Default for ZoneSet {
    fn default() -> Self {
        Self::student_card()
    }
}
