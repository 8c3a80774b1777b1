use crate::label::Label;
use crate::payload::DetectionPayload;

/// Board orientation derived from a single accelerometer sample. The discriminant is the
/// `label_id` sent to the networking core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum Orientation {
    /// Board faces the ceiling
    Up = 0,
    /// Board faces the ground
    Down = 1,
    /// Landscape
    TopEdge = 2,
    /// Inverted landscape
    BottomEdge = 3,
    /// Portrait
    LeftEdge = 4,
    /// Inverted portrait
    RightEdge = 5,
}

impl Orientation {
    pub const ALL: [Orientation; 6] = [
        Orientation::Up,
        Orientation::Down,
        Orientation::TopEdge,
        Orientation::BottomEdge,
        Orientation::LeftEdge,
        Orientation::RightEdge,
    ];

    /// Picks the axis most aligned with gravity; its sign tells which side faces the ground.
    /// Ties between axes fall through to the x axis.
    pub fn classify(x: i16, y: i16, z: i16) -> Self {
        let (abs_x, abs_y, abs_z) = (x.unsigned_abs(), y.unsigned_abs(), z.unsigned_abs());

        if abs_z > abs_x && abs_z > abs_y {
            if z < 0 {
                Orientation::Down
            } else {
                Orientation::Up
            }
        } else if abs_y > abs_x && abs_y > abs_z {
            if y > 0 {
                Orientation::BottomEdge
            } else {
                Orientation::TopEdge
            }
        } else if x < 0 {
            Orientation::RightEdge
        } else {
            Orientation::LeftEdge
        }
    }

    pub const fn label_id(self) -> u32 {
        self as u32
    }

    pub const fn label(self) -> &'static str {
        match self {
            Orientation::Up => "up",
            Orientation::Down => "down",
            Orientation::TopEdge => "top",
            Orientation::BottomEdge => "bottom",
            Orientation::LeftEdge => "left_edge",
            Orientation::RightEdge => "right_edge",
        }
    }

    pub fn from_label_id(label_id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.label_id() == label_id)
    }

    /// Fills a producer payload slot with this orientation
    pub fn write_into(self, payload: &mut DetectionPayload) {
        payload.label_id = self.label_id();
        payload.label = Label::truncated(self.label());
    }
}
