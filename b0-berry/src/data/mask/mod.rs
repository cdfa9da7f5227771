//! 二值掩膜: 模体掩膜与内部 ROI.

mod compact;
mod core;

pub use self::compact::CompactMask;
pub use self::core::{InteriorRoi, PhantomMask};

pub(crate) use self::core::{areas_of, fill_holes};
