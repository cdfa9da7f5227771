mod image;
mod mask;
mod volume;

pub use image::{Image, ImageMeta, TaggedImage};
pub use mask::{CompactMask, InteriorRoi, PhantomMask};
pub use volume::{EchoPair, Volume};

pub(crate) use mask::{areas_of, fill_holes};
