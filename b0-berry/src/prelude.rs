//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx2dF};

pub use crate::{
    CompactMask, EchoPair, Image, ImageMeta, InteriorRoi, PhantomMask, TaggedImage, Volume,
};
pub use crate::{MetaField, QcError};

pub use crate::config::{Connectivity, QcConfig, ShrinkStrategy, SlicePairing};
pub use crate::consts::{DEFAULT_ACTION_LIMIT_PPM, DEFAULT_SHRINK_FRACTION};

pub use crate::eval::{QcResult, QcSummary, SliceMetric, Verdict};
pub use crate::field::{FieldMap, FieldMapEstimator, PhaseScale};
pub use crate::loader::{load_echo_pair, load_echo_pair_with, load_volumes};
pub use crate::pipeline::{compute_b0, B0Outcome, B0Pipeline, SliceReport, SliceStatus};
pub use crate::roi::shrink;
pub use crate::segment::segment_phantom;

pub use crate::dataset::home_dataset_dir_with;

#[cfg(feature = "nifti")]
pub use crate::dataset::{open_echoes, EchoSource};
