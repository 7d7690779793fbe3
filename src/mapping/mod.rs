//! Mapping profiles: how a bank's CSV layout maps onto OFX and QIF fields.
//!
//! Profiles are plain data. Each output field is bound to a [`FieldSource`]
//! strategy, so a profile loaded from JSON can describe column picking,
//! concatenation or sign flipping without running any code.

mod date;
mod fields;
mod profile;

pub use date::DateParser;
pub use fields::{FieldSource, RowPredicate, SplitTake};
pub use profile::{
    IS_SPLIT_KEY, MappingProfile, OfxField, OfxFieldMap, ProfileParams, QifField, QifFieldMap,
    SKIP_KEY,
};
