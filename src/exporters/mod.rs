pub mod ofx;
pub mod qif;
pub mod traits;

pub mod prelude {
    pub use super::ofx::{OfxAccount, OfxExporter, OfxTransaction};
    pub use super::qif::{QifAccount, QifExporter, QifSplit, QifTransaction, SplitState};
    pub use super::traits::Exporter;
}
