use iotmap_core::Layer;
use iotmap_store::StoreError;
use thiserror::Error;

/// Errors aborting a layer rebuild.
///
/// Input-level problems (transmissions matching no node) are not errors:
/// the offending record is dropped and logged, and the rebuild continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown pattern '{name}' for the {layer} layer")]
    UnknownPattern { layer: Layer, name: String },

    #[error("the {0} layer has not been built yet")]
    MissingLayer(Layer),

    #[error("rebuilding the datalink layer requires a transmission feed")]
    MissingFeed,

    #[error(transparent)]
    Store(#[from] StoreError),
}
