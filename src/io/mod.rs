//! On-disk formats: the binary dataset container and its JSON side manifests.

pub mod container;
pub mod manifest;

pub use container::{
    load_dataset, load_predictions, save_dataset, save_predictions, ContainerCodec, ContainerKind,
    DeserializeError, FormatFlags, FormatHeader, Payload, PayloadV1, PredictionsPayload,
    SerializeError, TrainDataPayload, CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR, MAGIC,
};
pub use manifest::{
    load_feature_order, load_stat_manifest, save_feature_order, save_header_file,
    save_stat_manifest, FeatureOrderManifest, ManifestError, StatManifest,
};
