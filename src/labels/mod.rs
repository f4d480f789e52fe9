//! Label exchange with a LabelMe annotation store
//!
//! Band features are imported into pixel-space annotation objects, curated
//! in an external tool and exported back as georeferenced features.

pub mod export;
pub mod import;
mod object;
pub mod store;

pub use export::features_from_labels;
pub use import::{label_name, labels_from_features};
pub use object::{LabeledObject, NewLabel};
pub use store::{AnnotationStore, DocumentHeader};
