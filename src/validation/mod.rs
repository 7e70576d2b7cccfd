pub mod metadata;
pub mod version;

pub use metadata::{normalize_dist_name, ManifestKind, PackageMetadata};
pub use version::{is_prerelease, normalize_tag, parse_release_tag};
