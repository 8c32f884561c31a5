mod descriptor;
mod feed;
mod file_repository;
mod locate;
mod version;

pub use descriptor::{RepositoryDescriptor, DEFAULT_REPOSITORY_PATTERN, DEFAULT_REPOSITORY_URL};
pub use feed::{
    latest_version, parse_release_info, HttpVersionFeed, ReleaseInfo, VersionFeed,
    CURRENT_VERSION_URL,
};
pub use file_repository::{ArtifactResolver, FileRepository, ResolvedArtifact};
pub use locate::{coordinate, expand_pattern, locate, Coordinate, LATEST_REVISION};
pub use version::{compare_versions, is_stable_version};
