pub mod dockerfile;
pub mod schema;

pub use schema::{
    BuildMetadata, CopySpec, ImageBuild, InstallerStage, ResolverStage, RuntimeStage,
    ServiceAccount,
};
