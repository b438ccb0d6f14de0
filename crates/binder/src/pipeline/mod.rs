pub mod build;
pub mod deploy;

pub use build::{BuildError, BuildOptions, BuildPipeline};
pub use deploy::{DEFAULT_MODE, DeployError, DeployPipeline};
