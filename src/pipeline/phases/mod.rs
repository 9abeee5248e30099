// Build pipeline phases, in execution order

#[path = "01_resolve.rs"]
pub mod resolve;
#[path = "02_install.rs"]
pub mod install;
#[path = "03_assemble.rs"]
pub mod assemble;
#[path = "04_validate.rs"]
pub mod validate;

pub use assemble::AssemblePhase;
pub use install::InstallPhase;
pub use resolve::ResolvePhase;
pub use validate::ValidatePhase;
