pub mod directory;
pub mod feedback;
pub mod profile;

pub use directory::{InMemoryProviderDirectory, ProviderDirectory};
pub use feedback::Feedback;
pub use profile::ProviderProfile;
