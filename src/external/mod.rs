pub mod media;
pub mod notifier;

pub use media::*;
pub use notifier::*;
