pub mod agents;
pub mod execute;
pub mod socket;
pub mod voice;
