//! Job control: background execution, cancellation and the worker-to-host
//! event channel.

pub mod controller;
pub mod events;

pub use controller::{Collaborators, JobController, JobState};
pub use events::{EventSink, JobEvent};
