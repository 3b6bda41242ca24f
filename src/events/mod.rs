//! # Events Module
//!
//! Progress reporting for long-running engine work.
//!
//! ## Design
//! The engine emits events through channels, allowing any front end
//! (CLI today, GUI later) to subscribe and display progress.
//!
//! ## Example
//! ```rust,ignore
//! use driver_store_cleaner::events::{EventChannel, Event};
//!
//! let (sender, receiver) = EventChannel::new();
//!
//! // Engine thread sends events
//! std::thread::spawn(move || {
//!     // ... pipeline work emits through `sender` ...
//! });
//!
//! // UI thread receives events
//! while let Some(event) = receiver.recv() {
//!     match event {
//!         Event::Pipeline(e) => println!("{:?}", e),
//!         _ => {}
//!     }
//! }
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::{
    CorrelateEvent, CorrelateProgress, DeleteEvent, EnumerateEvent, Event, PipelineEvent,
    PipelinePhase, PipelineSummary,
};
