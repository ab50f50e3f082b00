pub mod entry;
pub mod store;
pub mod transfer;

pub use entry::{Clock, DateFormatter, Draft, Entry, FixedClock, SystemClock};
pub use store::{Confirm, DeleteOutcome, JournalStore};
pub use transfer::ExportFile;
