//! Types that represent the data exchanged with the finance coach server, such as
//! `AnalyticsSnapshot` and `Message`.
mod amount;
mod file;
mod message;
mod period;
mod receipt;
mod snapshot;

pub use amount::{Amount, AmountError};
pub use file::{FileHandle, FileKind};
pub use message::{ChatReply, ChatRequest, Message, Role};
pub use period::Period;
pub use receipt::UploadReceipt;
pub use snapshot::{AnalyticsSnapshot, CategorySlice, TrendPoint};
