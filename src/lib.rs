pub mod config;
pub mod id;
pub mod logging;
pub mod observable;
pub mod store;

pub use id::{IdGenerator, IdStrategy, RandomIds, SequentialIds};
pub use observable::{Observable, Subscription};
pub use store::{Notification, NotificationStore};
