mod caller;

pub use caller::{Caller, Identity};
