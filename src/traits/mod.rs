pub mod external;
pub mod transform;

pub use external::{Completion, External};
pub use transform::{asynchronous, Callback, Transform};
