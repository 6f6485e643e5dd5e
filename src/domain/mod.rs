pub mod announcement;
pub mod pagination;
pub mod user;

pub use announcement::*;
pub use pagination::*;
pub use user::*;
