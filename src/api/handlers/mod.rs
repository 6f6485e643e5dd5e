pub mod announcements;
pub mod root;
pub mod uploads;
