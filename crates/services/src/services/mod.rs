pub mod activity;
pub mod activity_template;
pub mod auth;
pub mod buildings;
pub mod checklist;
pub mod deficiency;
pub mod error;
pub mod notification;
pub mod organisation;
pub mod qr;
pub mod report;
pub mod room_task;
pub mod rooms;
pub mod storage;
pub mod users;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;
