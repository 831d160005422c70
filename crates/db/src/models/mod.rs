pub mod activity_template;
pub mod building;
pub mod checklist;
pub mod cleaning_activity;
pub mod client;
pub mod deficiency;
pub mod floor;
pub mod invitation;
pub mod notification;
pub mod organisation;
pub mod room;
pub mod room_task;
pub mod room_type;
pub mod task_item_response;
pub mod user;
