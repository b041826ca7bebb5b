mod auth;
mod task;
mod user;
mod dashboard;
mod report;

pub use auth::{get_profile, login, register, update_profile, upload_image};
pub use task::{
    create_task, delete_task, get_task, list_tasks, update_checklist, update_status, update_task,
};
pub use user::{delete_user, get_user, list_users};
pub use dashboard::{admin_dashboard, user_dashboard};
pub use report::{export_tasks, export_users};
