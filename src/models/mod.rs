mod user;
mod forms;
mod task;

pub use user::{normalize_email, Role, User, UserView};
pub use forms::{
    AuthResponse, CreateTaskRequest, DashboardQuery, ListUsersQuery, LoginRequest,
    RegisterRequest, TaskListQuery, UpdateChecklistRequest, UpdateProfileRequest,
    UpdateStatusRequest, UpdateTaskRequest,
};
pub use task::{ChecklistItem, CreatorRef, Priority, Status, Task, TaskView};
