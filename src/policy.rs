//! Authorization policy.
//!
//! Every permission check in the service goes through here so the role
//! logic lives in one place instead of being re-derived per endpoint.
//! Checks return a tagged [`Decision`] rather than a bare bool; handlers
//! convert a denial into a 403 with the decision's reason.

use crate::errors::{AppError, AppResult};
use crate::models::{Task, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: &'static str,
}

impl Decision {
    pub fn allow() -> Self {
        Self { allowed: true, reason: "" }
    }

    pub fn deny(reason: &'static str) -> Self {
        Self { allowed: false, reason }
    }

    // Converts a denial into the Forbidden error handlers propagate with `?`.
    pub fn require(self) -> AppResult<()> {
        if self.allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden(self.reason.to_string()))
        }
    }
}

/// Which tasks an actor may see in list and aggregate endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    AssignedTo(String),
}

impl Scope {
    pub fn permits(&self, task: &Task) -> bool {
        match self {
            Scope::All => true,
            Scope::AssignedTo(user_id) => task.is_assigned_to(user_id),
        }
    }
}

pub fn list_scope(actor: &User) -> Scope {
    if actor.is_admin() {
        Scope::All
    } else {
        Scope::AssignedTo(actor.id.clone())
    }
}

// The creator reference may be a single id or a historical array of ids;
// both are treated as a set.
pub fn is_creator_or_admin(task: &Task, actor: &User) -> bool {
    if actor.is_admin() {
        return true;
    }
    task.created_by
        .as_ref()
        .is_some_and(|creator| creator.contains(&actor.id))
}

pub fn is_assigned_or_privileged(task: &Task, actor: &User) -> bool {
    actor.is_admin() || task.is_assigned_to(&actor.id) || is_creator_or_admin(task, actor)
}

pub fn can_update_task(task: &Task, actor: &User) -> Decision {
    if is_creator_or_admin(task, actor) {
        Decision::allow()
    } else {
        Decision::deny("Forbidden: cannot update this task")
    }
}

pub fn can_delete_task(task: &Task, actor: &User) -> Decision {
    if is_creator_or_admin(task, actor) {
        Decision::allow()
    } else {
        Decision::deny("Forbidden: cannot delete this task")
    }
}

pub fn can_set_status(task: &Task, actor: &User) -> Decision {
    if is_assigned_or_privileged(task, actor) {
        Decision::allow()
    } else {
        Decision::deny("Forbidden: cannot update status")
    }
}

pub fn can_edit_checklist(task: &Task, actor: &User) -> Decision {
    if is_assigned_or_privileged(task, actor) {
        Decision::allow()
    } else {
        Decision::deny("Forbidden: cannot update checklist")
    }
}

pub fn admin_only(actor: &User) -> Decision {
    if actor.is_admin() {
        Decision::allow()
    } else {
        Decision::deny("Access denied, admin only")
    }
}

// Admins cannot be deleted through the user-admin path, even by another
// admin; demote first.
pub fn can_delete_user(target: &User, actor: &User) -> Decision {
    if !actor.is_admin() {
        return Decision::deny("Access denied, admin only");
    }
    if target.is_admin() {
        return Decision::deny("Cannot delete an admin user");
    }
    Decision::allow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreatorRef, Priority, Role, Status};
    use chrono::Utc;

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.into(),
            name: id.into(),
            email: format!("{id}@example.com"),
            password_hash: String::new(),
            role,
            profile_image_url: None,
            created_at: Utc::now(),
        }
    }

    fn task(creator: Option<CreatorRef>, assigned: &[&str]) -> Task {
        Task {
            id: "t1".into(),
            title: "T".into(),
            description: String::new(),
            priority: Priority::Medium,
            status: Status::Pending,
            due_date: None,
            assigned_to: assigned.iter().map(|s| s.to_string()).collect(),
            created_by: creator,
            todo_checklist: vec![],
            attachments: vec![],
            progress: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_passes_every_check() {
        let admin = user("a", Role::Admin);
        let t = task(Some(CreatorRef::One("someone-else".into())), &[]);

        assert!(is_creator_or_admin(&t, &admin));
        assert!(is_assigned_or_privileged(&t, &admin));
        assert!(can_update_task(&t, &admin).allowed);
        assert!(can_set_status(&t, &admin).allowed);
        assert_eq!(list_scope(&admin), Scope::All);
    }

    #[test]
    fn creator_matches_single_and_array_shapes() {
        let member = user("u1", Role::Member);

        let single = task(Some(CreatorRef::One("u1".into())), &[]);
        assert!(is_creator_or_admin(&single, &member));

        let many = task(Some(CreatorRef::Many(vec!["u0".into(), "u1".into()])), &[]);
        assert!(is_creator_or_admin(&many, &member));

        let other = task(Some(CreatorRef::One("u2".into())), &[]);
        assert!(!is_creator_or_admin(&other, &member));

        let none = task(None, &[]);
        assert!(!is_creator_or_admin(&none, &member));
    }

    #[test]
    fn assignee_may_touch_status_but_not_update() {
        let member = user("u1", Role::Member);
        let t = task(Some(CreatorRef::One("u2".into())), &["u1"]);

        assert!(can_set_status(&t, &member).allowed);
        assert!(can_edit_checklist(&t, &member).allowed);
        assert!(!can_update_task(&t, &member).allowed);
        assert!(!can_delete_task(&t, &member).allowed);
    }

    #[test]
    fn unrelated_member_is_denied_with_reason() {
        let member = user("u3", Role::Member);
        let t = task(Some(CreatorRef::One("u2".into())), &["u1"]);

        let decision = can_set_status(&t, &member);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "Forbidden: cannot update status");
        assert!(decision.require().is_err());
    }

    #[test]
    fn member_scope_filters_to_assignments() {
        let member = user("u1", Role::Member);
        let scope = list_scope(&member);
        assert!(scope.permits(&task(None, &["u1", "u2"])));
        assert!(!scope.permits(&task(None, &["u2"])));
    }

    #[test]
    fn admin_target_cannot_be_deleted() {
        let admin = user("a", Role::Admin);
        let other_admin = user("b", Role::Admin);
        let member = user("m", Role::Member);

        assert!(can_delete_user(&member, &admin).allowed);
        let denied = can_delete_user(&other_admin, &admin);
        assert!(!denied.allowed);
        assert_eq!(denied.reason, "Cannot delete an admin user");
        assert!(!can_delete_user(&member, &member).allowed);
    }
}
