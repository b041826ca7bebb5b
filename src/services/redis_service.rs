use redis::{AsyncCommands, Client};
use std::sync::Arc;
use crate::models::{Task, User};

// Document store over Redis. Records are JSON values under `user:{id}` /
// `task:{id}`, with `users` / `tasks` id sets for listing and a
// `user_email:{email}` index enforcing email uniqueness. Query/filter
// semantics live in the callers; the store only loads and saves.
pub struct RedisService {
    client: Arc<Client>,
}

fn parse_error(what: &str, e: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::TypeError, "Failed to parse record", format!("{what}: {e}")))
}

fn encode<T: serde::Serialize>(what: &str, value: &T) -> Result<String, redis::RedisError> {
    serde_json::to_string(value).map_err(|e| {
        redis::RedisError::from((redis::ErrorKind::TypeError, "Failed to encode record", format!("{what}: {e}")))
    })
}

impl RedisService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        let user_data: Option<String> = conn.get(format!("user:{}", id)).await?;
        user_data
            .map(|data| serde_json::from_str(&data).map_err(|e| parse_error("user", e)))
            .transpose()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        let id: Option<String> = conn.get(format!("user_email:{}", email)).await?;
        match id {
            Some(id) => self.get_user(&id).await,
            None => Ok(None),
        }
    }

    pub async fn save_user(&self, user: &User) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        conn.set::<_, _, ()>(format!("user:{}", user.id), encode("user", user)?).await?;
        conn.set::<_, _, ()>(format!("user_email:{}", user.email), &user.id).await?;
        conn.sadd("users", &user.id).await
    }

    // Dropped when a profile update changes the address; save_user writes
    // the new index entry.
    pub async fn remove_email_index(&self, email: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        conn.del(format!("user_email:{}", email)).await
    }

    pub async fn delete_user(&self, user: &User) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        conn.del::<_, ()>(format!("user:{}", user.id)).await?;
        conn.del::<_, ()>(format!("user_email:{}", user.email)).await?;
        conn.srem("users", &user.id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        let ids: Vec<String> = conn.smembers("users").await?;
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            // Tolerate ids whose record vanished between SMEMBERS and GET
            if let Some(user) = self.get_user(&id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Option<Task>, redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        let task_data: Option<String> = conn.get(format!("task:{}", task_id)).await?;
        task_data
            .map(|data| serde_json::from_str(&data).map_err(|e| parse_error("task", e)))
            .transpose()
    }

    pub async fn save_task(&self, task: &Task) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        conn.set::<_, _, ()>(format!("task:{}", task.id), encode("task", task)?).await?;
        conn.sadd("tasks", &task.id).await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        conn.del::<_, ()>(format!("task:{}", task_id)).await?;
        conn.srem("tasks", task_id).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        let ids: Vec<String> = conn.smembers("tasks").await?;
        let mut tasks = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(task) = self.get_task(&id).await? {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }
}

impl Clone for RedisService {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone()
        }
    }
}
