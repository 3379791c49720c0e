//! Request body validation: required text fields must be non-empty.

use crate::error::AppError;
use crate::model::{Subtask, TodoPatch, TodoReplacement};

pub struct TodoValidator;

impl TodoValidator {
    /// Full payloads (POST, PUT): every text field is required.
    pub fn validate(body: &TodoReplacement) -> Result<(), AppError> {
        required("title", &body.title)?;
        required("description", &body.description)?;
        required("date", &body.date)?;
        required("priority", &body.priority)?;
        required("dueTime", &body.due_time)?;
        required("assignedTo", &body.assigned_to)?;
        required("status", &body.status)?;
        subtasks(&body.subtasks)
    }

    /// PATCH: only the fields present are checked.
    pub fn validate_partial(body: &TodoPatch) -> Result<(), AppError> {
        let text = [
            ("title", &body.title),
            ("description", &body.description),
            ("date", &body.date),
            ("priority", &body.priority),
            ("dueTime", &body.due_time),
            ("assignedTo", &body.assigned_to),
            ("status", &body.status),
        ];
        for (field, value) in text {
            if let Some(v) = value {
                required(field, v)?;
            }
        }
        match &body.subtasks {
            Some(s) => subtasks(s),
            None => Ok(()),
        }
    }
}

fn required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn subtasks(items: &[Subtask]) -> Result<(), AppError> {
    for (i, s) in items.iter().enumerate() {
        if s.title.trim().is_empty() {
            return Err(AppError::Validation(format!("subtasks[{}].title is required", i)));
        }
    }
    Ok(())
}
