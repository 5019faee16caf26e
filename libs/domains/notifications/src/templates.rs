//! Email template rendering engine.
//!
//! This module provides Handlebars-based template rendering for the
//! emails this service composes itself (reminders, task lifecycle
//! events, test emails). Direct sends carry caller-supplied bodies and
//! never pass through here.

use crate::error::{NotificationError, NotificationResult};
use crate::models::{TaskEventKind, TaskPriority};
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Rendered email content.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    /// HTML body content.
    pub html: String,
    /// Plain text body content.
    pub text: String,
    /// Email subject line.
    pub subject: String,
}

/// Template data for a task reminder email.
#[derive(Debug, Serialize)]
pub struct TaskReminderData {
    pub task_title: String,
    /// Already formatted for display; "No due date set" when absent.
    pub due_date: String,
}

/// Template data for a task lifecycle email.
#[derive(Debug, Serialize)]
pub struct TaskEventData {
    pub heading: String,
    pub intro: String,
    pub task_title: String,
    pub task_description: String,
    pub priority_label: &'static str,
    pub priority_color: &'static str,
    pub due_date: String,
}

impl TaskEventData {
    pub fn new(
        event: TaskEventKind,
        task_title: String,
        task_description: Option<String>,
        priority: TaskPriority,
        due_date: Option<String>,
    ) -> Self {
        let (heading, intro) = match event {
            TaskEventKind::Created => (
                "✅ New Task Created",
                "A new task has been created in your Task Management System.",
            ),
            TaskEventKind::Updated => (
                "📝 Task Updated",
                "A task has been updated in your Task Management System.",
            ),
            TaskEventKind::Completed => (
                "🎉 Task Completed",
                "A task has been completed in your Task Management System.",
            ),
        };

        Self {
            heading: heading.to_string(),
            intro: intro.to_string(),
            task_title,
            task_description: task_description
                .unwrap_or_else(|| "No description provided".to_string()),
            priority_label: priority.label(),
            priority_color: priority.color(),
            due_date: due_date.unwrap_or_else(|| "No due date".to_string()),
        }
    }
}

/// Template engine for rendering email templates.
pub struct TemplateEngine {
    handlebars: Arc<Handlebars<'static>>,
}

impl TemplateEngine {
    /// Create a new template engine with all templates registered.
    pub fn new() -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();

        // Register task reminder templates
        handlebars
            .register_template_string("task_reminder_html", TASK_REMINDER_HTML_TEMPLATE)
            .map_err(|e| {
                NotificationError::Template(format!("Failed to register task_reminder_html: {}", e))
            })?;
        handlebars
            .register_template_string("task_reminder_text", TASK_REMINDER_TEXT_TEMPLATE)
            .map_err(|e| {
                NotificationError::Template(format!("Failed to register task_reminder_text: {}", e))
            })?;

        // Register task event templates
        handlebars
            .register_template_string("task_event_html", TASK_EVENT_HTML_TEMPLATE)
            .map_err(|e| {
                NotificationError::Template(format!("Failed to register task_event_html: {}", e))
            })?;
        handlebars
            .register_template_string("task_event_text", TASK_EVENT_TEXT_TEMPLATE)
            .map_err(|e| {
                NotificationError::Template(format!("Failed to register task_event_text: {}", e))
            })?;

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    /// Render a template with the given data.
    fn render<T: Serialize>(&self, template_name: &str, data: &T) -> NotificationResult<String> {
        self.handlebars
            .render(template_name, data)
            .map_err(|e| NotificationError::Template(e.to_string()))
    }

    /// Render a task reminder email.
    pub fn render_task_reminder(&self, data: &TaskReminderData) -> NotificationResult<RenderedEmail> {
        debug!(task_title = %data.task_title, "Rendering task reminder email");

        let html = self.render("task_reminder_html", data)?;
        let text = self.render("task_reminder_text", data)?;

        Ok(RenderedEmail {
            html,
            text,
            subject: format!("Task Reminder: {}", data.task_title),
        })
    }

    /// Render a task lifecycle event email.
    pub fn render_task_event(&self, data: &TaskEventData) -> NotificationResult<RenderedEmail> {
        debug!(task_title = %data.task_title, heading = %data.heading, "Rendering task event email");

        let html = self.render("task_event_html", data)?;
        let text = self.render("task_event_text", data)?;

        Ok(RenderedEmail {
            html,
            text,
            subject: format!("{}: {}", data.heading, data.task_title),
        })
    }

    /// Fixed-content email used to verify transport configuration.
    pub fn test_email(&self) -> RenderedEmail {
        RenderedEmail {
            html: "<p>This is a test email from your <strong>Task Management System</strong>.</p>\
                   <p>If you received this, email notifications are working correctly!</p>"
                .to_string(),
            text: "This is a test email from your Task Management System. \
                   If you received this, email notifications are working correctly!"
                .to_string(),
            subject: "Test Email - Task Management System".to_string(),
        }
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new().expect("Failed to create default template engine")
    }
}

// ============================================================================
// Email Templates
// ============================================================================

const TASK_REMINDER_HTML_TEMPLATE: &str = r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">Task Reminder</h2>
  <p>Hi there!</p>
  <p>This is a reminder about your task:</p>
  <div style="background-color: #f5f5f5; padding: 15px; border-radius: 5px; margin: 15px 0;">
    <h3 style="margin: 0; color: #2c3e50;">{{task_title}}</h3>
    <p style="margin: 5px 0; color: #666;">Due date: {{due_date}}</p>
  </div>
  <p>Please log in to your task manager to view and update this task.</p>
  <p>Best regards,<br>Task Management Team</p>
</div>"#;

const TASK_REMINDER_TEXT_TEMPLATE: &str = r#"Hi there!

This is a reminder about your task: "{{task_title}}"
Due date: {{due_date}}

Please log in to your task manager to view and update this task.

Best regards,
Task Management Team"#;

const TASK_EVENT_HTML_TEMPLATE: &str = r#"<div style="font-family: 'Segoe UI', Arial, sans-serif; max-width: 600px; margin: 0 auto; background-color: #f8fafc; padding: 20px;">
  <div style="background: linear-gradient(135deg, #2563eb 0%, #3b82f6 100%); padding: 30px; border-radius: 12px 12px 0 0; text-align: center;">
    <h1 style="color: white; margin: 0; font-size: 24px;">{{heading}}</h1>
  </div>

  <div style="background-color: white; padding: 30px; border-radius: 0 0 12px 12px; box-shadow: 0 4px 6px rgba(0,0,0,0.1);">
    <p style="color: #374151; font-size: 16px; margin-bottom: 20px;">Hello! {{intro}}</p>

    <div style="background-color: #f1f5f9; padding: 20px; border-radius: 8px; border-left: 4px solid {{priority_color}};">
      <h2 style="color: #1e293b; margin: 0 0 15px 0; font-size: 20px;">{{task_title}}</h2>
      <p style="color: #64748b; margin: 0 0 15px 0;">{{task_description}}</p>

      <div style="display: flex; gap: 20px; flex-wrap: wrap;">
        <div>
          <span style="color: #94a3b8; font-size: 12px; text-transform: uppercase;">Priority</span>
          <p style="margin: 5px 0 0 0; color: {{priority_color}}; font-weight: 600; text-transform: capitalize;">{{priority_label}}</p>
        </div>
        <div>
          <span style="color: #94a3b8; font-size: 12px; text-transform: uppercase;">Due Date</span>
          <p style="margin: 5px 0 0 0; color: #374151; font-weight: 600;">{{due_date}}</p>
        </div>
      </div>
    </div>

    <p style="color: #64748b; font-size: 14px; margin-top: 25px; text-align: center;">
      Log in to your task manager to view and manage this task.
    </p>
  </div>

  <p style="color: #94a3b8; font-size: 12px; text-align: center; margin-top: 20px;">
    Task Management System
  </p>
</div>"#;

const TASK_EVENT_TEXT_TEMPLATE: &str = r#"Hello!

{{intro}}

Task Details:
- Title: {{task_title}}
- Description: {{task_description}}
- Priority: {{priority_label}}
- Due Date: {{due_date}}

Log in to your task manager to view and manage this task.

Best regards,
Task Management System"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_engine_creation() {
        let engine = TemplateEngine::new();
        assert!(engine.is_ok());
    }

    #[test]
    fn test_render_task_reminder() {
        let engine = TemplateEngine::new().unwrap();
        let data = TaskReminderData {
            task_title: "Ship the release".to_string(),
            due_date: "No due date set".to_string(),
        };

        let rendered = engine.render_task_reminder(&data).unwrap();
        assert_eq!(rendered.subject, "Task Reminder: Ship the release");
        assert!(rendered.html.contains("Ship the release"));
        assert!(rendered.text.contains("No due date set"));
    }

    #[test]
    fn test_render_task_event_created() {
        let engine = TemplateEngine::new().unwrap();
        let data = TaskEventData::new(
            TaskEventKind::Created,
            "Write docs".to_string(),
            Some("Cover the new endpoints".to_string()),
            TaskPriority::High,
            None,
        );

        let rendered = engine.render_task_event(&data).unwrap();
        assert_eq!(rendered.subject, "✅ New Task Created: Write docs");
        assert!(rendered.html.contains("#ef4444"));
        assert!(rendered.text.contains("No due date"));
    }

    #[test]
    fn test_render_task_event_defaults_description() {
        let engine = TemplateEngine::new().unwrap();
        let data = TaskEventData::new(
            TaskEventKind::Completed,
            "Write docs".to_string(),
            None,
            TaskPriority::Medium,
            Some("12/25/2026".to_string()),
        );

        let rendered = engine.render_task_event(&data).unwrap();
        assert_eq!(rendered.subject, "🎉 Task Completed: Write docs");
        assert!(rendered.text.contains("No description provided"));
        assert!(rendered.text.contains("12/25/2026"));
    }

    #[test]
    fn test_test_email_is_fixed() {
        let engine = TemplateEngine::new().unwrap();
        let rendered = engine.test_email();
        assert_eq!(rendered.subject, "Test Email - Task Management System");
        assert!(rendered.html.contains("Task Management System"));
    }
}
