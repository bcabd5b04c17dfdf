//! Fallback policy — the static, always-valid document substituted when
//! extraction is unrecoverable.
//!
//! The shape must stay structurally compatible with what downstream consumers
//! expect as a "valid empty" document: an HTML template with mustache
//! placeholders, a form schema, and resume data carrying the basic identity
//! fields plus an empty work list. Callers receive this instead of an error —
//! a usable default beats a hard failure mid-workflow.

use serde_json::{json, Value};

const FALLBACK_HTML_TEMPLATE: &str = r#"
<div class="resume-container">
    <h1>{{basics.name}}</h1>
    <h2>{{basics.label}}</h2>
    <p>{{basics.email}} | {{basics.phone}}</p>
    <hr/>
    <div class="section">
        <h3>Experience</h3>
        {{#work}}
        <div class="item">
            <h4>{{position}} - {{company}}</h4>
            <p>{{startDate}} - {{endDate}}</p>
            <p>{{summary}}</p>
        </div>
        {{/work}}
    </div>
</div>
"#;

/// The minimal schema-valid document returned whenever extraction fails.
pub fn safe_default() -> Value {
    json!({
        "html_template": FALLBACK_HTML_TEMPLATE,
        "form_schema": {
            "basics": {
                "name": {"type": "text", "label": "Full Name"},
                "label": {"type": "text", "label": "Job Title"},
                "email": {"type": "text", "label": "Email"},
                "phone": {"type": "text", "label": "Phone"}
            },
            "work": {
                "type": "array",
                "label": "Work Experience",
                "items": {
                    "company": {"type": "text", "label": "Company"},
                    "position": {"type": "text", "label": "Position"},
                    "startDate": {"type": "text", "label": "Start Date"},
                    "endDate": {"type": "text", "label": "End Date"},
                    "summary": {"type": "textarea", "label": "Description"}
                }
            }
        },
        "resume_data": {
            "basics": {"name": "Your Name", "label": "Professional Title"},
            "work": []
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_a_json_object() {
        assert!(safe_default().is_object());
    }

    #[test]
    fn test_fallback_has_identity_section_and_empty_work_list() {
        let doc = safe_default();
        assert!(doc["resume_data"]["basics"].is_object());
        assert_eq!(doc["resume_data"]["basics"]["name"], "Your Name");
        assert_eq!(doc["resume_data"]["work"], serde_json::json!([]));
    }

    #[test]
    fn test_fallback_template_keeps_mustache_placeholders() {
        let doc = safe_default();
        let html = doc["html_template"].as_str().unwrap();
        assert!(html.contains("{{basics.name}}"));
        assert!(html.contains("{{#work}}"));
        assert!(html.contains("{{/work}}"));
    }
}
