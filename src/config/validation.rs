//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Returns all validation errors, not just the first.

use crate::config::schema::ServerOptions;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate server options.
pub fn validate_options(options: &ServerOptions) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if options.http.host.is_empty() {
        errors.push(ValidationError {
            field: "http.host".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if options.http.request_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "http.request_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    for (field, value) in [
        ("paths.server_bundle", &options.paths.server_bundle),
        ("paths.client_manifest", &options.paths.client_manifest),
        ("paths.templates.spa", &options.paths.templates.spa),
        ("paths.templates.ssr", &options.paths.templates.ssr),
    ] {
        if value.is_empty() {
            errors.push(ValidationError {
                field: field.to_string(),
                message: "must not be empty".to_string(),
            });
        }
    }
    if options.paths.templates.spa == options.paths.templates.ssr {
        errors.push(ValidationError {
            field: "paths.templates".to_string(),
            message: "spa and ssr templates must be distinct files".to_string(),
        });
    }

    if options.renderer.outlet.is_empty() {
        errors.push(ValidationError {
            field: "renderer.outlet".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    if let Some(dev) = &options.dev {
        if dev.client.entry.is_empty() {
            errors.push(ValidationError {
                field: "dev.client.entry".to_string(),
                message: "at least one entry module is required".to_string(),
            });
        }
        if dev.watch.is_empty() {
            errors.push(ValidationError {
                field: "dev.watch".to_string(),
                message: "at least one watch directory is required".to_string(),
            });
        }
        if dev.heartbeat_secs == 0 {
            errors.push(ValidationError {
                field: "dev.heartbeat_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if !dev.hot_path.starts_with('/') {
            errors.push(ValidationError {
                field: "dev.hot_path".to_string(),
                message: "must be an absolute request path".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DevOptions;

    #[test]
    fn default_options_validate() {
        assert!(validate_options(&ServerOptions::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut options = ServerOptions::default();
        options.http.host.clear();
        options.http.request_timeout_secs = 0;
        options.paths.server_bundle.clear();

        let errors = validate_options(&options).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "http.host"));
    }

    #[test]
    fn identical_templates_rejected() {
        let mut options = ServerOptions::default();
        options.paths.templates.spa = "index.html".to_string();
        options.paths.templates.ssr = "index.html".to_string();

        let errors = validate_options(&options).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "paths.templates"));
    }

    #[test]
    fn dev_section_checks() {
        let mut options = ServerOptions::default();
        let mut dev = DevOptions::default();
        dev.client.entry.clear();
        dev.hot_path = "hot".to_string();
        options.dev = Some(dev);

        let errors = validate_options(&options).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "dev.client.entry"));
        assert!(errors.iter().any(|e| e.field == "dev.hot_path"));
    }
}
