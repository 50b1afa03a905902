use console::style;
use std::fmt;
use wapor_core::WaporError;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "error",
            "message": self.message,
            "context": self.context,
            "suggestions": self.suggestions,
        })
    }

    pub fn display_json(&self) {
        let value = self.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
        );
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// No API key in any configuration layer and no terminal to ask on
pub fn api_key_missing() -> CliError {
    CliError::new("No WaPOR API key configured")
        .with_context("Every command except `config` signs in to the WaPOR API first.")
        .with_suggestion("Pass it on the command line: wapor --api-key <KEY> ...")
        .with_suggestion("Or export WAPOR_API_KEY=<KEY>")
        .with_suggestion("Or set api_key_file = \"/path/to/key.txt\" in wapor.toml")
        .with_help("Run: wapor config")
}

fn authentication_failed(reason: &str) -> CliError {
    CliError::new("Cannot sign in to WaPOR")
        .with_context(format!("The API key was rejected or the sign-in request failed.\n\nReason: {}", reason))
        .with_suggestion("Check the API key (profile page of the WaPOR portal)")
        .with_suggestion("Check --base-url / WAPOR_BASE_URL if you use a mirror")
        .with_help("Run: wapor config")
}

fn product_not_found(code: &str, searched: &str) -> CliError {
    CliError::new(format!("Cube \"{}\" not found", code))
        .with_context(format!("Searched: {}", searched))
        .with_suggestion("List the cubes of a partition: wapor catalog --version 2 --level 1")
        .with_suggestion("Level 1 and 2 codes look like L1_AETI_D; level 3 codes include the area, e.g. L3_ODN_AETI_D")
        .with_help("Run: wapor catalog --help")
}

fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check wapor.toml (or the file given with --config) for syntax errors")
        .with_suggestion("Check the WAPOR_* environment variables")
        .with_help("Run: wapor config")
}

fn job_did_not_finish(job_url: &str, polls: u32) -> CliError {
    CliError::new("Job did not finish in time")
        .with_context(format!("Job: {}\nPolled {} times", job_url, polls))
        .with_suggestion("Raise the limit: --max-polls <N> or max_polls in wapor.toml")
        .with_suggestion("Or remove the limit to wait until the server is done")
}

fn service_unreachable(url: &str, reason: &str) -> CliError {
    CliError::new("Cannot reach the WaPOR API")
        .with_context(format!("URL: {}\nError: {}", url, reason))
        .with_suggestion("Check your network connection")
        .with_suggestion("Or set request_timeout_secs in wapor.toml if requests time out")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let error = match error.downcast::<CliError>() {
        Ok(cli_error) => return cli_error,
        Err(error) => error,
    };

    let message = format!("{:#}", error);
    let converted = match error.downcast_ref::<WaporError>() {
        Some(WaporError::Authentication { reason }) => authentication_failed(reason),
        Some(WaporError::ProductNotFound { code, probed }) => {
            let searched = probed.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            product_not_found(code, &searched)
        }
        Some(WaporError::ConfigInvalid { key, reason }) => invalid_config(key, reason),
        Some(WaporError::ConfigMissing { key }) => invalid_config(key, "value is required"),
        Some(WaporError::PollLimitExceeded { job_url, polls }) => job_did_not_finish(job_url, *polls),
        Some(WaporError::Transport { url, reason }) => service_unreachable(url, reason),
        Some(WaporError::JobFailed { job_url, log }) => CliError::new("Server job failed")
            .with_context(format!("Job: {}\n\n{}", job_url, log)),
        _ => return CliError::new(message),
    };
    with_outer_context(converted, &error)
}

/// Prefix the context layers wrapped around a `WaporError` to `err.context`
fn with_outer_context(mut err: CliError, error: &anyhow::Error) -> CliError {
    let outer: Vec<String> = error
        .chain()
        .take_while(|cause| cause.downcast_ref::<WaporError>().is_none())
        .map(ToString::to_string)
        .collect();
    if outer.is_empty() {
        return err;
    }

    let outer = outer.join(": ");
    err.context = Some(match err.context.take() {
        Some(inner) => format!("{}\n\n{}", outer, inner),
        None => outer,
    });
    err
}
