use herald::{RawOptions, RunConfiguration};

use super::shared::describe_config_errors;

/// Human-readable summary of a resolved configuration. The token stays
/// redacted.
fn summary(config: &RunConfiguration) -> Vec<String> {
    vec![
        format!("username:                        {}", config.username),
        format!("token:                           {}", config.token),
        format!("mark_as_read:                    {}", config.mark_as_read),
        format!("add_release_details:             {}", config.add_release_details),
        format!(
            "regex_filter_tag:                {}",
            config
                .tag_filter
                .as_ref()
                .map_or("(none)", |filter| filter.pattern())
        ),
        format!(
            "expected_receive_period_in_days: {}",
            config.expected_receive_period_in_days
        ),
        format!(
            "dedupe_acknowledgements:         {}",
            config.dedupe_acknowledgements
        ),
        format!(
            "request_timeout_secs:            {}",
            config.request_timeout.as_secs()
        ),
        format!("api_base:                        {}", config.api_base),
    ]
}

/// Check the options without touching the network.
pub(crate) fn handle_validate(raw: &RawOptions) -> Result<(), Box<dyn std::error::Error>> {
    match RunConfiguration::resolve(raw) {
        Ok(config) => {
            println!("Configuration is valid.\n");
            for line in summary(&config) {
                println!("  {line}");
            }
            Ok(())
        }
        Err(errors) => {
            println!("Configuration is invalid:\n");
            for line in describe_config_errors(&errors) {
                println!("  - {line}");
            }
            Err(format!("invalid configuration ({} error(s))", errors.len()).into())
        }
    }
}
