use herald::{ConfigError, RawOptions, RunConfiguration};

/// One line per invalid key, in key order.
pub(crate) fn describe_config_errors(errors: &[ConfigError]) -> Vec<String> {
    let mut lines: Vec<(&str, String)> = errors.iter().map(|e| (e.field(), e.to_string())).collect();
    lines.sort_by(|a, b| a.0.cmp(b.0));
    lines.into_iter().map(|(_, line)| line).collect()
}

/// Resolve options, reporting every invalid key before failing.
pub(crate) fn resolve_or_report(
    raw: &RawOptions,
) -> Result<RunConfiguration, Box<dyn std::error::Error>> {
    RunConfiguration::resolve(raw).map_err(|errors| -> Box<dyn std::error::Error> {
        for line in describe_config_errors(&errors) {
            tracing::error!("{}", line);
        }
        format!("invalid configuration ({} error(s))", errors.len()).into()
    })
}
