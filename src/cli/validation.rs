use crate::cli::errors::{CliError, CliResult};

/// Validates a centroid similarity threshold
pub fn validate_threshold(threshold: f32) -> CliResult<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CliError::validation(
            "threshold",
            format!("must be between 0.0 and 1.0, got {threshold}"),
        ));
    }
    Ok(())
}

/// Validates the clustering radius. Cosine distance lies in [0, 2].
pub fn validate_eps(eps: f32) -> CliResult<()> {
    if !(eps > 0.0 && eps <= 2.0) {
        return Err(CliError::validation(
            "eps",
            format!("must be in (0.0, 2.0], got {eps}"),
        ));
    }
    Ok(())
}

pub fn validate_min_cluster_size(size: usize) -> CliResult<()> {
    if size == 0 {
        return Err(CliError::validation("min-cluster-size", "must be at least 1"));
    }
    Ok(())
}

pub fn validate_limit(limit: usize) -> CliResult<()> {
    if limit == 0 {
        return Err(CliError::validation("limit", "must be at least 1"));
    }
    Ok(())
}

/// Validates the target note slug for single-note modes
pub fn validate_note_slug(note: Option<&str>) -> CliResult<String> {
    match note.map(str::trim) {
        Some(slug) if !slug.is_empty() => Ok(slug.to_string()),
        _ => Err(CliError::validation(
            "note",
            "--note is required for --mode=for-note",
        )),
    }
}
