use kg_types::{
    ParamBounds, ParamInput, RetrievalError, RetrievalParams, MAX_COMMUNITIES, MAX_PATHS_PER_ENTITY,
    MAX_PATH_LENGTH, MAX_RESULTS,
};

fn bounded(bounds: ParamBounds, value: Option<i64>) -> Result<usize, RetrievalError> {
    let Some(v) = value else {
        return Ok(bounds.default);
    };
    if v < bounds.min as i64 {
        return Err(RetrievalError::InvalidParameter(format!(
            "{} must be at least {}, got {}",
            bounds.name, bounds.min, v
        )));
    }
    if v > bounds.max as i64 {
        tracing::warn!(
            param = bounds.name,
            requested = v,
            max = bounds.max,
            "parameter above maximum; clamping"
        );
        return Ok(bounds.max);
    }
    Ok(v as usize)
}

/// Fill defaults, reject values below the minimum, clamp values above the maximum.
pub fn validate_params(input: &ParamInput) -> Result<RetrievalParams, RetrievalError> {
    Ok(RetrievalParams {
        max_results: bounded(MAX_RESULTS, input.max_results)?,
        max_path_length: bounded(MAX_PATH_LENGTH, input.max_path_length)?,
        max_communities: bounded(MAX_COMMUNITIES, input.max_communities)?,
        max_paths_per_entity: bounded(MAX_PATHS_PER_ENTITY, input.max_paths_per_entity)?,
        include_communities: input.include_communities.unwrap_or(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_take_defaults() {
        assert_eq!(
            validate_params(&ParamInput::default()).unwrap(),
            RetrievalParams::default()
        );
    }

    #[test]
    fn zero_and_negative_are_rejected() {
        for bad in [0, -3] {
            let input = ParamInput {
                max_path_length: Some(bad),
                ..Default::default()
            };
            let err = validate_params(&input).unwrap_err();
            assert!(matches!(err, RetrievalError::InvalidParameter(ref m) if m.contains("max_path_length")));
        }
    }

    #[test]
    fn large_values_are_clamped() {
        let input = ParamInput {
            max_results: Some(5000),
            max_path_length: Some(7),
            max_communities: Some(50),
            max_paths_per_entity: Some(1),
            include_communities: Some(false),
        };
        let p = validate_params(&input).unwrap();
        assert_eq!(p.max_results, 100);
        assert_eq!(p.max_path_length, 6);
        assert_eq!(p.max_communities, 50);
        assert_eq!(p.max_paths_per_entity, 1);
        assert!(!p.include_communities);
    }

    #[test]
    fn communities_are_included_unless_disabled() {
        assert!(validate_params(&ParamInput::default()).unwrap().include_communities);
    }
}
