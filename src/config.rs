use std::path::Path;

use undertow_fluids::sph::SphFluid2DParams;

use crate::CliError;

/// Reads fluid parameters from a RON file, or falls back to the defaults.
pub fn load_params(path: Option<&Path>) -> Result<SphFluid2DParams, CliError> {
    let Some(path) = path else {
        return Ok(SphFluid2DParams::default());
    };

    let contents = std::fs::read_to_string(path)?;
    Ok(parse_params(&contents)?)
}

fn parse_params(contents: &str) -> Result<SphFluid2DParams, ron::error::SpannedError> {
    ron::from_str(contents)
}
